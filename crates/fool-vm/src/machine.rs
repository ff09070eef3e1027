//! The stack machine.
//!
//! ## Memory
//!
//! ```text
//! 0                                                    memory_size
//! | heap ->                                     <- stack |
//!   hp                                                sp = fp initially
//! ```
//!
//! `ra` and `tm` are single-slot scratch registers used by the calling
//! convention. A run ends at `halt`, when `ip` moves past the last code
//! cell, or at the first fault.

use fool_core::{OpCode, RuntimeError};

use crate::MachineConfig;

/// A stack machine loaded with one program.
#[derive(Debug)]
pub struct Machine {
    code: Vec<i32>,
    memory: Vec<i32>,
    ip: usize,
    sp: i32,
    fp: i32,
    hp: i32,
    ra: i32,
    tm: i32,
    output: Vec<i32>,
}

impl Machine {
    /// Load `code` into a machine sized by `config`.
    ///
    /// Fails if the code does not fit in the code store or if the memory
    /// is too large to be addressed by a cell value.
    pub fn new(code: Vec<i32>, config: MachineConfig) -> Result<Self, RuntimeError> {
        if code.len() > config.code_size {
            return Err(RuntimeError::CodeTooLarge {
                size: code.len(),
                capacity: config.code_size,
            });
        }
        let top = i32::try_from(config.memory_size).map_err(|_| RuntimeError::MemoryTooLarge {
            size: config.memory_size,
        })?;
        Ok(Self {
            code,
            memory: vec![0; config.memory_size],
            ip: 0,
            sp: top,
            fp: top,
            hp: 0,
            ra: 0,
            tm: 0,
            output: Vec::new(),
        })
    }

    /// Values printed so far, in order.
    pub fn output(&self) -> &[i32] {
        &self.output
    }

    /// The value on top of the stack, if any.
    fn top(&self) -> Option<i32> {
        self.memory.get(self.sp as usize).copied()
    }

    // ========================================================================
    // Execution
    // ========================================================================

    /// Run until `halt`, the end of the code, or a fault.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(&mut self) -> Result<&[i32], RuntimeError> {
        while self.ip < self.code.len() {
            let at = self.ip;
            let cell = self.code[at];
            let op = OpCode::decode(cell).ok_or(RuntimeError::InvalidOpcode { code: cell, ip: at })?;
            self.ip += 1;
            tracing::trace!(ip = at, op = op.mnemonic(), sp = self.sp, "step");

            if !self.step(op, at)? {
                break;
            }
        }
        tracing::debug!(printed = self.output.len(), sp = self.sp, hp = self.hp, "machine stopped");
        Ok(&self.output)
    }

    /// Execute one decoded instruction; `false` means halt.
    fn step(&mut self, op: OpCode, at: usize) -> Result<bool, RuntimeError> {
        match op {
            OpCode::Halt => return Ok(false),
            OpCode::Push => {
                let value = self.fetch_operand(at)?;
                self.push(value)?;
            }
            OpCode::Pop => {
                self.pop()?;
            }

            OpCode::Add => self.binary(i32::wrapping_add)?,
            OpCode::Sub => self.binary(i32::wrapping_sub)?,
            OpCode::Mult => self.binary(i32::wrapping_mul)?,
            OpCode::Div => {
                let right = self.pop()?;
                let left = self.pop()?;
                if right == 0 {
                    return Err(RuntimeError::DivisionByZero { ip: at });
                }
                self.push(left.wrapping_div(right))?;
            }

            OpCode::Branch => {
                let target = self.fetch_operand(at)?;
                self.jump(target, at)?;
            }
            OpCode::BranchEq | OpCode::BranchLessEq => {
                let target = self.fetch_operand(at)?;
                let right = self.pop()?;
                let left = self.pop()?;
                let taken = if op == OpCode::BranchEq {
                    left == right
                } else {
                    left <= right
                };
                if taken {
                    self.jump(target, at)?;
                }
            }
            OpCode::JumpSubroutine => {
                let target = self.pop()?;
                self.ra = self.ip as i32;
                self.jump(target, at)?;
            }

            OpCode::LoadFp => self.push(self.fp)?,
            OpCode::StoreFp => self.fp = self.pop()?,
            OpCode::CopyFp => self.fp = self.sp,
            OpCode::LoadRa => self.push(self.ra)?,
            OpCode::StoreRa => self.ra = self.pop()?,
            OpCode::LoadTm => self.push(self.tm)?,
            OpCode::StoreTm => self.tm = self.pop()?,
            OpCode::LoadHp => self.push(self.hp)?,
            OpCode::StoreHp => self.hp = self.pop()?,

            OpCode::LoadWord => {
                let address = self.pop()?;
                let value = self.load(address)?;
                self.push(value)?;
            }
            OpCode::StoreWord => {
                let address = self.pop()?;
                let value = self.pop()?;
                self.store(address, value)?;
            }

            OpCode::Print => match self.top() {
                Some(value) => {
                    tracing::debug!(value, "print");
                    self.output.push(value);
                }
                None => tracing::warn!(ip = at, "print on empty stack"),
            },
        }
        Ok(true)
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn fetch_operand(&mut self, at: usize) -> Result<i32, RuntimeError> {
        let value = self
            .code
            .get(self.ip)
            .copied()
            .ok_or(RuntimeError::CodeOutOfBounds {
                address: self.ip as i32,
                ip: at,
            })?;
        self.ip += 1;
        Ok(value)
    }

    /// Jumping to one past the last cell ends the run normally.
    fn jump(&mut self, target: i32, at: usize) -> Result<(), RuntimeError> {
        if target < 0 || target as usize > self.code.len() {
            return Err(RuntimeError::CodeOutOfBounds {
                address: target,
                ip: at,
            });
        }
        self.ip = target as usize;
        Ok(())
    }

    fn binary(&mut self, op: fn(i32, i32) -> i32) -> Result<(), RuntimeError> {
        let right = self.pop()?;
        let left = self.pop()?;
        self.push(op(left, right))
    }

    fn cell(&self, address: i32) -> Result<usize, RuntimeError> {
        if address < 0 || address as usize >= self.memory.len() {
            return Err(RuntimeError::MemoryOutOfBounds {
                address,
                ip: self.ip.saturating_sub(1),
            });
        }
        Ok(address as usize)
    }

    fn load(&self, address: i32) -> Result<i32, RuntimeError> {
        Ok(self.memory[self.cell(address)?])
    }

    fn store(&mut self, address: i32, value: i32) -> Result<(), RuntimeError> {
        let cell = self.cell(address)?;
        self.memory[cell] = value;
        Ok(())
    }

    fn push(&mut self, value: i32) -> Result<(), RuntimeError> {
        let cell = self.cell(self.sp - 1)?;
        self.memory[cell] = value;
        self.sp -= 1;
        Ok(())
    }

    fn pop(&mut self) -> Result<i32, RuntimeError> {
        let value = self.load(self.sp)?;
        self.sp += 1;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble;
    use crate::test_utils::init_test_logging;

    fn run(source: &str) -> Result<Vec<i32>, RuntimeError> {
        init_test_logging();
        let code = assemble(source, 1000).unwrap();
        let mut machine = Machine::new(code, MachineConfig::default().with_memory_size(100))?;
        machine.run().map(<[i32]>::to_vec)
    }

    #[test]
    fn subtraction_pops_right_operand_first() {
        assert_eq!(run("push 5\npush 2\nsub\nprint\nhalt\n"), Ok(vec![3]));
    }

    #[test]
    fn arithmetic_handles_negatives() {
        assert_eq!(run("push 1\npush -2\nmult\nprint\n"), Ok(vec![-2]));
        assert_eq!(run("push -7\npush 2\ndiv\nprint\n"), Ok(vec![-3]));
    }

    #[test]
    fn arithmetic_wraps() {
        assert_eq!(
            run("push 2147483647\npush 1\nadd\nprint\n"),
            Ok(vec![i32::MIN])
        );
    }

    #[test]
    fn division_by_zero_faults() {
        assert_eq!(
            run("push 1\npush 0\ndiv\nprint\n"),
            Err(RuntimeError::DivisionByZero { ip: 4 })
        );
    }

    #[test]
    fn print_does_not_pop() {
        assert_eq!(run("push 4\nprint\nprint\npop\nprint\n"), Ok(vec![4, 4]));
    }

    #[test]
    fn branches_consume_operands() {
        let source = "push 3\npush 3\nbeq yes\npush 0\nprint\nhalt\nyes:\npush 1\nprint\nhalt\n";
        assert_eq!(run(source), Ok(vec![1]));

        let source = "push 4\npush 3\nbleq yes\npush 0\nprint\nhalt\nyes:\npush 1\nprint\n";
        assert_eq!(run(source), Ok(vec![0]));
    }

    #[test]
    fn halt_stops_before_remaining_code() {
        assert_eq!(run("push 1\nprint\nhalt\nprint\n"), Ok(vec![1]));
    }

    #[test]
    fn running_past_the_code_ends_the_run() {
        assert_eq!(run("push 9\nprint\n"), Ok(vec![9]));
    }

    #[test]
    fn jump_subroutine_saves_return_address() {
        let source = "push sub\njs\nprint\nhalt\nsub:\nlra\nprint\npop\npush 42\nlra\njs\n";
        assert_eq!(run(source), Ok(vec![3, 42]));
    }

    #[test]
    fn store_and_load_words() {
        let source = "push 17\npush 50\nsw\npush 50\nlw\nprint\n";
        assert_eq!(run(source), Ok(vec![17]));
    }

    #[test]
    fn heap_pointer_round_trip() {
        let source = "lhp\nprint\npop\npush 12\nshp\nlhp\nprint\n";
        assert_eq!(run(source), Ok(vec![0, 12]));
    }

    #[test]
    fn frame_registers() {
        let source = "lfp\nprint\npop\npush 1\ncfp\nlfp\nprint\n";
        assert_eq!(run(source), Ok(vec![100, 99]));
    }

    #[test]
    fn memory_bounds_are_checked() {
        assert!(matches!(
            run("push -1\nlw\n"),
            Err(RuntimeError::MemoryOutOfBounds { address: -1, .. })
        ));
        assert!(matches!(
            run("pop\n"),
            Err(RuntimeError::MemoryOutOfBounds { address: 100, .. })
        ));
    }

    #[test]
    fn invalid_opcode_and_code_bounds() {
        let mut machine = Machine::new(vec![99], MachineConfig::default()).unwrap();
        assert_eq!(
            machine.run(),
            Err(RuntimeError::InvalidOpcode { code: 99, ip: 0 })
        );

        assert!(matches!(
            run("push 500\njs\n"),
            Err(RuntimeError::CodeOutOfBounds { address: 500, .. })
        ));
    }

    #[test]
    fn code_must_fit_the_code_store() {
        let code = assemble("push 1\nprint\npush 2\nprint\nhalt\n", 100).unwrap();
        assert_eq!(code.len(), 7);

        let small = MachineConfig::default().with_code_size(2);
        assert_eq!(
            Machine::new(code.clone(), small).err(),
            Some(RuntimeError::CodeTooLarge {
                size: 7,
                capacity: 2
            })
        );

        let exact = MachineConfig::default().with_code_size(7);
        let mut machine = Machine::new(code, exact).unwrap();
        assert_eq!(machine.run(), Ok(&[1, 2][..]));
    }

    #[test]
    fn memory_must_be_addressable() {
        let huge = MachineConfig::default().with_memory_size(i32::MAX as usize + 1);
        assert_eq!(
            Machine::new(vec![], huge).err(),
            Some(RuntimeError::MemoryTooLarge {
                size: i32::MAX as usize + 1
            })
        );
    }

    #[test]
    fn print_on_empty_stack_emits_nothing() {
        assert_eq!(run("print\nhalt\n"), Ok(vec![]));
    }
}
