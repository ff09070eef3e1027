//! A complete instruction stream.

use std::fmt;

use fool_core::OpCode;

use super::{AsmItem, Instruction};

/// The generated program: the main stream followed by every function and
/// method body.
///
/// Its [`Display`](fmt::Display) form is the textual assembly accepted by
/// the assembler, one instruction or `label:` per line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AsmProgram {
    items: Vec<AsmItem>,
}

impl AsmProgram {
    pub fn new(items: Vec<AsmItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[AsmItem] {
        &self.items
    }

    /// Instructions in order, labels skipped.
    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.items.iter().filter_map(|item| match item {
            AsmItem::Instr(instr) => Some(instr),
            AsmItem::Label(_) => None,
        })
    }

    /// Number of code cells the program occupies once assembled.
    pub fn code_size(&self) -> usize {
        self.instructions().map(|instr| instr.op.width()).sum()
    }

    /// How many times `op` occurs.
    pub fn count(&self, op: OpCode) -> usize {
        self.instructions().filter(|instr| instr.op == op).count()
    }
}

impl fmt::Display for AsmProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for item in &self.items {
            writeln!(f, "{item}")?;
        }
        Ok(())
    }
}
