//! The stack machine's instruction set.
//!
//! Instructions are stored in the code segment as `i32` cells: the opcode
//! followed by at most one operand cell (a constant or a resolved code
//! address). The textual form uses the lower-case mnemonics returned by
//! [`OpCode::mnemonic`].

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Stack machine operation codes.
///
/// Binary operators pop the right operand first, then the left one, and
/// push `left op right`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(i32)]
pub enum OpCode {
    /// Stop execution.
    Halt = 0,

    // =========================================================================
    // Stack
    // =========================================================================
    /// Push the operand.
    Push,
    /// Discard the top of stack.
    Pop,

    // =========================================================================
    // Arithmetic
    // =========================================================================
    Add,
    Sub,
    Mult,
    Div,

    // =========================================================================
    // Control Flow
    // =========================================================================
    /// Jump to the operand address.
    Branch,
    /// Pop two values, jump to the operand address if they are equal.
    BranchEq,
    /// Pop right then left, jump to the operand address if `left <= right`.
    BranchLessEq,
    /// Pop an address, save `ip` into `ra`, jump to the address.
    JumpSubroutine,

    // =========================================================================
    // Registers
    // =========================================================================
    /// Push `fp`.
    LoadFp,
    /// Pop into `fp`.
    StoreFp,
    /// Copy `sp` into `fp`.
    CopyFp,
    /// Push `ra`.
    LoadRa,
    /// Pop into `ra`.
    StoreRa,
    /// Push `tm`.
    LoadTm,
    /// Pop into `tm`.
    StoreTm,
    /// Push `hp`.
    LoadHp,
    /// Pop into `hp`.
    StoreHp,

    // =========================================================================
    // Memory
    // =========================================================================
    /// Pop an address, push the word stored there.
    LoadWord,
    /// Pop an address, then a value, and store the value at the address.
    StoreWord,

    // =========================================================================
    // Output
    // =========================================================================
    /// Emit the top of stack without popping it.
    Print,
}

impl OpCode {
    /// Every opcode, in encoding order.
    pub const ALL: [OpCode; 23] = [
        OpCode::Halt,
        OpCode::Push,
        OpCode::Pop,
        OpCode::Add,
        OpCode::Sub,
        OpCode::Mult,
        OpCode::Div,
        OpCode::Branch,
        OpCode::BranchEq,
        OpCode::BranchLessEq,
        OpCode::JumpSubroutine,
        OpCode::LoadFp,
        OpCode::StoreFp,
        OpCode::CopyFp,
        OpCode::LoadRa,
        OpCode::StoreRa,
        OpCode::LoadTm,
        OpCode::StoreTm,
        OpCode::LoadHp,
        OpCode::StoreHp,
        OpCode::LoadWord,
        OpCode::StoreWord,
        OpCode::Print,
    ];

    /// Decode a code cell.
    #[inline]
    pub fn decode(cell: i32) -> Option<Self> {
        OpCode::try_from(cell).ok()
    }

    /// The textual mnemonic of this instruction.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            OpCode::Halt => "halt",
            OpCode::Push => "push",
            OpCode::Pop => "pop",
            OpCode::Add => "add",
            OpCode::Sub => "sub",
            OpCode::Mult => "mult",
            OpCode::Div => "div",
            OpCode::Branch => "b",
            OpCode::BranchEq => "beq",
            OpCode::BranchLessEq => "bleq",
            OpCode::JumpSubroutine => "js",
            OpCode::LoadFp => "lfp",
            OpCode::StoreFp => "sfp",
            OpCode::CopyFp => "cfp",
            OpCode::LoadRa => "lra",
            OpCode::StoreRa => "sra",
            OpCode::LoadTm => "ltm",
            OpCode::StoreTm => "stm",
            OpCode::LoadHp => "lhp",
            OpCode::StoreHp => "shp",
            OpCode::LoadWord => "lw",
            OpCode::StoreWord => "sw",
            OpCode::Print => "print",
        }
    }

    /// Look up an instruction by mnemonic.
    pub fn from_mnemonic(text: &str) -> Option<Self> {
        OpCode::ALL.into_iter().find(|op| op.mnemonic() == text)
    }

    /// Whether the instruction is followed by an operand cell.
    #[inline]
    pub fn has_operand(&self) -> bool {
        matches!(
            self,
            OpCode::Push | OpCode::Branch | OpCode::BranchEq | OpCode::BranchLessEq
        )
    }

    /// Number of code cells the instruction occupies.
    #[inline]
    pub fn width(&self) -> usize {
        if self.has_operand() { 2 } else { 1 }
    }
}
