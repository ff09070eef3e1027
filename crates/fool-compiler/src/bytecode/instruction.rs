//! Symbolic instructions.

use std::fmt;

use fool_core::OpCode;

/// A named code address, resolved by the assembler.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Label(String);

impl Label {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The argument of `push` or of a branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Value(i32),
    Label(Label),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Value(value) => write!(f, "{value}"),
            Operand::Label(label) => write!(f, "{label}"),
        }
    }
}

/// One instruction with its optional operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub op: OpCode,
    pub operand: Option<Operand>,
    /// Source line the instruction was generated from.
    pub line: u32,
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.operand {
            Some(operand) => write!(f, "{} {operand}", self.op.mnemonic()),
            None => f.write_str(self.op.mnemonic()),
        }
    }
}

/// An element of an instruction stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AsmItem {
    Instr(Instruction),
    Label(Label),
}

impl fmt::Display for AsmItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AsmItem::Instr(instr) => write!(f, "{instr}"),
            AsmItem::Label(label) => write!(f, "{label}:"),
        }
    }
}
