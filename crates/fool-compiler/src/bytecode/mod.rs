//! Symbolic stack-machine code produced by the code generator.
//!
//! - [`Instruction`], [`Operand`] and [`Label`] - single instructions
//! - [`AsmItem`] - an instruction or a label definition
//! - [`AsmProgram`] - the full stream, printable as assembly text

mod instruction;
mod program;

pub use fool_core::OpCode;
pub use instruction::{AsmItem, Instruction, Label, Operand};
pub use program::AsmProgram;
