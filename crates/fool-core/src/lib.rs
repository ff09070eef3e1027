//! Shared building blocks for the FOOL compiler and stack machine.
//!
//! - [`Span`] - source positions
//! - [`OpCode`] - the stack machine instruction set
//! - [`error`] - the error hierarchy for every phase

pub mod error;
mod opcode;
mod span;

pub use error::{AssemblyError, CodegenError, CompileError, LinkError, RuntimeError, TypeError};
pub use opcode::OpCode;
pub use span::Span;
