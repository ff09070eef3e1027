//! Compiler passes, run in order over the same tree.
//!
//! - [`linking`]: Pass 1 - bind names to slots and lay out classes
//! - [`type_check`]: Pass 2 - compute types and check declarations
//! - [`codegen`]: Pass 3 - emit stack-machine code
//!
//! Each pass takes the previous pass's output as an argument.

pub mod codegen;
pub mod linking;
pub mod type_check;

pub use codegen::{CodeGenOptions, CodeGenPass};
pub use linking::{LinkOutput, LinkingPass};
pub use type_check::{TypeCheckOutput, TypeCheckPass};
