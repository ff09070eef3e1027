//! FOOL: a small object-oriented let-language compiled to a stack machine.
//!
//! ## Architecture
//!
//! ```text
//! AstBuilder ──► Program ──► Compiler ──► assembly text ──► assemble ──► Machine
//!  (fool-ast)             (fool-compiler)                       (fool-vm)
//! ```
//!
//! [`Session`] drives the whole pipeline. The stage crates are re-exported
//! for callers that only need one of them.

mod session;

pub use fool_ast as ast;
pub use fool_compiler as compiler;
pub use fool_vm as vm;

pub use fool_ast::AstBuilder;
pub use fool_compiler::{AsmProgram, CodeGenOptions, CompilationResult, Compiler};
pub use fool_core::{
    AssemblyError, CodegenError, CompileError, LinkError, RuntimeError, Span, TypeError,
};
pub use fool_vm::{Machine, MachineConfig, assemble};
pub use session::{BuildError, Compiled, Error, Session, SessionOptions};
