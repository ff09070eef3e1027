//! FOOL compiler: linking, type checking and code generation.
//!
//! This crate turns an arena-allocated syntax tree into symbolic
//! stack-machine code.
//!
//! ## Architecture
//!
//! ```text
//! Program ──► LinkingPass ──► TypeCheckPass ──► CodeGenPass ──► AsmProgram
//!               │ bindings       │ types           │
//!               ▼                ▼                 ▼
//!            LinkOutput     TypeCheckOutput     assembly text
//! ```
//!
//! ## Modules
//!
//! - [`scope`]: lexical scope stack used by the linker
//! - [`class_table`]: per-class member and dispatch tables
//! - [`types`]: subtyping and lowest common ancestors
//! - [`passes`]: the three compiler passes
//! - [`emit`]: instruction emitter
//! - [`bytecode`]: symbolic instructions and programs
//!
//! ## Example
//!
//! ```
//! use bumpalo::Bump;
//! use fool_ast::AstBuilder;
//! use fool_compiler::{CodeGenOptions, Compiler};
//!
//! let arena = Bump::new();
//! let b = AstBuilder::new(&arena);
//! let program = b.program(&[], b.print(b.sub(b.int(5), b.int(2))));
//!
//! let result = Compiler::compile(&arena, program, CodeGenOptions::default());
//! assert!(result.is_success());
//! assert_eq!(result.assembly.unwrap().to_string(), "push 5\npush 2\nsub\nprint\nhalt\n");
//! ```

pub mod bytecode;
pub mod class_table;
pub mod emit;
pub mod passes;
pub mod scope;
pub mod types;

use bumpalo::Bump;
use fool_ast::{Program, Type};
use fool_core::CompileError;

pub use bytecode::AsmProgram;
pub use passes::{
    CodeGenOptions, CodeGenPass, LinkOutput, LinkingPass, TypeCheckOutput, TypeCheckPass,
};

/// Result of running every pass over a program.
#[derive(Debug)]
pub struct CompilationResult<'ast> {
    /// Generated code; present only when no pass reported an error.
    pub assembly: Option<AsmProgram>,
    /// Type of the program body, when it could be determined.
    pub program_type: Option<Type<'ast>>,
    /// Some subtree was incomplete and skipped by the type checker.
    pub incomplete: bool,
    /// Errors from every pass, in pass order.
    pub errors: Vec<CompileError>,
}

impl CompilationResult<'_> {
    /// Check if compilation produced code.
    pub fn is_success(&self) -> bool {
        self.errors.is_empty() && self.assembly.is_some()
    }
}

/// Runs the passes in order and refuses to generate code for a program
/// with link or type errors, or whose type is unknown.
pub struct Compiler;

impl Compiler {
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn compile<'ast>(
        arena: &'ast Bump,
        program: &Program<'ast>,
        options: CodeGenOptions,
    ) -> CompilationResult<'ast> {
        let link = LinkingPass::new(arena).run(program);
        let types = TypeCheckPass::new().run(program, &link);

        let mut errors: Vec<CompileError> = link.errors.iter().cloned().map(Into::into).collect();
        errors.extend(types.errors.iter().cloned().map(CompileError::from));

        let mut assembly = None;
        if errors.is_empty() && types.program_type.is_some() {
            match CodeGenPass::new(options).run(program, &types) {
                Ok(asm) => assembly = Some(asm),
                Err(error) => errors.push(error.into()),
            }
        } else {
            tracing::debug!(errors = errors.len(), "code generation skipped");
        }

        CompilationResult {
            assembly,
            program_type: types.program_type,
            incomplete: types.incomplete,
            errors,
        }
    }
}
