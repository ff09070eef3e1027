//! Compile-and-run session.
//!
//! A [`Session`] runs the compiler passes, refuses programs that did not
//! check, assembles the generated text and executes it on a fresh
//! [`Machine`].
//!
//! # Example
//!
//! ```
//! use bumpalo::Bump;
//! use fool::{AstBuilder, Session};
//!
//! let arena = Bump::new();
//! let b = AstBuilder::new(&arena);
//! let program = b.program(&[], b.print(b.mul(b.int(1), b.int(-2))));
//!
//! let output = Session::default().compile_and_run(&arena, program)?;
//! assert_eq!(output, vec![-2]);
//! # Ok::<(), fool::Error>(())
//! ```

use bumpalo::Bump;
use fool_ast::Program;
use fool_compiler::{CodeGenOptions, Compiler};
use fool_core::{AssemblyError, CompileError, RuntimeError};
use fool_vm::{DEFAULT_CODE_SIZE, DEFAULT_MEMORY_SIZE, Machine, MachineConfig, assemble};
use thiserror::Error;

/// Machine sizing shared by code generation and execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub code_size: usize,
    pub memory_size: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            code_size: DEFAULT_CODE_SIZE,
            memory_size: DEFAULT_MEMORY_SIZE,
        }
    }
}

impl SessionOptions {
    pub fn with_code_size(mut self, code_size: usize) -> Self {
        self.code_size = code_size;
        self
    }

    pub fn with_memory_size(mut self, memory_size: usize) -> Self {
        self.memory_size = memory_size;
        self
    }

    fn machine(&self) -> MachineConfig {
        MachineConfig::default()
            .with_code_size(self.code_size)
            .with_memory_size(self.memory_size)
    }
}

/// Reasons a program produced no runnable code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("program rejected with {} error(s)", .errors.len())]
    Rejected { errors: Vec<CompileError> },

    #[error("program type could not be determined")]
    IncompleteProgram,

    #[error("memory of {size} cells is not addressable")]
    MemoryTooLarge { size: usize },

    #[error(transparent)]
    Assembly(#[from] AssemblyError),
}

impl BuildError {
    /// Compiler diagnostics, if the program was rejected.
    pub fn errors(&self) -> &[CompileError] {
        match self {
            BuildError::Rejected { errors } => errors,
            _ => &[],
        }
    }
}

/// Any failure of [`Session::compile_and_run`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

/// Output of a successful build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compiled {
    /// Symbolic assembly, one instruction or label per line.
    pub assembly: String,
    /// Encoded code cells.
    pub code: Vec<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    options: SessionOptions,
}

impl Session {
    pub fn new(options: SessionOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Compile and assemble a program.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn compile<'ast>(
        &self,
        arena: &'ast Bump,
        program: &Program<'ast>,
    ) -> Result<Compiled, BuildError> {
        let size = self.options.memory_size;
        let memory_size = i32::try_from(size).map_err(|_| BuildError::MemoryTooLarge { size })?;
        let result = Compiler::compile(arena, program, CodeGenOptions { memory_size });

        if !result.errors.is_empty() {
            for error in &result.errors {
                tracing::warn!(%error, "compile error");
            }
            return Err(BuildError::Rejected {
                errors: result.errors,
            });
        }
        let Some(assembly) = result.assembly else {
            return Err(BuildError::IncompleteProgram);
        };

        let assembly = assembly.to_string();
        let code = assemble(&assembly, self.options.code_size)?;
        tracing::debug!(cells = code.len(), "program assembled");
        Ok(Compiled { assembly, code })
    }

    /// Execute assembled code and collect printed values.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(&self, code: Vec<i32>) -> Result<Vec<i32>, RuntimeError> {
        let mut machine = Machine::new(code, self.options.machine())?;
        Ok(machine.run()?.to_vec())
    }

    pub fn compile_and_run<'ast>(
        &self,
        arena: &'ast Bump,
        program: &Program<'ast>,
    ) -> Result<Vec<i32>, Error> {
        let compiled = self.compile(arena, program)?;
        Ok(self.run(compiled.code)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fool_ast::AstBuilder;

    #[test]
    fn options_flow_to_machine() {
        let options = SessionOptions::default()
            .with_code_size(64)
            .with_memory_size(128);
        let config = options.machine();
        assert_eq!(config.code_size, 64);
        assert_eq!(config.memory_size, 128);
    }

    #[test]
    fn compile_returns_text_and_code() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let program = b.program(&[], b.print(b.int(7)));

        let compiled = Session::default().compile(&arena, program).unwrap();
        assert_eq!(compiled.assembly, "push 7\nprint\nhalt\n");
        assert_eq!(compiled.code.len(), 4);
    }

    #[test]
    fn code_larger_than_store_is_rejected() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let program = b.program(&[], b.print(b.int(7)));

        let session = Session::new(SessionOptions::default().with_code_size(2));
        assert!(matches!(
            session.compile(&arena, program),
            Err(BuildError::Assembly(AssemblyError::ProgramTooLarge { .. }))
        ));
    }

    #[test]
    fn unaddressable_memory_is_rejected() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let program = b.program(&[], b.print(b.int(7)));

        let size = i32::MAX as usize + 1;
        let session = Session::new(SessionOptions::default().with_memory_size(size));
        assert_eq!(
            session.compile(&arena, program),
            Err(BuildError::MemoryTooLarge { size })
        );
        assert_eq!(
            session.run(vec![]),
            Err(RuntimeError::MemoryTooLarge { size })
        );
    }

    #[test]
    fn run_checks_code_store_size() {
        let session = Session::new(SessionOptions::default().with_code_size(1));
        assert_eq!(
            session.run(vec![1, 7, 0]),
            Err(RuntimeError::CodeTooLarge {
                size: 3,
                capacity: 1
            })
        );
    }

    #[test]
    fn rejected_program_keeps_diagnostics() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let program = b.program(&[], b.print(b.id("missing")));

        let error = Session::default().compile(&arena, program).unwrap_err();
        assert_eq!(error.errors().len(), 1);
        assert!(error.errors()[0].is_link_error());
    }
}
