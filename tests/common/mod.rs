//! Shared helpers for the pipeline tests.

use bumpalo::Bump;
use fool::ast::Program;
use fool::{Error, Session};

/// Initialize a tracing subscriber for tests, honouring `RUST_LOG`.
pub fn init_test_logging() {
    use tracing_subscriber::{EnvFilter, fmt};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Compile and run a program on a default session.
pub fn run<'ast>(arena: &'ast Bump, program: &Program<'ast>) -> Result<Vec<i32>, Error> {
    init_test_logging();
    Session::default().compile_and_run(arena, program)
}

/// Compile and run a program that must succeed.
pub fn output<'ast>(arena: &'ast Bump, program: &Program<'ast>) -> Vec<i32> {
    run(arena, program).unwrap_or_else(|error| panic!("program failed: {error}"))
}
