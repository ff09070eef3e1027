//! Assembler and interpreter for the FOOL stack machine.
//!
//! ```
//! use fool_vm::{Machine, MachineConfig, assemble};
//!
//! let config = MachineConfig::default();
//! let code = assemble("push 10\npush 10\nbleq yes\npush 0\nb end\nyes:\npush 1\nend:\nprint\nhalt\n", config.code_size)?;
//! let mut machine = Machine::new(code, config)?;
//! assert_eq!(machine.run()?, &[1]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod assembler;
mod config;
mod machine;

pub use assembler::assemble;
pub use config::{DEFAULT_CODE_SIZE, DEFAULT_MEMORY_SIZE, MachineConfig};
pub use machine::Machine;
