//! Syntax tree for FOOL programs.
//!
//! The tree is allocated in a [`bumpalo::Bump`] arena and shared by every
//! compiler pass. Passes do not rebuild it: the linker records its results
//! in the `Cell` annotations on declaration and use sites, and the type
//! checker and code generator read them back.
//!
//! - [`Type`] and friends - the type language
//! - [`Expr`] - expressions
//! - [`Decl`] and [`Program`] - declarations and the root
//! - [`Binding`] and [`Resolution`] - resolved storage locations
//! - [`AstBuilder`] - node construction

mod binding;
mod builder;
pub mod decl;
pub mod expr;
pub mod types;

pub use binding::{Binding, Resolution};
pub use builder::AstBuilder;
pub use decl::*;
pub use expr::*;
pub use types::*;
