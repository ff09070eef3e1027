//! Type relations used by the type checker.

mod relations;

pub use relations::TypeRelations;
