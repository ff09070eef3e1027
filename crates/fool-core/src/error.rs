//! Error types for every phase of the FOOL pipeline.
//!
//! ## Error Hierarchy
//!
//! ```text
//! CompileError (wrapper for the static passes)
//! ├── LinkError      - scope resolution and class layout
//! ├── TypeError      - type checking
//! └── CodegenError   - code generation over an unannotated tree
//! AssemblyError      - label resolution of the textual instruction stream
//! RuntimeError       - faults raised by the stack machine
//! ```
//!
//! Link and type errors are collected by their passes and do not stop the
//! traversal; the caller decides whether to continue to code generation.
//! Runtime errors end the run that raised them.

use thiserror::Error;

use crate::Span;

// ============================================================================
// Link Errors
// ============================================================================

/// Errors reported while binding identifiers and laying out classes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    #[error("at {span}: identifier `{name}` is not declared")]
    UnresolvedIdentifier { name: String, span: Span },

    #[error("at {span}: `{name}` is already declared in this scope")]
    DuplicateDeclaration { name: String, span: Span },

    #[error("at {span}: member `{name}` is declared twice in class `{class}`")]
    DuplicateMember {
        class: String,
        name: String,
        span: Span,
    },

    #[error("at {span}: field `{name}` in class `{class}` cannot override a method")]
    FieldOverridesMethod {
        class: String,
        name: String,
        span: Span,
    },

    #[error("at {span}: method `{name}` in class `{class}` cannot override a field")]
    MethodOverridesField {
        class: String,
        name: String,
        span: Span,
    },

    #[error("at {span}: class `{name}` is not declared")]
    UndeclaredClass { name: String, span: Span },

    #[error("at {span}: `{name}` is not an object reference")]
    NotAnObject { name: String, span: Span },

    #[error("at {span}: class `{class}` has no method `{name}`")]
    UnknownMethod {
        class: String,
        name: String,
        span: Span,
    },

    #[error("at {span}: class `{name}` must be declared at top level")]
    NestedClass { name: String, span: Span },
}

impl LinkError {
    /// Get the span where this error occurred.
    pub fn span(&self) -> Span {
        match self {
            LinkError::UnresolvedIdentifier { span, .. }
            | LinkError::DuplicateDeclaration { span, .. }
            | LinkError::DuplicateMember { span, .. }
            | LinkError::FieldOverridesMethod { span, .. }
            | LinkError::MethodOverridesField { span, .. }
            | LinkError::UndeclaredClass { span, .. }
            | LinkError::NotAnObject { span, .. }
            | LinkError::UnknownMethod { span, .. }
            | LinkError::NestedClass { span, .. } => *span,
        }
    }
}

// ============================================================================
// Type Errors
// ============================================================================

/// Errors reported by the type checker.
///
/// Types are rendered to text when the error is built so this crate does
/// not depend on the syntax tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    #[error("at {span}: `{name}` returns {found} but is declared to return {expected}")]
    WrongReturnType {
        name: String,
        expected: String,
        found: String,
        span: Span,
    },

    #[error("at {span}: `{name}` is declared {expected} but initialized with {found}")]
    IncompatibleValue {
        name: String,
        expected: String,
        found: String,
        span: Span,
    },

    #[error("at {span}: condition has type {found}, expected bool")]
    NonBooleanCondition { found: String, span: Span },

    #[error("at {span}: branches have incompatible types {then_ty} and {else_ty}")]
    IncompatibleBranches {
        then_ty: String,
        else_ty: String,
        span: Span,
    },

    #[error("at {span}: cannot compare {left} with {right}")]
    IncompatibleEquality {
        left: String,
        right: String,
        span: Span,
    },

    #[error("at {span}: operands of `{op}` must be int")]
    NonIntegerOperands { op: &'static str, span: Span },

    #[error("at {span}: operands of `{op}` must be bool")]
    NonBooleanOperands { op: &'static str, span: Span },

    #[error("at {span}: `{name}` is not a function")]
    NotCallable { name: String, span: Span },

    #[error("at {span}: `{name}` expects {expected} argument(s), got {found}")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
        span: Span,
    },

    #[error("at {span}: argument {index} of `{name}` has type {found}, expected {expected}")]
    ArgumentType {
        name: String,
        index: usize,
        expected: String,
        found: String,
        span: Span,
    },

    #[error("at {span}: `{name}` is not a class")]
    NotAConstructor { name: String, span: Span },

    #[error("at {span}: `new {class}` expects {expected} argument(s), got {found}")]
    ConstructorArity {
        class: String,
        expected: usize,
        found: usize,
        span: Span,
    },

    #[error("at {span}: argument {index} of `new {class}` has type {found}, expected {expected}")]
    ConstructorArgument {
        class: String,
        index: usize,
        expected: String,
        found: String,
        span: Span,
    },

    #[error("at {span}: function `{name}` cannot be used as a value")]
    FunctionUsedAsValue { name: String, span: Span },

    #[error("at {span}: class `{name}` cannot be used as a value")]
    ClassUsedAsValue { name: String, span: Span },

    #[error("at {span}: field `{field}` in class `{class}` is not a subtype of the inherited field")]
    WrongFieldOverride {
        class: String,
        field: String,
        span: Span,
    },

    #[error("at {span}: method `{method}` in class `{class}` is not a subtype of the inherited method")]
    WrongMethodOverride {
        class: String,
        method: String,
        span: Span,
    },
}

impl TypeError {
    /// Get the span where this error occurred.
    pub fn span(&self) -> Span {
        match self {
            TypeError::WrongReturnType { span, .. }
            | TypeError::IncompatibleValue { span, .. }
            | TypeError::NonBooleanCondition { span, .. }
            | TypeError::IncompatibleBranches { span, .. }
            | TypeError::IncompatibleEquality { span, .. }
            | TypeError::NonIntegerOperands { span, .. }
            | TypeError::NonBooleanOperands { span, .. }
            | TypeError::NotCallable { span, .. }
            | TypeError::ArityMismatch { span, .. }
            | TypeError::ArgumentType { span, .. }
            | TypeError::NotAConstructor { span, .. }
            | TypeError::ConstructorArity { span, .. }
            | TypeError::ConstructorArgument { span, .. }
            | TypeError::FunctionUsedAsValue { span, .. }
            | TypeError::ClassUsedAsValue { span, .. }
            | TypeError::WrongFieldOverride { span, .. }
            | TypeError::WrongMethodOverride { span, .. } => *span,
        }
    }
}

// ============================================================================
// Code Generation Errors
// ============================================================================

/// Errors from generating code for a tree the earlier passes did not
/// fully annotate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodegenError {
    #[error("at {span}: `{name}` has no resolved binding")]
    Unresolved { name: String, span: Span },

    #[error("at {span}: class `{name}` has no computed layout")]
    MissingLayout { name: String, span: Span },

    #[error("at {span}: syntax tree is incomplete")]
    IncompleteTree { span: Span },
}

// ============================================================================
// Assembly Errors
// ============================================================================

/// Errors from turning the textual instruction stream into machine code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblyError {
    #[error("line {line}: unknown instruction `{mnemonic}`")]
    UnknownMnemonic { line: usize, mnemonic: String },

    #[error("line {line}: `{mnemonic}` requires an operand")]
    MissingOperand { line: usize, mnemonic: String },

    #[error("line {line}: `{mnemonic}` takes no operand")]
    UnexpectedOperand { line: usize, mnemonic: String },

    #[error("line {line}: invalid operand `{operand}`")]
    InvalidOperand { line: usize, operand: String },

    #[error("label `{label}` is never defined")]
    UndefinedLabel { label: String },

    #[error("line {line}: label `{label}` is defined twice")]
    DuplicateLabel { line: usize, label: String },

    #[error("program needs {size} code cells but the code store holds {capacity}")]
    ProgramTooLarge { size: usize, capacity: usize },
}

// ============================================================================
// Runtime Errors
// ============================================================================

/// Faults raised by the stack machine. Each one ends the run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error("memory address {address} out of bounds (ip {ip})")]
    MemoryOutOfBounds { address: i32, ip: usize },

    #[error("code address {address} out of bounds (ip {ip})")]
    CodeOutOfBounds { address: i32, ip: usize },

    #[error("invalid opcode {code} (ip {ip})")]
    InvalidOpcode { code: i32, ip: usize },

    #[error("division by zero (ip {ip})")]
    DivisionByZero { ip: usize },

    #[error("program has {size} code cells but the code store holds {capacity}")]
    CodeTooLarge { size: usize, capacity: usize },

    #[error("memory of {size} cells is not addressable")]
    MemoryTooLarge { size: usize },
}

// ============================================================================
// Unified Error
// ============================================================================

/// Any error reported by one of the static passes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error(transparent)]
    Link(#[from] LinkError),

    #[error(transparent)]
    Type(#[from] TypeError),

    #[error(transparent)]
    Codegen(#[from] CodegenError),
}

impl CompileError {
    /// Check if this is a link error.
    pub fn is_link_error(&self) -> bool {
        matches!(self, CompileError::Link(_))
    }

    /// Check if this is a type error.
    pub fn is_type_error(&self) -> bool {
        matches!(self, CompileError::Type(_))
    }

    pub fn span(&self) -> Span {
        match self {
            CompileError::Link(e) => e.span(),
            CompileError::Type(e) => e.span(),
            CompileError::Codegen(
                CodegenError::Unresolved { span, .. }
                | CodegenError::MissingLayout { span, .. }
                | CodegenError::IncompleteTree { span },
            ) => *span,
        }
    }
}
