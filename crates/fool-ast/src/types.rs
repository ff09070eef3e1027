//! Types of the FOOL language.
//!
//! Types are small `Copy` values; compound types point into the same arena
//! as the syntax tree so the passes can hand them around freely.
//!
//! - `int`, `bool`: primitive values. `bool` is a subtype of `int`.
//! - `null`: the type of the `null` literal, a subtype of every class
//!   reference.
//! - `Ref(C)`: a reference to an instance of class `C`.
//! - `Arrow`: a function signature.
//! - `Method`: a method signature, an arrow bound inside a class.
//! - `Class`: the layout of a class (field types and method signatures),
//!   the type of a class name itself.

use std::fmt;

use fool_core::Span;

/// A FOOL type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type<'ast> {
    Int,
    Bool,
    /// The type of `null`.
    Empty,
    /// Reference to an instance of the named class.
    Ref(&'ast str),
    /// Function signature.
    Arrow(&'ast ArrowType<'ast>),
    /// Method signature.
    Method(&'ast ArrowType<'ast>),
    /// Class layout.
    Class(&'ast ClassType<'ast>),
}

impl<'ast> Type<'ast> {
    /// The signature of something callable: a function or a method.
    #[inline]
    pub fn signature(&self) -> Option<&'ast ArrowType<'ast>> {
        match *self {
            Type::Arrow(arrow) | Type::Method(arrow) => Some(arrow),
            _ => None,
        }
    }

    /// The class name if this is an object reference.
    #[inline]
    pub fn class_name(&self) -> Option<&'ast str> {
        match *self {
            Type::Ref(name) => Some(name),
            _ => None,
        }
    }

    #[inline]
    pub fn is_callable(&self) -> bool {
        self.signature().is_some()
    }
}

/// A function or method signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrowType<'ast> {
    pub params: &'ast [Type<'ast>],
    pub ret: Type<'ast>,
}

impl ArrowType<'_> {
    #[inline]
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// The layout of a class.
///
/// `fields[i]` is the field stored at object offset `-(i + 1)`;
/// `methods[s]` is the signature bound to dispatch slot `s`. Both include
/// everything inherited from the superclass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassType<'ast> {
    pub name: &'ast str,
    pub fields: &'ast [Type<'ast>],
    pub methods: &'ast [ArrowType<'ast>],
}

impl fmt::Display for Type<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => f.write_str("int"),
            Type::Bool => f.write_str("bool"),
            Type::Empty => f.write_str("null"),
            Type::Ref(name) => f.write_str(name),
            Type::Arrow(arrow) => write!(f, "{arrow}"),
            Type::Method(arrow) => write!(f, "method {arrow}"),
            Type::Class(class) => write!(f, "class {}", class.name),
        }
    }
}

impl fmt::Display for ArrowType<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{param}")?;
        }
        write!(f, ") -> {}", self.ret)
    }
}

/// A type written in the source, with its position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeExpr<'ast> {
    pub ty: Type<'ast>,
    pub span: Span,
}
