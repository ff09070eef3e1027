//! Expression nodes.
//!
//! Every FOOL program body is a single expression. Nodes that refer to a
//! declaration carry an annotation cell that the linker fills in; later
//! passes read it back.

use std::cell::Cell;

use fool_core::Span;

use crate::{Binding, Resolution};

/// An identifier with its source position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ident<'ast> {
    pub name: &'ast str,
    pub span: Span,
}

/// An expression.
#[derive(Debug, Clone, Copy)]
pub enum Expr<'ast> {
    /// Integer literal
    Int(IntLit),
    /// Boolean literal
    Bool(BoolLit),
    /// The `null` reference
    Null(Span),
    /// A subtree the front end could not produce
    Missing(Span),
    /// Reference to a variable or parameter
    Ident(&'ast IdentExpr<'ast>),
    /// Function call, or method call on the enclosing object
    Call(&'ast CallExpr<'ast>),
    /// `obj.m(args)`
    MethodCall(&'ast MethodCallExpr<'ast>),
    /// `new C(args)`
    New(&'ast NewExpr<'ast>),
    /// `if c then { a } else { b }`
    If(&'ast IfExpr<'ast>),
    /// `!e`
    Not(&'ast NotExpr<'ast>),
    /// Arithmetic, comparison and logical operators
    Binary(&'ast BinaryExpr<'ast>),
    /// `print(e)`
    Print(&'ast PrintExpr<'ast>),
}

impl<'ast> Expr<'ast> {
    /// Get the span of this expression.
    pub fn span(&self) -> Span {
        match self {
            Self::Int(e) => e.span,
            Self::Bool(e) => e.span,
            Self::Null(span) | Self::Missing(span) => *span,
            Self::Ident(e) => e.name.span,
            Self::Call(e) => e.span,
            Self::MethodCall(e) => e.span,
            Self::New(e) => e.span,
            Self::If(e) => e.span,
            Self::Not(e) => e.span,
            Self::Binary(e) => e.span,
            Self::Print(e) => e.span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntLit {
    pub value: i32,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoolLit {
    pub value: bool,
    pub span: Span,
}

/// A variable, parameter, or field read.
#[derive(Debug)]
pub struct IdentExpr<'ast> {
    pub name: Ident<'ast>,
    pub resolution: Cell<Option<Resolution<'ast>>>,
}

/// `f(args)`.
///
/// Inside a class body `f` may name a method of the enclosing class, in
/// which case the callee binding has a method type.
#[derive(Debug)]
pub struct CallExpr<'ast> {
    pub callee: Ident<'ast>,
    pub args: &'ast [Expr<'ast>],
    pub span: Span,
    pub resolution: Cell<Option<Resolution<'ast>>>,
}

/// `object.method(args)`.
#[derive(Debug)]
pub struct MethodCallExpr<'ast> {
    pub object: Ident<'ast>,
    pub method: Ident<'ast>,
    pub args: &'ast [Expr<'ast>],
    pub span: Span,
    pub object_resolution: Cell<Option<Resolution<'ast>>>,
    /// The method's entry in the object's class: its signature and slot.
    pub method_binding: Cell<Option<Binding<'ast>>>,
}

/// `new Class(args)`; one argument per field, in field order.
#[derive(Debug)]
pub struct NewExpr<'ast> {
    pub class: Ident<'ast>,
    pub args: &'ast [Expr<'ast>],
    pub span: Span,
    pub class_binding: Cell<Option<Binding<'ast>>>,
}

#[derive(Debug)]
pub struct IfExpr<'ast> {
    pub cond: Expr<'ast>,
    pub then_branch: Expr<'ast>,
    pub else_branch: Expr<'ast>,
    pub span: Span,
}

#[derive(Debug)]
pub struct NotExpr<'ast> {
    pub operand: Expr<'ast>,
    pub span: Span,
}

#[derive(Debug)]
pub struct BinaryExpr<'ast> {
    pub op: BinaryOp,
    pub left: Expr<'ast>,
    pub right: Expr<'ast>,
    pub span: Span,
}

#[derive(Debug)]
pub struct PrintExpr<'ast> {
    pub arg: Expr<'ast>,
    pub span: Span,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    LessEq,
    GreaterEq,
    And,
    Or,
}

impl BinaryOp {
    /// The operator as written in source.
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Eq => "==",
            BinaryOp::LessEq => "<=",
            BinaryOp::GreaterEq => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    #[inline]
    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div
        )
    }

    #[inline]
    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}
