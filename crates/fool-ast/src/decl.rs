//! Declarations and the program root.

use std::cell::Cell;

use fool_core::Span;

use crate::{Binding, ClassType, Expr, Ident, TypeExpr};

/// A declaration in a `let` block.
#[derive(Debug, Clone, Copy)]
pub enum Decl<'ast> {
    Fun(&'ast FunDecl<'ast>),
    Var(&'ast VarDecl<'ast>),
    Class(&'ast ClassDecl<'ast>),
}

impl<'ast> Decl<'ast> {
    pub fn name(&self) -> Ident<'ast> {
        match self {
            Decl::Fun(d) => d.name,
            Decl::Var(d) => d.name,
            Decl::Class(d) => d.name,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Decl::Fun(d) => d.span,
            Decl::Var(d) => d.span,
            Decl::Class(d) => d.span,
        }
    }

    /// The slot assigned by the linker.
    pub fn binding(&self) -> Option<Binding<'ast>> {
        match self {
            Decl::Fun(d) => d.binding.get(),
            Decl::Var(d) => d.binding.get(),
            Decl::Class(d) => d.binding.get(),
        }
    }
}

/// A function or method parameter.
#[derive(Debug)]
pub struct Param<'ast> {
    pub name: Ident<'ast>,
    pub ty: TypeExpr<'ast>,
    pub binding: Cell<Option<Binding<'ast>>>,
}

/// `fun name:ret (params) (let decls in)? body`.
#[derive(Debug)]
pub struct FunDecl<'ast> {
    pub name: Ident<'ast>,
    pub params: &'ast [Param<'ast>],
    pub ret: TypeExpr<'ast>,
    pub decls: &'ast [Decl<'ast>],
    pub body: Expr<'ast>,
    pub span: Span,
    pub binding: Cell<Option<Binding<'ast>>>,
}

/// `var name:ty = init`.
#[derive(Debug)]
pub struct VarDecl<'ast> {
    pub name: Ident<'ast>,
    pub ty: TypeExpr<'ast>,
    pub init: Expr<'ast>,
    pub span: Span,
    pub binding: Cell<Option<Binding<'ast>>>,
}

/// A class field, initialized by the matching `new` argument.
#[derive(Debug)]
pub struct FieldDecl<'ast> {
    pub name: Ident<'ast>,
    pub ty: TypeExpr<'ast>,
    /// Offset below the object pointer, negative.
    pub offset: Cell<Option<i32>>,
}

/// A method of a class. Same shape as a function, bound to a dispatch slot.
#[derive(Debug)]
pub struct MethodDecl<'ast> {
    pub name: Ident<'ast>,
    pub params: &'ast [Param<'ast>],
    pub ret: TypeExpr<'ast>,
    pub decls: &'ast [Decl<'ast>],
    pub body: Expr<'ast>,
    pub span: Span,
    pub slot: Cell<Option<usize>>,
}

/// `class Name (extends Super)? (fields) { methods }`.
#[derive(Debug)]
pub struct ClassDecl<'ast> {
    pub name: Ident<'ast>,
    pub superclass: Option<Ident<'ast>>,
    pub fields: &'ast [FieldDecl<'ast>],
    pub methods: &'ast [MethodDecl<'ast>],
    pub span: Span,
    pub binding: Cell<Option<Binding<'ast>>>,
    /// Complete layout including inherited members.
    pub layout: Cell<Option<&'ast ClassType<'ast>>>,
    /// Layout of the superclass at the point of declaration.
    pub super_layout: Cell<Option<&'ast ClassType<'ast>>>,
}

/// A whole program: an optional `let` block followed by one expression.
#[derive(Debug)]
pub struct Program<'ast> {
    pub declarations: &'ast [Decl<'ast>],
    pub body: Expr<'ast>,
    pub span: Span,
}

impl Program<'_> {
    /// Whether the program has a `let ... in` block.
    #[inline]
    pub fn has_declarations(&self) -> bool {
        !self.declarations.is_empty()
    }
}
