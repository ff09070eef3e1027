//! Programmatic construction of syntax trees.
//!
//! [`AstBuilder`] allocates every node in a caller-provided arena and stamps
//! it with the current source line. It is the entry point for front ends
//! and for tests.
//!
//! # Example
//!
//! ```
//! use bumpalo::Bump;
//! use fool_ast::{AstBuilder, Type};
//!
//! let arena = Bump::new();
//! let b = AstBuilder::new(&arena);
//! let program = b.program(
//!     &[b.var("x", Type::Int, b.int(3))],
//!     b.print(b.add(b.id("x"), b.int(4))),
//! );
//! assert_eq!(program.declarations.len(), 1);
//! ```

use std::cell::Cell;

use bumpalo::Bump;
use fool_core::Span;

use crate::{
    ArrowType, BinaryExpr, BinaryOp, BoolLit, CallExpr, ClassDecl, Decl, Expr, FieldDecl, FunDecl,
    Ident, IdentExpr, IfExpr, IntLit, MethodCallExpr, MethodDecl, NewExpr, NotExpr, Param,
    PrintExpr, Program, Type, TypeExpr, VarDecl,
};

/// Arena-backed node factory.
pub struct AstBuilder<'ast> {
    arena: &'ast Bump,
    line: Cell<u32>,
}

impl<'ast> AstBuilder<'ast> {
    pub fn new(arena: &'ast Bump) -> Self {
        Self {
            arena,
            line: Cell::new(1),
        }
    }

    /// Stamp nodes built from now on with `line`.
    pub fn at(&self, line: u32) -> &Self {
        self.line.set(line);
        self
    }

    fn span(&self) -> Span {
        Span::line(self.line.get())
    }

    fn ident(&self, name: &str) -> Ident<'ast> {
        Ident {
            name: self.arena.alloc_str(name),
            span: self.span(),
        }
    }

    fn type_expr(&self, ty: Type<'ast>) -> TypeExpr<'ast> {
        TypeExpr {
            ty,
            span: self.span(),
        }
    }

    // ========================================================================
    // Types
    // ========================================================================

    /// Reference to an instance of `class`.
    pub fn class_ref(&self, class: &str) -> Type<'ast> {
        Type::Ref(self.arena.alloc_str(class))
    }

    /// Function type `(params) -> ret`.
    pub fn arrow(&self, params: &[Type<'ast>], ret: Type<'ast>) -> Type<'ast> {
        Type::Arrow(self.arena.alloc(ArrowType {
            params: self.arena.alloc_slice_copy(params),
            ret,
        }))
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    pub fn int(&self, value: i32) -> Expr<'ast> {
        Expr::Int(IntLit {
            value,
            span: self.span(),
        })
    }

    pub fn bool(&self, value: bool) -> Expr<'ast> {
        Expr::Bool(BoolLit {
            value,
            span: self.span(),
        })
    }

    pub fn null(&self) -> Expr<'ast> {
        Expr::Null(self.span())
    }

    /// Placeholder for a subtree the front end failed to build.
    pub fn missing(&self) -> Expr<'ast> {
        Expr::Missing(self.span())
    }

    pub fn id(&self, name: &str) -> Expr<'ast> {
        Expr::Ident(self.arena.alloc(IdentExpr {
            name: self.ident(name),
            resolution: Cell::new(None),
        }))
    }

    pub fn call(&self, callee: &str, args: &[Expr<'ast>]) -> Expr<'ast> {
        Expr::Call(self.arena.alloc(CallExpr {
            callee: self.ident(callee),
            args: self.arena.alloc_slice_copy(args),
            span: self.span(),
            resolution: Cell::new(None),
        }))
    }

    pub fn method_call(&self, object: &str, method: &str, args: &[Expr<'ast>]) -> Expr<'ast> {
        Expr::MethodCall(self.arena.alloc(MethodCallExpr {
            object: self.ident(object),
            method: self.ident(method),
            args: self.arena.alloc_slice_copy(args),
            span: self.span(),
            object_resolution: Cell::new(None),
            method_binding: Cell::new(None),
        }))
    }

    pub fn new_object(&self, class: &str, args: &[Expr<'ast>]) -> Expr<'ast> {
        Expr::New(self.arena.alloc(NewExpr {
            class: self.ident(class),
            args: self.arena.alloc_slice_copy(args),
            span: self.span(),
            class_binding: Cell::new(None),
        }))
    }

    pub fn if_else(
        &self,
        cond: Expr<'ast>,
        then_branch: Expr<'ast>,
        else_branch: Expr<'ast>,
    ) -> Expr<'ast> {
        Expr::If(self.arena.alloc(IfExpr {
            cond,
            then_branch,
            else_branch,
            span: self.span(),
        }))
    }

    pub fn not(&self, operand: Expr<'ast>) -> Expr<'ast> {
        Expr::Not(self.arena.alloc(NotExpr {
            operand,
            span: self.span(),
        }))
    }

    pub fn binary(&self, op: BinaryOp, left: Expr<'ast>, right: Expr<'ast>) -> Expr<'ast> {
        Expr::Binary(self.arena.alloc(BinaryExpr {
            op,
            left,
            right,
            span: self.span(),
        }))
    }

    pub fn add(&self, left: Expr<'ast>, right: Expr<'ast>) -> Expr<'ast> {
        self.binary(BinaryOp::Add, left, right)
    }

    pub fn sub(&self, left: Expr<'ast>, right: Expr<'ast>) -> Expr<'ast> {
        self.binary(BinaryOp::Sub, left, right)
    }

    pub fn mul(&self, left: Expr<'ast>, right: Expr<'ast>) -> Expr<'ast> {
        self.binary(BinaryOp::Mul, left, right)
    }

    pub fn div(&self, left: Expr<'ast>, right: Expr<'ast>) -> Expr<'ast> {
        self.binary(BinaryOp::Div, left, right)
    }

    pub fn eq(&self, left: Expr<'ast>, right: Expr<'ast>) -> Expr<'ast> {
        self.binary(BinaryOp::Eq, left, right)
    }

    pub fn le(&self, left: Expr<'ast>, right: Expr<'ast>) -> Expr<'ast> {
        self.binary(BinaryOp::LessEq, left, right)
    }

    pub fn ge(&self, left: Expr<'ast>, right: Expr<'ast>) -> Expr<'ast> {
        self.binary(BinaryOp::GreaterEq, left, right)
    }

    pub fn and(&self, left: Expr<'ast>, right: Expr<'ast>) -> Expr<'ast> {
        self.binary(BinaryOp::And, left, right)
    }

    pub fn or(&self, left: Expr<'ast>, right: Expr<'ast>) -> Expr<'ast> {
        self.binary(BinaryOp::Or, left, right)
    }

    pub fn print(&self, arg: Expr<'ast>) -> Expr<'ast> {
        Expr::Print(self.arena.alloc(PrintExpr {
            arg,
            span: self.span(),
        }))
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    pub fn param(&self, name: &str, ty: Type<'ast>) -> Param<'ast> {
        Param {
            name: self.ident(name),
            ty: self.type_expr(ty),
            binding: Cell::new(None),
        }
    }

    pub fn var(&self, name: &str, ty: Type<'ast>, init: Expr<'ast>) -> Decl<'ast> {
        Decl::Var(self.arena.alloc(VarDecl {
            name: self.ident(name),
            ty: self.type_expr(ty),
            init,
            span: self.span(),
            binding: Cell::new(None),
        }))
    }

    pub fn fun(
        &self,
        name: &str,
        params: Vec<Param<'ast>>,
        ret: Type<'ast>,
        decls: &[Decl<'ast>],
        body: Expr<'ast>,
    ) -> Decl<'ast> {
        Decl::Fun(self.arena.alloc(FunDecl {
            name: self.ident(name),
            params: self.arena.alloc_slice_fill_iter(params),
            ret: self.type_expr(ret),
            decls: self.arena.alloc_slice_copy(decls),
            body,
            span: self.span(),
            binding: Cell::new(None),
        }))
    }

    pub fn field(&self, name: &str, ty: Type<'ast>) -> FieldDecl<'ast> {
        FieldDecl {
            name: self.ident(name),
            ty: self.type_expr(ty),
            offset: Cell::new(None),
        }
    }

    pub fn method(
        &self,
        name: &str,
        params: Vec<Param<'ast>>,
        ret: Type<'ast>,
        decls: &[Decl<'ast>],
        body: Expr<'ast>,
    ) -> MethodDecl<'ast> {
        MethodDecl {
            name: self.ident(name),
            params: self.arena.alloc_slice_fill_iter(params),
            ret: self.type_expr(ret),
            decls: self.arena.alloc_slice_copy(decls),
            body,
            span: self.span(),
            slot: Cell::new(None),
        }
    }

    pub fn class(
        &self,
        name: &str,
        superclass: Option<&str>,
        fields: Vec<FieldDecl<'ast>>,
        methods: Vec<MethodDecl<'ast>>,
    ) -> Decl<'ast> {
        Decl::Class(self.arena.alloc(ClassDecl {
            name: self.ident(name),
            superclass: superclass.map(|s| self.ident(s)),
            fields: self.arena.alloc_slice_fill_iter(fields),
            methods: self.arena.alloc_slice_fill_iter(methods),
            span: self.span(),
            binding: Cell::new(None),
            layout: Cell::new(None),
            super_layout: Cell::new(None),
        }))
    }

    pub fn program(&self, declarations: &[Decl<'ast>], body: Expr<'ast>) -> &'ast Program<'ast> {
        self.arena.alloc(Program {
            declarations: self.arena.alloc_slice_copy(declarations),
            body,
            span: Span::line(1),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn nodes_carry_current_line() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let first = b.at(3).int(1);
        let second = b.at(9).id("y");
        assert_eq!(first.span().line, 3);
        assert_eq!(second.span().line, 9);
    }

    #[test]
    fn class_keeps_member_order() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let decl = b.class(
            "Account",
            None,
            vec![b.field("balance", Type::Int), b.field("open", Type::Bool)],
            vec![b.method("get", vec![], Type::Int, &[], b.id("balance"))],
        );
        let Decl::Class(class) = decl else {
            panic!("expected a class");
        };
        let names: Vec<_> = class.fields.iter().map(|f| f.name.name).collect();
        assert_eq!(names, vec!["balance", "open"]);
        assert_eq!(class.methods[0].name.name, "get");
        assert!(class.superclass.is_none());
        assert!(class.binding.get().is_none());
    }

    #[test]
    fn arrow_type_is_arena_allocated() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let ty = b.arrow(&[Type::Int, b.class_ref("A")], Type::Bool);
        assert_eq!(ty.to_string(), "(int, A) -> bool");
    }
}
