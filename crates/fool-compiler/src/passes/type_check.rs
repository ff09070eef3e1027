//! Type Checking Pass (Pass 2) - compute and validate types.
//!
//! Runs over a tree the linking pass has annotated. Every expression gets a
//! type; every declaration is checked against its declared type; class
//! declarations record their inheritance edge and have their overrides
//! checked position by position against the superclass layout.
//!
//! ## Failure handling
//!
//! ```text
//! declaration error      -> recorded, sibling declarations still checked
//! program body error     -> recorded, no program type
//! missing annotation     -> Incomplete: swallowed at declaration
//! or Missing node           boundaries, never counted as a type error
//! ```

use fool_ast::{
    ArrowType, BinaryExpr, BinaryOp, ClassDecl, Decl, Expr, FunDecl, MethodDecl, Program, Type,
    VarDecl,
};
use fool_core::{Span, TypeError};

use crate::class_table::field_index;
use crate::passes::LinkOutput;
use crate::types::TypeRelations;

/// Why checking a subtree stopped.
#[derive(Debug, Clone, PartialEq)]
enum CheckError {
    /// A genuine type error.
    Type(TypeError),
    /// The subtree was not fully built or linked.
    Incomplete,
}

impl From<TypeError> for CheckError {
    fn from(error: TypeError) -> Self {
        CheckError::Type(error)
    }
}

type CheckResult<T> = Result<T, CheckError>;

/// Output of the type checking pass.
#[derive(Debug, Default)]
pub struct TypeCheckOutput<'ast> {
    /// Type of the program body, when it could be determined.
    pub program_type: Option<Type<'ast>>,
    /// Type errors, in the order they were found.
    pub errors: Vec<TypeError>,
    /// Whether some subtree was skipped because it was incomplete.
    pub incomplete: bool,
    /// Inheritance edges recorded while checking.
    pub relations: TypeRelations<'ast>,
}

impl TypeCheckOutput<'_> {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty() && self.program_type.is_some()
    }
}

/// Pass 2: type checking.
pub struct TypeCheckPass<'ast> {
    relations: TypeRelations<'ast>,
    errors: Vec<TypeError>,
    incomplete: bool,
}

impl<'ast> TypeCheckPass<'ast> {
    pub fn new() -> Self {
        Self {
            relations: TypeRelations::new(),
            errors: Vec::new(),
            incomplete: false,
        }
    }

    /// Type check a linked program.
    ///
    /// The link output is taken to make the pass order explicit: the tree
    /// must have been annotated by [`LinkingPass`](crate::passes::LinkingPass).
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(mut self, program: &Program<'ast>, link: &LinkOutput<'ast>) -> TypeCheckOutput<'ast> {
        tracing::debug!(
            declarations = program.declarations.len(),
            classes = link.classes.len(),
            "type checking"
        );
        for decl in program.declarations {
            self.check_isolated(decl);
        }
        let program_type = match self.check_expr(&program.body) {
            Ok(ty) => Some(ty),
            Err(error) => {
                self.record(error);
                None
            }
        };
        tracing::debug!(
            program_type = ?program_type.map(|ty| ty.to_string()),
            errors = self.errors.len(),
            "type checking finished"
        );
        TypeCheckOutput {
            program_type,
            errors: self.errors,
            incomplete: self.incomplete,
            relations: self.relations,
        }
    }

    fn record(&mut self, error: CheckError) {
        match error {
            CheckError::Type(error) => {
                tracing::warn!(%error, "type error");
                self.errors.push(error);
            }
            CheckError::Incomplete => self.incomplete = true,
        }
    }

    /// Check one declaration, recording its failure without propagating it.
    fn check_isolated(&mut self, decl: &Decl<'ast>) {
        if let Err(error) = self.check_decl(decl) {
            self.record(error);
        }
    }

    fn expect_subtype(
        &self,
        found: Type<'ast>,
        expected: Type<'ast>,
        error: impl FnOnce() -> TypeError,
    ) -> CheckResult<()> {
        if self.relations.is_subtype(found, expected) {
            Ok(())
        } else {
            Err(error().into())
        }
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    fn check_decl(&mut self, decl: &Decl<'ast>) -> CheckResult<()> {
        match decl {
            Decl::Fun(fun) => self.check_fun(fun),
            Decl::Var(var) => self.check_var(var),
            Decl::Class(class) => {
                self.check_class(class);
                Ok(())
            }
        }
    }

    fn check_fun(&mut self, fun: &FunDecl<'ast>) -> CheckResult<()> {
        self.check_body(fun.name.name, fun.decls, &fun.body, fun.ret.ty, fun.span)
    }

    fn check_body(
        &mut self,
        name: &str,
        decls: &[Decl<'ast>],
        body: &Expr<'ast>,
        ret: Type<'ast>,
        span: Span,
    ) -> CheckResult<()> {
        for decl in decls {
            self.check_isolated(decl);
        }
        let found = self.check_expr(body)?;
        self.expect_subtype(found, ret, || TypeError::WrongReturnType {
            name: name.to_string(),
            expected: ret.to_string(),
            found: found.to_string(),
            span,
        })
    }

    fn check_var(&mut self, var: &VarDecl<'ast>) -> CheckResult<()> {
        let found = self.check_expr(&var.init)?;
        let expected = var.ty.ty;
        self.expect_subtype(found, expected, || TypeError::IncompatibleValue {
            name: var.name.name.to_string(),
            expected: expected.to_string(),
            found: found.to_string(),
            span: var.span,
        })
    }

    fn check_method(&mut self, method: &MethodDecl<'ast>) -> CheckResult<()> {
        self.check_body(
            method.name.name,
            method.decls,
            &method.body,
            method.ret.ty,
            method.span,
        )
    }

    fn check_class(&mut self, class: &ClassDecl<'ast>) {
        let name = class.name.name;
        if let Some(superclass) = class.superclass {
            self.relations.declare_subclass(name, superclass.name);
        }

        for method in class.methods {
            if let Err(error) = self.check_method(method) {
                self.record(error);
            }
        }

        let (Some(layout), Some(parent)) = (class.layout.get(), class.super_layout.get()) else {
            return;
        };

        for field in class.fields {
            let Some(offset) = field.offset.get() else {
                continue;
            };
            let Some(inherited) = parent.fields.get(field_index(offset)) else {
                continue;
            };
            if !self.relations.is_subtype(field.ty.ty, *inherited) {
                self.record(
                    TypeError::WrongFieldOverride {
                        class: name.to_string(),
                        field: field.name.name.to_string(),
                        span: field.name.span,
                    }
                    .into(),
                );
            }
        }

        for method in class.methods {
            let Some(slot) = method.slot.get() else {
                continue;
            };
            let (Some(own), Some(inherited)) = (layout.methods.get(slot), parent.methods.get(slot))
            else {
                continue;
            };
            if !self.relations.is_subtype(Type::Arrow(own), Type::Arrow(inherited)) {
                self.record(
                    TypeError::WrongMethodOverride {
                        class: name.to_string(),
                        method: method.name.name.to_string(),
                        span: method.span,
                    }
                    .into(),
                );
            }
        }
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn check_expr(&mut self, expr: &Expr<'ast>) -> CheckResult<Type<'ast>> {
        match expr {
            Expr::Int(_) => Ok(Type::Int),
            Expr::Bool(_) => Ok(Type::Bool),
            Expr::Null(_) => Ok(Type::Empty),
            Expr::Missing(_) => Err(CheckError::Incomplete),
            Expr::Ident(ident) => {
                let resolution = ident.resolution.get().ok_or(CheckError::Incomplete)?;
                let ty = resolution.binding.ty;
                if ty.is_callable() {
                    return Err(TypeError::FunctionUsedAsValue {
                        name: ident.name.name.to_string(),
                        span: ident.name.span,
                    }
                    .into());
                }
                if let Type::Class(class) = ty {
                    return Err(TypeError::ClassUsedAsValue {
                        name: class.name.to_string(),
                        span: ident.name.span,
                    }
                    .into());
                }
                Ok(ty)
            }
            Expr::Call(call) => {
                let resolution = call.resolution.get().ok_or(CheckError::Incomplete)?;
                let signature = resolution.binding.ty.signature().ok_or_else(|| {
                    TypeError::NotCallable {
                        name: call.callee.name.to_string(),
                        span: call.span,
                    }
                })?;
                self.check_args(call.callee.name, signature, call.args, call.span)
            }
            Expr::MethodCall(call) => {
                let binding = call.method_binding.get().ok_or(CheckError::Incomplete)?;
                let signature = binding.ty.signature().ok_or_else(|| TypeError::NotCallable {
                    name: call.method.name.to_string(),
                    span: call.span,
                })?;
                self.check_args(call.method.name, signature, call.args, call.span)
            }
            Expr::New(new) => {
                let binding = new.class_binding.get().ok_or(CheckError::Incomplete)?;
                let Type::Class(class) = binding.ty else {
                    return Err(TypeError::NotAConstructor {
                        name: new.class.name.to_string(),
                        span: new.span,
                    }
                    .into());
                };
                if new.args.len() != class.fields.len() {
                    return Err(TypeError::ConstructorArity {
                        class: class.name.to_string(),
                        expected: class.fields.len(),
                        found: new.args.len(),
                        span: new.span,
                    }
                    .into());
                }
                for (index, (arg, field)) in new.args.iter().zip(class.fields).enumerate() {
                    let found = self.check_expr(arg)?;
                    self.expect_subtype(found, *field, || TypeError::ConstructorArgument {
                        class: class.name.to_string(),
                        index: index + 1,
                        expected: field.to_string(),
                        found: found.to_string(),
                        span: arg.span(),
                    })?;
                }
                Ok(Type::Ref(class.name))
            }
            Expr::If(e) => {
                let cond = self.check_expr(&e.cond)?;
                self.expect_subtype(cond, Type::Bool, || TypeError::NonBooleanCondition {
                    found: cond.to_string(),
                    span: e.cond.span(),
                })?;
                let then_ty = self.check_expr(&e.then_branch)?;
                let else_ty = self.check_expr(&e.else_branch)?;
                self.relations
                    .lowest_common_ancestor(then_ty, else_ty)
                    .ok_or_else(|| {
                        TypeError::IncompatibleBranches {
                            then_ty: then_ty.to_string(),
                            else_ty: else_ty.to_string(),
                            span: e.span,
                        }
                        .into()
                    })
            }
            Expr::Not(e) => {
                let operand = self.check_expr(&e.operand)?;
                self.expect_subtype(operand, Type::Bool, || TypeError::NonBooleanOperands {
                    op: "!",
                    span: e.span,
                })?;
                Ok(Type::Bool)
            }
            Expr::Binary(e) => self.check_binary(e),
            Expr::Print(e) => self.check_expr(&e.arg),
        }
    }

    fn check_args(
        &mut self,
        name: &str,
        signature: &ArrowType<'ast>,
        args: &[Expr<'ast>],
        span: Span,
    ) -> CheckResult<Type<'ast>> {
        if args.len() != signature.arity() {
            return Err(TypeError::ArityMismatch {
                name: name.to_string(),
                expected: signature.arity(),
                found: args.len(),
                span,
            }
            .into());
        }
        for (index, (arg, param)) in args.iter().zip(signature.params).enumerate() {
            let found = self.check_expr(arg)?;
            self.expect_subtype(found, *param, || TypeError::ArgumentType {
                name: name.to_string(),
                index: index + 1,
                expected: param.to_string(),
                found: found.to_string(),
                span: arg.span(),
            })?;
        }
        Ok(signature.ret)
    }

    fn check_binary(&mut self, e: &BinaryExpr<'ast>) -> CheckResult<Type<'ast>> {
        let left = self.check_expr(&e.left)?;
        let right = self.check_expr(&e.right)?;
        let op = e.op.symbol();
        let both = |expected: Type<'ast>| {
            self.relations.is_subtype(left, expected) && self.relations.is_subtype(right, expected)
        };
        match e.op {
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
                if both(Type::Int) {
                    Ok(Type::Int)
                } else {
                    Err(TypeError::NonIntegerOperands { op, span: e.span }.into())
                }
            }
            BinaryOp::LessEq | BinaryOp::GreaterEq => {
                if both(Type::Int) {
                    Ok(Type::Bool)
                } else {
                    Err(TypeError::NonIntegerOperands { op, span: e.span }.into())
                }
            }
            BinaryOp::And | BinaryOp::Or => {
                if both(Type::Bool) {
                    Ok(Type::Bool)
                } else {
                    Err(TypeError::NonBooleanOperands { op, span: e.span }.into())
                }
            }
            BinaryOp::Eq => {
                if self.relations.is_subtype(left, right) || self.relations.is_subtype(right, left)
                {
                    Ok(Type::Bool)
                } else {
                    Err(TypeError::IncompatibleEquality {
                        left: left.to_string(),
                        right: right.to_string(),
                        span: e.span,
                    }
                    .into())
                }
            }
        }
    }
}

impl Default for TypeCheckPass<'_> {
    fn default() -> Self {
        Self::new()
    }
}
