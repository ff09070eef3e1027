//! Linking Pass (Pass 1) - bind every name to its storage slot.
//!
//! This pass walks the tree once, assigning each declaration a
//! `(level, type, offset)` binding and recording on every use site the
//! binding it refers to together with the nesting level of the use.
//!
//! ## Responsibilities
//!
//! - Allocate frame offsets: parameters `1, 2, ...`, locals `-2, -3, ...`
//! - Lay out classes: field offsets below the object pointer and
//!   dispatch-table slots, extending the superclass layout
//! - Resolve identifiers, calls, method calls and `new`
//! - Report unresolved names, duplicates and invalid overrides
//!
//! ## Levels
//!
//! ```text
//! level 0   top-level let           (frame base = memory size)
//! level 1   function body           | class members (object pointer)
//! level 2   nested function body    | method body
//! ```
//!
//! Errors are collected and the walk continues; the caller decides whether
//! later passes may run.

use bumpalo::Bump;
use fool_ast::{
    ArrowType, Binding, ClassDecl, ClassType, Decl, Expr, FunDecl, Ident, MethodDecl, Param,
    Program, Resolution, Type, TypeExpr, VarDecl,
};
use fool_core::LinkError;
use rustc_hash::FxHashSet;

use crate::class_table::{ClassRegistry, MemberConflict, VirtualTable};
use crate::scope::{FIRST_PARAM_OFFSET, Scope, ScopeStack};

/// Output of the linking pass.
#[derive(Debug, Default)]
pub struct LinkOutput<'ast> {
    /// Errors encountered while linking.
    pub errors: Vec<LinkError>,
    /// Member tables of every successfully declared class.
    pub classes: ClassRegistry<'ast>,
}

impl LinkOutput<'_> {
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Pass 1: scope resolution and class layout.
pub struct LinkingPass<'ast> {
    arena: &'ast Bump,
    scopes: ScopeStack<'ast>,
    classes: ClassRegistry<'ast>,
    /// Class whose declaration is being linked; may refer to itself.
    current_class: Option<&'ast str>,
    errors: Vec<LinkError>,
}

impl<'ast> LinkingPass<'ast> {
    /// Create a new linking pass allocating types in `arena`.
    pub fn new(arena: &'ast Bump) -> Self {
        Self {
            arena,
            scopes: ScopeStack::new(),
            classes: ClassRegistry::new(),
            current_class: None,
            errors: Vec::new(),
        }
    }

    /// Run the linking pass over a program.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(mut self, program: &Program<'ast>) -> LinkOutput<'ast> {
        self.scopes.push();
        for decl in program.declarations {
            self.visit_decl(decl);
        }
        self.visit_expr(&program.body);
        self.scopes.pop();

        tracing::debug!(
            errors = self.errors.len(),
            classes = self.classes.len(),
            "linking finished"
        );
        LinkOutput {
            errors: self.errors,
            classes: self.classes,
        }
    }

    fn report(&mut self, error: LinkError) {
        tracing::warn!(%error, "link error");
        self.errors.push(error);
    }

    fn declare(&mut self, name: Ident<'ast>, binding: Binding<'ast>) -> bool {
        match self.scopes.declare(name, binding) {
            Ok(()) => true,
            Err(error) => {
                self.report(error);
                false
            }
        }
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    fn visit_decl(&mut self, decl: &Decl<'ast>) {
        match decl {
            Decl::Fun(fun) => self.visit_fun(fun),
            Decl::Var(var) => self.visit_var(var),
            Decl::Class(class) => {
                if self.scopes.level() == 0 {
                    self.visit_class(class);
                } else {
                    self.report(LinkError::NestedClass {
                        name: class.name.name.to_string(),
                        span: class.name.span,
                    });
                }
            }
        }
    }

    fn visit_fun(&mut self, fun: &FunDecl<'ast>) {
        let signature = self.signature(fun.params, fun.ret);
        let offset = self.scopes.allocate();
        let binding = Binding::new(self.scopes.level(), Type::Arrow(signature), offset);
        fun.binding.set(Some(binding));
        self.declare(fun.name, binding);

        self.visit_body(fun.params, fun.decls, &fun.body);
    }

    fn visit_var(&mut self, var: &VarDecl<'ast>) {
        self.visit_expr(&var.init);
        self.check_type(&var.ty);
        let offset = self.scopes.allocate();
        let binding = Binding::new(self.scopes.level(), var.ty.ty, offset);
        var.binding.set(Some(binding));
        self.declare(var.name, binding);
    }

    /// Open a frame for a function or method body and link its contents.
    fn visit_body(&mut self, params: &[Param<'ast>], decls: &[Decl<'ast>], body: &Expr<'ast>) {
        self.scopes.push();
        let level = self.scopes.level();
        for (index, param) in params.iter().enumerate() {
            let binding = Binding::new(level, param.ty.ty, FIRST_PARAM_OFFSET + index as i32);
            param.binding.set(Some(binding));
            self.declare(param.name, binding);
        }
        for decl in decls {
            self.visit_decl(decl);
        }
        self.visit_expr(body);
        self.scopes.pop();
    }

    /// Build the arrow type of a function or method header, checking the
    /// class references it mentions.
    fn signature(&mut self, params: &[Param<'ast>], ret: TypeExpr<'ast>) -> &'ast ArrowType<'ast> {
        for param in params {
            self.check_type(&param.ty);
        }
        self.check_type(&ret);
        let arena = self.arena;
        arena.alloc(ArrowType {
            params: arena.alloc_slice_fill_iter(params.iter().map(|p| p.ty.ty)),
            ret: ret.ty,
        })
    }

    /// Report class references to undeclared classes.
    fn check_type(&mut self, ty: &TypeExpr<'ast>) {
        self.check_type_at(ty.ty, ty);
    }

    fn check_type_at(&mut self, ty: Type<'ast>, at: &TypeExpr<'ast>) {
        match ty {
            Type::Ref(name) => {
                if self.current_class != Some(name) && !self.classes.contains(name) {
                    self.report(LinkError::UndeclaredClass {
                        name: name.to_string(),
                        span: at.span,
                    });
                }
            }
            Type::Arrow(arrow) | Type::Method(arrow) => {
                for param in arrow.params {
                    self.check_type_at(*param, at);
                }
                self.check_type_at(arrow.ret, at);
            }
            Type::Int | Type::Bool | Type::Empty | Type::Class(_) => {}
        }
    }

    // ========================================================================
    // Classes
    // ========================================================================

    fn visit_class(&mut self, class: &ClassDecl<'ast>) {
        let name = class.name.name;
        self.current_class = Some(name);

        let mut table = VirtualTable::new();
        if let Some(superclass) = class.superclass {
            match self.classes.get(superclass.name).cloned() {
                Some(parent) => {
                    table = parent;
                    if let Some(Binding {
                        ty: Type::Class(layout),
                        ..
                    }) = self.scopes.lookup_global(superclass.name)
                    {
                        class.super_layout.set(Some(layout));
                    }
                }
                None => self.report(LinkError::UndeclaredClass {
                    name: superclass.name.to_string(),
                    span: superclass.span,
                }),
            }
        }

        let mut declared: FxHashSet<&'ast str> = FxHashSet::default();
        for field in class.fields {
            self.check_type(&field.ty);
            if !declared.insert(field.name.name) {
                self.report(duplicate_member(name, field.name));
                continue;
            }
            match table.add_field(field.name.name, field.ty.ty) {
                Ok(offset) => field.offset.set(Some(offset)),
                Err(conflict) => self.report(member_conflict(name, field.name, conflict)),
            }
        }

        // Every header is registered before any body is linked.
        for method in class.methods {
            let signature = self.signature(method.params, method.ret);
            if !declared.insert(method.name.name) {
                self.report(duplicate_member(name, method.name));
                continue;
            }
            match table.add_method(method.name.name, signature) {
                Ok(slot) => method.slot.set(Some(slot)),
                Err(conflict) => self.report(member_conflict(name, method.name, conflict)),
            }
        }

        let layout = self.layout(name, &table);
        class.layout.set(Some(layout));
        let binding = Binding::new(0, Type::Class(layout), self.scopes.allocate());
        class.binding.set(Some(binding));
        let members = table.members().clone();
        if self.declare(class.name, binding) {
            self.classes.register(name, table);
        }

        self.scopes.push_scope(Scope::with_bindings(members));
        for method in class.methods {
            self.visit_method(method);
        }
        self.scopes.pop();

        tracing::debug!(
            class = name,
            fields = layout.fields.len(),
            methods = layout.methods.len(),
            "class laid out"
        );
        self.current_class = None;
    }

    fn visit_method(&mut self, method: &MethodDecl<'ast>) {
        self.visit_body(method.params, method.decls, &method.body);
    }

    fn layout(&self, name: &'ast str, table: &VirtualTable<'ast>) -> &'ast ClassType<'ast> {
        let arena = self.arena;
        arena.alloc(ClassType {
            name,
            fields: arena.alloc_slice_copy(table.fields()),
            methods: arena
                .alloc_slice_fill_iter(table.dispatch().iter().map(|slot| *slot.signature)),
        })
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn resolve(&mut self, name: Ident<'ast>) -> Option<Resolution<'ast>> {
        match self.scopes.resolve(name.name, name.span) {
            Ok(binding) => Some(Resolution {
                binding,
                use_level: self.scopes.level(),
            }),
            Err(error) => {
                self.report(error);
                None
            }
        }
    }

    fn visit_args(&mut self, args: &[Expr<'ast>]) {
        for arg in args {
            self.visit_expr(arg);
        }
    }

    fn visit_expr(&mut self, expr: &Expr<'ast>) {
        match expr {
            Expr::Int(_) | Expr::Bool(_) | Expr::Null(_) | Expr::Missing(_) => {}
            Expr::Ident(ident) => {
                ident.resolution.set(self.resolve(ident.name));
            }
            Expr::Call(call) => {
                call.resolution.set(self.resolve(call.callee));
                self.visit_args(call.args);
            }
            Expr::MethodCall(call) => {
                let object = self.resolve(call.object);
                call.object_resolution.set(object);
                if let Some(object) = object {
                    let method = self.resolve_method(call.object, call.method, object.binding.ty);
                    call.method_binding.set(method);
                }
                self.visit_args(call.args);
            }
            Expr::New(new) => {
                if self.classes.contains(new.class.name) {
                    new.class_binding
                        .set(self.scopes.lookup_global(new.class.name));
                } else {
                    self.report(LinkError::UndeclaredClass {
                        name: new.class.name.to_string(),
                        span: new.class.span,
                    });
                }
                self.visit_args(new.args);
            }
            Expr::If(e) => {
                self.visit_expr(&e.cond);
                self.visit_expr(&e.then_branch);
                self.visit_expr(&e.else_branch);
            }
            Expr::Not(e) => self.visit_expr(&e.operand),
            Expr::Binary(e) => {
                self.visit_expr(&e.left);
                self.visit_expr(&e.right);
            }
            Expr::Print(e) => self.visit_expr(&e.arg),
        }
    }

    fn resolve_method(
        &mut self,
        object: Ident<'ast>,
        method: Ident<'ast>,
        object_type: Type<'ast>,
    ) -> Option<Binding<'ast>> {
        let Some(class) = object_type.class_name() else {
            self.report(LinkError::NotAnObject {
                name: object.name.to_string(),
                span: object.span,
            });
            return None;
        };
        let found = self
            .classes
            .get(class)
            .and_then(|table| table.member(method.name))
            .filter(|binding| matches!(binding.ty, Type::Method(_)));
        if found.is_none() {
            self.report(LinkError::UnknownMethod {
                class: class.to_string(),
                name: method.name.to_string(),
                span: method.span,
            });
        }
        found
    }
}

fn duplicate_member(class: &str, member: Ident<'_>) -> LinkError {
    LinkError::DuplicateMember {
        class: class.to_string(),
        name: member.name.to_string(),
        span: member.span,
    }
}

fn member_conflict(class: &str, member: Ident<'_>, conflict: MemberConflict) -> LinkError {
    let class = class.to_string();
    let name = member.name.to_string();
    let span = member.span;
    match conflict {
        MemberConflict::FieldOverridesMethod => LinkError::FieldOverridesMethod { class, name, span },
        MemberConflict::MethodOverridesField => LinkError::MethodOverridesField { class, name, span },
    }
}
