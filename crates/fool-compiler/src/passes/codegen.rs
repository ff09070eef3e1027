//! Code Generation Pass (Pass 3) - emit stack-machine code.
//!
//! Turns a linked, type-checked tree into an [`AsmProgram`].
//!
//! ## Frames
//!
//! ```text
//!   higher addresses
//!   | control link  |  caller's fp
//!   | argument n    |
//!   | ...           |
//!   | argument 1    |  fp + 1
//!   | access link   |  fp        (frame of the declaring scope,
//!   | return addr   |  fp - 1     or the object for methods)
//!   | local 1       |  fp - 2
//!   | ...           |
//!   lower addresses
//! ```
//!
//! The top-level frame base is the memory size, with a fake return address
//! slot at offset `-1`.
//!
//! ## Objects and classes
//!
//! ```text
//! heap: [ field n | ... | field 1 | dispatch ptr ]   object ptr -> dispatch ptr
//!       [ slot 0 | slot 1 | ... ]                   class value -> slot 0
//! ```
//!
//! A field with offset `-k` lives at `object - k`; method slot `s` is at
//! `dispatch + s`. The class's top-level slot holds its dispatch pointer.

use fool_ast::{BinaryExpr, BinaryOp, ClassDecl, Decl, Expr, Param, Program, Resolution, Type};
use fool_core::{CodegenError, Span};
use rustc_hash::FxHashMap;

use crate::bytecode::{AsmProgram, Label, OpCode};
use crate::emit::CodeEmitter;
use crate::passes::TypeCheckOutput;

/// Settings shared with the machine that will run the code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeGenOptions {
    /// Size of the machine memory; the top-level frame base.
    pub memory_size: i32,
}

impl Default for CodeGenOptions {
    fn default() -> Self {
        Self {
            memory_size: 10_000,
        }
    }
}

type GenResult = Result<(), CodegenError>;

/// Pass 3: code generation.
pub struct CodeGenPass<'ast> {
    emitter: CodeEmitter,
    options: CodeGenOptions,
    /// Set while generating method bodies, where the static chain ends at
    /// an object rather than the top-level frame.
    inside_class: bool,
    /// Dispatch-table labels of every class generated so far.
    dispatch_labels: FxHashMap<&'ast str, Vec<Label>>,
}

impl<'ast> CodeGenPass<'ast> {
    pub fn new(options: CodeGenOptions) -> Self {
        Self {
            emitter: CodeEmitter::new(),
            options,
            inside_class: false,
            dispatch_labels: FxHashMap::default(),
        }
    }

    /// Generate code for a program that passed type checking.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(
        mut self,
        program: &Program<'ast>,
        types: &TypeCheckOutput<'ast>,
    ) -> Result<AsmProgram, CodegenError> {
        tracing::debug!(
            program_type = ?types.program_type.map(|ty| ty.to_string()),
            "generating code"
        );
        if program.has_declarations() {
            self.emitter.emit_push(0);
            for decl in program.declarations {
                self.gen_decl(decl)?;
            }
        }
        self.gen_expr(&program.body)?;
        self.emitter.emit(OpCode::Halt);

        let asm = self.emitter.finish();
        tracing::debug!(cells = asm.code_size(), "code generated");
        Ok(asm)
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    fn gen_decl(&mut self, decl: &Decl<'ast>) -> GenResult {
        self.emitter.set_line(decl.span().line);
        match decl {
            Decl::Var(var) => self.gen_expr(&var.init),
            Decl::Fun(fun) => {
                let label = self.emitter.fresh_function_label();
                self.gen_body(&label, fun.params, fun.decls, &fun.body)?;
                self.emitter.emit_push_label(&label);
                Ok(())
            }
            Decl::Class(class) => self.gen_class(class),
        }
    }

    /// Emit a function or method body out of line, entered at `label`.
    fn gen_body(
        &mut self,
        label: &Label,
        params: &[Param<'ast>],
        decls: &[Decl<'ast>],
        body: &Expr<'ast>,
    ) -> GenResult {
        self.emitter.begin_function(label);
        self.emitter.emit(OpCode::CopyFp);
        self.emitter.emit(OpCode::LoadRa);
        for decl in decls {
            self.gen_decl(decl)?;
        }
        self.gen_expr(body)?;

        self.emitter.emit(OpCode::StoreTm);
        self.emitter.emit_repeat(OpCode::Pop, decls.len());
        self.emitter.emit(OpCode::StoreRa);
        // access link
        self.emitter.emit(OpCode::Pop);
        self.emitter.emit_repeat(OpCode::Pop, params.len());
        self.emitter.emit(OpCode::StoreFp);
        self.emitter.emit(OpCode::LoadTm);
        self.emitter.emit(OpCode::LoadRa);
        self.emitter.emit(OpCode::JumpSubroutine);
        self.emitter.end_function();
        Ok(())
    }

    fn gen_class(&mut self, class: &ClassDecl<'ast>) -> GenResult {
        let layout = class.layout.get().ok_or_else(|| CodegenError::MissingLayout {
            name: class.name.name.to_string(),
            span: class.span,
        })?;

        let mut labels = class
            .superclass
            .and_then(|superclass| self.dispatch_labels.get(superclass.name).cloned())
            .unwrap_or_default();

        let was_inside = std::mem::replace(&mut self.inside_class, true);
        for method in class.methods {
            let slot = method.slot.get().ok_or_else(|| CodegenError::Unresolved {
                name: method.name.name.to_string(),
                span: method.span,
            })?;
            let label = self.emitter.fresh_function_label();
            self.gen_body(&label, method.params, method.decls, &method.body)?;
            if slot < labels.len() {
                labels[slot] = label;
            } else if slot == labels.len() {
                labels.push(label);
            } else {
                return Err(CodegenError::MissingLayout {
                    name: class.name.name.to_string(),
                    span: method.span,
                });
            }
        }
        self.inside_class = was_inside;

        if labels.len() != layout.methods.len() {
            return Err(CodegenError::MissingLayout {
                name: class.name.name.to_string(),
                span: class.span,
            });
        }

        self.emitter.set_line(class.span.line);
        self.emitter.emit(OpCode::LoadHp);
        for label in &labels {
            self.emitter.emit_push_label(label);
            self.store_at_hp_and_bump();
        }
        self.dispatch_labels.insert(class.name.name, labels);
        Ok(())
    }

    /// `lhp; sw; lhp; push 1; add; shp`: pop a value into the next heap cell.
    fn store_at_hp_and_bump(&mut self) {
        self.emitter.emit(OpCode::LoadHp);
        self.emitter.emit(OpCode::StoreWord);
        self.bump_hp();
    }

    fn bump_hp(&mut self) {
        self.emitter.emit(OpCode::LoadHp);
        self.emitter.emit_push(1);
        self.emitter.emit(OpCode::Add);
        self.emitter.emit(OpCode::StoreHp);
    }

    // ========================================================================
    // Addressing
    // ========================================================================

    /// Push the base address of the frame (or object) declaring the name.
    fn gen_frame(&mut self, resolution: Resolution<'ast>) {
        if self.inside_class && resolution.binding.level == 0 {
            self.emitter.emit_push(self.options.memory_size);
        } else {
            self.emitter.emit(OpCode::LoadFp);
            self.emitter
                .emit_repeat(OpCode::LoadWord, resolution.hops() as usize);
        }
    }

    /// Push the value stored at `offset` from the frame on top of the stack.
    fn gen_load(&mut self, offset: i32) {
        self.emitter.emit_push(offset);
        self.emitter.emit(OpCode::Add);
        self.emitter.emit(OpCode::LoadWord);
    }

    fn gen_args_reversed(&mut self, args: &[Expr<'ast>]) -> GenResult {
        for arg in args.iter().rev() {
            self.gen_expr(arg)?;
        }
        Ok(())
    }

    /// Duplicate the access link on top of the stack.
    fn dup_access_link(&mut self) {
        self.emitter.emit(OpCode::StoreTm);
        self.emitter.emit(OpCode::LoadTm);
        self.emitter.emit(OpCode::LoadTm);
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn gen_expr(&mut self, expr: &Expr<'ast>) -> GenResult {
        self.emitter.set_line(expr.span().line);
        match expr {
            Expr::Int(lit) => self.emitter.emit_push(lit.value),
            Expr::Bool(lit) => self.emitter.emit_push(lit.value as i32),
            Expr::Null(_) => self.emitter.emit_push(-1),
            Expr::Missing(span) => return Err(CodegenError::IncompleteTree { span: *span }),
            Expr::Ident(ident) => {
                let resolution = resolved(ident.resolution.get(), ident.name.name, ident.name.span)?;
                self.gen_frame(resolution);
                self.gen_load(resolution.binding.offset);
            }
            Expr::Call(call) => {
                let resolution = resolved(call.resolution.get(), call.callee.name, call.span)?;
                self.emitter.emit(OpCode::LoadFp);
                self.gen_args_reversed(call.args)?;
                self.gen_frame(resolution);
                self.dup_access_link();
                if matches!(resolution.binding.ty, Type::Method(_)) {
                    self.emitter.emit(OpCode::LoadWord);
                }
                self.gen_load(resolution.binding.offset);
                self.emitter.emit(OpCode::JumpSubroutine);
            }
            Expr::MethodCall(call) => {
                let object =
                    resolved(call.object_resolution.get(), call.object.name, call.object.span)?;
                let method = call
                    .method_binding
                    .get()
                    .ok_or_else(|| CodegenError::Unresolved {
                        name: call.method.name.to_string(),
                        span: call.method.span,
                    })?;
                self.emitter.emit(OpCode::LoadFp);
                self.gen_args_reversed(call.args)?;
                self.gen_frame(object);
                self.gen_load(object.binding.offset);
                self.dup_access_link();
                self.emitter.emit(OpCode::LoadWord);
                self.gen_load(method.offset);
                self.emitter.emit(OpCode::JumpSubroutine);
            }
            Expr::New(new) => {
                let class = new.class_binding.get().ok_or_else(|| CodegenError::Unresolved {
                    name: new.class.name.to_string(),
                    span: new.class.span,
                })?;
                for arg in new.args {
                    self.gen_expr(arg)?;
                }
                for _ in new.args {
                    self.store_at_hp_and_bump();
                }
                self.emitter
                    .emit_push(self.options.memory_size + class.offset);
                self.emitter.emit(OpCode::LoadWord);
                self.emitter.emit(OpCode::LoadHp);
                self.emitter.emit(OpCode::StoreWord);
                // object pointer
                self.emitter.emit(OpCode::LoadHp);
                self.bump_hp();
            }
            Expr::If(e) => {
                let then_label = self.emitter.fresh_label();
                let end_label = self.emitter.fresh_label();
                self.gen_expr(&e.cond)?;
                self.emitter.emit_push(1);
                self.emitter.emit_branch(OpCode::BranchEq, &then_label);
                self.gen_expr(&e.else_branch)?;
                self.emitter.emit_branch(OpCode::Branch, &end_label);
                self.emitter.place_label(&then_label);
                self.gen_expr(&e.then_branch)?;
                self.emitter.place_label(&end_label);
            }
            Expr::Not(e) => {
                self.gen_expr(&e.operand)?;
                self.emitter.emit_push(0);
                self.gen_select(OpCode::BranchEq, 1, 0);
            }
            Expr::Binary(e) => self.gen_binary(e)?,
            Expr::Print(e) => {
                self.gen_expr(&e.arg)?;
                self.emitter.emit(OpCode::Print);
            }
        }
        Ok(())
    }

    /// `branch T; push otherwise; b E; T: push taken; E:`
    fn gen_select(&mut self, branch: OpCode, taken: i32, otherwise: i32) {
        let taken_label = self.emitter.fresh_label();
        let end_label = self.emitter.fresh_label();
        self.emitter.emit_branch(branch, &taken_label);
        self.emitter.emit_push(otherwise);
        self.emitter.emit_branch(OpCode::Branch, &end_label);
        self.emitter.place_label(&taken_label);
        self.emitter.emit_push(taken);
        self.emitter.place_label(&end_label);
    }

    fn gen_binary(&mut self, e: &BinaryExpr<'ast>) -> GenResult {
        if e.op.is_logical() {
            return self.gen_short_circuit(e);
        }
        self.gen_expr(&e.left)?;
        self.gen_expr(&e.right)?;
        match e.op {
            BinaryOp::Add => self.emitter.emit(OpCode::Add),
            BinaryOp::Sub => self.emitter.emit(OpCode::Sub),
            BinaryOp::Mul => self.emitter.emit(OpCode::Mult),
            BinaryOp::Div => self.emitter.emit(OpCode::Div),
            BinaryOp::Eq => self.gen_select(OpCode::BranchEq, 1, 0),
            BinaryOp::LessEq => self.gen_select(OpCode::BranchLessEq, 1, 0),
            // left >= right  <=>  !(left <= right - 1)
            BinaryOp::GreaterEq => {
                self.emitter.emit_push(1);
                self.emitter.emit(OpCode::Sub);
                self.gen_select(OpCode::BranchLessEq, 0, 1);
            }
            BinaryOp::And | BinaryOp::Or => {}
        }
        Ok(())
    }

    /// `&&` jumps to false on the first `0`; `||` jumps to true on the first `1`.
    fn gen_short_circuit(&mut self, e: &BinaryExpr<'ast>) -> GenResult {
        let (decisive, otherwise) = match e.op {
            BinaryOp::And => (0, 1),
            _ => (1, 0),
        };
        let decided = self.emitter.fresh_label();
        let end_label = self.emitter.fresh_label();
        for operand in [&e.left, &e.right] {
            self.gen_expr(operand)?;
            self.emitter.emit_push(decisive);
            self.emitter.emit_branch(OpCode::BranchEq, &decided);
        }
        self.emitter.emit_push(otherwise);
        self.emitter.emit_branch(OpCode::Branch, &end_label);
        self.emitter.place_label(&decided);
        self.emitter.emit_push(decisive);
        self.emitter.place_label(&end_label);
        Ok(())
    }
}

fn resolved<'ast>(
    resolution: Option<Resolution<'ast>>,
    name: &str,
    span: Span,
) -> Result<Resolution<'ast>, CodegenError> {
    resolution.ok_or_else(|| CodegenError::Unresolved {
        name: name.to_string(),
        span,
    })
}
