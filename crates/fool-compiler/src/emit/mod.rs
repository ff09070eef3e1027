//! Instruction emitter for the code generator.
//!
//! The [`CodeEmitter`] keeps the main instruction stream separate from the
//! bodies of functions and methods. A body is opened with
//! [`begin_function`](CodeEmitter::begin_function), filled with the usual
//! `emit*` calls, and closed with
//! [`end_function`](CodeEmitter::end_function); closed bodies are appended
//! after the main stream by [`finish`](CodeEmitter::finish), so they are
//! only ever reached through `js`.
//!
//! # Example
//!
//! ```
//! use fool_compiler::bytecode::OpCode;
//! use fool_compiler::emit::CodeEmitter;
//!
//! let mut emitter = CodeEmitter::new();
//! emitter.emit_push(2);
//! emitter.emit_push(3);
//! emitter.emit(OpCode::Add);
//! emitter.emit(OpCode::Halt);
//!
//! assert_eq!(emitter.finish().to_string(), "push 2\npush 3\nadd\nhalt\n");
//! ```

use crate::bytecode::{AsmItem, AsmProgram, Instruction, Label, OpCode, Operand};

/// Emits symbolic instructions.
#[derive(Debug, Default)]
pub struct CodeEmitter {
    /// Main program stream
    main: Vec<AsmItem>,
    /// Bodies being generated, innermost last
    open: Vec<Vec<AsmItem>>,
    /// Finished bodies, in completion order
    functions: Vec<AsmItem>,
    label_count: usize,
    function_count: usize,
    current_line: u32,
}

impl CodeEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set current source line for debug info.
    pub fn set_line(&mut self, line: u32) {
        self.current_line = line;
    }

    fn target(&mut self) -> &mut Vec<AsmItem> {
        self.open.last_mut().unwrap_or(&mut self.main)
    }

    // ==========================================================================
    // Basic Emission
    // ==========================================================================

    /// Emit an instruction without operand.
    pub fn emit(&mut self, op: OpCode) {
        self.emit_with(op, None);
    }

    fn emit_with(&mut self, op: OpCode, operand: Option<Operand>) {
        let line = self.current_line;
        self.target()
            .push(AsmItem::Instr(Instruction { op, operand, line }));
    }

    /// Emit `op` `count` times.
    pub fn emit_repeat(&mut self, op: OpCode, count: usize) {
        for _ in 0..count {
            self.emit(op);
        }
    }

    /// Emit `push value`.
    pub fn emit_push(&mut self, value: i32) {
        self.emit_with(OpCode::Push, Some(Operand::Value(value)));
    }

    /// Emit `push label`, pushing the label's code address.
    pub fn emit_push_label(&mut self, label: &Label) {
        self.emit_with(OpCode::Push, Some(Operand::Label(label.clone())));
    }

    /// Emit a branch (`b`, `beq` or `bleq`) to `label`.
    pub fn emit_branch(&mut self, op: OpCode, label: &Label) {
        debug_assert!(matches!(
            op,
            OpCode::Branch | OpCode::BranchEq | OpCode::BranchLessEq
        ));
        self.emit_with(op, Some(Operand::Label(label.clone())));
    }

    /// Define `label` at the current position.
    pub fn place_label(&mut self, label: &Label) {
        self.target().push(AsmItem::Label(label.clone()));
    }

    // ==========================================================================
    // Labels
    // ==========================================================================

    /// A fresh label for control flow inside a body.
    pub fn fresh_label(&mut self) -> Label {
        let label = Label::new(format!("label{}", self.label_count));
        self.label_count += 1;
        label
    }

    /// A fresh label for the entry point of a function or method.
    pub fn fresh_function_label(&mut self) -> Label {
        let label = Label::new(format!("function{}", self.function_count));
        self.function_count += 1;
        label
    }

    // ==========================================================================
    // Out-of-line Bodies
    // ==========================================================================

    /// Start generating a body entered at `label`.
    pub fn begin_function(&mut self, label: &Label) {
        self.open.push(vec![AsmItem::Label(label.clone())]);
    }

    /// Close the innermost body, moving it after the main stream.
    pub fn end_function(&mut self) {
        if let Some(body) = self.open.pop() {
            self.functions.extend(body);
        }
    }

    /// The main stream followed by every finished body.
    pub fn finish(mut self) -> AsmProgram {
        while !self.open.is_empty() {
            self.end_function();
        }
        let mut items = self.main;
        items.extend(self.functions);
        AsmProgram::new(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn labels_are_unique() {
        let mut emitter = CodeEmitter::new();
        let a = emitter.fresh_label();
        let b = emitter.fresh_label();
        let f = emitter.fresh_function_label();
        assert_ne!(a, b);
        assert_eq!(a.as_str(), "label0");
        assert_eq!(f.as_str(), "function0");
    }

    #[test]
    fn bodies_follow_main_stream() {
        let mut emitter = CodeEmitter::new();
        let f = emitter.fresh_function_label();
        emitter.emit_push(0);
        emitter.begin_function(&f);
        emitter.emit(OpCode::CopyFp);
        emitter.end_function();
        emitter.emit_push_label(&f);
        emitter.emit(OpCode::Halt);

        assert_eq!(
            emitter.finish().to_string(),
            "push 0\npush function0\nhalt\nfunction0:\ncfp\n"
        );
    }

    #[test]
    fn nested_bodies_are_emitted_separately() {
        let mut emitter = CodeEmitter::new();
        let outer = emitter.fresh_function_label();
        let inner = emitter.fresh_function_label();
        emitter.begin_function(&outer);
        emitter.emit(OpCode::LoadRa);
        emitter.begin_function(&inner);
        emitter.emit(OpCode::LoadFp);
        emitter.end_function();
        emitter.emit(OpCode::JumpSubroutine);
        emitter.end_function();

        assert_eq!(
            emitter.finish().to_string(),
            "function1:\nlfp\nfunction0:\nlra\njs\n"
        );
    }

    #[test]
    fn lines_are_recorded() {
        let mut emitter = CodeEmitter::new();
        emitter.set_line(7);
        emitter.emit(OpCode::Print);
        let program = emitter.finish();
        assert_eq!(program.instructions().next().unwrap().line, 7);
        assert_eq!(program.code_size(), 1);
    }
}
