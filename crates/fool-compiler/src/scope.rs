//! Lexical scopes for the linker.
//!
//! One [`Scope`] per lexical region: the top-level `let`, each function or
//! method body, and each class body (its member table). The index of a
//! scope in the stack is its nesting level.

use fool_ast::{Binding, Ident};
use fool_core::{LinkError, Span};
use rustc_hash::FxHashMap;

/// Offset of the first local in a frame: `0` holds the access link and
/// `-1` the saved return address.
pub const FIRST_LOCAL_OFFSET: i32 = -2;

/// Offset of the first parameter, just above the access link.
pub const FIRST_PARAM_OFFSET: i32 = 1;

/// Names declared in one lexical region.
#[derive(Debug, Clone, Default)]
pub struct Scope<'ast> {
    bindings: FxHashMap<&'ast str, Binding<'ast>>,
    next_offset: i32,
}

impl<'ast> Scope<'ast> {
    pub fn new() -> Self {
        Self {
            bindings: FxHashMap::default(),
            next_offset: FIRST_LOCAL_OFFSET,
        }
    }

    /// A scope pre-populated with class members.
    pub fn with_bindings(bindings: FxHashMap<&'ast str, Binding<'ast>>) -> Self {
        Self {
            bindings,
            next_offset: FIRST_LOCAL_OFFSET,
        }
    }

    pub fn get(&self, name: &str) -> Option<Binding<'ast>> {
        self.bindings.get(name).copied()
    }
}

/// The stack of open scopes, innermost last.
#[derive(Debug, Default)]
pub struct ScopeStack<'ast> {
    scopes: Vec<Scope<'ast>>,
}

impl<'ast> ScopeStack<'ast> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nesting level of the innermost scope.
    #[inline]
    pub fn level(&self) -> u32 {
        self.scopes.len().saturating_sub(1) as u32
    }

    pub fn push(&mut self) {
        self.scopes.push(Scope::new());
    }

    pub fn push_scope(&mut self, scope: Scope<'ast>) {
        self.scopes.push(scope);
    }

    pub fn pop(&mut self) -> Option<Scope<'ast>> {
        self.scopes.pop()
    }

    /// Reserve the next local offset in the innermost scope.
    pub fn allocate(&mut self) -> i32 {
        let scope = self.innermost();
        let offset = scope.next_offset;
        scope.next_offset -= 1;
        offset
    }

    /// Insert `name` into the innermost scope.
    ///
    /// A name already present in the same scope is left untouched and
    /// reported as a duplicate.
    pub fn declare(&mut self, name: Ident<'ast>, binding: Binding<'ast>) -> Result<(), LinkError> {
        let scope = self.innermost();
        if scope.bindings.contains_key(name.name) {
            return Err(LinkError::DuplicateDeclaration {
                name: name.name.to_string(),
                span: name.span,
            });
        }
        scope.bindings.insert(name.name, binding);
        Ok(())
    }

    /// Find the innermost declaration of `name`.
    pub fn lookup(&self, name: &str) -> Option<Binding<'ast>> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    /// Find `name` in the top-level scope only.
    pub fn lookup_global(&self, name: &str) -> Option<Binding<'ast>> {
        self.scopes.first().and_then(|scope| scope.get(name))
    }

    /// Like [`lookup`](Self::lookup), reporting an unresolved identifier.
    pub fn resolve(&self, name: &str, span: Span) -> Result<Binding<'ast>, LinkError> {
        self.lookup(name)
            .ok_or_else(|| LinkError::UnresolvedIdentifier {
                name: name.to_string(),
                span,
            })
    }

    fn innermost(&mut self) -> &mut Scope<'ast> {
        if self.scopes.is_empty() {
            self.scopes.push(Scope::new());
        }
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }
}
