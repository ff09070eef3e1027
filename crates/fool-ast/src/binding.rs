//! Resolved storage locations.

use crate::Type;

/// Where a declared name lives at run time.
///
/// `level` is the lexical nesting level of the declaring scope (0 for the
/// top-level `let`). `offset` is relative to the frame base of that scope:
/// positive for parameters, negative for locals and object fields. For a
/// method, `offset` is its dispatch-table slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Binding<'ast> {
    pub level: u32,
    pub ty: Type<'ast>,
    pub offset: i32,
}

impl<'ast> Binding<'ast> {
    pub fn new(level: u32, ty: Type<'ast>, offset: i32) -> Self {
        Self { level, ty, offset }
    }
}

/// A use of a name, linked to its declaration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution<'ast> {
    pub binding: Binding<'ast>,
    /// Nesting level at the point of use.
    pub use_level: u32,
}

impl Resolution<'_> {
    /// Number of access links to follow from the current frame to reach
    /// the declaring frame.
    #[inline]
    pub fn hops(&self) -> u32 {
        self.use_level.saturating_sub(self.binding.level)
    }
}
