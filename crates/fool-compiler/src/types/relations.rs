//! Nominal subtyping between FOOL types.
//!
//! [`TypeRelations`] records the direct superclass of each class as the
//! type checker meets class declarations, and answers subtype and
//! lowest-common-ancestor queries against those edges.
//!
//! The rules:
//!
//! - `bool <: int`, and every primitive is a subtype of itself.
//! - `null` is a subtype of every class reference.
//! - `A <: B` for classes when `B` is `A` or one of its ancestors.
//! - Arrows of equal arity: covariant in the result, contravariant in
//!   every parameter. Method types compare by their arrows.

use fool_ast::{ArrowType, Type};
use rustc_hash::FxHashMap;

/// Inheritance edges of one type-checking run.
#[derive(Debug, Default, Clone)]
pub struct TypeRelations<'ast> {
    supertypes: FxHashMap<&'ast str, &'ast str>,
}

impl<'ast> TypeRelations<'ast> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `class` directly extends `superclass`.
    pub fn declare_subclass(&mut self, class: &'ast str, superclass: &'ast str) {
        self.supertypes.insert(class, superclass);
    }

    /// Direct superclass of `class`, if any.
    pub fn superclass(&self, class: &str) -> Option<&'ast str> {
        self.supertypes.get(class).copied()
    }

    /// `class` followed by its ancestors, nearest first.
    ///
    /// The walk stops after as many steps as there are edges, so a cyclic
    /// registry cannot make it loop.
    pub fn ancestors(&self, class: &'ast str) -> impl Iterator<Item = &'ast str> + '_ {
        std::iter::successors(Some(class), move |current| self.superclass(current))
            .take(self.supertypes.len() + 1)
    }

    /// Whether a value of type `sub` may be used where `sup` is expected.
    pub fn is_subtype(&self, sub: Type<'ast>, sup: Type<'ast>) -> bool {
        match (sub, sup) {
            (Type::Bool, Type::Bool | Type::Int) | (Type::Int, Type::Int) => true,
            (Type::Empty, Type::Empty | Type::Ref(_)) => true,
            (Type::Ref(sub), Type::Ref(sup)) => self.ancestors(sub).any(|class| class == sup),
            (Type::Arrow(sub), Type::Arrow(sup)) | (Type::Method(sub), Type::Method(sup)) => {
                self.is_sub_arrow(sub, sup)
            }
            (Type::Class(sub), Type::Class(sup)) => sub.name == sup.name,
            _ => false,
        }
    }

    fn is_sub_arrow(&self, sub: &ArrowType<'ast>, sup: &ArrowType<'ast>) -> bool {
        sub.arity() == sup.arity()
            && self.is_subtype(sub.ret, sup.ret)
            && sub
                .params
                .iter()
                .zip(sup.params)
                .all(|(sub_param, sup_param)| self.is_subtype(*sup_param, *sub_param))
    }

    /// The most specific type both `a` and `b` are subtypes of.
    ///
    /// When neither is a subtype of the other, only the ancestor chain of
    /// `a` is searched.
    pub fn lowest_common_ancestor(&self, a: Type<'ast>, b: Type<'ast>) -> Option<Type<'ast>> {
        if self.is_subtype(a, b) {
            return Some(b);
        }
        if self.is_subtype(b, a) {
            return Some(a);
        }
        let Type::Ref(class) = a else {
            return None;
        };
        self.ancestors(class)
            .find(|ancestor| self.is_subtype(b, Type::Ref(*ancestor)))
            .map(Type::Ref)
    }
}
