//! Per-class member tables.
//!
//! ## Architecture
//!
//! ```text
//! ClassRegistry  (one per linker run)
//! └── "Account" -> VirtualTable
//!                  ├── members   name -> Binding   (fields and methods)
//!                  ├── dispatch  [slot] -> (name, signature)
//!                  └── fields    [-(offset) - 1] -> type
//! ```
//!
//! A subclass table starts as a copy of its superclass table. Fields that
//! redeclare an inherited field keep its offset; methods that redeclare an
//! inherited method keep its slot. Everything else is appended.

use fool_ast::{ArrowType, Binding, Type};
use rustc_hash::FxHashMap;

/// Nesting level of class members: one below the top-level scope.
pub const MEMBER_LEVEL: u32 = 1;

/// One dispatch-table entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DispatchSlot<'ast> {
    pub name: &'ast str,
    pub signature: &'ast ArrowType<'ast>,
}

/// Why a member could not be added to a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberConflict {
    /// A field was declared with the name of a method.
    FieldOverridesMethod,
    /// A method was declared with the name of a field.
    MethodOverridesField,
}

/// Fields and methods of one class, including inherited ones.
#[derive(Debug, Clone, Default)]
pub struct VirtualTable<'ast> {
    members: FxHashMap<&'ast str, Binding<'ast>>,
    dispatch: Vec<DispatchSlot<'ast>>,
    fields: Vec<Type<'ast>>,
}

impl<'ast> VirtualTable<'ast> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a field or method by name.
    pub fn member(&self, name: &str) -> Option<Binding<'ast>> {
        self.members.get(name).copied()
    }

    /// All members, keyed by name.
    pub fn members(&self) -> &FxHashMap<&'ast str, Binding<'ast>> {
        &self.members
    }

    /// Dispatch slots in slot order.
    pub fn dispatch(&self) -> &[DispatchSlot<'ast>] {
        &self.dispatch
    }

    /// Field types, `fields()[i]` stored at offset `-(i + 1)`.
    pub fn fields(&self) -> &[Type<'ast>] {
        &self.fields
    }

    /// Add or override a field, returning its offset.
    pub fn add_field(&mut self, name: &'ast str, ty: Type<'ast>) -> Result<i32, MemberConflict> {
        let offset = match self.members.get(name) {
            Some(existing) if matches!(existing.ty, Type::Method(_)) => {
                return Err(MemberConflict::FieldOverridesMethod);
            }
            Some(existing) => {
                let offset = existing.offset;
                self.fields[field_index(offset)] = ty;
                offset
            }
            None => {
                self.fields.push(ty);
                -(self.fields.len() as i32)
            }
        };
        self.members
            .insert(name, Binding::new(MEMBER_LEVEL, ty, offset));
        Ok(offset)
    }

    /// Add or override a method, returning its dispatch slot.
    pub fn add_method(
        &mut self,
        name: &'ast str,
        signature: &'ast ArrowType<'ast>,
    ) -> Result<usize, MemberConflict> {
        let slot = match self.members.get(name) {
            Some(existing) if matches!(existing.ty, Type::Method(_)) => {
                let slot = existing.offset as usize;
                self.dispatch[slot] = DispatchSlot { name, signature };
                slot
            }
            Some(_) => return Err(MemberConflict::MethodOverridesField),
            None => {
                self.dispatch.push(DispatchSlot { name, signature });
                self.dispatch.len() - 1
            }
        };
        self.members.insert(
            name,
            Binding::new(MEMBER_LEVEL, Type::Method(signature), slot as i32),
        );
        Ok(slot)
    }
}

/// Position in the field list of the field stored at `offset`.
#[inline]
pub fn field_index(offset: i32) -> usize {
    (-offset - 1) as usize
}

/// Every class declared in a program, by name.
#[derive(Debug, Clone, Default)]
pub struct ClassRegistry<'ast> {
    classes: FxHashMap<&'ast str, VirtualTable<'ast>>,
}

impl<'ast> ClassRegistry<'ast> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &'ast str, table: VirtualTable<'ast>) {
        self.classes.insert(name, table);
    }

    pub fn get(&self, name: &str) -> Option<&VirtualTable<'ast>> {
        self.classes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GETTER: ArrowType<'static> = ArrowType {
        params: &[],
        ret: Type::Int,
    };
    const SETTER: ArrowType<'static> = ArrowType {
        params: &[Type::Int],
        ret: Type::Bool,
    };

    #[test]
    fn fields_grow_downward() {
        let mut table = VirtualTable::new();
        assert_eq!(table.add_field("a", Type::Int), Ok(-1));
        assert_eq!(table.add_field("b", Type::Bool), Ok(-2));
        assert_eq!(table.fields(), &[Type::Int, Type::Bool]);
        assert_eq!(field_index(-2), 1);
    }

    #[test]
    fn overriding_field_reuses_offset() {
        let mut parent = VirtualTable::new();
        parent.add_field("balance", Type::Int).unwrap();

        let mut child = parent.clone();
        assert_eq!(child.add_field("balance", Type::Bool), Ok(-1));
        assert_eq!(child.fields(), &[Type::Bool]);
        assert_eq!(parent.fields(), &[Type::Int]);
    }

    #[test]
    fn inherited_method_keeps_slot_and_new_method_appends() {
        let mut parent = VirtualTable::new();
        assert_eq!(parent.add_method("get", &GETTER), Ok(0));

        let mut child = parent.clone();
        assert_eq!(child.add_method("set", &SETTER), Ok(1));
        assert_eq!(child.add_method("get", &GETTER), Ok(0));
        assert_eq!(child.dispatch().len(), 2);
        assert_eq!(child.dispatch()[1].name, "set");
    }

    #[test]
    fn field_and_method_names_cannot_cross() {
        let mut table = VirtualTable::new();
        table.add_field("x", Type::Int).unwrap();
        table.add_method("m", &GETTER).unwrap();

        assert_eq!(
            table.add_field("m", Type::Int),
            Err(MemberConflict::FieldOverridesMethod)
        );
        assert_eq!(
            table.add_method("x", &GETTER),
            Err(MemberConflict::MethodOverridesField)
        );
    }

    #[test]
    fn method_binding_is_slot() {
        let mut table = VirtualTable::new();
        table.add_method("a", &GETTER).unwrap();
        table.add_method("b", &SETTER).unwrap();
        let binding = table.member("b").unwrap();
        assert_eq!(binding.offset, 1);
        assert_eq!(binding.level, MEMBER_LEVEL);
        assert!(matches!(binding.ty, Type::Method(_)));
    }
}
