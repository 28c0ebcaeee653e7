//! # Storage Bindings and Carriers
//!
//! `ReturnRef`/`ParameterRef` arguments can only address their own list, so a
//! value crossing lists has to pass through a scratch slot that is written in
//! the source list and read in the destination list. The [`StorageRegistry`]
//! declares, per value type, which carrier type provides that slot and the
//! get/set accessor pair to reach it; the [`DataRoot`] hands out one shared
//! carrier instance per carrier type for the duration of a compile session.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tangle_graph::{TypeTable, ValueType};
use uuid::Uuid;

use crate::calls::MethodRef;

/// Maps a value type to the carrier usable as its scratch slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageBinding {
    pub value_type: ValueType,
    pub carrier_type: ValueType,
    pub getter: MethodRef,
    pub setter: MethodRef,
}

impl StorageBinding {
    /// Binding whose carrier exposes the conventional `get`/`set` pair.
    pub fn slot(value_type: ValueType, carrier_type: ValueType) -> Self {
        let getter = MethodRef::new(carrier_type.clone(), "get", Vec::new(), Some(value_type.clone()));
        let setter = MethodRef::new(carrier_type.clone(), "set", vec![value_type.clone()], None);
        Self {
            value_type,
            carrier_type,
            getter,
            setter,
        }
    }
}

/// Fixed, ordered set of storage bindings. Fixed per compiler build: only
/// types covered here are bridgeable across lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageRegistry {
    bindings: Vec<StorageBinding>,
}

impl StorageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry covering the builtin value types, one slot carrier each.
    /// `object` comes first so subclasses of it match before anything else.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for name in ["object", "float", "bool", "vec3", "string", "int", "vec2"] {
            registry.register(StorageBinding::slot(
                ValueType::named(name),
                ValueType::named(&format!("{name}_slot")),
            ));
        }
        registry
    }

    pub fn register(&mut self, binding: StorageBinding) {
        self.bindings.push(binding);
    }

    /// First binding, in registration order, whose key type equals `ty` or is
    /// a supertype of it.
    pub fn find(&self, ty: &ValueType, types: &TypeTable) -> Option<&StorageBinding> {
        self.bindings
            .iter()
            .find(|b| types.is_subtype(ty, &b.value_type))
    }

    pub fn bindings(&self) -> &[StorageBinding] {
        &self.bindings
    }
}

/// Handle of a carrier instance allocated from a [`DataRoot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CarrierId(pub u32);

/// A scratch slot instance of some carrier type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Carrier {
    pub carrier_type: ValueType,
}

/// Per-session container that owns carrier instances.
///
/// Allocation is idempotent per carrier type: every bridge of the same type
/// within one session shares one instance. Carriers are ordinary settable and
/// gettable slots, so they survive as part of the compiled output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataRoot {
    /// Session root identifier the carriers are scoped to.
    pub id: Uuid,
    carriers: Vec<Carrier>,
    by_type: HashMap<ValueType, CarrierId>,
}

impl DataRoot {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            carriers: Vec::new(),
            by_type: HashMap::new(),
        }
    }

    /// Shared carrier instance for a carrier type, created on first request.
    pub fn carrier_for(&mut self, carrier_type: &ValueType) -> CarrierId {
        if let Some(&id) = self.by_type.get(carrier_type) {
            return id;
        }
        let id = CarrierId(self.carriers.len() as u32);
        self.carriers.push(Carrier {
            carrier_type: carrier_type.clone(),
        });
        self.by_type.insert(carrier_type.clone(), id);
        id
    }

    pub fn carrier(&self, id: CarrierId) -> &Carrier {
        &self.carriers[id.0 as usize]
    }

    pub fn carrier_count(&self) -> usize {
        self.carriers.len()
    }
}

impl Default for DataRoot {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tangle_graph::Value;

    #[test]
    fn test_find_prefers_registration_order() {
        let types = TypeTable::builtin();
        let registry = StorageRegistry::builtin();

        let float_binding = registry.find(&ValueType::named("float"), &types).unwrap();
        assert_eq!(float_binding.carrier_type, ValueType::named("float_slot"));
    }

    #[test]
    fn test_find_matches_supertype() {
        let mut types = TypeTable::builtin();
        types.register(
            ValueType::named("texture"),
            Some(ValueType::named("object")),
            Value::Null,
        );
        let registry = StorageRegistry::builtin();

        // No texture binding exists; the object slot covers it.
        let binding = registry.find(&ValueType::named("texture"), &types).unwrap();
        assert_eq!(binding.value_type, ValueType::named("object"));
    }

    #[test]
    fn test_find_misses_uncovered_type() {
        let mut types = TypeTable::builtin();
        types.register(ValueType::named("quaternion"), None, Value::Null);
        let registry = StorageRegistry::builtin();

        assert!(registry.find(&ValueType::named("quaternion"), &types).is_none());
    }

    #[test]
    fn test_carrier_allocation_is_idempotent() {
        let mut root = DataRoot::new();
        let slot = ValueType::named("int_slot");
        let a = root.carrier_for(&slot);
        let b = root.carrier_for(&slot);
        assert_eq!(a, b);
        assert_eq!(root.carrier_count(), 1);

        let c = root.carrier_for(&ValueType::named("float_slot"));
        assert_ne!(a, c);
        assert_eq!(root.carrier_count(), 2);
    }
}
