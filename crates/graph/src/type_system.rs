//! # Value Type Table
//!
//! Value types are interned names looked up in a [`TypeTable`] that records,
//! per type, an optional parent type and the default literal used when a
//! binding degrades. The table replaces runtime type scanning: hosts author
//! it directly at startup and the compiler only ever queries it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::Value;

/// Identifier of a value type declared in a [`TypeTable`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValueType(String);

impl ValueType {
    pub fn named(name: &str) -> Self {
        Self(name.to_string())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TypeEntry {
    parent: Option<ValueType>,
    default: Value,
}

/// Registry of value types with single-parent subtyping.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeTable {
    entries: HashMap<ValueType, TypeEntry>,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with the standard types. `object` is the root of the reference
    /// types; primitives have no parent.
    pub fn builtin() -> Self {
        let mut table = Self::new();
        table.register(ValueType::named("object"), None, Value::Null);
        table.register(ValueType::named("string"), None, Value::Str(String::new()));
        table.register(ValueType::named("bool"), None, Value::Bool(false));
        table.register(ValueType::named("int"), None, Value::Int(0));
        table.register(ValueType::named("float"), None, Value::Float(0.0));
        table.register(ValueType::named("vec2"), None, Value::Vec2(0.0, 0.0));
        table.register(ValueType::named("vec3"), None, Value::Vec3(0.0, 0.0, 0.0));
        table
    }

    pub fn register(&mut self, ty: ValueType, parent: Option<ValueType>, default: Value) {
        self.entries.insert(ty, TypeEntry { parent, default });
    }

    pub fn contains(&self, ty: &ValueType) -> bool {
        self.entries.contains_key(ty)
    }

    pub fn parent(&self, ty: &ValueType) -> Option<&ValueType> {
        self.entries.get(ty).and_then(|e| e.parent.as_ref())
    }

    /// True when `ty` is `ancestor` or declared below it in the parent chain.
    pub fn is_subtype(&self, ty: &ValueType, ancestor: &ValueType) -> bool {
        let mut current = ty;
        loop {
            if current == ancestor {
                return true;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Default literal for a type; `Null` when the type is unregistered.
    pub fn default_value(&self, ty: &ValueType) -> Value {
        self.entries
            .get(ty)
            .map(|e| e.default.clone())
            .unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subtype_walks_parent_chain() {
        let mut table = TypeTable::builtin();
        table.register(
            ValueType::named("texture"),
            Some(ValueType::named("object")),
            Value::Null,
        );
        table.register(
            ValueType::named("render_texture"),
            Some(ValueType::named("texture")),
            Value::Null,
        );

        let object = ValueType::named("object");
        let texture = ValueType::named("texture");
        let render = ValueType::named("render_texture");

        assert!(table.is_subtype(&render, &texture));
        assert!(table.is_subtype(&render, &object));
        assert!(table.is_subtype(&texture, &texture));
        assert!(!table.is_subtype(&object, &texture));
        assert!(!table.is_subtype(&ValueType::named("int"), &object));
    }

    #[test]
    fn test_default_values() {
        let table = TypeTable::builtin();
        assert_eq!(table.default_value(&ValueType::named("int")), Value::Int(0));
        assert_eq!(
            table.default_value(&ValueType::named("string")),
            Value::Str(String::new())
        );
        // Unregistered types degrade to null.
        assert_eq!(table.default_value(&ValueType::named("mystery")), Value::Null);
    }
}
