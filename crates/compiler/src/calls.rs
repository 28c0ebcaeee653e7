//! # Call Lists
//!
//! The compiled artifact: ordered sequences of method invocations, one list
//! per event, executed front to back by the host dispatcher.
//!
//! Lists keep a stable [`EntryId`] per entry alongside the execution order.
//! The compiler inserts entries mid-list (the cross-list bridge places its
//! SET as close to the source as possible), so positions move while identity
//! does not; positional `ReturnRef` indices are resolved with [`CallList::index_of`]
//! at the moment an argument is bound.

use serde::{Deserialize, Serialize};
use tangle_graph::{CallListId, EntryId, Value, ValueType};

use crate::storage::CarrierId;

/// Pre-resolved callable descriptor. Produced by the host's method metadata
/// service; the compiler never performs name-based lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodRef {
    pub owner: ValueType,
    pub name: String,
    pub params: Vec<ValueType>,
    pub ret: Option<ValueType>,
}

impl MethodRef {
    pub fn new(owner: ValueType, name: &str, params: Vec<ValueType>, ret: Option<ValueType>) -> Self {
        Self {
            owner,
            name: name.to_string(),
            params,
            ret,
        }
    }
}

/// Tagged binding of one argument slot.
///
/// `ParameterRef` indexes the enclosing list's external parameter set;
/// `ReturnRef` indexes an earlier entry of the same list. Neither ever
/// references another list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Argument {
    Literal { value: Value, ty: ValueType },
    ParameterRef { index: usize, ty: ValueType },
    ReturnRef { entry: usize, ty: ValueType },
}

/// One method invocation unit with a fixed argument slot list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallEntry {
    /// Set when the call targets a session carrier rather than a host object.
    pub target: Option<CarrierId>,
    pub method: MethodRef,
    pub args: Vec<Argument>,
}

impl CallEntry {
    /// New entry with one null-literal slot per declared parameter.
    pub fn new(method: MethodRef) -> Self {
        let args = method
            .params
            .iter()
            .map(|ty| Argument::Literal {
                value: Value::Null,
                ty: ty.clone(),
            })
            .collect();
        Self {
            target: None,
            method,
            args,
        }
    }

    pub fn with_target(mut self, carrier: CarrierId) -> Self {
        self.target = Some(carrier);
        self
    }
}

/// Ordered sequence of call entries, semantically one event's handler list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallList {
    pub name: String,
    /// Types of the event's external parameters, addressed by `ParameterRef`.
    pub param_types: Vec<ValueType>,
    entries: Vec<CallEntry>,
    ids: Vec<EntryId>,
    next_id: u32,
}

impl CallList {
    pub fn new(name: &str, param_types: Vec<ValueType>) -> Self {
        Self {
            name: name.to_string(),
            param_types,
            entries: Vec::new(),
            ids: Vec::new(),
            next_id: 0,
        }
    }

    fn next_id(&mut self) -> EntryId {
        let id = EntryId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Append an entry at the tail.
    pub fn push(&mut self, entry: CallEntry) -> EntryId {
        let id = self.next_id();
        self.entries.push(entry);
        self.ids.push(id);
        id
    }

    /// Insert an entry at a specific position, shifting later entries.
    pub fn insert(&mut self, index: usize, entry: CallEntry) -> EntryId {
        let id = self.next_id();
        self.entries.insert(index, entry);
        self.ids.insert(index, id);
        id
    }

    /// Current position of an entry within the list.
    pub fn index_of(&self, id: EntryId) -> Option<usize> {
        self.ids.iter().position(|&i| i == id)
    }

    pub fn entry(&self, id: EntryId) -> Option<&CallEntry> {
        self.index_of(id).map(|i| &self.entries[i])
    }

    pub fn get(&self, index: usize) -> Option<&CallEntry> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[CallEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// All call lists produced by one compile run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallListSet {
    lists: Vec<CallList>,
}

impl CallListSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_list(&mut self, name: &str, param_types: Vec<ValueType>) -> CallListId {
        let id = CallListId(self.lists.len() as u32);
        self.lists.push(CallList::new(name, param_types));
        id
    }

    pub fn list(&self, id: CallListId) -> &CallList {
        &self.lists[id.0 as usize]
    }

    pub fn list_mut(&mut self, id: CallListId) -> &mut CallList {
        &mut self.lists[id.0 as usize]
    }

    pub fn lists(&self) -> &[CallList] {
        &self.lists
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tangle_graph::ValueType;

    fn method(name: &str, params: Vec<ValueType>) -> MethodRef {
        MethodRef::new(ValueType::named("object"), name, params, None)
    }

    #[test]
    fn test_entry_identity_survives_insertion() {
        let mut list = CallList::new("update", Vec::new());
        let first = list.push(CallEntry::new(method("first", Vec::new())));
        let second = list.push(CallEntry::new(method("second", Vec::new())));

        assert_eq!(list.index_of(second), Some(1));

        // Insert ahead of `second`; its identity keeps working.
        list.insert(1, CallEntry::new(method("wedge", Vec::new())));
        assert_eq!(list.index_of(first), Some(0));
        assert_eq!(list.index_of(second), Some(2));
        assert_eq!(list.entry(second).unwrap().method.name, "second");
    }

    #[test]
    fn test_new_entry_gets_one_slot_per_param() {
        let entry = CallEntry::new(method(
            "apply",
            vec![ValueType::named("int"), ValueType::named("float")],
        ));
        assert_eq!(entry.args.len(), 2);
        assert!(matches!(entry.args[0], Argument::Literal { value: Value::Null, .. }));
    }
}
