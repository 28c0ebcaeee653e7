//! # Argument Binding
//!
//! A [`PendingConnection`] is built per data wire at the moment the consuming
//! call entry is being constructed, and decides how that entry's argument
//! slot references the source value: directly (`ParameterRef`/`ReturnRef`
//! within the same list), through the cross-list data bridge, or degraded to
//! a literal default when the wire resolves to nothing.
//!
//! The bridge encodes a read-after-write discipline with insertion positions
//! alone: the SET lands as close to its source as sequential execution
//! allows, and the GET lands at the destination list's current tail, which is
//! always ahead of the entry under construction.

use tangle_graph::{CallListId, EntryId, Graph, NodeKind, OutputPinRef, TypeTable, ValueType};

use crate::calls::{Argument, CallEntry, CallListSet, MethodRef};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::redirect::{resolve_redirect, ResolvedSource};
use crate::storage::{DataRoot, StorageRegistry};

/// Classified origin of a wire, captured at construction time.
#[derive(Debug, Clone)]
struct SourceInfo {
    list: CallListId,
    /// Producing entry; `None` when the value is parameter-sourced.
    entry: Option<EntryId>,
    out_ty: ValueType,
    /// `Some` when the source is an external parameter of its list.
    param_index: Option<usize>,
}

/// A data wire waiting to be bound into a call entry under construction.
#[derive(Debug, Clone)]
pub struct PendingConnection {
    source: Option<SourceInfo>,
    dest_list: CallListId,
    dest_arg: usize,
    dest_ty: ValueType,
}

impl PendingConnection {
    /// Capture and classify a wire's source for a destination argument slot.
    ///
    /// If the origin pin still belongs to a redirect node (the orchestrator
    /// pre-resolves chains, but direct callers may not have), the chain walk
    /// happens inline here. A chain with a missing left-side connection
    /// records an unresolved source; binding then degrades at
    /// [`PendingConnection::connect`] time instead of failing hard.
    pub fn new(
        graph: &mut Graph,
        origin: OutputPinRef,
        dest_list: CallListId,
        dest_method: &MethodRef,
        arg_index: usize,
        diagnostics: &mut Diagnostics,
    ) -> Self {
        let dest_ty = dest_method.params[arg_index].clone();

        let origin = if graph.node(origin.node).kind == NodeKind::Redirect {
            match resolve_redirect(graph, origin, diagnostics) {
                ResolvedSource::Source(pin) => pin,
                ResolvedSource::Unresolved => {
                    return Self {
                        source: None,
                        dest_list,
                        dest_arg: arg_index,
                        dest_ty,
                    };
                }
            }
        } else {
            origin
        };

        let node = graph.node(origin.node);
        let pin = &node.outputs[origin.pin];

        // Boundary pins surface their list's parameters; otherwise a pin may
        // be flagged to reuse its own call's parameter.
        let param_index = if node.kind == NodeKind::Boundary {
            Some(origin.pin)
        } else {
            pin.param_index
        };

        let source = match pin.compiled {
            Some(compiled) if param_index.is_some() || compiled.entry.is_some() => Some(SourceInfo {
                list: compiled.list,
                entry: compiled.entry,
                out_ty: pin.ty.clone(),
                param_index,
            }),
            // Source node not compiled yet (or never will be): same outcome
            // as a missing wire.
            _ => None,
        };

        Self {
            source,
            dest_list,
            dest_arg: arg_index,
            dest_ty,
        }
    }

    /// Bind the destination argument slot of `entry`.
    ///
    /// `entry` is the call entry under construction; it must not yet be a
    /// member of the destination list, because the bridge relies on appending
    /// its GET ahead of it.
    pub fn connect(
        &self,
        entry: &mut CallEntry,
        lists: &mut CallListSet,
        root: &mut DataRoot,
        registry: &StorageRegistry,
        types: &TypeTable,
        diagnostics: &mut Diagnostics,
    ) -> Result<(), String> {
        let Some(source) = &self.source else {
            // Degrade to a typed default rather than leaving a hole.
            entry.args[self.dest_arg] = Argument::Literal {
                value: types.default_value(&self.dest_ty),
                ty: self.dest_ty.clone(),
            };
            diagnostics.push(Diagnostic::MissingWire {
                method: entry.method.name.clone(),
            });
            return Ok(());
        };

        if source.list == self.dest_list {
            entry.args[self.dest_arg] = match source.param_index {
                Some(index) => Argument::ParameterRef {
                    index,
                    ty: self.dest_ty.clone(),
                },
                None => {
                    let index = self.source_position(source, lists)?;
                    Argument::ReturnRef {
                        entry: index,
                        ty: self.dest_ty.clone(),
                    }
                }
            };
            return Ok(());
        }

        self.bridge(source, entry, lists, root, registry, types, diagnostics)
    }

    /// Move the source value into the destination list through a carrier.
    fn bridge(
        &self,
        source: &SourceInfo,
        entry: &mut CallEntry,
        lists: &mut CallListSet,
        root: &mut DataRoot,
        registry: &StorageRegistry,
        types: &TypeTable,
        diagnostics: &mut Diagnostics,
    ) -> Result<(), String> {
        // Transfer the most specific type the wire supports.
        let mut transfer_ty = self.dest_ty.clone();
        if types.is_subtype(&source.out_ty, &self.dest_ty) {
            transfer_ty = source.out_ty.clone();
        }

        let Some(binding) = registry.find(&transfer_ty, types) else {
            // Leave the argument slot as constructed; nothing is written to
            // either list.
            diagnostics.push(Diagnostic::UnbridgeableType { ty: transfer_ty });
            return Ok(());
        };

        let carrier = root.carrier_for(&binding.carrier_type);
        tracing::debug!(
            "bridging {} from list {} to list {} via {}",
            transfer_ty,
            source.list.0,
            self.dest_list.0,
            binding.carrier_type,
        );

        // SET in the source list, as close to the source as possible.
        let mut set_entry = CallEntry::new(binding.setter.clone()).with_target(carrier);
        match source.param_index {
            Some(index) => {
                set_entry.args[0] = Argument::ParameterRef {
                    index,
                    ty: transfer_ty.clone(),
                };
                // Parameter values exist from entry zero onward; store before
                // anything else runs.
                lists.list_mut(source.list).insert(0, set_entry);
            }
            None => {
                let source_index = self.source_position(source, lists)?;
                set_entry.args[0] = Argument::ReturnRef {
                    entry: source_index,
                    ty: transfer_ty.clone(),
                };
                lists.list_mut(source.list).insert(source_index + 1, set_entry);
            }
        }

        // GET at the destination tail. The entry under construction is
        // appended after this call returns, so the GET always precedes it.
        let get_entry = CallEntry::new(binding.getter.clone()).with_target(carrier);
        let dest = lists.list_mut(self.dest_list);
        dest.push(get_entry);
        let get_index = dest.len() - 1;

        entry.args[self.dest_arg] = Argument::ReturnRef {
            entry: get_index,
            ty: self.dest_ty.clone(),
        };
        Ok(())
    }

    fn source_position(&self, source: &SourceInfo, lists: &CallListSet) -> Result<usize, String> {
        let id = source
            .entry
            .ok_or("data source has no producing call entry")?;
        lists
            .list(source.list)
            .index_of(id)
            .ok_or_else(|| format!("call entry vanished from list {}", source.list.0))
    }
}
