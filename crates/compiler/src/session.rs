//! # Compile Session and Orchestration
//!
//! One [`CompileSession`] exists per compile run: it owns the call lists
//! being built, the carrier root, the diagnostics sink, and the pointer to
//! the node currently being compiled (for failure attribution). Compilation
//! is single-threaded and runs to completion synchronously; everything here
//! is mutated in place by exactly one caller.
//!
//! What each node kind actually emits is not decided here. Emission is a
//! capability implemented per kind ([`NodeEmitter`]) and dispatched through
//! an [`EmitterSet`] keyed by the node's tag; the orchestrator only
//! guarantees that redirect chains feeding a node are resolved before its
//! emitter runs.

use std::collections::HashMap;

use tangle_graph::{
    CallListId, CompiledRef, EntryId, Graph, NodeId, NodeKind, OutputPinRef, TypeTable,
};

use crate::binding::PendingConnection;
use crate::calls::{Argument, CallEntry, CallListSet};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::redirect::resolve_redirect;
use crate::storage::{DataRoot, StorageRegistry};

/// Node-kind-specific emission capability.
pub trait NodeEmitter {
    /// Construct the node's call entries and argument bindings. A returned
    /// error aborts the remainder of this node's compilation; entries already
    /// emitted by prior nodes are not rolled back.
    fn emit(&self, session: &mut CompileSession, node: NodeId) -> Result<(), String>;

    /// Invoked once after every node of the graph has been compiled.
    fn post_compile(&self, _session: &mut CompileSession) -> Result<(), String> {
        Ok(())
    }
}

/// Emitters keyed by node tag.
#[derive(Default)]
pub struct EmitterSet {
    emitters: HashMap<String, Box<dyn NodeEmitter>>,
}

impl EmitterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tag: &str, emitter: Box<dyn NodeEmitter>) {
        self.emitters.insert(tag.to_string(), emitter);
    }

    pub fn get(&self, tag: &str) -> Option<&dyn NodeEmitter> {
        self.emitters.get(tag).map(|e| e.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn NodeEmitter> {
        self.emitters.values().map(|e| e.as_ref())
    }
}

/// All state of one compile run.
pub struct CompileSession<'g> {
    pub graph: &'g mut Graph,
    pub lists: CallListSet,
    pub root: DataRoot,
    pub registry: StorageRegistry,
    pub types: TypeTable,
    pub diagnostics: Diagnostics,
    /// The list entries are currently being emitted into.
    pub current_list: Option<CallListId>,
    last_visited: Option<NodeId>,
}

impl<'g> CompileSession<'g> {
    pub fn new(graph: &'g mut Graph, registry: StorageRegistry, types: TypeTable) -> Self {
        Self {
            graph,
            lists: CallListSet::new(),
            root: DataRoot::new(),
            registry,
            types,
            diagnostics: Diagnostics::new(),
            current_list: None,
            last_visited: None,
        }
    }

    /// Node a subsequent emission failure is attributed to.
    pub fn last_visited(&self) -> Option<NodeId> {
        self.last_visited
    }

    /// Compile a single node: record it as last visited, pre-resolve redirect
    /// chains on its wired inputs, then hand off to its emitter.
    pub fn compile_node(&mut self, node: NodeId, emitters: &EmitterSet) -> Result<(), String> {
        self.last_visited = Some(node);

        let input_count = self.graph.node(node).inputs.len();
        for input in 0..input_count {
            let Some(source) = self.graph.node(node).inputs[input].source else {
                continue;
            };
            if self.graph.node(source.node).kind == NodeKind::Redirect {
                resolve_redirect(self.graph, source, &mut self.diagnostics);
            }
        }

        let tag = self.graph.node(node).tag.clone();
        let emitter = emitters
            .get(&tag)
            .ok_or_else(|| format!("no emitter registered for node tag '{tag}'"))?;
        tracing::debug!("compiling node '{}'", self.graph.node(node).name);
        emitter.emit(self, node)
    }

    /// Bind one data input of `node` into an argument slot of an entry under
    /// construction.
    ///
    /// Wired inputs go through a [`PendingConnection`]. Unwired inputs take
    /// the authored property of the same name when one exists, and otherwise
    /// degrade to a typed default with a diagnostic.
    pub fn bind_input(
        &mut self,
        node: NodeId,
        input: usize,
        entry: &mut CallEntry,
        arg_index: usize,
    ) -> Result<(), String> {
        let list = self
            .current_list
            .ok_or("no call list is open for emission")?;

        let Some(origin) = self.graph.node(node).inputs[input].source else {
            let ty = entry.method.params[arg_index].clone();
            let input_name = &self.graph.node(node).inputs[input].name;
            match self.graph.node(node).properties.get(input_name) {
                Some(value) => {
                    entry.args[arg_index] = Argument::Literal {
                        value: value.clone(),
                        ty,
                    };
                }
                None => {
                    entry.args[arg_index] = Argument::Literal {
                        value: self.types.default_value(&ty),
                        ty,
                    };
                    self.diagnostics.push(Diagnostic::MissingWire {
                        method: entry.method.name.clone(),
                    });
                }
            }
            return Ok(());
        };

        let connection = PendingConnection::new(
            self.graph,
            origin,
            list,
            &entry.method,
            arg_index,
            &mut self.diagnostics,
        );
        connection.connect(
            entry,
            &mut self.lists,
            &mut self.root,
            &self.registry,
            &self.types,
            &mut self.diagnostics,
        )
    }

    /// Record which call entry produces an output pin's value.
    pub fn mark_compiled(&mut self, pin: OutputPinRef, list: CallListId, entry: Option<EntryId>) {
        self.graph.output_pin_mut(pin).compiled = Some(CompiledRef { list, entry });
    }

    /// Run every emitter's post-compile hook once.
    pub fn post_compile(&mut self, emitters: &EmitterSet) -> Result<(), String> {
        for emitter in emitters.iter() {
            emitter.post_compile(self)?;
        }
        Ok(())
    }

    /// Consume the session, yielding the compiled artifacts.
    pub fn finish(self) -> (CallListSet, DataRoot, Diagnostics) {
        (self.lists, self.root, self.diagnostics)
    }

    /// Convenience used by emitters that produce exactly one entry: append it
    /// to the current list and mark the node's first output as produced by it.
    pub fn finish_entry(&mut self, node: NodeId, entry: CallEntry) -> Result<EntryId, String> {
        let list = self
            .current_list
            .ok_or("no call list is open for emission")?;
        let id = self.lists.list_mut(list).push(entry);
        if !self.graph.node(node).outputs.is_empty() {
            self.mark_compiled(OutputPinRef { node, pin: 0 }, list, Some(id));
        }
        Ok(id)
    }
}
