//! # The Tangle Event-Graph Compiler
//!
//! Compiles an authored node graph into ordered call lists, the form the
//! host's event dispatcher executes sequentially at runtime.
//!
//! ## Compilation Pipeline
//!
//! 1. **Event discovery**: every boundary node that opens a flow chain
//!    becomes one call list, parameterized by that node's output pins.
//! 2. **Per-node compilation**: the orchestrator pre-resolves redirect
//!    chains on a node's inputs, then dispatches to the emitter registered
//!    for the node's tag.
//! 3. **Argument binding**: each data wire becomes a literal, parameter
//!    reference, or return-value reference; wires crossing call lists are
//!    bridged through typed carrier slots.
//! 4. **Post-compile**: each emitter's hook runs once over the finished
//!    session.
//!
//! Missing wires and unbridgeable types degrade with diagnostics instead of
//! aborting; only emitter failures stop a node's compilation.

pub mod binding;
pub mod calls;
pub mod diagnostics;
pub mod emitters;
pub mod redirect;
pub mod session;
pub mod storage;


pub use binding::PendingConnection;
pub use calls::{Argument, CallEntry, CallList, CallListSet, MethodRef};
pub use diagnostics::{Diagnostic, Diagnostics};
pub use redirect::{resolve_redirect, ResolvedSource};
pub use session::{CompileSession, EmitterSet, NodeEmitter};
pub use storage::{Carrier, CarrierId, DataRoot, StorageBinding, StorageRegistry};

use tangle_graph::{Graph, NodeId, NodeKind, OutputPinRef, TypeTable, ValueType};

/// Everything a compile run produces besides the compiled-reference fields
/// written onto the graph's output pins.
#[derive(Debug)]
pub struct CompileOutput {
    pub lists: CallListSet,
    pub root: DataRoot,
    pub diagnostics: Diagnostics,
}

/// Compile a whole graph: one call list per event boundary, walking each
/// flow chain in author order.
///
/// Emission errors abort the run and name the node they occurred on; the
/// non-fatal conditions accumulate in [`CompileOutput::diagnostics`].
pub fn compile(
    graph: &mut Graph,
    emitters: &EmitterSet,
    registry: StorageRegistry,
    types: TypeTable,
) -> Result<CompileOutput, String> {
    let roots: Vec<NodeId> = graph
        .nodes
        .iter()
        .enumerate()
        .filter(|(_, node)| node.kind == NodeKind::Boundary && !node.flow_outputs.is_empty())
        .map(|(index, _)| NodeId(index as u32))
        .collect();

    tracing::debug!(
        "compiling graph '{}' ({} nodes, {} events)",
        graph.metadata.name,
        graph.nodes.len(),
        roots.len()
    );

    let mut session = CompileSession::new(graph, registry, types);

    for root in roots {
        let (name, param_types) = {
            let node = session.graph.node(root);
            let params: Vec<ValueType> = node.outputs.iter().map(|pin| pin.ty.clone()).collect();
            (node.name.clone(), params)
        };
        let list = session.lists.add_list(&name, param_types);

        // Boundary pins surface the event's parameters; they produce no entry.
        for pin in 0..session.graph.node(root).outputs.len() {
            session.mark_compiled(OutputPinRef { node: root, pin }, list, None);
        }

        session.current_list = Some(list);

        let mut next = session
            .graph
            .node(root)
            .flow_outputs
            .first()
            .and_then(|flow| flow.target);
        while let Some(flow) = next {
            let result = session.compile_node(flow.node, emitters);
            if let Err(error) = result {
                let at = session
                    .last_visited()
                    .map(|id| session.graph.node(id).name.clone())
                    .unwrap_or_default();
                return Err(format!("failed compiling node '{at}': {error}"));
            }
            next = session
                .graph
                .node(flow.node)
                .flow_outputs
                .first()
                .and_then(|flow| flow.target);
        }
    }

    session.post_compile(emitters)?;

    let (lists, root, diagnostics) = session.finish();
    Ok(CompileOutput {
        lists,
        root,
        diagnostics,
    })
}
