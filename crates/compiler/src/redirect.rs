//! # Redirect Resolution
//!
//! Redirect nodes exist purely so authors can route a wire around the canvas;
//! compilation must see through them. Walking backward from a consumer, a
//! chain of redirects either reaches a real source pin or dead-ends on a
//! redirect with no left-side connection.
//!
//! On success the whole chain is aliased: every redirect's own output pin has
//! its compiled reference overwritten with the ultimate source's, so later
//! resolutions skip the chain entirely. An unresolved chain performs no
//! aliasing.

use std::collections::HashSet;

use tangle_graph::{Graph, NodeKind, OutputPinRef};

use crate::diagnostics::{Diagnostic, Diagnostics};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedSource {
    /// The true, non-redirect source output pin.
    Source(OutputPinRef),
    /// The chain has a missing left-side connection (or loops).
    Unresolved,
}

/// Walk a redirect chain back to its true source pin.
///
/// A chain that revisits a node is cyclic; the walk stops with a diagnostic
/// and the chain is treated exactly like a missing connection.
pub fn resolve_redirect(
    graph: &mut Graph,
    origin: OutputPinRef,
    diagnostics: &mut Diagnostics,
) -> ResolvedSource {
    if graph.node(origin.node).kind != NodeKind::Redirect {
        return ResolvedSource::Source(origin);
    }

    let mut chain = Vec::new();
    let mut seen = HashSet::new();
    let mut current = origin;

    loop {
        let node = graph.node(current.node);
        if node.kind != NodeKind::Redirect {
            break;
        }
        if !seen.insert(current.node) {
            diagnostics.push(Diagnostic::RedirectCycle { node: current.node });
            return ResolvedSource::Unresolved;
        }
        chain.push(current.node);

        // A redirect forwards exactly one data input.
        match node.inputs.first().and_then(|input| input.source) {
            Some(next) => current = next,
            None => return ResolvedSource::Unresolved,
        }
    }

    // Alias every redirect in the chain to the ultimate source, never an
    // intermediate one.
    let compiled = graph.output_pin(current).compiled;
    for node in chain {
        graph.node_mut(node).outputs[0].compiled = compiled;
    }

    ResolvedSource::Source(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tangle_graph::{CallListId, CompiledRef, EntryId, Node, NodeId, ValueType};

    fn redirect_node(ty: &ValueType) -> Node {
        let mut node = Node::new("reroute", "core", NodeKind::Redirect);
        node.add_input_pin("in", ty.clone());
        node.add_output_pin("out", ty.clone());
        node
    }

    fn source_node(ty: &ValueType) -> Node {
        let mut node = Node::new("source", "core", NodeKind::Regular);
        node.add_output_pin("out", ty.clone());
        node
    }

    #[test]
    fn test_chain_aliases_to_ultimate_source() {
        let ty = ValueType::named("int");
        let mut graph = Graph::new("test");
        let src = graph.add_node(source_node(&ty));
        let r1 = graph.add_node(redirect_node(&ty));
        let r2 = graph.add_node(redirect_node(&ty));

        let src_pin = OutputPinRef { node: src, pin: 0 };
        graph.connect_data(src_pin, r1, 0);
        graph.connect_data(OutputPinRef { node: r1, pin: 0 }, r2, 0);

        let compiled = CompiledRef {
            list: CallListId(0),
            entry: Some(EntryId(4)),
        };
        graph.output_pin_mut(src_pin).compiled = Some(compiled);

        let mut diagnostics = Diagnostics::new();
        let resolved = resolve_redirect(&mut graph, OutputPinRef { node: r2, pin: 0 }, &mut diagnostics);

        assert_eq!(resolved, ResolvedSource::Source(src_pin));
        assert_eq!(graph.node(r1).outputs[0].compiled, Some(compiled));
        assert_eq!(graph.node(r2).outputs[0].compiled, Some(compiled));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_missing_left_side_is_unresolved() {
        let ty = ValueType::named("int");
        let mut graph = Graph::new("test");
        let r1 = graph.add_node(redirect_node(&ty));

        let mut diagnostics = Diagnostics::new();
        let resolved = resolve_redirect(&mut graph, OutputPinRef { node: r1, pin: 0 }, &mut diagnostics);

        assert_eq!(resolved, ResolvedSource::Unresolved);
        assert_eq!(graph.node(r1).outputs[0].compiled, None);
    }

    #[test]
    fn test_cycle_terminates_with_diagnostic() {
        let ty = ValueType::named("int");
        let mut graph = Graph::new("test");
        let r1 = graph.add_node(redirect_node(&ty));
        let r2 = graph.add_node(redirect_node(&ty));
        graph.connect_data(OutputPinRef { node: r2, pin: 0 }, r1, 0);
        graph.connect_data(OutputPinRef { node: r1, pin: 0 }, r2, 0);

        let mut diagnostics = Diagnostics::new();
        let resolved = resolve_redirect(&mut graph, OutputPinRef { node: r1, pin: 0 }, &mut diagnostics);

        assert_eq!(resolved, ResolvedSource::Unresolved);
        assert_eq!(diagnostics.len(), 1);
        assert!(matches!(
            diagnostics.items()[0],
            Diagnostic::RedirectCycle { node: NodeId(_) }
        ));
        // No aliasing happened.
        assert_eq!(graph.node(r1).outputs[0].compiled, None);
        assert_eq!(graph.node(r2).outputs[0].compiled, None);
    }
}
