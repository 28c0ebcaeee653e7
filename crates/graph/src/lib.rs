//! # Graph Snapshot Model
//!
//! The frozen node/pin/wire structures handed to the compiler. The graph is
//! authored and validated elsewhere; during compilation it is read-only except
//! for the compiled-reference fields on output pins, which the compiler writes
//! once and every downstream consumer then reads.
//!
//! Nodes and pins are addressed with arena-style indices (`NodeId`,
//! `OutputPinRef`) rather than owning references, so chain walks over wires
//! can keep a visited set keyed by handle.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub mod type_system;

pub use type_system::{TypeTable, ValueType};

/// Stable handle of a node inside a [`Graph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

/// A specific output pin: node handle plus position among that node's outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutputPinRef {
    pub node: NodeId,
    pub pin: usize,
}

/// Handle of one compiled call list. Allocated by the compiler; carried here
/// because output pins store it once their owning node has been compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallListId(pub u32);

/// Stable identity of a call entry within its list. Positions shift when the
/// compiler inserts entries, so pins remember identity and positions are
/// looked up at bind time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryId(pub u32);

/// Compiler-written record of where an output pin's value comes from.
///
/// `entry` is `None` for pins that surface a call list's external parameter
/// (boundary pins), `Some` for pins whose value is produced by a call entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledRef {
    pub list: CallListId,
    pub entry: Option<EntryId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Ordinary node compiled by an emitter.
    Regular,
    /// Pass-through node that forwards a single data wire.
    Redirect,
    /// Node surfacing the compiled unit's external parameters.
    Boundary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub metadata: GraphMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    /// Selects which emitter compiles this node.
    pub tag: String,
    pub kind: NodeKind,
    pub inputs: Vec<DataInput>,
    pub outputs: Vec<OutputPin>,
    pub flow_inputs: Vec<FlowInput>,
    pub flow_outputs: Vec<FlowOutput>,
    /// Authored literal values for unconnected inputs, keyed by input name.
    pub properties: HashMap<String, Value>,
    pub position: Position,
}

/// Data input slot. Holds a reference to at most one source output pin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataInput {
    pub name: String,
    pub ty: ValueType,
    pub source: Option<OutputPinRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputPin {
    pub name: String,
    pub ty: ValueType,
    /// Written during the owning node's compile pass, read by every
    /// downstream binder that consumes this pin.
    pub compiled: Option<CompiledRef>,
    /// Set when this output reuses its own call's external parameter
    /// instead of a produced return value.
    pub param_index: Option<usize>,
}

/// A flow socket on some node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowRef {
    pub node: NodeId,
    pub socket: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowInput {
    pub name: String,
    pub sources: Vec<FlowRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowOutput {
    pub name: String,
    pub target: Option<FlowRef>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphMetadata {
    pub name: String,
    pub description: String,
    pub version: String,
    pub created_at: String,
    pub modified_at: String,
}

/// Literal values carried by authored properties and literal arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Vec2(f32, f32),
    Vec3(f32, f32, f32),
}

impl Graph {
    pub fn new(name: &str) -> Self {
        Self {
            nodes: Vec::new(),
            metadata: GraphMetadata {
                name: name.to_string(),
                description: String::new(),
                version: "1.0.0".to_string(),
                created_at: chrono::Utc::now().to_rfc3339(),
                modified_at: chrono::Utc::now().to_rfc3339(),
            },
        }
    }

    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        self.metadata.modified_at = chrono::Utc::now().to_rfc3339();
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0 as usize]
    }

    pub fn output_pin(&self, pin: OutputPinRef) -> &OutputPin {
        &self.node(pin.node).outputs[pin.pin]
    }

    pub fn output_pin_mut(&mut self, pin: OutputPinRef) -> &mut OutputPin {
        &mut self.node_mut(pin.node).outputs[pin.pin]
    }

    /// Wire a source output pin into a node's data input.
    pub fn connect_data(&mut self, source: OutputPinRef, node: NodeId, input: usize) {
        self.node_mut(node).inputs[input].source = Some(source);
        self.metadata.modified_at = chrono::Utc::now().to_rfc3339();
    }

    /// Wire a flow output socket to a flow input socket.
    pub fn connect_flow(&mut self, from: NodeId, socket: usize, to: NodeId, input: usize) {
        self.node_mut(from).flow_outputs[socket].target = Some(FlowRef { node: to, socket: input });
        self.node_mut(to).flow_inputs[input]
            .sources
            .push(FlowRef { node: from, socket });
        self.metadata.modified_at = chrono::Utc::now().to_rfc3339();
    }
}

impl Node {
    pub fn new(name: &str, tag: &str, kind: NodeKind) -> Self {
        Self {
            name: name.to_string(),
            tag: tag.to_string(),
            kind,
            inputs: Vec::new(),
            outputs: Vec::new(),
            flow_inputs: Vec::new(),
            flow_outputs: Vec::new(),
            properties: HashMap::new(),
            position: Position::default(),
        }
    }

    pub fn add_input_pin(&mut self, name: &str, ty: ValueType) {
        self.inputs.push(DataInput {
            name: name.to_string(),
            ty,
            source: None,
        });
    }

    pub fn add_output_pin(&mut self, name: &str, ty: ValueType) {
        self.outputs.push(OutputPin {
            name: name.to_string(),
            ty,
            compiled: None,
            param_index: None,
        });
    }

    pub fn add_flow_input(&mut self, name: &str) {
        self.flow_inputs.push(FlowInput {
            name: name.to_string(),
            sources: Vec::new(),
        });
    }

    pub fn add_flow_output(&mut self, name: &str) {
        self.flow_outputs.push(FlowOutput {
            name: name.to_string(),
            target: None,
        });
    }

    pub fn set_property(&mut self, name: &str, value: Value) {
        self.properties.insert(name.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value_type(name: &str) -> ValueType {
        ValueType::named(name)
    }

    #[test]
    fn test_node_ids_are_dense() {
        let mut graph = Graph::new("test");
        let a = graph.add_node(Node::new("a", "core", NodeKind::Regular));
        let b = graph.add_node(Node::new("b", "core", NodeKind::Regular));
        assert_eq!(a, NodeId(0));
        assert_eq!(b, NodeId(1));
        assert_eq!(graph.node(b).name, "b");
    }

    #[test]
    fn test_connect_data_sets_single_source() {
        let mut graph = Graph::new("test");

        let mut src = Node::new("src", "core", NodeKind::Regular);
        src.add_output_pin("out", value_type("int"));
        let src = graph.add_node(src);

        let mut dst = Node::new("dst", "core", NodeKind::Regular);
        dst.add_input_pin("in", value_type("int"));
        let dst = graph.add_node(dst);

        let pin = OutputPinRef { node: src, pin: 0 };
        graph.connect_data(pin, dst, 0);

        assert_eq!(graph.node(dst).inputs[0].source, Some(pin));
    }

    #[test]
    fn test_connect_flow_links_both_sides() {
        let mut graph = Graph::new("test");

        let mut a = Node::new("a", "core", NodeKind::Regular);
        a.add_flow_output("next");
        let a = graph.add_node(a);

        let mut b = Node::new("b", "core", NodeKind::Regular);
        b.add_flow_input("run");
        let b = graph.add_node(b);

        graph.connect_flow(a, 0, b, 0);

        assert_eq!(
            graph.node(a).flow_outputs[0].target,
            Some(FlowRef { node: b, socket: 0 })
        );
        assert_eq!(graph.node(b).flow_inputs[0].sources.len(), 1);
    }

    #[test]
    fn test_graph_round_trips_through_json() {
        let mut graph = Graph::new("round_trip");
        let mut node = Node::new("n", "core", NodeKind::Regular);
        node.add_input_pin("in", value_type("float"));
        node.add_output_pin("out", value_type("float"));
        node.set_property("in", Value::Float(1.5));
        graph.add_node(node);

        let json = serde_json::to_string(&graph).unwrap();
        let back: Graph = serde_json::from_str(&json).unwrap();
        assert_eq!(back.nodes.len(), 1);
        assert_eq!(back.nodes[0].properties.get("in"), Some(&Value::Float(1.5)));
    }
}
