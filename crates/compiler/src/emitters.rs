//! Built-in emitters.
//!
//! Most node kinds ship with the host; the generic method-call emitter lives
//! here because nearly every graph uses it. It turns one node into one call
//! entry, binding each data input to the matching argument slot.

use std::collections::HashMap;

use tangle_graph::NodeId;

use crate::calls::{CallEntry, MethodRef};
use crate::session::{CompileSession, NodeEmitter};

/// Emits a single method invocation per node, using a pre-resolved node-name
/// to method table (the hand-off format of the host's metadata service).
#[derive(Default)]
pub struct CallMethodEmitter {
    methods: HashMap<String, MethodRef>,
}

impl CallMethodEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, node_name: &str, method: MethodRef) {
        self.methods.insert(node_name.to_string(), method);
    }
}

impl NodeEmitter for CallMethodEmitter {
    fn emit(&self, session: &mut CompileSession, node: NodeId) -> Result<(), String> {
        let name = session.graph.node(node).name.clone();
        let method = self
            .methods
            .get(&name)
            .ok_or_else(|| format!("no method bound for node '{name}'"))?
            .clone();

        let input_count = session.graph.node(node).inputs.len();
        if input_count != method.params.len() {
            return Err(format!(
                "node '{name}' has {input_count} data inputs but '{}' takes {} parameters",
                method.name,
                method.params.len()
            ));
        }

        let mut entry = CallEntry::new(method);
        for input in 0..input_count {
            session.bind_input(node, input, &mut entry, input)?;
        }

        session.finish_entry(node, entry)?;
        Ok(())
    }
}
