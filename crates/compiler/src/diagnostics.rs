//! Non-fatal compile diagnostics.
//!
//! Missing wires and unbridgeable types never abort a compile run; a
//! partially-wrong compiled graph with diagnostics is more useful to the
//! author than no compiled graph at all. Diagnostics accumulate in order and
//! are surfaced to the caller after the run.

use serde::{Deserialize, Serialize};
use tangle_graph::{NodeId, ValueType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Diagnostic {
    /// A consumer's wire traces to nothing; its argument degraded to a
    /// literal default. Names the destination method.
    MissingWire { method: String },
    /// No storage binding covers the transfer type; the destination argument
    /// was left unresolved.
    UnbridgeableType { ty: ValueType },
    /// A redirect chain closed on itself and was treated as unresolved.
    RedirectCycle { node: NodeId },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::MissingWire { method } => {
                write!(f, "data input of '{method}' is wired to nothing; using a default value")
            }
            Diagnostic::UnbridgeableType { ty } => {
                write!(f, "no storage binding covers '{ty}'; value cannot cross call lists")
            }
            Diagnostic::RedirectCycle { node } => {
                write!(f, "redirect chain through node {} loops back on itself", node.0)
            }
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        tracing::warn!("{diagnostic}");
        self.items.push(diagnostic);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn items(&self) -> &[Diagnostic] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
