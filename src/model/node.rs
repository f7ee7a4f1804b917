//! Node in the property graph.

use serde::{Deserialize, Serialize};

use super::{PropertyMap, Value};

/// Opaque node identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A node in the property graph.
///
/// Every node in this graph carries exactly one label and is identified by
/// its `(label, name)` pair — that pair is the merge key for upserts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub label: String,
    pub name: String,
    pub properties: PropertyMap,
}

impl Node {
    pub fn new(id: NodeId, label: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            name: name.into(),
            properties: PropertyMap::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.label == label
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}
