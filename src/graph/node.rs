//! Node type and related structures.
//!
//! Nodes are the people and organizational units of the dataset. Each node has:
//! - A dense slot identifier assigned at ingestion (`NodeId`)
//! - The host's string key, unique across persons and orgs
//! - A kind (person or org) and a display label
//! - For persons, whether they are a leaf individual contributor ("basis")
//!
//! Positions are not stored here; they live in the layout's position arena.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Dense node identifier.
///
/// Assigned in ingestion order and stable for the lifetime of a loaded
/// dataset. It wraps a u32 for efficient storage and WebAssembly interop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Create a new NodeId from a raw u32.
    #[inline]
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw u32 value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Slot index into per-node buffers.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.0)
    }
}

impl From<u32> for NodeId {
    #[inline]
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<NodeId> for u32 {
    #[inline]
    fn from(id: NodeId) -> Self {
        id.0
    }
}

/// The two node kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Person,
    Org,
}

/// Static node record, created once per loaded dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Host-supplied id, globally unique.
    pub key: String,
    pub kind: NodeKind,
    pub label: String,
    /// Leaf individual contributor with no reports. Always false for orgs.
    pub is_basis: bool,
}

impl Node {
    pub fn person(key: impl Into<String>, label: impl Into<String>, is_basis: bool) -> Self {
        Self {
            key: key.into(),
            kind: NodeKind::Person,
            label: label.into(),
            is_basis,
        }
    }

    pub fn org(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind: NodeKind::Org,
            label: label.into(),
            is_basis: false,
        }
    }

    #[inline]
    pub fn is_person(&self) -> bool {
        self.kind == NodeKind::Person
    }

    #[inline]
    pub fn is_org(&self) -> bool {
        self.kind == NodeKind::Org
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id() {
        let id = NodeId::new(42);
        assert_eq!(id.raw(), 42);
        assert_eq!(id.index(), 42);
        assert_eq!(format!("{}", id), "Node(42)");
    }

    #[test]
    fn test_node_id_conversion() {
        let id: NodeId = 123.into();
        let raw: u32 = id.into();
        assert_eq!(raw, 123);
    }

    #[test]
    fn test_node_constructors() {
        let p = Node::person("p1", "Ada", true);
        assert!(p.is_person());
        assert!(p.is_basis);

        let o = Node::org("o1", "Platform");
        assert!(o.is_org());
        assert!(!o.is_basis);
    }
}
