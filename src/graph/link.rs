//! Link type and the link collection.
//!
//! Links are directed connections between nodes. Their meaning depends on
//! the endpoint kinds:
//! - person → person: "reports to" (source is the manager)
//! - person → org: "member of"
//! - org → org: "parent → child" (source is the parent)

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use super::node::{NodeId, NodeKind};

/// A directed link between two dataset slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Link {
    pub source: NodeId,
    pub target: NodeId,
}

impl Link {
    #[inline]
    pub fn new(source: NodeId, target: NodeId) -> Self {
        Self { source, target }
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.target)
    }
}

/// Link semantics derived from endpoint kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    /// person → person, source manages target.
    Reports,
    /// person → org.
    Membership,
    /// org → org, source is the parent.
    OrgParent,
    /// org → person; carried along but never followed by traversal.
    Unclassified,
}

impl LinkKind {
    pub fn classify(source: NodeKind, target: NodeKind) -> Self {
        match (source, target) {
            (NodeKind::Person, NodeKind::Person) => Self::Reports,
            (NodeKind::Person, NodeKind::Org) => Self::Membership,
            (NodeKind::Org, NodeKind::Org) => Self::OrgParent,
            (NodeKind::Org, NodeKind::Person) => Self::Unclassified,
        }
    }
}

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// An ordered collection of links with an identity.
///
/// Every instance gets a process-unique generation number, including clones.
/// Index caches are keyed on the generation, so handing the same collection
/// back reuses cached adjacency while an equal-but-distinct collection forces
/// a rebuild.
#[derive(Debug)]
pub struct LinkSet {
    links: Vec<Link>,
    generation: u64,
}

impl LinkSet {
    pub fn new(links: Vec<Link>) -> Self {
        Self {
            links,
            generation: NEXT_GENERATION.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Identity of this collection instance.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[inline]
    pub fn as_slice(&self) -> &[Link] {
        &self.links
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Link> {
        self.links.iter()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

impl Clone for LinkSet {
    fn clone(&self) -> Self {
        Self::new(self.links.clone())
    }
}

impl Default for LinkSet {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<'a> IntoIterator for &'a LinkSet {
    type Item = &'a Link;
    type IntoIter = std::slice::Iter<'a, Link>;

    fn into_iter(self) -> Self::IntoIter {
        self.links.iter()
    }
}

/// A link endpoint as the host sends it: a raw id or an object carrying `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LinkEndpoint {
    Id(String),
    Node { id: String },
}

impl LinkEndpoint {
    pub fn id(&self) -> &str {
        match self {
            Self::Id(id) => id,
            Self::Node { id } => id,
        }
    }
}

/// Raw link record from the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub source: LinkEndpoint,
    pub target: LinkEndpoint,
}

impl LinkRecord {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: LinkEndpoint::Id(source.into()),
            target: LinkEndpoint::Id(target.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        use NodeKind::*;
        assert_eq!(LinkKind::classify(Person, Person), LinkKind::Reports);
        assert_eq!(LinkKind::classify(Person, Org), LinkKind::Membership);
        assert_eq!(LinkKind::classify(Org, Org), LinkKind::OrgParent);
        assert_eq!(LinkKind::classify(Org, Person), LinkKind::Unclassified);
    }

    #[test]
    fn test_generation_is_per_instance() {
        let a = LinkSet::new(vec![Link::new(NodeId(0), NodeId(1))]);
        let b = LinkSet::new(vec![Link::new(NodeId(0), NodeId(1))]);
        assert_ne!(a.generation(), b.generation());

        let c = a.clone();
        assert_ne!(a.generation(), c.generation());
        assert_eq!(a.as_slice(), c.as_slice());
    }

    #[test]
    fn test_endpoint_forms() {
        let raw: LinkRecord =
            serde_json::from_str(r#"{"source": "p1", "target": {"id": "o1", "x": 3}}"#).unwrap();
        assert_eq!(raw.source.id(), "p1");
        assert_eq!(raw.target.id(), "o1");
    }
}
