//! Dataset ingestion.
//!
//! Normalizes the host's person, org and link records into a dense node
//! table plus a deduplicated `LinkSet`. Upstream data is assumed to be
//! occasionally inconsistent, so bad records are dropped rather than
//! reported:
//! - duplicate node ids (first record wins)
//! - links naming unknown ids
//! - self-loops
//! - repeated (source, target) pairs

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::link::{Link, LinkKind, LinkRecord, LinkSet};
use super::node::{Node, NodeId, NodeKind};

/// A person record as the host sends it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonRecord {
    pub id: String,
    #[serde(default, alias = "name")]
    pub label: Option<String>,
    /// When absent, derived from the links: a person without reports is basis.
    #[serde(default)]
    pub is_basis: Option<bool>,
}

impl PersonRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: None,
            is_basis: None,
        }
    }
}

/// An org record as the host sends it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrgRecord {
    pub id: String,
    #[serde(default, alias = "name")]
    pub label: Option<String>,
}

impl OrgRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: None,
        }
    }
}

/// Everything the host hands over for one dataset load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetInput {
    #[serde(default)]
    pub persons: Vec<PersonRecord>,
    #[serde(default)]
    pub orgs: Vec<OrgRecord>,
    #[serde(default)]
    pub links: Vec<LinkRecord>,
}

/// Counters from one ingestion pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestStats {
    pub duplicate_nodes: usize,
    pub unknown_endpoints: usize,
    pub self_loops: usize,
    pub duplicate_links: usize,
}

/// The loaded dataset: node table, key lookup and link collection.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    nodes: Vec<Node>,
    key_to_id: HashMap<String, NodeId>,
    /// `isBasis` as the host sent it, per slot; None means derive from links.
    explicit_basis: Vec<Option<bool>>,
    links: LinkSet,
    stats: IngestStats,
}

impl Dataset {
    /// Normalize host records into a dataset.
    pub fn from_input(input: &DatasetInput) -> Self {
        let capacity = input.persons.len() + input.orgs.len();
        let mut dataset = Self {
            nodes: Vec::with_capacity(capacity),
            key_to_id: HashMap::with_capacity(capacity),
            explicit_basis: Vec::with_capacity(capacity),
            ..Self::default()
        };

        for person in &input.persons {
            let label = person.label.clone().unwrap_or_else(|| person.id.clone());
            dataset.push(
                Node::person(person.id.clone(), label, person.is_basis.unwrap_or(false)),
                person.is_basis,
            );
        }
        for org in &input.orgs {
            let label = org.label.clone().unwrap_or_else(|| org.id.clone());
            dataset.push(Node::org(org.id.clone(), label), None);
        }

        dataset.set_links(&input.links);
        dataset
    }

    fn push(&mut self, node: Node, basis: Option<bool>) {
        if self.key_to_id.contains_key(&node.key) {
            tracing::warn!(key = %node.key, "duplicate node id dropped");
            self.stats.duplicate_nodes += 1;
            return;
        }
        let id = NodeId(self.nodes.len() as u32);
        self.key_to_id.insert(node.key.clone(), id);
        self.nodes.push(node);
        self.explicit_basis.push(basis);
    }

    /// Replace the link collection, keeping the node table.
    ///
    /// Link counters in `stats` are recounted and derived basis flags follow
    /// the new links. The new collection has a fresh identity, so index
    /// caches rebuild.
    pub fn set_links(&mut self, records: &[LinkRecord]) {
        self.stats.unknown_endpoints = 0;
        self.stats.self_loops = 0;
        self.stats.duplicate_links = 0;

        let mut seen: HashSet<(NodeId, NodeId)> = HashSet::with_capacity(records.len());
        let mut links = Vec::with_capacity(records.len());
        for record in records {
            let (Some(source), Some(target)) =
                (self.id_of(record.source.id()), self.id_of(record.target.id()))
            else {
                self.stats.unknown_endpoints += 1;
                continue;
            };
            if source == target {
                self.stats.self_loops += 1;
                continue;
            }
            if !seen.insert((source, target)) {
                self.stats.duplicate_links += 1;
                continue;
            }
            links.push(Link::new(source, target));
        }

        tracing::debug!(
            nodes = self.nodes.len(),
            links = links.len(),
            unknown_endpoints = self.stats.unknown_endpoints,
            self_loops = self.stats.self_loops,
            duplicate_links = self.stats.duplicate_links,
            "links ingested"
        );
        self.links = LinkSet::new(links);
        self.derive_basis();
    }

    /// Persons without an explicit flag are basis when they manage nobody.
    fn derive_basis(&mut self) {
        let mut has_reports = vec![false; self.nodes.len()];
        for link in &self.links {
            if self.link_kind(link) == Some(LinkKind::Reports) {
                has_reports[link.source.index()] = true;
            }
        }
        for (slot, node) in self.nodes.iter_mut().enumerate() {
            if node.kind == NodeKind::Person && self.explicit_basis[slot].is_none() {
                node.is_basis = !has_reports[slot];
            }
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// All node ids in slot order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len() as u32).map(NodeId)
    }

    pub fn id_of(&self, key: &str) -> Option<NodeId> {
        self.key_to_id.get(key).copied()
    }

    pub fn key_of(&self, id: NodeId) -> Option<&str> {
        self.node(id).map(|n| n.key.as_str())
    }

    pub fn label_of(&self, id: NodeId) -> Option<&str> {
        self.node(id).map(|n| n.label.as_str())
    }

    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.node(id).map(|n| n.kind)
    }

    pub fn is_person(&self, id: NodeId) -> bool {
        self.kind(id) == Some(NodeKind::Person)
    }

    pub fn is_org(&self, id: NodeId) -> bool {
        self.kind(id) == Some(NodeKind::Org)
    }

    pub fn is_basis(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(|n| n.is_person() && n.is_basis)
    }

    pub fn links(&self) -> &LinkSet {
        &self.links
    }

    pub fn stats(&self) -> IngestStats {
        self.stats
    }

    /// Classify a link by its endpoint kinds.
    pub fn link_kind(&self, link: &Link) -> Option<LinkKind> {
        Some(LinkKind::classify(self.kind(link.source)?, self.kind(link.target)?))
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Build a dataset from compact person/org/link lists.
    pub(crate) fn dataset(persons: &[&str], orgs: &[&str], links: &[(&str, &str)]) -> Dataset {
        Dataset::from_input(&DatasetInput {
            persons: persons.iter().map(|p| PersonRecord::new(*p)).collect(),
            orgs: orgs.iter().map(|o| OrgRecord::new(*o)).collect(),
            links: links.iter().map(|(s, t)| LinkRecord::new(*s, *t)).collect(),
        })
    }

    /// p1 manages p2, p2 manages p3; p1 ∈ o1, p2 ∈ o2; o1 is o2's parent.
    pub(crate) fn scenario() -> Dataset {
        dataset(
            &["p1", "p2", "p3"],
            &["o1", "o2"],
            &[
                ("p1", "p2"),
                ("p2", "p3"),
                ("p1", "o1"),
                ("p2", "o2"),
                ("o1", "o2"),
            ],
        )
    }
}
