//! Subgraph computation.
//!
//! Selects the bounded neighborhood of one or more focus nodes:
//! 1. Breadth-first traversal under the mode's edge rules (`traversal`)
//! 2. Hidden-node filtering
//! 3. Optional management compaction
//! 4. Org filtering
//! 5. Link projection onto the surviving nodes
//!
//! Legend orgs are computed independently from every visited person.

mod legend;
mod passes;
mod traversal;

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::graph::{Dataset, GraphIndex, Link, NodeId};

use passes::Retained;

/// Which edges the traversal follows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraversalMode {
    /// Toward reports and child orgs.
    #[default]
    Down,
    /// Toward managers, memberships and parent orgs.
    Up,
    /// Union of both rule sets.
    Both,
}

impl TraversalMode {
    #[inline]
    pub fn follows_down(self) -> bool {
        matches!(self, Self::Down | Self::Both)
    }

    #[inline]
    pub fn follows_up(self) -> bool {
        matches!(self, Self::Up | Self::Both)
    }
}

/// A subgraph computation request over resolved node ids.
#[derive(Debug, Clone, Default)]
pub struct SubgraphRequest {
    pub roots: Vec<NodeId>,
    pub depth: u32,
    pub mode: TraversalMode,
    pub management_enabled: bool,
    pub hidden: HashSet<NodeId>,
    /// Hidden nodes shown anyway for this call.
    pub temporarily_visible: HashSet<NodeId>,
    /// `None` allows every org.
    pub allowed_orgs: Option<HashSet<NodeId>>,
}

impl SubgraphRequest {
    pub fn new(root: NodeId, depth: u32, mode: TraversalMode) -> Self {
        Self::with_roots(vec![root], depth, mode)
    }

    pub fn with_roots(roots: Vec<NodeId>, depth: u32, mode: TraversalMode) -> Self {
        Self {
            roots,
            depth,
            mode,
            ..Default::default()
        }
    }

    pub fn management(mut self, enabled: bool) -> Self {
        self.management_enabled = enabled;
        self
    }

    pub fn hide(mut self, ids: impl IntoIterator<Item = NodeId>) -> Self {
        self.hidden.extend(ids);
        self
    }

    pub fn reveal(mut self, ids: impl IntoIterator<Item = NodeId>) -> Self {
        self.temporarily_visible.extend(ids);
        self
    }

    pub fn allow_orgs(mut self, ids: impl IntoIterator<Item = NodeId>) -> Self {
        self.allowed_orgs = Some(ids.into_iter().collect());
        self
    }

    #[inline]
    pub fn is_hidden(&self, id: NodeId) -> bool {
        self.hidden.contains(&id) && !self.temporarily_visible.contains(&id)
    }
}

/// The same request as the host sends it, naming nodes by string id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubgraphQuery {
    pub start_ids: Vec<String>,
    pub depth: u32,
    pub direction: TraversalMode,
    pub management_enabled: bool,
    pub hidden_node_ids: Vec<String>,
    pub temporarily_visible_ids: Vec<String>,
    pub allowed_org_ids: Option<Vec<String>>,
}

impl SubgraphQuery {
    /// Resolve string ids. Unknown ids are ignored; with no known start id
    /// the request yields an empty result.
    pub fn resolve(&self, dataset: &Dataset) -> SubgraphRequest {
        let lookup = |keys: &[String]| -> Vec<NodeId> {
            keys.iter().filter_map(|k| dataset.id_of(k)).collect()
        };
        SubgraphRequest {
            roots: lookup(&self.start_ids),
            depth: self.depth,
            mode: self.direction,
            management_enabled: self.management_enabled,
            hidden: lookup(&self.hidden_node_ids).into_iter().collect(),
            temporarily_visible: lookup(&self.temporarily_visible_ids).into_iter().collect(),
            allowed_orgs: self
                .allowed_org_ids
                .as_deref()
                .map(|keys| lookup(keys).into_iter().collect()),
        }
    }
}

/// A selected node and its BFS distance from the nearest root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubgraphNode {
    pub id: NodeId,
    pub level: u32,
}

/// Outcome of one subgraph computation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubgraphResult {
    /// Requested roots that survived every filter, in request order. May be
    /// empty while `nodes` is not, e.g. when the root was hidden.
    pub roots: Vec<NodeId>,
    pub nodes: Vec<SubgraphNode>,
    pub links: Vec<Link>,
    pub legend_orgs: HashSet<NodeId>,
    pub legend_org_levels: HashMap<NodeId, u32>,
    /// Nodes removed by the hidden filter in this call.
    pub hidden_count: usize,
}

impl SubgraphResult {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().map(|n| n.id)
    }

    pub fn id_set(&self) -> HashSet<NodeId> {
        self.ids().collect()
    }

    pub fn level_of(&self, id: NodeId) -> Option<u32> {
        self.nodes.iter().find(|n| n.id == id).map(|n| n.level)
    }

    /// Host-facing form with string ids.
    pub fn to_view(&self, dataset: &Dataset) -> SubgraphView {
        let key = |id: NodeId| dataset.key_of(id).unwrap_or_default().to_string();
        SubgraphView {
            nodes: self
                .nodes
                .iter()
                .filter_map(|n| {
                    let node = dataset.node(n.id)?;
                    Some(NodeView {
                        id: node.key.clone(),
                        kind: node.kind,
                        label: node.label.clone(),
                        level: n.level,
                        is_basis: node.is_basis,
                    })
                })
                .collect(),
            links: self
                .links
                .iter()
                .map(|l| LinkView {
                    source: key(l.source),
                    target: key(l.target),
                })
                .collect(),
            legend_org_levels: self
                .legend_org_levels
                .iter()
                .map(|(&org, &level)| (key(org), level))
                .collect(),
            hidden_count: self.hidden_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeView {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: crate::graph::NodeKind,
    pub label: String,
    pub level: u32,
    pub is_basis: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkView {
    pub source: String,
    pub target: String,
}

/// Serialized subgraph; `legendOrgLevels` keys double as the legend org set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubgraphView {
    pub nodes: Vec<NodeView>,
    pub links: Vec<LinkView>,
    pub legend_org_levels: BTreeMap<String, u32>,
    pub hidden_count: usize,
}

/// Compute the visible subgraph for `request`.
///
/// Returns an empty result when none of the roots exist.
pub fn compute_subgraph(
    dataset: &Dataset,
    index: &GraphIndex,
    request: &SubgraphRequest,
) -> SubgraphResult {
    let roots: Vec<NodeId> = request
        .roots
        .iter()
        .copied()
        .filter(|&id| dataset.node(id).is_some())
        .collect();
    if roots.is_empty() {
        return SubgraphResult::default();
    }

    let adjacency = index.build_index(dataset, dataset.links());
    let hierarchy = index.hierarchy(dataset, dataset.links());

    let walk = traversal::traverse(&adjacency, &roots, request.depth, request.mode);
    let (legend_orgs, legend_org_levels) =
        legend::legend_orgs(dataset, &adjacency, &hierarchy, &walk.order, &walk.levels);

    let mut retained = Retained::from_levels(&walk.order, &walk.levels);
    let hidden_count = passes::filter_hidden(&mut retained, request);
    if request.management_enabled {
        passes::compact_management(&mut retained, dataset, &adjacency, &walk.levels, request);
    }
    passes::filter_orgs(&mut retained, dataset, request);

    let links = dataset
        .links()
        .iter()
        .filter(|l| retained.contains(l.source) && retained.contains(l.target))
        .copied()
        .collect();

    tracing::debug!(
        roots = roots.len(),
        visited = walk.order.len(),
        kept = retained.nodes.len(),
        hidden_count,
        "subgraph computed"
    );

    let roots = roots
        .into_iter()
        .filter(|&root| retained.contains(root))
        .collect();

    SubgraphResult {
        roots,
        nodes: retained
            .nodes
            .into_iter()
            .map(|(id, level)| SubgraphNode { id, level })
            .collect(),
        links,
        legend_orgs,
        legend_org_levels,
        hidden_count,
    }
}
