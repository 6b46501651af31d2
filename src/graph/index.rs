//! Graph index: adjacency, management lookup and org hierarchy.
//!
//! The adjacency stores the dataset's links in petgraph's StableGraph with
//! one graph node per dataset slot, so `NodeId(i)` is always `NodeIndex(i)`.
//! Edge weights carry the link's classified `LinkKind`.
//!
//! Building the index is the expensive step, so `GraphIndex` caches it keyed
//! by the identity (generation) of the `LinkSet` it was built from. The cache
//! is never invalidated by content: the host must call `invalidate()` after
//! editing nodes, links or the hierarchy.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

use petgraph::stable_graph::{NodeIndex, StableGraph};
use petgraph::visit::EdgeRef;
use petgraph::{Directed, Direction};

use super::dataset::Dataset;
use super::link::{LinkKind, LinkSet};
use super::node::{NodeId, NodeKind};

/// Forward and inverse adjacency over the whole dataset.
#[derive(Debug)]
pub struct Adjacency {
    graph: StableGraph<NodeId, LinkKind, Directed>,
    kinds: Vec<NodeKind>,
    manager_of: HashMap<NodeId, NodeId>,
}

impl Adjacency {
    fn build(dataset: &Dataset, links: &LinkSet) -> Self {
        let node_count = dataset.len();
        let mut graph = StableGraph::with_capacity(node_count, links.len());
        let mut kinds = Vec::with_capacity(node_count);
        for id in dataset.ids() {
            graph.add_node(id);
            kinds.push(dataset.nodes()[id.index()].kind);
        }

        let mut manager_of = HashMap::new();
        let mut dropped = 0usize;
        for link in links {
            if link.source.index() >= node_count || link.target.index() >= node_count {
                dropped += 1;
                continue;
            }
            let kind = LinkKind::classify(kinds[link.source.index()], kinds[link.target.index()]);
            if kind == LinkKind::Reports {
                manager_of.entry(link.target).or_insert(link.source);
            }
        }

        // petgraph walks a node's edge list newest-first; inserting in reverse
        // makes neighbor iteration follow link order.
        for link in links.iter().rev() {
            if link.source.index() >= node_count || link.target.index() >= node_count {
                continue;
            }
            let kind = LinkKind::classify(kinds[link.source.index()], kinds[link.target.index()]);
            graph.add_edge(
                NodeIndex::new(link.source.index()),
                NodeIndex::new(link.target.index()),
                kind,
            );
        }

        if dropped > 0 {
            tracing::debug!(dropped, "links with unknown endpoints skipped");
        }

        Self {
            graph,
            kinds,
            manager_of,
        }
    }

    fn index_of(&self, id: NodeId) -> Option<NodeIndex> {
        (id.index() < self.kinds.len()).then(|| NodeIndex::new(id.index()))
    }

    /// Targets of links leaving `id`, with the link kind.
    pub fn out(&self, id: NodeId) -> impl Iterator<Item = (NodeId, LinkKind)> + '_ {
        self.directed(id, Direction::Outgoing)
    }

    /// Sources of links entering `id`, with the link kind.
    pub fn inn(&self, id: NodeId) -> impl Iterator<Item = (NodeId, LinkKind)> + '_ {
        self.directed(id, Direction::Incoming)
    }

    fn directed(
        &self,
        id: NodeId,
        direction: Direction,
    ) -> impl Iterator<Item = (NodeId, LinkKind)> + '_ {
        self.index_of(id).into_iter().flat_map(move |index| {
            self.graph.edges_directed(index, direction).map(move |edge| {
                let other = match direction {
                    Direction::Outgoing => edge.target(),
                    Direction::Incoming => edge.source(),
                };
                (self.graph[other], *edge.weight())
            })
        })
    }

    /// Forward and inverse neighbors, forward first, without duplicates.
    pub fn neighbors(&self, id: NodeId) -> Vec<NodeId> {
        let mut seen = HashSet::new();
        self.out(id)
            .chain(self.inn(id))
            .filter_map(|(n, _)| seen.insert(n).then_some(n))
            .collect()
    }

    /// Direct manager of a person, if any.
    pub fn manager_of(&self, id: NodeId) -> Option<NodeId> {
        self.manager_of.get(&id).copied()
    }

    /// Orgs a person is a direct member of, in link order.
    pub fn memberships(&self, person: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.out(person)
            .filter(|&(_, kind)| kind == LinkKind::Membership)
            .map(|(org, _)| org)
    }

    /// Memberships with no child org among the person's other memberships.
    pub fn deepest_memberships(&self, person: NodeId, hierarchy: &OrgHierarchy) -> Vec<NodeId> {
        let all: Vec<NodeId> = self.memberships(person).collect();
        all.iter()
            .copied()
            .filter(|&org| {
                !all.iter()
                    .any(|&other| other != org && hierarchy.is_child_of(other, org))
            })
            .collect()
    }

    /// Number of managers above a person. Stops early on a reporting cycle.
    pub fn management_level(&self, person: NodeId) -> u32 {
        let mut level = 0;
        let mut seen = HashSet::from([person]);
        let mut current = person;
        while let Some(manager) = self.manager_of(current) {
            if !seen.insert(manager) {
                break;
            }
            level += 1;
            current = manager;
        }
        level
    }

    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.kinds.get(id.index()).copied()
    }

    pub fn node_count(&self) -> usize {
        self.kinds.len()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

/// Org parent/child structure derived from org → org links.
#[derive(Debug, Default)]
pub struct OrgHierarchy {
    parent_of: HashMap<NodeId, NodeId>,
    children: HashMap<NodeId, Vec<NodeId>>,
    roots: Vec<NodeId>,
}

impl OrgHierarchy {
    fn build(adjacency: &Adjacency) -> Self {
        let mut parent_of = HashMap::new();
        let mut children: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        let mut orgs = Vec::new();

        for slot in 0..adjacency.node_count() as u32 {
            let org = NodeId(slot);
            if adjacency.kind(org) != Some(NodeKind::Org) {
                continue;
            }
            orgs.push(org);
            for (child, kind) in adjacency.out(org) {
                if kind != LinkKind::OrgParent {
                    continue;
                }
                parent_of.entry(child).or_insert(org);
                let list = children.entry(org).or_default();
                if !list.contains(&child) {
                    list.push(child);
                }
            }
        }

        let roots = orgs
            .into_iter()
            .filter(|org| !parent_of.contains_key(org))
            .collect();

        Self {
            parent_of,
            children,
            roots,
        }
    }

    pub fn parent_of(&self, org: NodeId) -> Option<NodeId> {
        self.parent_of.get(&org).copied()
    }

    pub fn children(&self, org: NodeId) -> &[NodeId] {
        self.children.get(&org).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Orgs with no parent, in dataset order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// True when `child` is a direct child of `parent`.
    pub fn is_child_of(&self, child: NodeId, parent: NodeId) -> bool {
        self.children(parent).contains(&child)
    }

    /// `org` plus every org below it. Cycle-safe.
    pub fn descendants(&self, org: NodeId) -> HashSet<NodeId> {
        let mut seen = HashSet::from([org]);
        let mut stack = vec![org];
        while let Some(current) = stack.pop() {
            for &child in self.children(current) {
                if seen.insert(child) {
                    stack.push(child);
                }
            }
        }
        seen
    }

    /// Steps from `org` up to its root. Stops early on a parent cycle.
    pub fn depth_uncached(&self, org: NodeId) -> u32 {
        let mut depth = 0;
        let mut seen = HashSet::from([org]);
        let mut current = org;
        while let Some(parent) = self.parent_of(current) {
            if !seen.insert(parent) {
                break;
            }
            depth += 1;
            current = parent;
        }
        depth
    }
}

struct CachedIndex {
    generation: u64,
    adjacency: Rc<Adjacency>,
    hierarchy: Rc<OrgHierarchy>,
}

/// Host-owned cache of adjacency, hierarchy and org depths.
///
/// One instance per dataset; tests and multiple datasets never share state.
#[derive(Default)]
pub struct GraphIndex {
    cached: RefCell<Option<CachedIndex>>,
    depths: RefCell<HashMap<NodeId, u32>>,
    builds: Cell<u32>,
}

impl GraphIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adjacency for `links`, reusing the cached one for the same collection.
    pub fn build_index(&self, dataset: &Dataset, links: &LinkSet) -> Rc<Adjacency> {
        self.ensure(dataset, links).0
    }

    /// Org hierarchy for `links`, cached alongside the adjacency.
    pub fn hierarchy(&self, dataset: &Dataset, links: &LinkSet) -> Rc<OrgHierarchy> {
        self.ensure(dataset, links).1
    }

    fn ensure(&self, dataset: &Dataset, links: &LinkSet) -> (Rc<Adjacency>, Rc<OrgHierarchy>) {
        if let Some(cached) = &*self.cached.borrow() {
            if cached.generation == links.generation() {
                return (cached.adjacency.clone(), cached.hierarchy.clone());
            }
        }

        let adjacency = Rc::new(Adjacency::build(dataset, links));
        let hierarchy = Rc::new(OrgHierarchy::build(&adjacency));
        tracing::debug!(
            generation = links.generation(),
            nodes = adjacency.node_count(),
            edges = adjacency.edge_count(),
            "graph index rebuilt"
        );
        *self.cached.borrow_mut() = Some(CachedIndex {
            generation: links.generation(),
            adjacency: adjacency.clone(),
            hierarchy: hierarchy.clone(),
        });
        // Depths derive from the hierarchy just replaced.
        self.depths.borrow_mut().clear();
        self.builds.set(self.builds.get() + 1);
        (adjacency, hierarchy)
    }

    /// Depth of `org` below its root, memoized per org.
    pub fn org_depth(&self, org: NodeId, hierarchy: &OrgHierarchy) -> u32 {
        if let Some(&depth) = self.depths.borrow().get(&org) {
            return depth;
        }
        let depth = hierarchy.depth_uncached(org);
        self.depths.borrow_mut().insert(org, depth);
        depth
    }

    /// Forget memoized org depths (hierarchy edited).
    pub fn invalidate_depths(&self) {
        self.depths.borrow_mut().clear();
    }

    /// Forget everything (dataset or links edited).
    pub fn invalidate(&self) {
        self.cached.borrow_mut().take();
        self.invalidate_depths();
    }

    /// Number of index builds so far.
    pub fn build_count(&self) -> u32 {
        self.builds.get()
    }
}

/// `root` plus everyone below it along reporting lines.
///
/// Used to find what a "hide subtree" action affects.
pub fn collect_report_subtree(adjacency: &Adjacency, root: NodeId) -> HashSet<NodeId> {
    let mut seen = HashSet::new();
    if root.index() >= adjacency.node_count() {
        return seen;
    }
    seen.insert(root);
    let mut queue = VecDeque::from([root]);
    while let Some(current) = queue.pop_front() {
        for (report, kind) in adjacency.out(current) {
            if kind == LinkKind::Reports && seen.insert(report) {
                queue.push_back(report);
            }
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::fixtures::{dataset, scenario};

    fn id(ds: &Dataset, key: &str) -> NodeId {
        ds.id_of(key).unwrap()
    }

    #[test]
    fn test_forward_and_inverse() {
        let ds = scenario();
        let index = GraphIndex::new();
        let adj = index.build_index(&ds, ds.links());

        let out: Vec<_> = adj.out(id(&ds, "p1")).map(|(n, _)| n).collect();
        assert_eq!(out, vec![id(&ds, "p2"), id(&ds, "o1")]);

        let inn: Vec<_> = adj.inn(id(&ds, "o2")).collect();
        assert_eq!(
            inn,
            vec![
                (id(&ds, "p2"), LinkKind::Membership),
                (id(&ds, "o1"), LinkKind::OrgParent)
            ]
        );
    }

    #[test]
    fn test_manager_of_person_links_only() {
        let ds = scenario();
        let adj = GraphIndex::new().build_index(&ds, ds.links());
        assert_eq!(adj.manager_of(id(&ds, "p3")), Some(id(&ds, "p2")));
        assert_eq!(adj.manager_of(id(&ds, "p1")), None);
        // o2 has an org parent, not a manager
        assert_eq!(adj.manager_of(id(&ds, "o2")), None);
    }

    #[test]
    fn test_management_level() {
        let ds = scenario();
        let adj = GraphIndex::new().build_index(&ds, ds.links());
        assert_eq!(adj.management_level(id(&ds, "p1")), 0);
        assert_eq!(adj.management_level(id(&ds, "p3")), 2);

        let ring = dataset(&["a", "b", "c"], &[], &[("a", "b"), ("b", "c"), ("c", "a")]);
        let adj = GraphIndex::new().build_index(&ring, ring.links());
        assert_eq!(adj.management_level(id(&ring, "a")), 2);
    }

    #[test]
    fn test_deepest_memberships() {
        let ds = dataset(
            &["p"],
            &["parent", "child", "other"],
            &[
                ("parent", "child"),
                ("p", "parent"),
                ("p", "child"),
                ("p", "other"),
            ],
        );
        let index = GraphIndex::new();
        let adj = index.build_index(&ds, ds.links());
        let hierarchy = index.hierarchy(&ds, ds.links());
        assert_eq!(
            adj.deepest_memberships(id(&ds, "p"), &hierarchy),
            vec![id(&ds, "child"), id(&ds, "other")]
        );
    }

    #[test]
    fn test_cache_identity() {
        let ds = scenario();
        let index = GraphIndex::new();

        let a = index.build_index(&ds, ds.links());
        let b = index.build_index(&ds, ds.links());
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(index.build_count(), 1);

        // Same content, different instance: rebuilt.
        let copy = ds.links().clone();
        let c = index.build_index(&ds, &copy);
        assert!(!Rc::ptr_eq(&a, &c));
        assert_eq!(index.build_count(), 2);
    }

    #[test]
    fn test_invalidate_forces_rebuild() {
        let ds = scenario();
        let index = GraphIndex::new();
        let a = index.build_index(&ds, ds.links());
        index.invalidate();
        let b = index.build_index(&ds, ds.links());
        assert!(!Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_hierarchy() {
        let ds = dataset(&[], &["root", "a", "b", "c"], &[("root", "a"), ("a", "b"), ("root", "c")]);
        let index = GraphIndex::new();
        let h = index.hierarchy(&ds, ds.links());

        assert_eq!(h.roots(), &[id(&ds, "root")]);
        assert_eq!(h.parent_of(id(&ds, "b")), Some(id(&ds, "a")));
        assert_eq!(h.children(id(&ds, "root")), &[id(&ds, "a"), id(&ds, "c")]);
        assert!(h.is_child_of(id(&ds, "a"), id(&ds, "root")));

        assert_eq!(index.org_depth(id(&ds, "root"), &h), 0);
        assert_eq!(index.org_depth(id(&ds, "b"), &h), 2);

        let below_a = h.descendants(id(&ds, "a"));
        assert_eq!(below_a, HashSet::from([id(&ds, "a"), id(&ds, "b")]));
    }

    #[test]
    fn test_org_depth_cycle_terminates() {
        // x -> y -> z -> x
        let ds = dataset(&[], &["x", "y", "z"], &[("x", "y"), ("y", "z"), ("z", "x")]);
        let index = GraphIndex::new();
        let h = index.hierarchy(&ds, ds.links());
        assert!(h.roots().is_empty());
        assert_eq!(index.org_depth(id(&ds, "x"), &h), 2);
        assert_eq!(h.descendants(id(&ds, "x")).len(), 3);
    }

    #[test]
    fn test_org_depth_memoized_until_invalidated() {
        let ds = dataset(&[], &["a", "b"], &[("a", "b")]);
        let index = GraphIndex::new();
        let h = index.hierarchy(&ds, ds.links());
        assert_eq!(index.org_depth(id(&ds, "b"), &h), 1);

        // A flat hierarchy would say 0, but the memo still answers 1.
        let flat = OrgHierarchy::default();
        assert_eq!(index.org_depth(id(&ds, "b"), &flat), 1);

        index.invalidate_depths();
        assert_eq!(index.org_depth(id(&ds, "b"), &flat), 0);
    }

    #[test]
    fn test_collect_report_subtree() {
        let ds = dataset(
            &["boss", "m1", "m2", "ic1", "ic2"],
            &["team"],
            &[
                ("boss", "m1"),
                ("boss", "m2"),
                ("m1", "ic1"),
                ("m2", "ic2"),
                ("m1", "team"),
            ],
        );
        let adj = GraphIndex::new().build_index(&ds, ds.links());

        let subtree = collect_report_subtree(&adj, id(&ds, "m1"));
        assert_eq!(subtree, HashSet::from([id(&ds, "m1"), id(&ds, "ic1")]));

        let all = collect_report_subtree(&adj, id(&ds, "boss"));
        assert_eq!(all.len(), 5);
        assert!(!all.contains(&id(&ds, "team")));

        assert!(collect_report_subtree(&adj, NodeId(99)).is_empty());
    }
}
