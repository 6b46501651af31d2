//! OrgGraphEngine - the host-owned pipeline state.
//!
//! Ties the loaded dataset to its cached index, the position arena and the
//! current view. The pipeline per interaction is:
//! 1. `compute_subgraph` selects the view
//! 2. `layout` seeds positions for nodes the view added
//! 3. the host relaxes positions and writes them back
//! 4. `compute_clusters` derives org polygons from the live positions

use std::collections::{HashMap, HashSet};

use super::dataset::{Dataset, DatasetInput, IngestStats};
use super::index::{GraphIndex, collect_report_subtree};
use super::link::LinkRecord;
use super::node::{NodeId, NodeKind};
use crate::cluster::{ClusterSet, Point, compute_memberships};
use crate::error::{OrgGraphError, Result};
use crate::forces::{ForceContext, ForceParams, ForceSetup, ObjectiveConfig};
use crate::layout::{
    LayoutConfig, LayoutReport, NodeSizing, PositionArena, StyleConfig, layout_subgraph,
};
use crate::spatial::SpatialIndex;
use crate::subgraph::{SubgraphRequest, SubgraphResult, compute_subgraph};

/// What is currently on screen and the indexes derived from it.
#[derive(Default)]
pub struct ViewState {
    pub request: SubgraphRequest,
    pub subgraph: SubgraphResult,
    clusters: ClusterSet,
    spatial: SpatialIndex,
    /// Positions moved since the spatial index was built.
    spatial_dirty: bool,
}

impl ViewState {
    pub fn clusters(&self) -> &ClusterSet {
        &self.clusters
    }
}

/// The org-graph engine.
///
/// This struct manages:
/// - The dataset and its cached adjacency/hierarchy index
/// - Position/velocity buffers in SoA layout
/// - Active decorative ring counts per node
/// - The current view, its clusters and a spatial index for hit testing
#[derive(Default)]
pub struct OrgGraphEngine {
    dataset: Dataset,
    index: GraphIndex,
    arena: PositionArena,
    rings: HashMap<NodeId, u32>,
    style: StyleConfig,
    layout_config: LayoutConfig,
    force_params: ForceParams,
    objective: ObjectiveConfig,
    view: ViewState,
}

impl OrgGraphEngine {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Dataset
    // =========================================================================

    /// Replace the dataset. Positions, rings and the view are reset.
    pub fn load(&mut self, input: &DatasetInput) -> IngestStats {
        self.dataset = Dataset::from_input(input);
        self.index.invalidate();
        self.arena.reset(self.dataset.len());
        self.rings.clear();
        self.view = ViewState::default();

        let stats = self.dataset.stats();
        tracing::info!(
            nodes = self.dataset.len(),
            links = self.dataset.links().len(),
            ?stats,
            "dataset loaded"
        );
        stats
    }

    /// Replace the link collection, keeping nodes and positions.
    ///
    /// The current view is recomputed against the new links.
    pub fn set_links(&mut self, records: &[LinkRecord]) {
        self.dataset.set_links(records);
        self.index.invalidate();
        let request = std::mem::take(&mut self.view.request);
        self.compute_subgraph(request);
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn index(&self) -> &GraphIndex {
        &self.index
    }

    /// Drop every cached index after an external edit.
    pub fn invalidate(&mut self) {
        self.index.invalidate();
        self.view.spatial_dirty = true;
    }

    /// Resolve a host key, failing when it is not in the dataset.
    pub fn require(&self, key: &str) -> Result<NodeId> {
        self.dataset
            .id_of(key)
            .ok_or_else(|| OrgGraphError::UnknownNode(key.to_string()))
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    pub fn style(&self) -> &StyleConfig {
        &self.style
    }

    pub fn set_style(&mut self, style: StyleConfig) -> Result<()> {
        style.validate()?;
        self.style = style;
        Ok(())
    }

    pub fn layout_config(&self) -> &LayoutConfig {
        &self.layout_config
    }

    pub fn set_layout_config(&mut self, config: LayoutConfig) -> Result<()> {
        config.validate()?;
        self.layout_config = config;
        Ok(())
    }

    pub fn set_force_params(&mut self, params: ForceParams) -> Result<()> {
        params.validate()?;
        self.force_params = params;
        Ok(())
    }

    pub fn set_objective(&mut self, objective: ObjectiveConfig) -> Result<()> {
        objective.validate()?;
        self.objective = objective;
        Ok(())
    }

    /// Set the number of active decorative rings on a node.
    pub fn set_ring_count(&mut self, id: NodeId, rings: u32) -> Result<()> {
        if self.dataset.node(id).is_none() {
            return Err(OrgGraphError::UnknownNode(id.to_string()));
        }
        if rings == 0 {
            self.rings.remove(&id);
        } else {
            self.rings.insert(id, rings);
        }
        Ok(())
    }

    pub fn ring_count(&self, id: NodeId) -> u32 {
        self.rings.get(&id).copied().unwrap_or(0)
    }

    fn sizing(&self) -> NodeSizing<'_> {
        NodeSizing::new(&self.style, &self.dataset, &self.rings)
    }

    // =========================================================================
    // Pipeline
    // =========================================================================

    /// Select the view for `request` and make it current.
    pub fn compute_subgraph(&mut self, request: SubgraphRequest) -> &SubgraphResult {
        let subgraph = compute_subgraph(&self.dataset, &self.index, &request);
        self.view.request = request;
        self.view.subgraph = subgraph;
        self.view.clusters = ClusterSet::default();
        self.view.spatial_dirty = true;
        &self.view.subgraph
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    /// Seed positions for the current view.
    pub fn layout(&mut self) -> LayoutReport {
        let sizing = NodeSizing::new(&self.style, &self.dataset, &self.rings);
        let report = layout_subgraph(
            &mut self.arena,
            &self.view.subgraph,
            &sizing,
            &self.layout_config,
        );
        self.view.spatial_dirty = true;
        report
    }

    /// Rebuild org polygons from live positions.
    ///
    /// `allowed = None` builds a cluster for every org with visible members.
    pub fn compute_clusters(&mut self, allowed: Option<&HashSet<NodeId>>) -> &ClusterSet {
        let adjacency = self.index.build_index(&self.dataset, self.dataset.links());
        let hierarchy = self.index.hierarchy(&self.dataset, self.dataset.links());

        let persons: Vec<NodeId> = self
            .view
            .subgraph
            .ids()
            .filter(|&id| self.dataset.is_person(id))
            .collect();
        let orgs: Vec<NodeId> = self
            .dataset
            .ids()
            .filter(|&id| self.dataset.is_org(id))
            .collect();

        let memberships = compute_memberships(&persons, &orgs, allowed, &adjacency, &hierarchy);
        self.view.clusters = ClusterSet::build(
            &memberships,
            &self.arena,
            self.style.base_radius(NodeKind::Person),
            self.style.cluster_padding,
        );
        &self.view.clusters
    }

    /// Org labels under a point, deepest first.
    pub fn labels_at_point(&self, point: Point, allowed: Option<&HashSet<NodeId>>) -> Vec<String> {
        let hierarchy = self.index.hierarchy(&self.dataset, self.dataset.links());
        self.view.clusters.labels_at_point(
            point,
            allowed,
            |org| self.index.org_depth(org, &hierarchy),
            |org| self.dataset.label_of(org),
        )
    }

    /// The view node whose rendered disc covers the point.
    pub fn find_node_at(&mut self, x: f32, y: f32) -> Option<NodeId> {
        if self.view.spatial_dirty {
            self.view.spatial = SpatialIndex::from_arena(&self.arena, self.view.subgraph.ids());
            self.view.spatial_dirty = false;
        }
        let sizing = self.sizing();
        let max_radius = self
            .view
            .subgraph
            .ids()
            .map(|id| sizing.outer_radius(id))
            .fold(0.0f32, f32::max);
        self.view
            .spatial
            .hit_test(x, y, max_radius, |id| sizing.outer_radius(id))
    }

    /// `root` plus everyone reporting to it, directly or not.
    pub fn collect_report_subtree(&self, root: NodeId) -> HashSet<NodeId> {
        let adjacency = self.index.build_index(&self.dataset, self.dataset.links());
        collect_report_subtree(&adjacency, root)
    }

    /// Simulation inputs for the current view.
    pub fn force_setup(&self) -> ForceSetup {
        let adjacency = self.index.build_index(&self.dataset, self.dataset.links());
        let hierarchy = self.index.hierarchy(&self.dataset, self.dataset.links());
        let context = ForceContext {
            dataset: &self.dataset,
            adjacency: &adjacency,
            hierarchy: &hierarchy,
            subgraph: &self.view.subgraph,
            center: self.layout_config.center(),
        };
        ForceSetup::build(&self.force_params, &self.objective, &self.sizing(), &context)
    }

    // =========================================================================
    // Positions
    // =========================================================================

    pub fn arena(&self) -> &PositionArena {
        &self.arena
    }

    /// Store the state of the host's relaxation pass for one node.
    pub fn write_back(&mut self, id: NodeId, x: f32, y: f32, vx: f32, vy: f32) {
        self.arena.write_back(id, x, y, vx, vy);
        self.view.spatial_dirty = true;
    }

    /// Store whole position buffers, one entry per slot.
    pub fn write_back_all(&mut self, xs: &[f32], ys: &[f32]) -> Result<()> {
        if xs.len() != self.arena.len() || ys.len() != self.arena.len() {
            return Err(OrgGraphError::InvalidInput {
                what: "positions",
                message: format!(
                    "expected {} entries, got {} x and {} y",
                    self.arena.len(),
                    xs.len(),
                    ys.len()
                ),
            });
        }
        for (i, (&x, &y)) in xs.iter().zip(ys).enumerate() {
            let id = NodeId(i as u32);
            let (vx, vy) = self.arena.velocity(id).unwrap_or((0.0, 0.0));
            self.arena.write_back(id, x, y, vx, vy);
        }
        self.view.spatial_dirty = true;
        Ok(())
    }

    /// Forget every position.
    pub fn reset_positions(&mut self) {
        self.arena.reset(self.dataset.len());
        self.view.spatial_dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{OrgRecord, PersonRecord};
    use crate::layout::LayoutMode;
    use crate::subgraph::TraversalMode;

    fn scenario_input() -> DatasetInput {
        DatasetInput {
            persons: ["p1", "p2", "p3"].into_iter().map(PersonRecord::new).collect(),
            orgs: ["o1", "o2"].into_iter().map(OrgRecord::new).collect(),
            links: [
                ("p1", "p2"),
                ("p2", "p3"),
                ("p1", "o1"),
                ("p2", "o2"),
                ("o1", "o2"),
            ]
            .into_iter()
            .map(|(s, t)| LinkRecord::new(s, t))
            .collect(),
        }
    }

    fn loaded() -> OrgGraphEngine {
        let mut engine = OrgGraphEngine::new();
        engine.load(&scenario_input());
        engine
    }

    #[test]
    fn test_load_resets_state() {
        let mut engine = loaded();
        let p1 = engine.require("p1").unwrap();
        engine.set_ring_count(p1, 2).unwrap();
        engine.compute_subgraph(SubgraphRequest::new(p1, 1, TraversalMode::Down));
        engine.layout();
        assert!(engine.arena().placed_count() > 0);

        let stats = engine.load(&scenario_input());
        assert_eq!(stats, IngestStats::default());
        assert_eq!(engine.arena().len(), 5);
        assert_eq!(engine.arena().placed_count(), 0);
        assert_eq!(engine.ring_count(p1), 0);
        assert!(engine.view().subgraph.is_empty());
    }

    #[test]
    fn test_require_unknown_key() {
        let mut engine = loaded();
        assert_eq!(
            engine.require("nobody"),
            Err(OrgGraphError::UnknownNode("nobody".into()))
        );
        assert!(engine.set_ring_count(NodeId(99), 1).is_err());
    }

    #[test]
    fn test_cold_then_warm_layout() {
        let mut engine = loaded();
        let p1 = engine.require("p1").unwrap();

        engine.compute_subgraph(SubgraphRequest::new(p1, 1, TraversalMode::Down));
        let report = engine.layout();
        assert_eq!(report.mode, LayoutMode::Cold);
        let before = engine.arena().position(p1);

        engine.compute_subgraph(SubgraphRequest::new(p1, 2, TraversalMode::Down));
        let report = engine.layout();
        assert_eq!(report.mode, LayoutMode::Warm);
        assert_eq!(report.placed, 1);
        assert_eq!(engine.arena().position(p1), before);
    }

    #[test]
    fn test_clusters_and_labels() {
        let mut engine = loaded();
        let p1 = engine.require("p1").unwrap();
        engine.compute_subgraph(SubgraphRequest::new(p1, 2, TraversalMode::Down));
        engine.layout();

        let clusters = engine.compute_clusters(None);
        // o1 holds p1 and p2 (via o2), o2 holds p2
        assert_eq!(clusters.len(), 2);

        let p2 = engine.require("p2").unwrap();
        let (x, y) = engine.arena().position(p2).unwrap();
        let labels = engine.labels_at_point([x, y], None);
        assert_eq!(labels, vec!["o2", "o1"]);

        let o1 = engine.require("o1").unwrap();
        let only_o1 = HashSet::from([o1]);
        assert_eq!(engine.labels_at_point([x, y], Some(&only_o1)), vec!["o1"]);
    }

    #[test]
    fn test_find_node_at_follows_write_back() {
        let mut engine = loaded();
        let p1 = engine.require("p1").unwrap();
        engine.compute_subgraph(SubgraphRequest::new(p1, 0, TraversalMode::Down));
        engine.layout();

        let (x, y) = engine.arena().position(p1).unwrap();
        assert_eq!(engine.find_node_at(x + 3.0, y), Some(p1));
        assert_eq!(engine.find_node_at(x + 50.0, y), None);

        engine.write_back(p1, 500.0, 500.0, 0.0, 0.0);
        assert_eq!(engine.find_node_at(x, y), None);
        assert_eq!(engine.find_node_at(501.0, 500.0), Some(p1));
    }

    #[test]
    fn test_rings_widen_hit_area() {
        let mut engine = loaded();
        let p1 = engine.require("p1").unwrap();
        engine.compute_subgraph(SubgraphRequest::new(p1, 0, TraversalMode::Down));
        engine.layout();
        let (x, y) = engine.arena().position(p1).unwrap();

        assert_eq!(engine.find_node_at(x + 12.0, y), None);
        engine.set_ring_count(p1, 1).unwrap();
        assert_eq!(engine.find_node_at(x + 12.0, y), Some(p1));
    }

    #[test]
    fn test_set_links_invalidates_index() {
        let mut engine = loaded();
        let p1 = engine.require("p1").unwrap();
        assert_eq!(engine.collect_report_subtree(p1).len(), 3);

        engine.set_links(&[LinkRecord::new("p1", "p2")]);
        assert_eq!(engine.collect_report_subtree(p1).len(), 2);
    }

    #[test]
    fn test_set_links_recomputes_view() {
        let mut engine = loaded();
        let p1 = engine.require("p1").unwrap();
        let p3 = engine.require("p3").unwrap();
        engine.compute_subgraph(SubgraphRequest::new(p1, 2, TraversalMode::Down));
        engine.layout();
        assert_eq!(engine.view().subgraph.nodes.len(), 3);
        let before = engine.arena().position(p1);

        engine.set_links(&[LinkRecord::new("p1", "p2")]);
        let view = &engine.view().subgraph;
        assert_eq!(view.nodes.len(), 2);
        assert!(!view.id_set().contains(&p3));
        assert_eq!(view.links.len(), 1);
        assert_eq!(engine.arena().position(p1), before);
    }

    #[test]
    fn test_force_setup_covers_view() {
        let mut engine = loaded();
        let p1 = engine.require("p1").unwrap();
        engine.compute_subgraph(SubgraphRequest::new(p1, 2, TraversalMode::Down));
        let setup = engine.force_setup();
        assert_eq!(setup.collision_radii.len(), 3);
        assert!(setup.directional.is_empty());
    }

    #[test]
    fn test_config_validation() {
        let mut engine = loaded();
        let bad = StyleConfig {
            person_radius: -1.0,
            ..Default::default()
        };
        assert!(engine.set_style(bad).is_err());
        assert_eq!(engine.style(), &StyleConfig::default());
    }

    #[test]
    fn test_write_back_all_checks_length() {
        let mut engine = loaded();
        assert!(engine.write_back_all(&[0.0; 5], &[0.0; 5]).is_ok());
        assert_eq!(engine.arena().placed_count(), 5);
        assert!(engine.write_back_all(&[0.0; 2], &[0.0; 5]).is_err());
    }
}
