//! Org Graph - WASM Module
//!
//! This module provides the subgraph selection, layout and clustering engine
//! for the org-graph explorer. It is compiled to WebAssembly and exposes a
//! JavaScript-friendly API via wasm-bindgen.
//!
//! # Architecture
//!
//! - `graph`: dataset ingestion, cached adjacency/hierarchy index, engine
//! - `subgraph`: depth- and direction-bounded neighborhood selection
//! - `layout`: radial seeding of positions into a SoA position arena
//! - `cluster`: org membership polygons and hit-testing
//! - `forces`: simulation parameters and steady-state objectives
//! - `spatial`: R-tree spatial indexing for O(log n) hit testing

use std::collections::{BTreeMap, HashSet};

use js_sys::Float32Array;
use serde::Serialize;
use serde::de::DeserializeOwned;
use wasm_bindgen::prelude::*;

pub mod cluster;
pub mod error;
pub mod forces;
pub mod graph;
pub mod layout;
pub mod spatial;
pub mod subgraph;

use error::OrgGraphError;
use graph::{DatasetInput, LinkRecord, NodeId, OrgGraphEngine};
use subgraph::SubgraphQuery;

/// Initialize the WASM module.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

#[cfg(target_arch = "wasm32")]
fn report(err: &OrgGraphError) {
    web_sys::console::warn_1(&JsValue::from_str(&err.to_string()));
}

#[cfg(not(target_arch = "wasm32"))]
fn report(err: &OrgGraphError) {
    tracing::warn!(%err, "host call rejected");
}

fn js_error(err: OrgGraphError) -> JsValue {
    report(&err);
    JsValue::from_str(&err.to_string())
}

fn from_js<T: DeserializeOwned>(what: &'static str, value: JsValue) -> Result<T, JsValue> {
    serde_wasm_bindgen::from_value(value)
        .map_err(|err| js_error(OrgGraphError::invalid_input(what, err)))
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    // Plain objects rather than JS Maps for string-keyed maps.
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(JsValue::from)
}

/// Main entry point for the org-graph engine.
///
/// Nodes are addressed by their string ids at this boundary. Position
/// buffers are indexed by node slot; use `slotOf` / `keyOf` to translate.
#[wasm_bindgen]
pub struct OrgGraphWasm {
    engine: OrgGraphEngine,
}

#[wasm_bindgen]
impl OrgGraphWasm {
    /// Create an engine with an empty dataset.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            engine: OrgGraphEngine::new(),
        }
    }

    // =========================================================================
    // Dataset
    // =========================================================================

    /// Load `{ persons, orgs, links }`, replacing everything.
    ///
    /// Returns the ingestion counters (dropped duplicates, dangling links...).
    #[wasm_bindgen(js_name = loadDataset)]
    pub fn load_dataset(&mut self, input: JsValue) -> Result<JsValue, JsValue> {
        let input: DatasetInput = from_js("dataset", input)?;
        let stats = self.engine.load(&input);
        to_js(&stats)
    }

    /// Replace the links, keeping nodes and positions.
    #[wasm_bindgen(js_name = setLinks)]
    pub fn set_links(&mut self, links: JsValue) -> Result<(), JsValue> {
        let links: Vec<LinkRecord> = from_js("links", links)?;
        self.engine.set_links(&links);
        Ok(())
    }

    /// Drop cached indexes after the host edited the hierarchy.
    pub fn invalidate(&mut self) {
        self.engine.invalidate();
    }

    /// Number of node slots.
    #[wasm_bindgen(js_name = nodeCount)]
    pub fn node_count(&self) -> usize {
        self.engine.dataset().len()
    }

    /// Position-buffer slot of a node id.
    #[wasm_bindgen(js_name = slotOf)]
    pub fn slot_of(&self, id: &str) -> Option<u32> {
        self.engine.dataset().id_of(id).map(NodeId::raw)
    }

    /// Node id stored in a slot.
    #[wasm_bindgen(js_name = keyOf)]
    pub fn key_of(&self, slot: u32) -> Option<String> {
        self.engine.dataset().key_of(NodeId(slot)).map(str::to_string)
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Set node sizing (`personRadius`, `ringGap`, ...). Missing fields keep
    /// their defaults.
    #[wasm_bindgen(js_name = setStyle)]
    pub fn set_style(&mut self, style: JsValue) -> Result<(), JsValue> {
        let style = from_js("style", style)?;
        self.engine.set_style(style).map_err(js_error)
    }

    #[wasm_bindgen(js_name = setLayoutConfig)]
    pub fn set_layout_config(&mut self, config: JsValue) -> Result<(), JsValue> {
        let config = from_js("layout config", config)?;
        self.engine.set_layout_config(config).map_err(js_error)
    }

    #[wasm_bindgen(js_name = setForceParams)]
    pub fn set_force_params(&mut self, params: JsValue) -> Result<(), JsValue> {
        let params = from_js("force params", params)?;
        self.engine.set_force_params(params).map_err(js_error)
    }

    /// Select the steady-state objective (`free` / `leveled`, cluster
    /// attraction, band geometry).
    #[wasm_bindgen(js_name = setObjective)]
    pub fn set_objective(&mut self, objective: JsValue) -> Result<(), JsValue> {
        let objective = from_js("objective", objective)?;
        self.engine.set_objective(objective).map_err(js_error)
    }

    /// Set the number of decorative rings shown on a node.
    #[wasm_bindgen(js_name = setRingCount)]
    pub fn set_ring_count(&mut self, id: &str, rings: u32) -> Result<(), JsValue> {
        let node = self.engine.require(id).map_err(js_error)?;
        self.engine.set_ring_count(node, rings).map_err(js_error)
    }

    // =========================================================================
    // Pipeline
    // =========================================================================

    /// Compute and select the view for a query:
    /// `{ startIds, depth, direction, managementEnabled, hiddenNodeIds,
    /// temporarilyVisibleIds, allowedOrgIds }`.
    ///
    /// Returns `{ nodes, links, legendOrgLevels, hiddenCount }`.
    #[wasm_bindgen(js_name = computeSubgraph)]
    pub fn compute_subgraph(&mut self, query: JsValue) -> Result<JsValue, JsValue> {
        let query: SubgraphQuery = from_js("subgraph query", query)?;
        let request = query.resolve(self.engine.dataset());
        self.engine.compute_subgraph(request);
        let view = self.engine.view().subgraph.to_view(self.engine.dataset());
        to_js(&view)
    }

    /// Seed positions for nodes the current view added.
    ///
    /// Returns `{ mode, placed, fallback }`.
    pub fn layout(&mut self) -> Result<JsValue, JsValue> {
        let report = self.engine.layout();
        to_js(&report)
    }

    /// Rebuild org polygons from the current positions.
    ///
    /// `allowedOrgIds` may be null for every org. Returns
    /// `{ [orgId]: [[x, y], ...] }`.
    #[wasm_bindgen(js_name = computeClusters)]
    pub fn compute_clusters(&mut self, allowed_org_ids: JsValue) -> Result<JsValue, JsValue> {
        let allowed = self.allowed_orgs(allowed_org_ids)?;
        self.engine.compute_clusters(allowed.as_ref());
        let dataset = self.engine.dataset();
        let polygons: BTreeMap<&str, &[cluster::Point]> = self
            .engine
            .view()
            .clusters()
            .iter()
            .filter_map(|c| Some((dataset.key_of(c.org)?, c.polygon.as_slice())))
            .collect();
        to_js(&polygons)
    }

    /// Labels of the allowed orgs whose cluster contains the point, deepest
    /// org first.
    #[wasm_bindgen(js_name = labelsAtPoint)]
    pub fn labels_at_point(
        &self,
        x: f32,
        y: f32,
        allowed_org_ids: JsValue,
    ) -> Result<JsValue, JsValue> {
        let allowed = self.allowed_orgs(allowed_org_ids)?;
        to_js(&self.engine.labels_at_point([x, y], allowed.as_ref()))
    }

    /// Id of the view node drawn under the point, if any.
    #[wasm_bindgen(js_name = findNodeAt)]
    pub fn find_node_at(&mut self, x: f32, y: f32) -> Option<String> {
        let id = self.engine.find_node_at(x, y)?;
        self.engine.dataset().key_of(id).map(str::to_string)
    }

    /// Ids of `id` and everyone reporting to it.
    #[wasm_bindgen(js_name = collectReportSubtree)]
    pub fn collect_report_subtree(&self, id: &str) -> Result<JsValue, JsValue> {
        let root = self.engine.require(id).map_err(js_error)?;
        let dataset = self.engine.dataset();
        let mut keys: Vec<&str> = self
            .engine
            .collect_report_subtree(root)
            .into_iter()
            .filter_map(|n| dataset.key_of(n))
            .collect();
        keys.sort_unstable();
        to_js(&keys)
    }

    /// Simulation inputs for the current view:
    /// `{ params, collisionRadii, directional }`, keyed by slot.
    #[wasm_bindgen(js_name = forceSetup)]
    pub fn force_setup(&self) -> Result<JsValue, JsValue> {
        to_js(&self.engine.force_setup())
    }

    // =========================================================================
    // Positions (SoA buffers, indexed by slot)
    // =========================================================================

    /// Get a zero-copy view of X positions. NaN marks unplaced slots.
    ///
    /// # Safety
    ///
    /// The returned view is invalidated if any Rust allocation occurs.
    /// Use immediately, do not store.
    #[wasm_bindgen(js_name = getPositionsXView)]
    pub fn get_positions_x_view(&self) -> Float32Array {
        unsafe { Float32Array::view(self.engine.arena().positions_x()) }
    }

    /// Get a zero-copy view of Y positions.
    ///
    /// # Safety
    ///
    /// Same as `getPositionsXView`.
    #[wasm_bindgen(js_name = getPositionsYView)]
    pub fn get_positions_y_view(&self) -> Float32Array {
        unsafe { Float32Array::view(self.engine.arena().positions_y()) }
    }

    #[wasm_bindgen(js_name = getVelocitiesXView)]
    pub fn get_velocities_x_view(&self) -> Float32Array {
        unsafe { Float32Array::view(self.engine.arena().velocities_x()) }
    }

    #[wasm_bindgen(js_name = getVelocitiesYView)]
    pub fn get_velocities_y_view(&self) -> Float32Array {
        unsafe { Float32Array::view(self.engine.arena().velocities_y()) }
    }

    /// Get a pointer to the X positions buffer.
    ///
    /// Used for creating views after WASM memory growth.
    #[wasm_bindgen(js_name = positionsXPtr)]
    pub fn positions_x_ptr(&self) -> *const f32 {
        self.engine.arena().positions_x().as_ptr()
    }

    #[wasm_bindgen(js_name = positionsYPtr)]
    pub fn positions_y_ptr(&self) -> *const f32 {
        self.engine.arena().positions_y().as_ptr()
    }

    #[wasm_bindgen(js_name = positionsLen)]
    pub fn positions_len(&self) -> usize {
        self.engine.arena().len()
    }

    /// Slots of the current view's nodes, in view order.
    #[wasm_bindgen(js_name = viewSlots)]
    pub fn view_slots(&self) -> Vec<u32> {
        self.engine.view().subgraph.ids().map(NodeId::raw).collect()
    }

    /// Copy of the view's positions as `[x0, y0, x1, y1, ...]`, following
    /// `viewSlots` order.
    #[wasm_bindgen(js_name = getViewPositions)]
    pub fn get_view_positions(&self) -> Float32Array {
        let flat = self
            .engine
            .arena()
            .interleaved(self.engine.view().subgraph.ids());
        Float32Array::from(&flat[..])
    }

    /// Write back one node's state from the host simulation.
    #[wasm_bindgen(js_name = writeBack)]
    pub fn write_back(&mut self, slot: u32, x: f32, y: f32, vx: f32, vy: f32) {
        self.engine.write_back(NodeId(slot), x, y, vx, vy);
    }

    /// Write back every slot's position at once.
    #[wasm_bindgen(js_name = writePositions)]
    pub fn write_positions(&mut self, xs: &[f32], ys: &[f32]) -> Result<(), JsValue> {
        self.engine.write_back_all(xs, ys).map_err(js_error)
    }

    /// Forget every position; the next layout is a cold start.
    #[wasm_bindgen(js_name = resetPositions)]
    pub fn reset_positions(&mut self) {
        self.engine.reset_positions();
    }
}

impl OrgGraphWasm {
    fn allowed_orgs(&self, value: JsValue) -> Result<Option<HashSet<NodeId>>, JsValue> {
        if value.is_null() || value.is_undefined() {
            return Ok(None);
        }
        let keys: Vec<String> = from_js("allowed org ids", value)?;
        let dataset = self.engine.dataset();
        Ok(Some(keys.iter().filter_map(|k| dataset.id_of(k)).collect()))
    }
}

impl Default for OrgGraphWasm {
    fn default() -> Self {
        Self::new()
    }
}
