//! Radial initial placement.
//!
//! Seeds positions for a subgraph before the host's force relaxation takes
//! over. Two modes share the `place_on_circle` primitive:
//!
//! - **Cold start** (no subgraph node has a position yet): roots are placed
//!   left to right starting at the canvas center, and each root's
//!   neighborhood is expanded breadth-first, ringing every node's unplaced
//!   neighbors around it. At a root, managers/parents are centered on north
//!   and reports/children follow on the rest of the ring, so the two
//!   separate from the first ring on. Roots filtered out of the view are
//!   skipped.
//! - **Warm update**: every node placed before keeps `x, y, vx, vy`
//!   untouched. New nodes grow outward from the placed frontier.
//!
//! Anything still unplaced afterwards (a fragment with no placed neighbor)
//! gets a jittered spot near the canvas center.

use std::collections::{HashMap, HashSet, VecDeque};
use std::f32::consts::{FRAC_PI_2, TAU};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::graph::NodeId;
use crate::subgraph::SubgraphResult;

use super::LayoutConfig;
use super::positions::PositionArena;
use super::style::NodeSizing;

/// Which placement mode a layout call used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    Cold,
    Warm,
}

/// Summary of one layout call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LayoutReport {
    pub mode: LayoutMode,
    /// Nodes placed on circles by this call.
    pub placed: usize,
    /// Nodes that fell back to a jittered center position.
    pub fallback: usize,
}

/// Place `nodes` evenly on a circle, the first at `start_angle`.
pub fn place_on_circle(
    arena: &mut PositionArena,
    nodes: &[NodeId],
    center_x: f32,
    center_y: f32,
    radius: f32,
    start_angle: f32,
) {
    let step = TAU / nodes.len().max(1) as f32;
    for (i, &id) in nodes.iter().enumerate() {
        let angle = start_angle + step * i as f32;
        arena.place(
            id,
            center_x + radius * angle.cos(),
            center_y + radius * angle.sin(),
        );
    }
}

/// Ring a root's neighbors with managers/parents at north.
///
/// Alone, each side gets the whole circle: up from north, down from east.
/// Together they share one even spacing, the up arc centered on north and
/// the down arc following it clockwise, so no slot is used twice.
fn place_split(
    arena: &mut PositionArena,
    up: &[NodeId],
    down: &[NodeId],
    center_x: f32,
    center_y: f32,
    radius: f32,
) {
    if up.is_empty() || down.is_empty() {
        place_on_circle(arena, down, center_x, center_y, radius, 0.0);
        place_on_circle(arena, up, center_x, center_y, radius, -FRAC_PI_2);
        return;
    }
    let step = TAU / (up.len() + down.len()) as f32;
    let up_start = -FRAC_PI_2 - step * (up.len() - 1) as f32 / 2.0;
    let down_start = up_start + step * up.len() as f32;
    for (i, &id) in up.iter().enumerate() {
        let angle = up_start + step * i as f32;
        arena.place(id, center_x + radius * angle.cos(), center_y + radius * angle.sin());
    }
    for (i, &id) in down.iter().enumerate() {
        let angle = down_start + step * i as f32;
        arena.place(id, center_x + radius * angle.cos(), center_y + radius * angle.sin());
    }
}

/// Neighbors within the subgraph, derived from its projected links.
struct LocalAdjacency {
    down: HashMap<NodeId, Vec<NodeId>>,
    up: HashMap<NodeId, Vec<NodeId>>,
}

impl LocalAdjacency {
    fn new(subgraph: &SubgraphResult) -> Self {
        let mut down: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        let mut up: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        for link in &subgraph.links {
            down.entry(link.source).or_default().push(link.target);
            up.entry(link.target).or_default().push(link.source);
        }
        Self { down, up }
    }

    fn down(&self, id: NodeId) -> &[NodeId] {
        self.down.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    fn up(&self, id: NodeId) -> &[NodeId] {
        self.up.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Seed positions for every node of `subgraph` that lacks one.
pub fn layout_subgraph(
    arena: &mut PositionArena,
    subgraph: &SubgraphResult,
    sizing: &NodeSizing<'_>,
    config: &LayoutConfig,
) -> LayoutReport {
    let local = LocalAdjacency::new(subgraph);
    let ids: Vec<NodeId> = subgraph.ids().collect();
    let warm = ids.iter().any(|&id| arena.is_placed(id));
    let (center_x, center_y) = config.center();

    let mut placer = Placer {
        arena,
        local: &local,
        sizing,
        ring_padding: config.ring_padding,
        placed: 0,
    };

    let mode = if warm {
        let frontier: Vec<NodeId> = ids
            .iter()
            .copied()
            .filter(|&id| placer.arena.is_placed(id) && placer.has_unplaced_neighbor(id))
            .collect();
        placer.expand(&frontier, false);
        LayoutMode::Warm
    } else {
        // Only roots still in the view anchor rings; with none left, the
        // first view node stands in.
        let view = subgraph.id_set();
        let mut anchors: Vec<NodeId> = subgraph
            .roots
            .iter()
            .copied()
            .filter(|root| view.contains(root))
            .collect();
        if anchors.is_empty() {
            anchors.extend(ids.first().copied());
        }

        let mut first = true;
        for root in anchors {
            if placer.arena.is_placed(root) {
                continue;
            }
            let (x, y) = if first {
                (center_x, center_y)
            } else {
                match placer.arena.bounds(ids.iter().copied()) {
                    Some((_, _, max_x, _)) => {
                        (max_x + config.root_margin + sizing.outer_radius(root), center_y)
                    }
                    None => (center_x, center_y),
                }
            };
            first = false;
            placer.arena.place(root, x, y);
            placer.placed += 1;
            placer.expand(&[root], true);
        }
        LayoutMode::Cold
    };

    let placed = placer.placed;
    let fallback = place_fallbacks(arena, &ids, config);

    let report = LayoutReport {
        mode,
        placed,
        fallback,
    };
    tracing::debug!(?report, nodes = ids.len(), "layout seeded");
    report
}

struct Placer<'a, 'b> {
    arena: &'a mut PositionArena,
    local: &'a LocalAdjacency,
    sizing: &'a NodeSizing<'b>,
    ring_padding: f32,
    placed: usize,
}

impl Placer<'_, '_> {
    fn has_unplaced_neighbor(&self, id: NodeId) -> bool {
        self.local
            .down(id)
            .iter()
            .chain(self.local.up(id))
            .any(|&n| !self.arena.is_placed(n))
    }

    /// Breadth-first ringing from `seeds`. With `split_roots`, the seeds'
    /// own up and down neighbors start at different angles.
    fn expand(&mut self, seeds: &[NodeId], split_roots: bool) {
        let mut queue: VecDeque<(NodeId, bool)> =
            seeds.iter().map(|&id| (id, split_roots)).collect();
        let mut down = Vec::new();
        let mut up = Vec::new();

        while let Some((parent, split)) = queue.pop_front() {
            let Some((x, y)) = self.arena.position(parent) else {
                continue;
            };

            let mut claimed = HashSet::new();
            down.clear();
            up.clear();
            for &n in self.local.down(parent) {
                if !self.arena.is_placed(n) && claimed.insert(n) {
                    down.push(n);
                }
            }
            for &n in self.local.up(parent) {
                if !self.arena.is_placed(n) && claimed.insert(n) {
                    up.push(n);
                }
            }
            if down.is_empty() && up.is_empty() {
                continue;
            }

            let radius = self.sizing.outer_radius(parent) + self.ring_padding;
            if split {
                place_split(self.arena, &up, &down, x, y, radius);
            } else {
                down.append(&mut up);
                place_on_circle(self.arena, &down, x, y, radius, 0.0);
            }

            for &n in down.iter().chain(&up) {
                self.placed += 1;
                queue.push_back((n, false));
            }
        }
    }
}

/// Jittered center positions for whatever is still unplaced.
fn place_fallbacks(arena: &mut PositionArena, ids: &[NodeId], config: &LayoutConfig) -> usize {
    let (center_x, center_y) = config.center();
    let jitter = if config.fallback_jitter.is_finite() {
        config.fallback_jitter.abs()
    } else {
        0.0
    };
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut count = 0;
    for &id in ids {
        if arena.is_placed(id) {
            continue;
        }
        let dx = rng.gen_range(-jitter..=jitter);
        let dy = rng.gen_range(-jitter..=jitter);
        arena.place(id, center_x + dx, center_y + dy);
        count += 1;
    }
    if count > 0 {
        tracing::debug!(count, "disconnected nodes placed near center");
    }
    count
}
