//! Force-simulation parameters and steady-state objectives.
//!
//! The host runs the physics tick; this module only hands it numbers:
//! scalar parameters, per-node collision radii and, depending on the
//! objective, extra directional forces with per-node targets.
//!
//! - **Free**: no directional force.
//! - **Leveled**: a Y force pulling each node to the band of its level.
//! - **Cluster attraction** (independent toggle): an XY force pulling each
//!   person toward the ring slot of its deepest org.
//!
//! Switching objectives only rebuilds the directional list; parameters and
//! collision radii are untouched.

use std::collections::{BTreeSet, HashMap};
use std::f32::consts::{FRAC_PI_2, TAU};

use serde::{Deserialize, Serialize};

use crate::error::{OrgGraphError, Result, ensure_non_negative};
use crate::graph::{Adjacency, Dataset, NodeId, OrgHierarchy};
use crate::layout::NodeSizing;
use crate::subgraph::SubgraphResult;

/// Scalar simulation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ForceParams {
    /// Rest length of link springs (default: 80.0).
    pub link_distance: f32,
    /// Link spring stiffness in 0..=1 (default: 0.7).
    pub link_strength: f32,
    /// Many-body strength, negative repels (default: -250.0).
    pub charge_strength: f32,
    /// Cooling rate per tick (default: 0.0228).
    pub alpha_decay: f32,
    /// Velocity friction per tick (default: 0.4).
    pub velocity_decay: f32,
    /// Pull toward the canvas center (default: 0.05).
    pub center_strength: f32,
}

impl Default for ForceParams {
    fn default() -> Self {
        Self {
            link_distance: 80.0,
            link_strength: 0.7,
            charge_strength: -250.0,
            alpha_decay: 0.0228,
            velocity_decay: 0.4,
            center_strength: 0.05,
        }
    }
}

impl ForceParams {
    pub fn validate(&self) -> Result<()> {
        ensure_non_negative("linkDistance", self.link_distance)?;
        ensure_non_negative("linkStrength", self.link_strength)?;
        ensure_non_negative("alphaDecay", self.alpha_decay)?;
        ensure_non_negative("velocityDecay", self.velocity_decay)?;
        ensure_non_negative("centerStrength", self.center_strength)?;
        if !self.charge_strength.is_finite() {
            return Err(OrgGraphError::InvalidConfig(
                "`chargeStrength` must be finite".into(),
            ));
        }
        Ok(())
    }
}

/// Steady-state layout objective.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Objective {
    #[default]
    Free,
    Leveled,
}

/// Where leveled bands take a node's level from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelSource {
    /// Distance from the nearest traversal root.
    #[default]
    Bfs,
    /// Managers above a person. Orgs keep their BFS level.
    Management,
}

/// Objective selection and its geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObjectiveConfig {
    pub objective: Objective,
    pub cluster_attraction: bool,
    pub level_source: LevelSource,
    /// Levels grouped into one band (default: 1).
    pub levels_per_band: u32,
    /// Y of the first band (default: 60.0).
    pub top: f32,
    /// Vertical distance between bands (default: 90.0).
    pub band_height: f32,
    /// Strength of the band force (default: 0.3).
    pub level_strength: f32,
    /// Radius of the org slot ring around the canvas center (default: 240.0).
    pub cluster_ring_radius: f32,
    /// Strength of the cluster pull (default: 0.08).
    pub cluster_strength: f32,
}

impl Default for ObjectiveConfig {
    fn default() -> Self {
        Self {
            objective: Objective::Free,
            cluster_attraction: false,
            level_source: LevelSource::Bfs,
            levels_per_band: 1,
            top: 60.0,
            band_height: 90.0,
            level_strength: 0.3,
            cluster_ring_radius: 240.0,
            cluster_strength: 0.08,
        }
    }
}

impl ObjectiveConfig {
    pub fn validate(&self) -> Result<()> {
        ensure_non_negative("bandHeight", self.band_height)?;
        ensure_non_negative("levelStrength", self.level_strength)?;
        ensure_non_negative("clusterRingRadius", self.cluster_ring_radius)?;
        ensure_non_negative("clusterStrength", self.cluster_strength)?;
        if !self.top.is_finite() {
            return Err(OrgGraphError::InvalidConfig("`top` must be finite".into()));
        }
        Ok(())
    }

    /// Target Y for a level.
    pub fn band_y(&self, level: u32) -> f32 {
        let band = level / self.levels_per_band.max(1);
        self.top + band as f32 * self.band_height
    }
}

/// A positional force with one target per affected node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DirectionalForce {
    /// Pull along Y toward `targets[i].1`.
    Y {
        strength: f32,
        targets: Vec<(u32, f32)>,
    },
    /// Pull toward the point `(targets[i].1, targets[i].2)`.
    Xy {
        strength: f32,
        targets: Vec<(u32, f32, f32)>,
    },
}

/// Everything the host's simulation needs for the current view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForceSetup {
    pub params: ForceParams,
    /// `(slot, radius)` for each view node.
    pub collision_radii: Vec<(u32, f32)>,
    pub directional: Vec<DirectionalForce>,
}

/// Graph context the directional forces read.
pub struct ForceContext<'a> {
    pub dataset: &'a Dataset,
    pub adjacency: &'a Adjacency,
    pub hierarchy: &'a OrgHierarchy,
    pub subgraph: &'a SubgraphResult,
    /// Canvas center for the cluster ring.
    pub center: (f32, f32),
}

impl ForceSetup {
    pub fn build(
        params: &ForceParams,
        objective: &ObjectiveConfig,
        sizing: &NodeSizing<'_>,
        context: &ForceContext<'_>,
    ) -> Self {
        let collision_radii = context
            .subgraph
            .ids()
            .map(|id| (id.raw(), sizing.collision_radius(id)))
            .collect();
        Self {
            params: params.clone(),
            collision_radii,
            directional: directional_forces(objective, context),
        }
    }

    /// Swap the directional forces for another objective.
    pub fn set_objective(&mut self, objective: &ObjectiveConfig, context: &ForceContext<'_>) {
        self.directional = directional_forces(objective, context);
    }
}

/// Directional forces for `objective` over the context's subgraph.
pub fn directional_forces(
    objective: &ObjectiveConfig,
    context: &ForceContext<'_>,
) -> Vec<DirectionalForce> {
    let mut forces = Vec::new();

    if objective.objective == Objective::Leveled {
        let targets = context
            .subgraph
            .nodes
            .iter()
            .map(|node| {
                let level = match objective.level_source {
                    LevelSource::Management if context.dataset.is_person(node.id) => {
                        context.adjacency.management_level(node.id)
                    }
                    _ => node.level,
                };
                (node.id.raw(), objective.band_y(level))
            })
            .collect();
        forces.push(DirectionalForce::Y {
            strength: objective.level_strength,
            targets,
        });
    }

    if objective.cluster_attraction {
        let targets = cluster_targets(objective.cluster_ring_radius, context);
        if !targets.is_empty() {
            forces.push(DirectionalForce::Xy {
                strength: objective.cluster_strength,
                targets,
            });
        }
    }

    forces
}

/// Per-person slot targets. Slots sit on a ring around the center, one per
/// deepest org in label order, starting at north.
fn cluster_targets(radius: f32, context: &ForceContext<'_>) -> Vec<(u32, f32, f32)> {
    let mut home: HashMap<NodeId, NodeId> = HashMap::new();
    for id in context.subgraph.ids() {
        if !context.dataset.is_person(id) {
            continue;
        }
        // First deepest membership is the person's home org.
        if let Some(&org) = context
            .adjacency
            .deepest_memberships(id, context.hierarchy)
            .first()
        {
            home.insert(id, org);
        }
    }

    let by_label: BTreeSet<(&str, NodeId)> = home
        .values()
        .map(|&org| (context.dataset.label_of(org).unwrap_or_default(), org))
        .collect();
    let count = by_label.len().max(1) as f32;
    let (cx, cy) = context.center;
    let slots: HashMap<NodeId, (f32, f32)> = by_label
        .iter()
        .enumerate()
        .map(|(i, &(_, org))| {
            let angle = -FRAC_PI_2 + TAU * i as f32 / count;
            (org, (cx + radius * angle.cos(), cy + radius * angle.sin()))
        })
        .collect();

    context
        .subgraph
        .ids()
        .filter_map(|id| {
            let (x, y) = slots.get(home.get(&id)?)?;
            Some((id.raw(), *x, *y))
        })
        .collect()
}
