//! Node sizing.
//!
//! The outer visual radius of a node is its base radius plus stroke plus any
//! active decorative rings (attribute indicators). Layout sizes placement
//! circles with it and collision forces pad it, so children never overlap a
//! parent's rendered extent.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ensure_non_negative};
use crate::graph::{Dataset, NodeId, NodeKind};

/// Host-supplied sizing parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StyleConfig {
    /// Base radius of person nodes (default: 8.0).
    pub person_radius: f32,
    /// Base radius of org nodes (default: 12.0).
    pub org_radius: f32,
    /// Node outline width (default: 1.5).
    pub stroke_width: f32,
    /// Gap between a node and each decorative ring (default: 2.0).
    pub ring_gap: f32,
    /// Width of each decorative ring (default: 2.0).
    pub ring_width: f32,
    /// Padding around cluster hulls (default: 12.0).
    pub cluster_padding: f32,
    /// Extra spacing for collision radii (default: 4.0).
    pub collision_padding: f32,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            person_radius: 8.0,
            org_radius: 12.0,
            stroke_width: 1.5,
            ring_gap: 2.0,
            ring_width: 2.0,
            cluster_padding: 12.0,
            collision_padding: 4.0,
        }
    }
}

impl StyleConfig {
    pub fn validate(&self) -> Result<()> {
        ensure_non_negative("personRadius", self.person_radius)?;
        ensure_non_negative("orgRadius", self.org_radius)?;
        ensure_non_negative("strokeWidth", self.stroke_width)?;
        ensure_non_negative("ringGap", self.ring_gap)?;
        ensure_non_negative("ringWidth", self.ring_width)?;
        ensure_non_negative("clusterPadding", self.cluster_padding)?;
        ensure_non_negative("collisionPadding", self.collision_padding)
    }

    pub fn base_radius(&self, kind: NodeKind) -> f32 {
        match kind {
            NodeKind::Person => self.person_radius,
            NodeKind::Org => self.org_radius,
        }
    }

    /// Base radius + stroke + `rings` decorative rings.
    pub fn outer_visual_radius(&self, kind: NodeKind, rings: u32) -> f32 {
        self.base_radius(kind) + self.stroke_width + rings as f32 * (self.ring_gap + self.ring_width)
    }
}

/// Live sizing lookup: style plus each node's active ring count.
#[derive(Clone, Copy)]
pub struct NodeSizing<'a> {
    pub style: &'a StyleConfig,
    dataset: &'a Dataset,
    rings: &'a HashMap<NodeId, u32>,
}

impl<'a> NodeSizing<'a> {
    pub fn new(style: &'a StyleConfig, dataset: &'a Dataset, rings: &'a HashMap<NodeId, u32>) -> Self {
        Self {
            style,
            dataset,
            rings,
        }
    }

    pub fn rings(&self, id: NodeId) -> u32 {
        self.rings.get(&id).copied().unwrap_or(0)
    }

    pub fn outer_radius(&self, id: NodeId) -> f32 {
        let kind = self.dataset.kind(id).unwrap_or(NodeKind::Person);
        self.style.outer_visual_radius(kind, self.rings(id))
    }

    /// Outer radius plus collision padding.
    pub fn collision_radius(&self, id: NodeId) -> f32 {
        self.outer_radius(id) + self.style.collision_padding
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::fixtures::scenario;

    #[test]
    fn test_outer_radius_adds_rings() {
        let style = StyleConfig::default();
        assert_eq!(style.outer_visual_radius(NodeKind::Person, 0), 9.5);
        assert_eq!(style.outer_visual_radius(NodeKind::Person, 2), 17.5);
        assert_eq!(style.outer_visual_radius(NodeKind::Org, 0), 13.5);
    }

    #[test]
    fn test_sizing_lookup() {
        let ds = scenario();
        let style = StyleConfig::default();
        let p1 = ds.id_of("p1").unwrap();
        let rings = HashMap::from([(p1, 1)]);
        let sizing = NodeSizing::new(&style, &ds, &rings);
        assert_eq!(sizing.outer_radius(p1), 13.5);
        assert_eq!(sizing.outer_radius(ds.id_of("p2").unwrap()), 9.5);
        assert_eq!(sizing.outer_radius(ds.id_of("o1").unwrap()), 13.5);
    }

    #[test]
    fn test_validate() {
        assert!(StyleConfig::default().validate().is_ok());
        let bad = StyleConfig {
            ring_gap: -1.0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let style: StyleConfig = serde_json::from_str(r#"{"personRadius": 10}"#).unwrap();
        assert_eq!(style.person_radius, 10.0);
        assert_eq!(style.org_radius, 12.0);
    }
}
