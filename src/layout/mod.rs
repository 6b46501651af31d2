//! Layout for org-graph visualization.
//!
//! This module computes initial positions for a subgraph's nodes. These
//! positions are the starting state of the host's force relaxation: the
//! layout only seeds, it never animates.

pub mod positions;
pub mod radial;
pub mod style;

use serde::{Deserialize, Serialize};

use crate::error::{OrgGraphError, Result, ensure_non_negative};

pub use positions::PositionArena;
pub use radial::{LayoutMode, LayoutReport, layout_subgraph, place_on_circle};
pub use style::{NodeSizing, StyleConfig};

/// Configuration for radial placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutConfig {
    /// Canvas width in layout units (default: 960.0).
    pub canvas_width: f32,
    /// Canvas height in layout units (default: 640.0).
    pub canvas_height: f32,
    /// Gap between a parent's outer radius and its ring of neighbors.
    pub ring_padding: f32,
    /// Horizontal gap between consecutive root neighborhoods.
    pub root_margin: f32,
    /// Max offset from center for nodes without a placed neighbor.
    pub fallback_jitter: f32,
    /// Seed for the fallback jitter.
    pub seed: u64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            canvas_width: 960.0,
            canvas_height: 640.0,
            ring_padding: 60.0,
            root_margin: 80.0,
            fallback_jitter: 20.0,
            seed: 0x6f72_6767,
        }
    }
}

impl LayoutConfig {
    pub fn center(&self) -> (f32, f32) {
        (self.canvas_width / 2.0, self.canvas_height / 2.0)
    }

    pub fn validate(&self) -> Result<()> {
        ensure_non_negative("canvasWidth", self.canvas_width)?;
        ensure_non_negative("canvasHeight", self.canvas_height)?;
        ensure_non_negative("ringPadding", self.ring_padding)?;
        ensure_non_negative("rootMargin", self.root_margin)?;
        ensure_non_negative("fallbackJitter", self.fallback_jitter)?;
        if self.canvas_width == 0.0 || self.canvas_height == 0.0 {
            return Err(OrgGraphError::InvalidConfig(
                "canvas dimensions must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = LayoutConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.center(), (480.0, 320.0));
    }

    #[test]
    fn test_rejects_bad_values() {
        let config = LayoutConfig {
            ring_padding: f32::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = LayoutConfig {
            canvas_height: 0.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(OrgGraphError::InvalidConfig(_))));
    }

    #[test]
    fn test_from_camel_case_json() {
        let config: LayoutConfig =
            serde_json::from_str(r#"{"canvasWidth": 200, "seed": 7}"#).unwrap();
        assert_eq!(config.center(), (100.0, 320.0));
        assert_eq!(config.seed, 7);
        assert_eq!(config.ring_padding, 60.0);
    }
}
