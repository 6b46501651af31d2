//! Spatial indexing for O(log n) hit testing.
//!
//! This module provides R-tree based indexes for nearest-node lookups and
//! for narrowing cluster containment queries to nearby polygons.

mod rtree;

pub use rtree::{EnvelopeIndex, NodePoint, OrgBox, SpatialIndex};
