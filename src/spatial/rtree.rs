//! R-tree based spatial indexes using the rstar crate.
//!
//! Two trees back the hit-testing queries:
//! - `SpatialIndex`: node centers, for "which node is under the pointer"
//! - `EnvelopeIndex`: cluster polygon bounding boxes, narrowing the
//!   candidates for point-in-polygon tests

use rstar::{AABB, Envelope, PointDistance, RTree, RTreeObject};

use crate::graph::NodeId;
use crate::layout::PositionArena;

/// A node center in the spatial index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodePoint {
    pub id: NodeId,
    pub x: f32,
    pub y: f32,
}

impl NodePoint {
    pub fn new(id: NodeId, x: f32, y: f32) -> Self {
        Self { id, x, y }
    }
}

impl RTreeObject for NodePoint {
    type Envelope = AABB<[f32; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.x, self.y])
    }
}

impl PointDistance for NodePoint {
    fn distance_2(&self, point: &[f32; 2]) -> f32 {
        let dx = self.x - point[0];
        let dy = self.y - point[1];
        dx * dx + dy * dy
    }

    fn contains_point(&self, point: &[f32; 2]) -> bool {
        self.x == point[0] && self.y == point[1]
    }
}

/// Node centers of the current view.
#[derive(Default)]
pub struct SpatialIndex {
    tree: RTree<NodePoint>,
}

impl SpatialIndex {
    /// Bulk-load the placed nodes among `ids`. Unplaced nodes are skipped.
    pub fn from_arena(arena: &PositionArena, ids: impl IntoIterator<Item = NodeId>) -> Self {
        let points: Vec<_> = ids
            .into_iter()
            .filter_map(|id| arena.position(id).map(|(x, y)| NodePoint::new(id, x, y)))
            .collect();
        Self {
            tree: RTree::bulk_load(points),
        }
    }

    /// The closest node whose own disc covers the point.
    ///
    /// `radius_of` gives each node's hit radius; `max_radius` bounds the
    /// search so it stops once no larger node could still match.
    pub fn hit_test(
        &self,
        x: f32,
        y: f32,
        max_radius: f32,
        radius_of: impl Fn(NodeId) -> f32,
    ) -> Option<NodeId> {
        let max_sq = max_radius * max_radius;
        for point in self.tree.nearest_neighbor_iter(&[x, y]) {
            let dist_sq = point.distance_2(&[x, y]);
            if dist_sq > max_sq {
                break;
            }
            let r = radius_of(point.id);
            if dist_sq <= r * r {
                return Some(point.id);
            }
        }
        None
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An org's polygon bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrgBox {
    pub org: NodeId,
    pub envelope: AABB<[f32; 2]>,
}

impl RTreeObject for OrgBox {
    type Envelope = AABB<[f32; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

impl PointDistance for OrgBox {
    fn distance_2(&self, point: &[f32; 2]) -> f32 {
        self.envelope.distance_2(point)
    }

    fn contains_point(&self, point: &[f32; 2]) -> bool {
        self.envelope.contains_point(point)
    }
}

/// Bounding boxes of cluster polygons.
#[derive(Default)]
pub struct EnvelopeIndex {
    tree: RTree<OrgBox>,
}

impl EnvelopeIndex {
    /// Index each `(org, polygon)`. Empty polygons are skipped.
    pub fn build<'a>(polygons: impl IntoIterator<Item = (NodeId, &'a [[f32; 2]])>) -> Self {
        let boxes: Vec<_> = polygons
            .into_iter()
            .filter(|(_, polygon)| !polygon.is_empty())
            .map(|(org, polygon)| OrgBox {
                org,
                envelope: AABB::from_points(polygon),
            })
            .collect();
        Self {
            tree: RTree::bulk_load(boxes),
        }
    }

    /// Orgs whose bounding box covers the point.
    pub fn candidates(&self, x: f32, y: f32) -> Vec<NodeId> {
        self.tree
            .locate_all_at_point(&[x, y])
            .map(|b| b.org)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
