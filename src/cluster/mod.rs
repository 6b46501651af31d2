//! Org clusters: membership grouping, padded hull polygons and hit-testing.
//!
//! Clusters are derived from live positions and never write them. The host
//! recomputes them whenever its relaxation pass moves nodes.

mod hull;
mod membership;

use std::collections::{BTreeMap, HashSet};

use crate::graph::NodeId;
use crate::layout::PositionArena;
use crate::spatial::EnvelopeIndex;

pub use hull::{CIRCLE_SEGMENTS, Point, compute_cluster_polygon, convex_hull, point_in_cluster};
pub use membership::compute_memberships;

/// One org's polygon and the members it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    pub org: NodeId,
    /// Placed members, in membership order.
    pub members: Vec<NodeId>,
    pub polygon: Vec<Point>,
}

/// Polygons for every org with at least one placed member.
#[derive(Default)]
pub struct ClusterSet {
    clusters: BTreeMap<NodeId, Cluster>,
    boxes: EnvelopeIndex,
}

impl ClusterSet {
    /// Build polygons from members' current positions. Unplaced members are
    /// ignored; orgs left with none get no cluster.
    pub fn build(
        memberships: &BTreeMap<NodeId, Vec<NodeId>>,
        arena: &PositionArena,
        node_radius: f32,
        pad: f32,
    ) -> Self {
        let mut clusters = BTreeMap::new();
        for (&org, members) in memberships {
            let mut placed = Vec::with_capacity(members.len());
            let mut points = Vec::with_capacity(members.len());
            for &member in members {
                if let Some((x, y)) = arena.position(member) {
                    placed.push(member);
                    points.push([x, y]);
                }
            }
            let polygon = compute_cluster_polygon(&points, node_radius, pad);
            if polygon.is_empty() {
                continue;
            }
            clusters.insert(
                org,
                Cluster {
                    org,
                    members: placed,
                    polygon,
                },
            );
        }

        let boxes = EnvelopeIndex::build(
            clusters
                .values()
                .map(|c: &Cluster| (c.org, c.polygon.as_slice())),
        );
        tracing::debug!(clusters = clusters.len(), "cluster polygons built");
        Self { clusters, boxes }
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    pub fn get(&self, org: NodeId) -> Option<&Cluster> {
        self.clusters.get(&org)
    }

    /// Clusters in org id order.
    pub fn iter(&self) -> impl Iterator<Item = &Cluster> {
        self.clusters.values()
    }

    /// Allowed orgs whose polygon contains `point`, unordered.
    pub fn orgs_at_point(&self, point: Point, allowed: Option<&HashSet<NodeId>>) -> Vec<NodeId> {
        self.boxes
            .candidates(point[0], point[1])
            .into_iter()
            .filter(|org| allowed.is_none_or(|a| a.contains(org)))
            .filter(|org| {
                self.clusters
                    .get(org)
                    .is_some_and(|c| point_in_cluster(point, &c.polygon))
            })
            .collect()
    }

    /// Labels of the allowed orgs under `point`, deepest org first, then by
    /// label.
    pub fn labels_at_point<'a>(
        &self,
        point: Point,
        allowed: Option<&HashSet<NodeId>>,
        depth_of: impl Fn(NodeId) -> u32,
        label_of: impl Fn(NodeId) -> Option<&'a str>,
    ) -> Vec<String> {
        let mut hits: Vec<(u32, &str)> = self
            .orgs_at_point(point, allowed)
            .into_iter()
            .filter_map(|org| Some((depth_of(org), label_of(org)?)))
            .collect();
        hits.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));
        hits.into_iter().map(|(_, label)| label.to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::fixtures::dataset;
    use crate::graph::GraphIndex;

    fn arena_with(points: &[(u32, f32, f32)], size: usize) -> PositionArena {
        let mut arena = PositionArena::new(size);
        for &(id, x, y) in points {
            arena.write_back(NodeId(id), x, y, 0.0, 0.0);
        }
        arena
    }

    #[test]
    fn test_build_skips_unplaced_members() {
        let memberships = BTreeMap::from([
            (NodeId(10), vec![NodeId(0), NodeId(1)]),
            (NodeId(11), vec![NodeId(2)]),
        ]);
        let arena = arena_with(&[(0, 0.0, 0.0)], 12);
        let set = ClusterSet::build(&memberships, &arena, 8.0, 12.0);

        assert_eq!(set.len(), 1);
        let cluster = set.get(NodeId(10)).unwrap();
        assert_eq!(cluster.members, vec![NodeId(0)]);
        assert_eq!(cluster.polygon.len(), CIRCLE_SEGMENTS);
        assert!(set.get(NodeId(11)).is_none());
    }

    #[test]
    fn test_labels_sorted_by_depth_then_label() {
        // "Zeta" and "Alpha" nest inside "Root"; everyone sits at the origin
        let ds = dataset(
            &["p", "q"],
            &["Root", "Zeta", "Alpha"],
            &[
                ("Root", "Zeta"),
                ("Root", "Alpha"),
                ("p", "Zeta"),
                ("q", "Alpha"),
            ],
        );
        let index = GraphIndex::new();
        let adjacency = index.build_index(&ds, ds.links());
        let hierarchy = index.hierarchy(&ds, ds.links());
        let persons: Vec<_> = ["p", "q"].iter().map(|k| ds.id_of(k).unwrap()).collect();
        let orgs: Vec<_> = ds.ids().filter(|&id| ds.is_org(id)).collect();
        let memberships = compute_memberships(&persons, &orgs, None, &adjacency, &hierarchy);

        let mut arena = PositionArena::new(ds.len());
        arena.write_back(persons[0], 0.0, 0.0, 0.0, 0.0);
        arena.write_back(persons[1], 4.0, 0.0, 0.0, 0.0);
        let set = ClusterSet::build(&memberships, &arena, 8.0, 12.0);
        assert_eq!(set.len(), 3);

        let labels = set.labels_at_point(
            [2.0, 0.0],
            None,
            |org| index.org_depth(org, &hierarchy),
            |org| ds.label_of(org),
        );
        assert_eq!(labels, vec!["Alpha", "Zeta", "Root"]);

        let allowed = HashSet::from([ds.id_of("Root").unwrap(), ds.id_of("Zeta").unwrap()]);
        let labels = set.labels_at_point(
            [2.0, 0.0],
            Some(&allowed),
            |org| index.org_depth(org, &hierarchy),
            |org| ds.label_of(org),
        );
        assert_eq!(labels, vec!["Zeta", "Root"]);

        assert!(set
            .labels_at_point([500.0, 0.0], None, |_| 0, |org| ds.label_of(org))
            .is_empty());
    }

    #[test]
    fn test_point_in_bounding_box_but_outside_polygon() {
        // triangle; its bounding box corner is not inside it
        let memberships = BTreeMap::from([(NodeId(5), vec![NodeId(0), NodeId(1), NodeId(2)])]);
        let arena = arena_with(&[(0, 0.0, 0.0), (1, 100.0, 0.0), (2, 0.0, 100.0)], 6);
        let set = ClusterSet::build(&memberships, &arena, 8.0, 4.0);

        assert_eq!(set.orgs_at_point([10.0, 10.0], None), vec![NodeId(5)]);
        assert!(set.orgs_at_point([95.0, 95.0], None).is_empty());
    }
}
