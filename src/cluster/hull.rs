//! Padded cluster polygons and containment.

use std::f32::consts::TAU;

/// A polygon vertex, `[x, y]`.
pub type Point = [f32; 2];

/// Vertex count of the single-member polygon.
pub const CIRCLE_SEGMENTS: usize = 12;

/// Padded polygon around `points`.
///
/// - 0 points: empty
/// - 1 point: regular 12-gon of radius `node_radius + pad`
/// - 2 points: rectangle of half-width `node_radius + pad` along the
///   segment, reaching the same distance past each endpoint
/// - 3+ points: convex hull with every vertex pushed `pad` away from the
///   hull centroid. Collinear or coincident input falls back to the 1- or
///   2-point shape of the hull's vertices.
pub fn compute_cluster_polygon(points: &[Point], node_radius: f32, pad: f32) -> Vec<Point> {
    match points {
        [] => Vec::new(),
        [p] => circle(*p, node_radius + pad),
        [a, b] => capsule_box(*a, *b, node_radius + pad),
        _ => {
            let hull = convex_hull(points);
            match hull.len() {
                0 => Vec::new(),
                1 | 2 => compute_cluster_polygon(&hull, node_radius, pad),
                _ => inflate(&hull, pad),
            }
        }
    }
}

fn circle(center: Point, radius: f32) -> Vec<Point> {
    (0..CIRCLE_SEGMENTS)
        .map(|i| {
            let angle = TAU * i as f32 / CIRCLE_SEGMENTS as f32;
            [
                center[0] + radius * angle.cos(),
                center[1] + radius * angle.sin(),
            ]
        })
        .collect()
}

fn capsule_box(a: Point, b: Point, half_width: f32) -> Vec<Point> {
    let dx = b[0] - a[0];
    let dy = b[1] - a[1];
    let len = (dx * dx + dy * dy).sqrt();
    if len <= f32::EPSILON {
        return circle(a, half_width);
    }
    // unit direction scaled, and its normal
    let (ux, uy) = (dx / len * half_width, dy / len * half_width);
    let (nx, ny) = (-uy, ux);
    vec![
        [a[0] - ux + nx, a[1] - uy + ny],
        [b[0] + ux + nx, b[1] + uy + ny],
        [b[0] + ux - nx, b[1] + uy - ny],
        [a[0] - ux - nx, a[1] - uy - ny],
    ]
}

/// Convex hull by Graham scan, counter-clockwise from the lowest point.
/// Collinear points on hull edges are dropped.
pub fn convex_hull(points: &[Point]) -> Vec<Point> {
    let mut unique: Vec<Point> = points
        .iter()
        .copied()
        .filter(|p| p[0].is_finite() && p[1].is_finite())
        .collect();
    unique.sort_by(|a, b| a[0].total_cmp(&b[0]).then(a[1].total_cmp(&b[1])));
    unique.dedup();
    if unique.len() < 3 {
        return unique;
    }

    // Lowest y, leftmost on ties.
    let mut start = unique[0];
    for &p in &unique[1..] {
        if p[1] < start[1] || (p[1] == start[1] && p[0] < start[0]) {
            start = p;
        }
    }

    unique.sort_by(|a, b| {
        let angle_a = (a[1] - start[1]).atan2(a[0] - start[0]);
        let angle_b = (b[1] - start[1]).atan2(b[0] - start[0]);
        angle_a
            .total_cmp(&angle_b)
            .then_with(|| dist_sq(start, *a).total_cmp(&dist_sq(start, *b)))
    });

    let mut hull: Vec<Point> = Vec::with_capacity(unique.len());
    for p in unique {
        while hull.len() >= 2 {
            let a = hull[hull.len() - 2];
            let b = hull[hull.len() - 1];
            if cross(a, b, p) <= 0.0 {
                hull.pop();
            } else {
                break;
            }
        }
        hull.push(p);
    }
    hull
}

fn cross(a: Point, b: Point, p: Point) -> f32 {
    (b[0] - a[0]) * (p[1] - a[1]) - (b[1] - a[1]) * (p[0] - a[0])
}

fn dist_sq(a: Point, b: Point) -> f32 {
    let dx = b[0] - a[0];
    let dy = b[1] - a[1];
    dx * dx + dy * dy
}

/// Push each hull vertex outward from the vertex centroid by `pad`.
fn inflate(hull: &[Point], pad: f32) -> Vec<Point> {
    let n = hull.len() as f32;
    let cx = hull.iter().map(|p| p[0]).sum::<f32>() / n;
    let cy = hull.iter().map(|p| p[1]).sum::<f32>() / n;
    hull.iter()
        .map(|p| {
            let dx = p[0] - cx;
            let dy = p[1] - cy;
            let dist = (dx * dx + dy * dy).sqrt().max(f32::EPSILON);
            [p[0] + dx / dist * pad, p[1] + dy / dist * pad]
        })
        .collect()
}

/// Distance within which a point counts as lying on a polygon edge.
const BOUNDARY_TOLERANCE: f32 = 1e-3;

/// Even-odd ray casting; points on an edge count as inside. An empty
/// polygon contains nothing.
pub fn point_in_cluster(point: Point, polygon: &[Point]) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    let [x, y] = point;
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        if on_segment(point, polygon[j], polygon[i]) {
            return true;
        }
        let [xi, yi] = polygon[i];
        let [xj, yj] = polygon[j];
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn on_segment(p: Point, a: Point, b: Point) -> bool {
    let (dx, dy) = (b[0] - a[0], b[1] - a[1]);
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq > 0.0 {
        (((p[0] - a[0]) * dx + (p[1] - a[1]) * dy) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let (cx, cy) = (a[0] + t * dx - p[0], a[1] + t * dy - p[1]);
    cx * cx + cy * cy <= BOUNDARY_TOLERANCE * BOUNDARY_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const EPS: f32 = 1e-3;

    fn len(p: Point) -> f32 {
        (p[0] * p[0] + p[1] * p[1]).sqrt()
    }

    #[test]
    fn test_empty_input() {
        assert!(compute_cluster_polygon(&[], 8.0, 12.0).is_empty());
        assert!(!point_in_cluster([0.0, 0.0], &[]));
    }

    #[test]
    fn test_single_point_is_dodecagon() {
        let polygon = compute_cluster_polygon(&[[0.0, 0.0]], 8.0, 12.0);
        assert_eq!(polygon.len(), 12);
        for p in &polygon {
            assert!((len(*p) - 20.0).abs() < EPS);
        }
        assert!(point_in_cluster([0.0, 0.0], &polygon));
        assert!(point_in_cluster([15.0, 0.0], &polygon));
        assert!(!point_in_cluster([21.0, 0.0], &polygon));
    }

    #[test]
    fn test_two_points_rectangle() {
        let polygon = compute_cluster_polygon(&[[0.0, 0.0], [10.0, 0.0]], 5.0, 5.0);
        assert_eq!(polygon.len(), 4);
        let xs: Vec<f32> = polygon.iter().map(|p| p[0]).collect();
        let ys: Vec<f32> = polygon.iter().map(|p| p[1]).collect();
        let min_x = xs.iter().copied().fold(f32::INFINITY, f32::min);
        let max_x = xs.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let max_y = ys.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        assert!((min_x + 10.0).abs() < EPS);
        assert!((max_x - 20.0).abs() < EPS);
        assert!((max_y - 10.0).abs() < EPS);

        assert!(point_in_cluster([5.0, 9.0], &polygon));
        assert!(point_in_cluster([-9.0, 0.0], &polygon));
        assert!(!point_in_cluster([5.0, 11.0], &polygon));
    }

    #[test]
    fn test_coincident_pair_is_circle() {
        let polygon = compute_cluster_polygon(&[[3.0, 3.0], [3.0, 3.0]], 8.0, 12.0);
        assert_eq!(polygon.len(), CIRCLE_SEGMENTS);
    }

    #[test]
    fn test_hull_drops_interior_points() {
        let hull = convex_hull(&[
            [0.0, 0.0],
            [10.0, 0.0],
            [10.0, 10.0],
            [0.0, 10.0],
            [5.0, 5.0],
            [5.0, 0.0],
        ]);
        assert_eq!(hull.len(), 4);
        assert!(!hull.contains(&[5.0, 5.0]));
        assert!(!hull.contains(&[5.0, 0.0]));
        assert_eq!(hull[0], [0.0, 0.0]);
    }

    #[test]
    fn test_collinear_points_fall_back_to_rectangle() {
        let points = [[0.0, 0.0], [5.0, 0.0], [10.0, 0.0]];
        let polygon = compute_cluster_polygon(&points, 4.0, 2.0);
        assert_eq!(polygon.len(), 4);
        for p in points {
            assert!(point_in_cluster(p, &polygon));
        }
    }

    #[test]
    fn test_all_coincident_falls_back_to_circle() {
        let polygon = compute_cluster_polygon(&[[1.0, 1.0]; 4], 8.0, 12.0);
        assert_eq!(polygon.len(), CIRCLE_SEGMENTS);
    }

    #[test]
    fn test_hull_vertices_pushed_by_pad() {
        let square = [[-10.0, -10.0], [10.0, -10.0], [10.0, 10.0], [-10.0, 10.0]];
        let polygon = compute_cluster_polygon(&square, 8.0, 5.0);
        assert_eq!(polygon.len(), 4);
        let expected = 200.0f32.sqrt() + 5.0;
        for p in &polygon {
            assert!((len(*p) - expected).abs() < EPS);
        }
    }

    #[test]
    fn test_unpadded_hull_contains_its_corners() {
        let square = [[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]];
        let polygon = compute_cluster_polygon(&square, 8.0, 0.0);
        for p in square {
            assert!(point_in_cluster(p, &polygon), "{p:?} reported outside");
        }
        assert!(point_in_cluster([5.0, 0.0], &polygon));
        assert!(point_in_cluster([10.0, 7.5], &polygon));
        assert!(point_in_cluster([5.0, 5.0], &polygon));
        assert!(!point_in_cluster([10.5, 5.0], &polygon));
        assert!(!point_in_cluster([-0.1, -0.1], &polygon));
    }

    #[test]
    fn test_padded_hull_contains_inputs() {
        let mut rng = StdRng::seed_from_u64(42);
        for round in 0..50 {
            let count = rng.gen_range(3..40);
            let points: Vec<Point> = (0..count)
                .map(|_| [rng.gen_range(-300.0..300.0), rng.gen_range(-200.0..200.0)])
                .collect();
            let polygon = compute_cluster_polygon(&points, 8.0, 12.0);
            assert!(polygon.len() >= 3);
            for p in &points {
                assert!(point_in_cluster(*p, &polygon), "round {round}: {p:?} outside");
            }
        }
    }
}
