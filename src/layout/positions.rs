//! Position arena.
//!
//! Positions and velocities for every dataset slot in SoA (Structure of
//! Arrays) layout, ready for zero-copy upload. A slot without a finite
//! position has never been placed. Only the layout engine seeds positions;
//! the host's relaxation pass writes back through `write_back`.

use crate::graph::NodeId;

/// Caller-owned position and velocity buffers indexed by `NodeId`.
#[derive(Debug, Clone, Default)]
pub struct PositionArena {
    pos_x: Vec<f32>,
    pos_y: Vec<f32>,
    vel_x: Vec<f32>,
    vel_y: Vec<f32>,
}

impl PositionArena {
    /// Create an arena of `node_count` unplaced slots.
    pub fn new(node_count: usize) -> Self {
        Self {
            pos_x: vec![f32::NAN; node_count],
            pos_y: vec![f32::NAN; node_count],
            vel_x: vec![0.0; node_count],
            vel_y: vec![0.0; node_count],
        }
    }

    /// Forget every position, keeping `node_count` slots.
    pub fn reset(&mut self, node_count: usize) {
        *self = Self::new(node_count);
    }

    pub fn len(&self) -> usize {
        self.pos_x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pos_x.is_empty()
    }

    /// True when the slot holds a finite position.
    #[inline]
    pub fn is_placed(&self, id: NodeId) -> bool {
        let i = id.index();
        i < self.pos_x.len() && self.pos_x[i].is_finite() && self.pos_y[i].is_finite()
    }

    pub fn position(&self, id: NodeId) -> Option<(f32, f32)> {
        self.is_placed(id)
            .then(|| (self.pos_x[id.index()], self.pos_y[id.index()]))
    }

    pub fn velocity(&self, id: NodeId) -> Option<(f32, f32)> {
        let i = id.index();
        (i < self.vel_x.len()).then(|| (self.vel_x[i], self.vel_y[i]))
    }

    /// Seed a position and zero the velocity.
    pub(crate) fn place(&mut self, id: NodeId, x: f32, y: f32) {
        let i = id.index();
        if i < self.pos_x.len() {
            self.pos_x[i] = x;
            self.pos_y[i] = y;
            self.vel_x[i] = 0.0;
            self.vel_y[i] = 0.0;
        }
    }

    /// Write back the state of the host's relaxation pass.
    pub fn write_back(&mut self, id: NodeId, x: f32, y: f32, vx: f32, vy: f32) {
        let i = id.index();
        if i < self.pos_x.len() {
            self.pos_x[i] = x;
            self.pos_y[i] = y;
            self.vel_x[i] = vx;
            self.vel_y[i] = vy;
        }
    }

    pub fn placed_count(&self) -> usize {
        (0..self.len() as u32)
            .filter(|&i| self.is_placed(NodeId(i)))
            .count()
    }

    /// Bounding box `(min_x, min_y, max_x, max_y)` of the placed nodes in
    /// `ids`, or None when none is placed.
    pub fn bounds(&self, ids: impl IntoIterator<Item = NodeId>) -> Option<(f32, f32, f32, f32)> {
        let mut min_x = f32::INFINITY;
        let mut max_x = f32::NEG_INFINITY;
        let mut min_y = f32::INFINITY;
        let mut max_y = f32::NEG_INFINITY;

        for id in ids {
            if let Some((x, y)) = self.position(id) {
                min_x = min_x.min(x);
                max_x = max_x.max(x);
                min_y = min_y.min(y);
                max_y = max_y.max(y);
            }
        }

        if min_x == f32::INFINITY {
            return None;
        }
        Some((min_x, min_y, max_x, max_y))
    }

    /// Interleaved `[x0, y0, x1, y1, ...]` for `ids`, NaN for unplaced.
    pub fn interleaved(&self, ids: impl IntoIterator<Item = NodeId>) -> Vec<f32> {
        let mut out = Vec::new();
        for id in ids {
            let (x, y) = self.position(id).unwrap_or((f32::NAN, f32::NAN));
            out.push(x);
            out.push(y);
        }
        out
    }

    pub fn positions_x(&self) -> &[f32] {
        &self.pos_x
    }

    pub fn positions_y(&self) -> &[f32] {
        &self.pos_y
    }

    pub fn velocities_x(&self) -> &[f32] {
        &self.vel_x
    }

    pub fn velocities_y(&self) -> &[f32] {
        &self.vel_y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_arena_is_unplaced() {
        let arena = PositionArena::new(3);
        assert_eq!(arena.len(), 3);
        assert_eq!(arena.placed_count(), 0);
        assert_eq!(arena.position(NodeId(0)), None);
        assert_eq!(arena.velocity(NodeId(0)), Some((0.0, 0.0)));
        assert!(!arena.is_placed(NodeId(7)));
    }

    #[test]
    fn test_place_zeroes_velocity() {
        let mut arena = PositionArena::new(2);
        arena.write_back(NodeId(1), 1.0, 2.0, 3.0, 4.0);
        assert_eq!(arena.velocity(NodeId(1)), Some((3.0, 4.0)));

        arena.place(NodeId(1), 5.0, 6.0);
        assert_eq!(arena.position(NodeId(1)), Some((5.0, 6.0)));
        assert_eq!(arena.velocity(NodeId(1)), Some((0.0, 0.0)));
    }

    #[test]
    fn test_bounds_skips_unplaced() {
        let mut arena = PositionArena::new(3);
        arena.place(NodeId(0), -10.0, -5.0);
        arena.place(NodeId(2), 10.0, 5.0);

        let ids = [NodeId(0), NodeId(1), NodeId(2)];
        assert_eq!(arena.bounds(ids), Some((-10.0, -5.0, 10.0, 5.0)));
        assert_eq!(arena.bounds([NodeId(1)]), None);
    }

    #[test]
    fn test_interleaved() {
        let mut arena = PositionArena::new(2);
        arena.place(NodeId(1), 1.0, 2.0);
        let flat = arena.interleaved([NodeId(1), NodeId(0)]);
        assert_eq!(&flat[..2], &[1.0, 2.0]);
        assert!(flat[2].is_nan() && flat[3].is_nan());
    }

    #[test]
    fn test_reset() {
        let mut arena = PositionArena::new(1);
        arena.place(NodeId(0), 1.0, 1.0);
        arena.reset(4);
        assert_eq!(arena.len(), 4);
        assert_eq!(arena.placed_count(), 0);
    }
}
