//! Per-voxel stability scores

use crate::structure::Brick;

/// Scores at or above this value mark a structurally failing voxel
pub const FAILURE_THRESHOLD: f32 = 1.0;

/// D×D×D scalar field, laid out like the occupancy grid
#[derive(Debug, Clone, PartialEq)]
pub struct StabilityField {
    dim: usize,
    scores: Vec<f32>,
}

impl StabilityField {
    /// All-zero field (nothing failing)
    pub fn zeros(dim: usize) -> Self {
        Self {
            dim,
            scores: vec![0.0; dim * dim * dim],
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    #[inline]
    fn index(&self, x: usize, y: usize, z: usize) -> Option<usize> {
        if x < self.dim && y < self.dim && z < self.dim {
            Some((z * self.dim + x) * self.dim + y)
        } else {
            None
        }
    }

    pub fn get(&self, x: usize, y: usize, z: usize) -> Option<f32> {
        self.index(x, y, z).map(|i| self.scores[i])
    }

    /// Set a cell; cells outside the world are ignored
    pub fn set(&mut self, x: usize, y: usize, z: usize, score: f32) {
        if let Some(i) = self.index(x, y, z) {
            self.scores[i] = score;
        }
    }

    /// Set every footprint cell of `brick`
    pub fn mark_brick(&mut self, brick: &Brick, score: f32) {
        let z = brick.z() as usize;
        for (x, y) in brick.footprint() {
            self.set(x, y, z, score);
        }
    }

    /// Largest score in the field (0 for an empty world)
    pub fn max(&self) -> f32 {
        self.scores.iter().copied().fold(0.0, f32::max)
    }

    pub fn has_failure(&self) -> bool {
        self.max() >= FAILURE_THRESHOLD
    }

    /// Some footprint cell of `brick` is at or above the failure threshold
    pub fn brick_fails(&self, brick: &Brick) -> bool {
        let z = brick.z() as usize;
        brick
            .footprint()
            .any(|(x, y)| self.get(x, y, z).is_some_and(|s| s >= FAILURE_THRESHOLD))
    }
}
