//! Ground-connectivity stability oracle
//!
//! Two bricks interlock when their footprints overlap on adjacent layers.
//! A breadth-first flood fill from every ground-layer brick finds the bricks
//! with a load path to the ground; every other brick's cells score 1.0.
//! This catches detached sub-assemblies (including ones held together only
//! by each other) without modelling forces.

use std::collections::VecDeque;

use super::{StabilityField, StabilityOracle, FAILURE_THRESHOLD};
use crate::core::error::Result;
use crate::structure::VoxelStructure;

#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectivityOracle;

impl ConnectivityOracle {
    pub fn new() -> Self {
        Self
    }

    /// For each brick, whether it has a load path to the ground layer
    pub fn grounded(structure: &VoxelStructure) -> Vec<bool> {
        let dim = structure.world_dim();
        let bricks = structure.bricks();

        // Owner of each in-bounds voxel; the first brick wins on collisions
        let mut owner: Vec<Option<usize>> = vec![None; dim * dim * dim];
        let index = |x: usize, y: usize, z: usize| (z * dim + x) * dim + y;
        for (i, brick) in bricks.iter().enumerate() {
            let z = brick.z() as usize;
            if z >= dim {
                continue;
            }
            for (x, y) in brick.footprint() {
                if x < dim && y < dim && owner[index(x, y, z)].is_none() {
                    owner[index(x, y, z)] = Some(i);
                }
            }
        }

        let mut grounded = vec![false; bricks.len()];
        let mut queue = VecDeque::new();
        for (i, brick) in bricks.iter().enumerate() {
            if brick.z() == 0 {
                grounded[i] = true;
                queue.push_back(i);
            }
        }

        while let Some(current) = queue.pop_front() {
            let brick = &bricks[current];
            let z = brick.z() as usize;
            let neighbours = [z.checked_sub(1), Some(z + 1).filter(|&n| n < dim)];
            for layer in neighbours.into_iter().flatten() {
                for (x, y) in brick.footprint() {
                    if x >= dim || y >= dim {
                        continue;
                    }
                    if let Some(next) = owner[index(x, y, layer)] {
                        if !grounded[next] {
                            grounded[next] = true;
                            queue.push_back(next);
                        }
                    }
                }
            }
        }

        grounded
    }
}

impl StabilityOracle for ConnectivityOracle {
    fn score(&self, structure: &VoxelStructure) -> Result<StabilityField> {
        let mut field = StabilityField::zeros(structure.world_dim());
        let grounded = Self::grounded(structure);
        for (brick, grounded) in structure.bricks().iter().zip(grounded) {
            if !grounded {
                field.mark_brick(brick, FAILURE_THRESHOLD);
            }
        }
        Ok(field)
    }
}
