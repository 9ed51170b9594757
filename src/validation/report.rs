//! Whole-structure validation report

use super::RejectionReason;
use crate::structure::{Brick, VoxelStructure};
use serde::Serialize;

/// Result of running every structural check on a structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructureReport {
    pub is_valid: bool,
    pub starts_on_ground: bool,
    pub has_collisions: bool,
    /// Indices of bricks reaching outside the world
    pub out_of_bounds: Vec<usize>,
    /// Indices of floating bricks
    pub floating: Vec<usize>,
}

impl StructureReport {
    pub fn new() -> Self {
        Self {
            is_valid: true,
            starts_on_ground: true,
            has_collisions: false,
            out_of_bounds: Vec::new(),
            floating: Vec::new(),
        }
    }

    pub fn add_collisions(&mut self, has_collisions: bool) {
        if has_collisions {
            self.has_collisions = true;
            self.is_valid = false;
        }
    }

    pub fn add_out_of_bounds(&mut self, indices: Vec<usize>) {
        if !indices.is_empty() {
            self.is_valid = false;
            self.out_of_bounds.extend(indices);
        }
    }

    pub fn add_floating(&mut self, indices: Vec<usize>) {
        if !indices.is_empty() {
            self.is_valid = false;
            self.floating.extend(indices);
        }
    }
}

impl Default for StructureReport {
    fn default() -> Self {
        Self::new()
    }
}

pub struct StructureValidator;

impl StructureValidator {
    /// Check whether `brick` can be appended: in bounds first, then free of collisions
    pub fn check_placement(
        structure: &VoxelStructure,
        brick: &Brick,
    ) -> Result<(), RejectionReason> {
        if !structure.brick_in_bounds(brick) {
            return Err(RejectionReason::OutOfBounds);
        }
        if structure.brick_collides(brick) {
            return Err(RejectionReason::Collision);
        }
        Ok(())
    }

    /// Run every whole-structure check
    ///
    /// A structure that does not start on the ground is reported but still
    /// valid; that invariant is advisory.
    pub fn validate_structure(structure: &VoxelStructure) -> StructureReport {
        let mut report = StructureReport::new();

        report.starts_on_ground = structure
            .bricks()
            .iter()
            .map(|b| b.z())
            .min()
            .map_or(true, |z0| z0 == 0);

        report.add_collisions(structure.has_collisions());
        report.add_out_of_bounds(
            structure
                .bricks()
                .iter()
                .enumerate()
                .filter(|(_, b)| !structure.brick_in_bounds(b))
                .map(|(i, _)| i)
                .collect(),
        );
        report.add_floating(structure.floating_bricks());

        report
    }
}
