//! Structural stability scoring
//!
//! The physics scorer is an external collaborator. This module declares the
//! contract it is consumed through, the per-voxel field it returns, and a
//! connectivity-based oracle that lets the generator run without one.

mod connectivity;
mod field;

pub use connectivity::ConnectivityOracle;
pub use field::{StabilityField, FAILURE_THRESHOLD};

use crate::core::error::Result;
use crate::structure::VoxelStructure;

/// Scores a finished structure
///
/// Implementations return a field with the same shape as the structure's
/// world. A cell at or above [`FAILURE_THRESHOLD`] marks a failing location.
/// If the structure cannot be scored, return
/// [`BrickError::OracleUnavailable`](crate::core::BrickError::OracleUnavailable):
/// callers abort the attempt rather than assume stability.
pub trait StabilityOracle {
    fn score(&self, structure: &VoxelStructure) -> Result<StabilityField>;
}

impl<T: StabilityOracle + ?Sized> StabilityOracle for &T {
    fn score(&self, structure: &VoxelStructure) -> Result<StabilityField> {
        (**self).score(structure)
    }
}

impl<T: StabilityOracle + ?Sized> StabilityOracle for Box<T> {
    fn score(&self, structure: &VoxelStructure) -> Result<StabilityField> {
        (**self).score(structure)
    }
}
