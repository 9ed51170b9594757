//! Brick and structure data model

mod brick;
mod grid;
mod library;
mod voxel;

pub use brick::{Brick, BrickRecord};
pub use grid::OccupancyGrid;
pub use library::{BrickLibrary, BrickShape};
pub use voxel::{Placement, VoxelStructure, DEFAULT_WORLD_DIM};
