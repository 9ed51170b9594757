//! Ordered brick structure with a voxel occupancy grid
//!
//! The brick order is the generation order and the unit of rollback, so it
//! is preserved through every codec. Occupancy counts are kept in step with
//! the brick list on every append; a truncated structure is rebuilt from its
//! retained prefix rather than edited in place.

use crate::core::error::{BrickError, Result};
use crate::stability::{StabilityField, StabilityOracle};
use crate::structure::brick::{Brick, BrickRecord};
use crate::structure::grid::OccupancyGrid;
use crate::structure::library::BrickLibrary;
use serde::Serialize;

/// Default edge length of the cubic world
pub const DEFAULT_WORLD_DIM: usize = 20;

#[derive(Debug, Clone)]
pub struct VoxelStructure {
    world_dim: usize,
    bricks: Vec<Brick>,
    occupancy: OccupancyGrid,
}

/// A brick resolved against the library, as handed to renderers and exporters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub brick_id: u32,
    pub part_id: String,
    pub h: u32,
    pub w: u32,
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl VoxelStructure {
    pub fn new(world_dim: usize) -> Self {
        Self {
            world_dim,
            bricks: Vec::new(),
            occupancy: OccupancyGrid::new(world_dim),
        }
    }

    /// Build a structure by adding `bricks` in order
    pub fn from_bricks(bricks: impl IntoIterator<Item = Brick>, world_dim: usize) -> Self {
        let mut structure = Self::new(world_dim);
        for brick in bricks {
            structure.add(brick);
        }

        if let Some(z0) = structure.bricks.iter().map(|b| b.z()).min() {
            if z0 != 0 {
                tracing::warn!(z0, "Structure does not start at ground level z=0");
            }
        }

        structure
    }

    /// New structure holding only the first `len` bricks
    pub fn truncated(&self, len: usize) -> Self {
        let len = len.min(self.bricks.len());
        Self::from_bricks(self.bricks[..len].iter().copied(), self.world_dim)
    }

    /// Append a brick and mark its footprint in the occupancy grid
    ///
    /// Never rejects; check placement with the validation module first.
    pub fn add(&mut self, brick: Brick) {
        let z = brick.z() as usize;
        for (x, y) in brick.footprint() {
            self.occupancy.increment(x, y, z);
        }
        self.bricks.push(brick);
    }

    pub fn bricks(&self) -> &[Brick] {
        &self.bricks
    }

    pub fn len(&self) -> usize {
        self.bricks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bricks.is_empty()
    }

    pub fn world_dim(&self) -> usize {
        self.world_dim
    }

    pub fn occupancy(&self) -> &OccupancyGrid {
        &self.occupancy
    }

    /// Every footprint cell and the layer lie within `[0, D)`
    pub fn brick_in_bounds(&self, brick: &Brick) -> bool {
        let d = self.world_dim;
        brick.x_range().end <= d && brick.y_range().end <= d && (brick.z() as usize) < d
    }

    /// Some footprint cell is already occupied
    pub fn brick_collides(&self, brick: &Brick) -> bool {
        self.occupancy
            .any_occupied(brick.footprint(), brick.z() as usize)
    }

    /// Some voxel is covered by more than one brick
    pub fn has_collisions(&self) -> bool {
        self.occupancy.any_above(1)
    }

    pub fn has_floating_bricks(&self) -> bool {
        self.bricks.iter().any(|b| self.is_floating(b))
    }

    /// Indices of floating bricks, in insertion order
    pub fn floating_bricks(&self) -> Vec<usize> {
        self.bricks
            .iter()
            .enumerate()
            .filter(|(_, b)| self.is_floating(b))
            .map(|(i, _)| i)
            .collect()
    }

    /// Not on the ground and touching nothing directly below or above
    pub fn is_floating(&self, brick: &Brick) -> bool {
        let z = brick.z() as usize;
        if z == 0 {
            return false;
        }
        if self.occupancy.any_occupied(brick.footprint(), z - 1) {
            return false;
        }
        if z + 1 < self.world_dim && self.occupancy.any_occupied(brick.footprint(), z + 1) {
            return false;
        }
        true
    }

    pub fn stability_scores<O: StabilityOracle + ?Sized>(&self, oracle: &O) -> Result<StabilityField> {
        let field = oracle.score(self)?;
        if field.dim() != self.world_dim {
            return Err(BrickError::OracleUnavailable(format!(
                "oracle returned a {}^3 field for a {}^3 world",
                field.dim(),
                self.world_dim
            )));
        }
        Ok(field)
    }

    /// No collisions, no floating bricks, and every stability score below 1
    pub fn is_stable<O: StabilityOracle + ?Sized>(&self, oracle: &O) -> Result<bool> {
        if self.has_collisions() || self.has_floating_bricks() {
            return Ok(false);
        }
        Ok(!self.stability_scores(oracle)?.has_failure())
    }

    /// Index of the earliest-inserted brick whose footprint touches a failing cell
    pub fn first_unstable_brick(&self, field: &StabilityField) -> Option<usize> {
        self.bricks
            .iter()
            .position(|brick| field.brick_fails(brick))
    }

    pub fn to_txt(&self) -> String {
        self.bricks.iter().map(Brick::to_txt).collect()
    }

    /// Parse one brick per line; blank lines are ignored
    pub fn from_txt(text: &str, library: &BrickLibrary, world_dim: usize) -> Result<Self> {
        let bricks = text
            .split('\n')
            .filter(|line| !line.is_empty())
            .map(|line| Brick::from_txt(line, library))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::from_bricks(bricks, world_dim))
    }

    /// Structured form: `{"1": {brick_id, x, y, z, ori}, "2": ...}`
    pub fn to_json(&self) -> Result<serde_json::Value> {
        let map = self
            .bricks
            .iter()
            .enumerate()
            .map(|(i, brick)| -> Result<(String, serde_json::Value)> {
                Ok(((i + 1).to_string(), serde_json::to_value(brick.to_record())?))
            })
            .collect::<Result<serde_json::Map<_, _>>>()?;
        Ok(serde_json::Value::Object(map))
    }

    /// Inverse of [`to_json`](Self::to_json); keys that are not indices are skipped
    pub fn from_json(value: &serde_json::Value, library: &BrickLibrary, world_dim: usize) -> Result<Self> {
        let object = value.as_object().ok_or_else(|| {
            BrickError::MalformedBrick("structured structure must be a JSON object".into())
        })?;

        let mut indexed = Vec::with_capacity(object.len());
        for (key, entry) in object {
            if key.is_empty() || !key.bytes().all(|b| b.is_ascii_digit()) {
                continue;
            }
            let index: u64 = key
                .parse()
                .map_err(|_| BrickError::MalformedBrick(format!("brick index {}", key)))?;
            let record: BrickRecord = serde_json::from_value(entry.clone())?;
            indexed.push((index, record));
        }
        indexed.sort_by_key(|(index, _)| *index);

        let bricks = indexed
            .iter()
            .map(|(_, record)| Brick::from_record(record, library))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::from_bricks(bricks, world_dim))
    }

    pub fn from_json_str(json: &str, library: &BrickLibrary, world_dim: usize) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_json(&value, library, world_dim)
    }

    /// Ordered bricks with resolved library shapes
    pub fn placements(&self, library: &BrickLibrary) -> Vec<Placement> {
        self.bricks
            .iter()
            .map(|brick| Placement {
                brick_id: brick.brick_id(),
                part_id: library
                    .part_id(brick.brick_id())
                    .unwrap_or_default()
                    .to_string(),
                h: brick.h(),
                w: brick.w(),
                x: brick.x(),
                y: brick.y(),
                z: brick.z(),
            })
            .collect()
    }
}

impl Default for VoxelStructure {
    fn default() -> Self {
        Self::new(DEFAULT_WORLD_DIM)
    }
}

impl std::fmt::Display for VoxelStructure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_txt())
    }
}
