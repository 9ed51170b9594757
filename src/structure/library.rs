//! Brick shape library
//!
//! The library is a read-only table mapping brick IDs to nominal dimensions
//! and external part IDs. It is loaded once and shared by reference with
//! every component that needs to resolve shapes.

use crate::core::error::Result;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// A single library entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrickShape {
    /// Nominal extent along x
    pub height: u32,
    /// Nominal extent along y
    pub width: u32,
    /// Model identifier used by external renderers and exporters
    #[serde(rename = "partID")]
    pub part_id: String,
}

/// Immutable brick shape table
#[derive(Debug, Clone)]
pub struct BrickLibrary {
    shapes: BTreeMap<u32, BrickShape>,
    /// Canonical (smaller, larger) dimensions -> lowest brick ID with that shape
    by_dimensions: AHashMap<(u32, u32), u32>,
    /// Brick IDs in the order the instruction lists them
    listing: Vec<u32>,
}

/// Listing order of the standard table in the generator's training prompt
const STANDARD_LISTING: [u32; 8] = [5, 3, 1, 4, 6, 7, 0, 2];

impl BrickLibrary {
    /// Build a library from `(brick_id, shape)` entries
    pub fn from_shapes(shapes: impl IntoIterator<Item = (u32, BrickShape)>) -> Self {
        let shapes: BTreeMap<u32, BrickShape> = shapes.into_iter().collect();

        let mut by_dimensions = AHashMap::new();
        for (&id, shape) in &shapes {
            by_dimensions
                .entry(canonical(shape.height, shape.width))
                .or_insert(id);
        }

        let listing = shapes.keys().copied().collect();
        Self {
            shapes,
            by_dimensions,
            listing,
        }
    }

    /// The eight-shape library the bundled generator was trained with
    pub fn standard() -> Self {
        let entries = [
            (0, 1, 1, "3005"),
            (1, 1, 2, "3004"),
            (2, 2, 2, "3003"),
            (3, 2, 6, "2456"),
            (4, 1, 4, "3010"),
            (5, 2, 4, "3001"),
            (6, 1, 6, "3009"),
            (7, 1, 8, "3008"),
        ];
        let mut library = Self::from_shapes(entries.into_iter().map(|(id, height, width, part)| {
            (
                id,
                BrickShape {
                    height,
                    width,
                    part_id: part.to_string(),
                },
            )
        }));
        library.listing = STANDARD_LISTING.to_vec();
        library
    }

    /// Parse a library from JSON of the form `{"0": {"height": 1, "width": 1, "partID": "3005"}, ...}`
    pub fn from_json_str(json: &str) -> Result<Self> {
        let shapes: BTreeMap<u32, BrickShape> = serde_json::from_str(json)?;
        Ok(Self::from_shapes(shapes))
    }

    /// Load a library from a JSON file on disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Brick ID for the given dimensions, in either orientation
    pub fn brick_id(&self, h: u32, w: u32) -> Option<u32> {
        self.by_dimensions.get(&canonical(h, w)).copied()
    }

    pub fn shape(&self, brick_id: u32) -> Option<&BrickShape> {
        self.shapes.get(&brick_id)
    }

    /// Nominal `(height, width)` of a brick ID
    pub fn dimensions(&self, brick_id: u32) -> Option<(u32, u32)> {
        self.shape(brick_id).map(|s| (s.height, s.width))
    }

    pub fn part_id(&self, brick_id: u32) -> Option<&str> {
        self.shape(brick_id).map(|s| s.part_id.as_str())
    }

    /// Reverse lookup from an external part ID
    pub fn brick_id_for_part(&self, part_id: &str) -> Option<u32> {
        self.shapes
            .iter()
            .find(|(_, shape)| shape.part_id == part_id)
            .map(|(&id, _)| id)
    }

    /// Largest extent of any shape in the library
    pub fn max_dimension(&self) -> u32 {
        self.shapes
            .values()
            .map(|s| s.height.max(s.width))
            .max()
            .unwrap_or(0)
    }

    /// Allowed dimensions in both orientations, e.g. `"2x4, 4x2, 1x1"`
    ///
    /// Loaded libraries list shapes by brick ID; the standard table uses the
    /// order the bundled generator was trained on.
    pub fn allowed_dimensions(&self) -> String {
        let mut seen = Vec::new();
        for shape in self.listing.iter().filter_map(|id| self.shapes.get(id)) {
            for dims in [(shape.height, shape.width), (shape.width, shape.height)] {
                if !seen.contains(&dims) {
                    seen.push(dims);
                }
            }
        }
        seen.iter()
            .map(|(h, w)| format!("{}x{}", h, w))
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &BrickShape)> {
        self.shapes.iter().map(|(&id, shape)| (id, shape))
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

impl Default for BrickLibrary {
    fn default() -> Self {
        Self::standard()
    }
}

#[inline]
fn canonical(h: u32, w: u32) -> (u32, u32) {
    if h > w {
        (w, h)
    } else {
        (h, w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_orientation_independent() {
        let library = BrickLibrary::standard();
        assert_eq!(library.brick_id(2, 6), Some(3));
        assert_eq!(library.brick_id(6, 2), Some(3));
        assert_eq!(library.brick_id(3, 3), None);
    }

    #[test]
    fn test_part_id_round_trip() {
        let library = BrickLibrary::standard();
        assert_eq!(library.part_id(5), Some("3001"));
        assert_eq!(library.brick_id_for_part("3001"), Some(5));
        assert_eq!(library.brick_id_for_part("9999"), None);
    }

    #[test]
    fn test_duplicate_dimensions_resolve_to_lowest_id() {
        let json = r#"{
            "4": {"height": 1, "width": 2, "partID": "3004b"},
            "1": {"height": 2, "width": 1, "partID": "3004"}
        }"#;
        let library = BrickLibrary::from_json_str(json).unwrap();
        assert_eq!(library.brick_id(1, 2), Some(1));
        assert_eq!(library.len(), 2);
    }

    #[test]
    fn test_allowed_dimensions_lists_both_orientations() {
        let library = BrickLibrary::standard();
        let allowed = library.allowed_dimensions();
        assert!(allowed.contains("2x6"));
        assert!(allowed.contains("6x2"));
        assert!(allowed.starts_with("2x4, 4x2, 2x6"));
        assert!(allowed.ends_with("1x1, 2x2"));
        assert_eq!(library.max_dimension(), 8);
    }

    #[test]
    fn test_loaded_library_lists_by_id() {
        let json = r#"{
            "7": {"height": 2, "width": 4, "partID": "3001"},
            "2": {"height": 1, "width": 1, "partID": "3005"}
        }"#;
        let library = BrickLibrary::from_json_str(json).unwrap();
        assert_eq!(library.allowed_dimensions(), "1x1, 2x4, 4x2");
    }
}
