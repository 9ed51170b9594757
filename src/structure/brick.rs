//! A single placed brick and its text/JSON codecs

use crate::core::error::{BrickError, Result};
use crate::structure::library::BrickLibrary;
use nom::{
    bytes::complete::tag,
    character::complete::digit1,
    combinator::{all_consuming, map},
    IResult, Parser,
};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::Range;

/// A rigid, 1-unit-tall, axis-aligned rectangular brick
///
/// Covers cells `x..x+h` by `y..y+w` on layer `z`. A brick can only be
/// constructed if its dimensions resolve to a library shape, so every value
/// of this type is well-formed.
#[derive(Debug, Clone, Copy)]
pub struct Brick {
    h: u32,
    w: u32,
    x: u32,
    y: u32,
    z: u32,
    brick_id: u32,
}

/// Structured record of a brick, as exchanged with exporters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrickRecord {
    pub brick_id: u32,
    pub x: u32,
    pub y: u32,
    pub z: u32,
    /// 1 means the library's nominal (height, width) is swapped
    pub ori: u8,
}

impl Brick {
    /// Construct a brick, checking that its shape exists in the library
    pub fn new(h: u32, w: u32, x: u32, y: u32, z: u32, library: &BrickLibrary) -> Result<Self> {
        let brick_id = library
            .brick_id(h, w)
            .ok_or(BrickError::LibraryMismatch { h, w })?;
        Ok(Self {
            h,
            w,
            x,
            y,
            z,
            brick_id,
        })
    }

    /// Parse one text-format line such as `"2x4 (2,1,0)"`
    ///
    /// Surrounding whitespace, including the trailing newline, is ignored.
    pub fn from_txt(text: &str, library: &BrickLibrary) -> Result<Self> {
        let trimmed = text.trim();
        let (_, (h, w, x, y, z)) = all_consuming(brick_line)
            .parse(trimmed)
            .map_err(|_| BrickError::MalformedBrick(trimmed.to_string()))?;
        Self::new(h, w, x, y, z, library)
    }

    /// Text-format line, newline terminated
    pub fn to_txt(&self) -> String {
        format!("{}\n", self)
    }

    pub fn from_record(record: &BrickRecord, library: &BrickLibrary) -> Result<Self> {
        let (mut h, mut w) = library
            .dimensions(record.brick_id)
            .ok_or(BrickError::UnknownBrickId(record.brick_id))?;
        if record.ori == 1 {
            std::mem::swap(&mut h, &mut w);
        }
        Self::new(h, w, record.x, record.y, record.z, library)
    }

    pub fn to_record(&self) -> BrickRecord {
        BrickRecord {
            brick_id: self.brick_id,
            x: self.x,
            y: self.y,
            z: self.z,
            ori: self.orientation(),
        }
    }

    pub fn h(&self) -> u32 {
        self.h
    }

    pub fn w(&self) -> u32 {
        self.w
    }

    pub fn x(&self) -> u32 {
        self.x
    }

    pub fn y(&self) -> u32 {
        self.y
    }

    pub fn z(&self) -> u32 {
        self.z
    }

    pub fn brick_id(&self) -> u32 {
        self.brick_id
    }

    /// 0 if `h <= w`, else 1
    pub fn orientation(&self) -> u8 {
        u8::from(self.h > self.w)
    }

    pub fn area(&self) -> u32 {
        self.h * self.w
    }

    /// Rows covered along x
    pub fn x_range(&self) -> Range<usize> {
        self.x as usize..(self.x as usize).saturating_add(self.h as usize)
    }

    /// Columns covered along y
    pub fn y_range(&self) -> Range<usize> {
        self.y as usize..(self.y as usize).saturating_add(self.w as usize)
    }

    /// Footprint cells `(x, y)` on layer `z`
    pub fn footprint(&self) -> impl Iterator<Item = (usize, usize)> {
        let ys = self.y_range();
        self.x_range()
            .flat_map(move |x| ys.clone().map(move |y| (x, y)))
    }

    fn key(&self) -> (u32, u32, u32, u32, u32) {
        (self.h, self.w, self.x, self.y, self.z)
    }
}

impl PartialEq for Brick {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Brick {}

impl PartialOrd for Brick {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Brick {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl std::hash::Hash for Brick {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for Brick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{} ({},{},{})",
            self.h, self.w, self.x, self.y, self.z
        )
    }
}

/// Digits saturate at `u32::MAX`, so oversized values still parse and fail
/// the library or bounds checks instead
fn number(input: &str) -> IResult<&str, u32> {
    map(digit1, |digits: &str| digits.parse::<u32>().unwrap_or(u32::MAX)).parse(input)
}

/// `HxW (x,y,z)`
fn brick_line(input: &str) -> IResult<&str, (u32, u32, u32, u32, u32)> {
    let (input, (h, _, w, _, x, _, y, _, z, _)) = (
        number,
        tag("x"),
        number,
        tag(" ("),
        number,
        tag(","),
        number,
        tag(","),
        number,
        tag(")"),
    )
        .parse(input)?;
    Ok((input, (h, w, x, y, z)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_and_record_agree() {
        let library = BrickLibrary::standard();
        let record = BrickRecord {
            brick_id: 3,
            x: 0,
            y: 1,
            z: 2,
            ori: 1,
        };
        let from_record = Brick::from_record(&record, &library).unwrap();
        let from_txt = Brick::from_txt("6x2 (0,1,2)\n", &library).unwrap();

        for brick in [from_record, from_txt] {
            assert_eq!(brick.brick_id(), 3);
            assert_eq!(brick.orientation(), 1);
            assert_eq!(brick.area(), 12);
            assert_eq!(brick.x_range(), 0..6);
            assert_eq!(brick.y_range(), 1..3);
            assert_eq!(brick.to_record(), record);
            assert_eq!(brick.to_txt(), "6x2 (0,1,2)\n");
        }
    }

    #[test]
    fn test_ill_formatted_text() {
        let library = BrickLibrary::standard();
        for text in ["", "2x4", "2x4 (1,2)", "2 x 4 (1,2,3)", "2x4 (1,2,3) extra", "-2x4 (1,2,3)"] {
            let result = Brick::from_txt(text, &library);
            assert!(
                matches!(result, Err(BrickError::MalformedBrick(_))),
                "{:?} should be ill-formatted",
                text
            );
        }
    }

    #[test]
    fn test_oversized_numbers_still_parse() {
        let library = BrickLibrary::standard();
        let brick = Brick::from_txt("2x4 (99999999999,0,0)", &library).unwrap();
        assert_eq!(brick.x(), u32::MAX);

        assert!(matches!(
            Brick::from_txt("99999999999x4 (0,0,0)", &library),
            Err(BrickError::LibraryMismatch { h: u32::MAX, w: 4 })
        ));
    }

    #[test]
    fn test_shape_not_in_library() {
        let library = BrickLibrary::standard();
        let result = Brick::from_txt("3x3 (0,0,0)", &library);
        assert!(matches!(
            result,
            Err(BrickError::LibraryMismatch { h: 3, w: 3 })
        ));
    }

    #[test]
    fn test_unknown_record_id() {
        let library = BrickLibrary::standard();
        let record = BrickRecord {
            brick_id: 42,
            x: 0,
            y: 0,
            z: 0,
            ori: 0,
        };
        assert!(matches!(
            Brick::from_record(&record, &library),
            Err(BrickError::UnknownBrickId(42))
        ));
    }

    #[test]
    fn test_footprint_cells() {
        let library = BrickLibrary::standard();
        let brick = Brick::new(1, 2, 3, 4, 0, &library).unwrap();
        let cells: Vec<_> = brick.footprint().collect();
        assert_eq!(cells, vec![(3, 4), (3, 5)]);
    }

    #[test]
    fn test_ordering_by_dimensions_then_position() {
        let library = BrickLibrary::standard();
        let a = Brick::new(1, 2, 5, 5, 5, &library).unwrap();
        let b = Brick::new(2, 1, 0, 0, 0, &library).unwrap();
        let c = Brick::new(1, 2, 5, 5, 6, &library).unwrap();
        assert!(a < b);
        assert!(a < c);
        assert_ne!(a, b);
    }
}
