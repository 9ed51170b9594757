//! Validity checks for generated bricks and whole structures
//!
//! Everything here is stateless and costs O(brick area) per check, so the
//! same functions serve incremental placement during sampling and final
//! acceptance of a finished structure.

mod classify;
mod report;

pub use classify::{classify_proposal, Classification};
pub use report::{StructureReport, StructureValidator};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a proposed brick was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    /// Identical text was already rejected for this brick
    AlreadyRejected,
    /// Text does not parse as `HxW (x,y,z)`
    IllFormatted,
    /// Dimensions have no library entry
    NotInLibrary,
    /// Some cell lies outside the world
    OutOfBounds,
    /// Some cell is already occupied
    Collision,
}

impl RejectionReason {
    pub const ALL: [RejectionReason; 5] = [
        RejectionReason::AlreadyRejected,
        RejectionReason::IllFormatted,
        RejectionReason::NotInLibrary,
        RejectionReason::OutOfBounds,
        RejectionReason::Collision,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionReason::AlreadyRejected => "already_rejected",
            RejectionReason::IllFormatted => "ill_formatted",
            RejectionReason::NotInLibrary => "not_in_library",
            RejectionReason::OutOfBounds => "out_of_bounds",
            RejectionReason::Collision => "collision",
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_serialization() {
        let json = serde_json::to_string(&RejectionReason::NotInLibrary).unwrap();
        assert_eq!(json, "\"not_in_library\"");
        for reason in RejectionReason::ALL {
            assert_eq!(
                serde_json::to_string(&reason).unwrap(),
                format!("\"{}\"", reason)
            );
        }
    }
}
