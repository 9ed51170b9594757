//! Fixed-priority classification of a raw brick proposal

use ahash::AHashSet;

use super::{RejectionReason, StructureValidator};
use crate::core::error::{BrickError, Result};
use crate::structure::{Brick, BrickLibrary, VoxelStructure};

/// Outcome of checking one proposal against the current structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Success(Brick),
    Rejected(RejectionReason),
}

impl Classification {
    pub fn is_success(&self) -> bool {
        matches!(self, Classification::Success(_))
    }
}

struct Candidate<'a> {
    raw: &'a str,
    parsed: Result<Brick>,
    structure: &'a VoxelStructure,
    rejected: &'a AHashSet<String>,
}

impl Candidate<'_> {
    fn brick(&self) -> Option<&Brick> {
        self.parsed.as_ref().ok()
    }

    /// First placement check the parsed brick fails, if any
    fn placement_error(&self) -> Option<RejectionReason> {
        self.brick()
            .and_then(|b| StructureValidator::check_placement(self.structure, b).err())
    }
}

type Rule = (RejectionReason, fn(&Candidate<'_>) -> bool);

/// Evaluated in order; the first matching rule decides the outcome
const RULES: [Rule; 5] = [
    (RejectionReason::AlreadyRejected, seen_before),
    (RejectionReason::IllFormatted, ill_formatted),
    (RejectionReason::NotInLibrary, not_in_library),
    (RejectionReason::OutOfBounds, out_of_bounds),
    (RejectionReason::Collision, collides),
];

fn seen_before(c: &Candidate<'_>) -> bool {
    c.rejected.contains(c.raw)
}

fn ill_formatted(c: &Candidate<'_>) -> bool {
    matches!(c.parsed, Err(BrickError::MalformedBrick(_)))
}

fn not_in_library(c: &Candidate<'_>) -> bool {
    matches!(
        c.parsed,
        Err(BrickError::LibraryMismatch { .. }) | Err(BrickError::UnknownBrickId(_))
    )
}

fn out_of_bounds(c: &Candidate<'_>) -> bool {
    c.placement_error() == Some(RejectionReason::OutOfBounds)
}

fn collides(c: &Candidate<'_>) -> bool {
    c.placement_error() == Some(RejectionReason::Collision)
}

/// Classify raw proposal text against `structure`
///
/// `rejected` holds the raw texts already rejected for the brick being
/// sampled; a verbatim repeat is rejected without re-validation.
pub fn classify_proposal(
    raw: &str,
    structure: &VoxelStructure,
    library: &BrickLibrary,
    rejected: &AHashSet<String>,
) -> Classification {
    let candidate = Candidate {
        raw,
        parsed: Brick::from_txt(raw, library),
        structure,
        rejected,
    };

    if let Some((reason, _)) = RULES.iter().find(|(_, rule)| rule(&candidate)) {
        return Classification::Rejected(*reason);
    }

    match candidate.parsed {
        Ok(brick) => Classification::Success(brick),
        // Parse errors are all covered by the rules above
        Err(_) => Classification::Rejected(RejectionReason::IllFormatted),
    }
}
