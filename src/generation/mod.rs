//! Brick-by-brick structure generation
//!
//! - `sampler`: rejection sampling for a single brick
//! - `builder`: build loop and stability-driven regeneration
//! - `tally`: rejection reason counters

pub mod builder;
pub mod sampler;
pub mod tally;

pub use builder::{BrickGenerator, BuildResult, BuildStop, GenerationOutput};
pub use sampler::{BrickSample, BrickSampler, SampleOutcome};
pub use tally::RejectionTally;
