//! Brick Forge - caption-driven brick structure generation
//!
//! A language model proposes bricks one line at a time. Each proposal is
//! checked against the structure built so far and rolled back when it does
//! not fit; finished structures that fail the stability check are cut back
//! to a sound prefix and regenerated.

pub mod core;
pub mod generation;
pub mod llm;
pub mod stability;
pub mod structure;
pub mod validation;
