pub mod config;
pub mod error;

pub use config::{GenerationConfig, InstructionFormat};
pub use error::{BrickError, Result};
