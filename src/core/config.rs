//! Generation configuration with documented defaults
//!
//! All search bounds and sampling knobs live here. Values can be loaded from
//! a TOML file; any key left out falls back to its default.

use crate::core::error::{BrickError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Largest accepted `world_dim`; grids and stability fields hold `world_dim^3` cells
pub const MAX_WORLD_DIM: usize = 128;

/// Which instruction template to wrap the caption in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InstructionFormat {
    /// Template the fine-tuned generator was trained on
    #[default]
    Standard,
    /// Standard template plus explicit output-format rules, for base models
    ZeroShot,
}

/// Configuration for one caption-to-structure generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    // === WORLD ===
    /// Edge length of the cubic world the structure must fit in
    ///
    /// Bricks with any cell at or beyond this coordinate on any axis are
    /// rejected as out of bounds.
    pub world_dim: usize,

    // === SEARCH BOUNDS ===
    /// Maximum number of bricks in one generated structure
    pub max_bricks: usize,

    /// Maximum rejections per brick during rejection sampling
    ///
    /// 0 disables resampling: the first proposal is accepted or fails outright.
    pub max_brick_rejections: usize,

    /// Maximum number of truncate-and-regenerate rounds after an unstable result
    ///
    /// 0 disables physics-informed rollback.
    pub max_regenerations: usize,

    // === SAMPLING (forwarded to the generator) ===
    /// Sampling temperature
    pub temperature: f32,

    /// Number of top tokens to sample from
    pub top_k: u32,

    /// Cumulative probability threshold for nucleus sampling
    pub top_p: f32,

    /// Token budget for a single brick proposal
    ///
    /// "24x24 (19,19,19)\n" fits comfortably in 10 tokens.
    pub max_new_tokens: u32,

    /// Instruction template wrapped around the caption
    pub instruction_format: InstructionFormat,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            world_dim: 20,

            max_bricks: 2000,
            max_brick_rejections: 500,
            max_regenerations: 100,

            temperature: 0.6,
            top_k: 20,
            top_p: 1.0,
            max_new_tokens: 10,

            instruction_format: InstructionFormat::Standard,
        }
    }
}

impl GenerationConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: GenerationConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a TOML file on disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.world_dim == 0 {
            return Err(BrickError::ConfigError("world_dim must be positive".into()));
        }

        if self.world_dim > MAX_WORLD_DIM {
            return Err(BrickError::ConfigError(format!(
                "world_dim ({}) must be at most {}",
                self.world_dim, MAX_WORLD_DIM
            )));
        }

        if self.temperature < 0.0 {
            return Err(BrickError::ConfigError(format!(
                "temperature ({}) must be non-negative",
                self.temperature
            )));
        }

        if !(self.top_p > 0.0 && self.top_p <= 1.0) {
            return Err(BrickError::ConfigError(format!(
                "top_p ({}) must be in (0, 1]",
                self.top_p
            )));
        }

        if self.max_new_tokens == 0 {
            return Err(BrickError::ConfigError(
                "max_new_tokens must be positive".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = GenerationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.world_dim, 20);
        assert_eq!(config.max_brick_rejections, 500);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = GenerationConfig::from_toml_str(
            r#"
            max_regenerations = 0
            instruction_format = "zero_shot"
            "#,
        )
        .unwrap();
        assert_eq!(config.max_regenerations, 0);
        assert_eq!(config.instruction_format, InstructionFormat::ZeroShot);
        assert_eq!(config.max_bricks, 2000);
    }

    #[test]
    fn test_zero_bounds_are_allowed() {
        let config = GenerationConfig {
            max_bricks: 0,
            max_brick_rejections: 0,
            max_regenerations: 0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_world_dim_upper_bound() {
        let result = GenerationConfig::from_toml_str("world_dim = 100000000");
        assert!(matches!(result, Err(BrickError::ConfigError(_))));

        let config = GenerationConfig::from_toml_str(&format!("world_dim = {}", MAX_WORLD_DIM)).unwrap();
        assert_eq!(config.world_dim, MAX_WORLD_DIM);
    }

    #[test]
    fn test_invalid_top_p_rejected() {
        let result = GenerationConfig::from_toml_str("top_p = 1.5");
        assert!(matches!(result, Err(BrickError::ConfigError(_))));
    }

    #[test]
    fn test_unknown_format_is_toml_error() {
        let result = GenerationConfig::from_toml_str("instruction_format = \"few_shot\"");
        assert!(matches!(result, Err(BrickError::TomlError(_))));
    }
}
