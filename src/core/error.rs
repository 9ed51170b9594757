use thiserror::Error;

#[derive(Error, Debug)]
pub enum BrickError {
    #[error("Brick text is ill-formatted: {0:?}")]
    MalformedBrick(String),

    #[error("No brick ID for brick of dimensions: {h}x{w}")]
    LibraryMismatch { h: u32, w: u32 },

    #[error("Unknown brick ID: {0}")]
    UnknownBrickId(u32),

    #[error("Stability oracle unavailable: {0}")]
    OracleUnavailable(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, BrickError>;
