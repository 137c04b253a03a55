//! Error types for the reference simulator

use stealth_ai::StealthError;
use thiserror::Error;

/// Simulator errors
#[derive(Debug, Error)]
pub enum SimError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Scenario places agents but no perception target
    #[error("Scenario has agents but no [target] section")]
    MissingTarget,

    /// Scenario places agents but does not set up the alert registry
    #[error("Scenario has agents but no [registry] section")]
    MissingRegistry,

    #[error("Unknown route: {0}")]
    UnknownRoute(String),

    #[error("Invalid occluder shape: {0}")]
    InvalidShape(String),

    #[error("Invalid simulation settings: {0}")]
    InvalidSettings(String),

    #[error("Invalid scenario: {0}")]
    Config(#[from] StealthError),
}

/// Result type for simulator operations
pub type SimResult<T> = Result<T, SimError>;
