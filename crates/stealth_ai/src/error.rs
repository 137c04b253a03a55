//! Error types for the stealth AI core

use stealth_core::AgentId;
use thiserror::Error;

/// Stealth AI errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StealthError {
    /// Disguise name not present in the disguise table
    #[error("{0} is not a valid disguise name")]
    UnknownDisguise(String),

    /// Agent is not (or no longer) part of the roster
    #[error("Agent not registered: {0}")]
    AgentNotRegistered(AgentId),

    /// Invalid agent configuration
    #[error("Invalid agent configuration: {0}")]
    InvalidConfig(String),

    /// Invalid route edit or route data
    #[error("Invalid route: {0}")]
    InvalidRoute(String),
}

/// Result type for stealth AI operations
pub type Result<T> = std::result::Result<T, StealthError>;
