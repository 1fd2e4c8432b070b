use thiserror::Error;

/// Input and configuration errors exposed by `sentinel-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} is required and must be a non-empty string")]
    MissingField { field: &'static str },

    #[error("{field} must be a valid EVM address (0x + 40 hex chars)")]
    InvalidAddress { field: &'static str },

    #[error("{field} must be a positive number")]
    NotPositive { field: &'static str },

    #[error("unknown offering '{value}'")]
    UnknownOffering { value: String },

    #[error("invalid configuration value for {key}: '{value}'")]
    InvalidConfig { key: &'static str, value: String },
}
