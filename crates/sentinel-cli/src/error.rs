use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] sentinel_core::ValidationError),

    #[error("command error: {0}")]
    Command(String),

    #[error("configuration error: {0}")]
    Config(#[source] sentinel_core::ValidationError),

    #[error(transparent)]
    Cache(#[from] sentinel_core::CacheBackendError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("telemetry error: {0}")]
    Telemetry(String),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::Command(_) => 2,
            Self::Config(_) => 10,
            Self::Cache(_) => 10,
            Self::Serialization(_) => 4,
            Self::Io(_) => 10,
            Self::Telemetry(_) => 10,
        }
    }
}
