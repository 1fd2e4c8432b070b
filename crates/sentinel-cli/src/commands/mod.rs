mod cache;
mod job;

use std::sync::Arc;

use sentinel_core::{OfferingRegistry, ReqwestHttpClient, SentinelConfig};
use serde_json::Value;

use crate::cli::{Cli, Command};
use crate::error::CliError;

/// How a successfully executed command should exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// The request failed its offering's validation.
    Rejected,
    /// The job ran but produced an error deliverable.
    DeliverableError,
}

impl Outcome {
    pub const fn exit_code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Rejected => 2,
            Self::DeliverableError => 3,
        }
    }
}

pub struct CommandOutput {
    pub text: String,
    pub outcome: Outcome,
}

impl CommandOutput {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            outcome: Outcome::Success,
        }
    }

    pub fn json(value: &Value) -> Result<Self, CliError> {
        Ok(Self::success(serde_json::to_string_pretty(value)?))
    }

    pub fn with_outcome(mut self, outcome: Outcome) -> Self {
        self.outcome = outcome;
        self
    }
}

pub async fn run(cli: &Cli) -> Result<CommandOutput, CliError> {
    let config = load_config(cli)?;
    let registry = OfferingRegistry::from_config(&config, Arc::new(ReqwestHttpClient::new()));

    match &cli.command {
        Command::Offerings => CommandOutput::json(&Value::from(registry.names())),
        Command::Validate(args) => job::validate(args, &registry),
        Command::Payment(args) => job::payment(args, &registry),
        Command::Run(args) => job::run(args, &registry).await,
        Command::Cache(args) => cache::run(args.command, registry.cache()).await,
    }
}

fn load_config(cli: &Cli) -> Result<SentinelConfig, CliError> {
    let mut config = SentinelConfig::from_env().map_err(CliError::Config)?;
    if let Some(path) = &cli.cache_path {
        config = config.with_cache_path(path);
    }
    if let Some(backend) = cli.cache_backend {
        config = config.with_cache_backend(backend.into());
    }
    Ok(config)
}
