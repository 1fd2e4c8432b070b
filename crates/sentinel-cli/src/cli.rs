//! CLI argument definitions for Sentinel.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `offerings` | List the offerings this seller exposes |
//! | `validate` | Check a request against an offering's requirements |
//! | `payment` | Print the payment prompt for a request |
//! | `run` | Execute a job and print its deliverable |
//! | `cache` | Inspect or clear the deliverable cache |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--log-format` | `compact` | Log format on stderr (compact, json) |
//! | `--cache-path` | `SENTINEL_CACHE_PATH` | Cache file override |
//! | `--cache-backend` | `SENTINEL_CACHE_BACKEND` | Cache backend override |
//!
//! # Examples
//!
//! ```bash
//! sentinel run agent_brief --request '{"agentName":"Alpha"}' --pretty
//! sentinel validate ecosystem_health_check --request '{"tokenAddress":"0x..."}'
//! RUST_LOG=sentinel_core=debug sentinel cache stats
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use sentinel_core::CacheBackendKind;

/// Sentinel - marketplace intelligence seller
///
/// Runs the seller's offerings locally against the live marketplace and DEX
/// endpoints, sharing the same deliverable cache as the seller runtime.
#[derive(Debug, Parser)]
#[command(name = "sentinel", author, version, about = "Marketplace intelligence seller CLI")]
pub struct Cli {
    /// Log output format (logs go to stderr; filter with RUST_LOG).
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,

    /// Cache file path, overriding SENTINEL_CACHE_PATH.
    #[arg(long, global = true)]
    pub cache_path: Option<PathBuf>,

    /// Cache backend, overriding SENTINEL_CACHE_BACKEND.
    #[arg(long, global = true, value_enum)]
    pub cache_backend: Option<BackendArg>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Single-line human-readable events.
    Compact,
    /// One JSON object per event.
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendArg {
    Json,
    Duckdb,
    Memory,
}

impl From<BackendArg> for CacheBackendKind {
    fn from(value: BackendArg) -> Self {
        match value {
            BackendArg::Json => Self::Json,
            BackendArg::Duckdb => Self::DuckDb,
            BackendArg::Memory => Self::Memory,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List available offerings.
    Offerings,
    /// Validate a request against an offering's requirements.
    Validate(RequestArgs),
    /// Print the payment prompt for a request.
    Payment(RequestArgs),
    /// Execute a job and print its deliverable.
    Run(RunArgs),
    /// Inspect or clear the deliverable cache.
    Cache(CacheArgs),
}

#[derive(Debug, Clone, Args)]
pub struct RequestArgs {
    /// Offering name (see `sentinel offerings`).
    pub offering: String,

    /// Job requirements as a JSON object.
    #[arg(long, default_value = "{}")]
    pub request: String,
}

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub target: RequestArgs,

    /// Pretty-print the deliverable.
    #[arg(long, default_value_t = false)]
    pub pretty: bool,
}

#[derive(Debug, Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommand,
}

#[derive(Debug, Clone, Copy, Subcommand)]
pub enum CacheCommand {
    /// Show entry counts and hit/miss/save counters.
    Stats,
    /// Remove every entry and reset counters.
    Clear,
}
