use sentinel_core::CacheStore;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::cli::CacheCommand;
use crate::error::CliError;

use super::CommandOutput;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CacheReport {
    entries: usize,
    by_offering: BTreeMap<String, usize>,
    total_hits: u64,
    total_misses: u64,
    total_saves: u64,
}

pub async fn run(command: CacheCommand, cache: &CacheStore) -> Result<CommandOutput, CliError> {
    match command {
        CacheCommand::Stats => {
            let by_offering = cache.entries_by_offering().await;
            let stats = cache.stats().await;
            let report = CacheReport {
                entries: by_offering.values().sum(),
                by_offering,
                total_hits: stats.total_hits,
                total_misses: stats.total_misses,
                total_saves: stats.total_saves,
            };
            CommandOutput::json(&serde_json::to_value(report)?)
        }
        CacheCommand::Clear => {
            cache.clear().await?;
            tracing::info!("cache cleared");
            CommandOutput::json(&serde_json::json!({ "cleared": true }))
        }
    }
}
