//! `DuckDB` cache backend.

use std::path::PathBuf;

use ::duckdb::{params, Connection};

use super::backend::{CacheBackend, CacheBackendError};
use super::{CacheDocument, CacheEntry, CacheStats};
use crate::domain::Timestamp;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS cache_entries (
    position BIGINT NOT NULL,
    key VARCHAR NOT NULL,
    offering VARCHAR NOT NULL,
    request VARCHAR NOT NULL,
    result VARCHAR NOT NULL,
    timestamp_ms BIGINT NOT NULL,
    hit_count BIGINT NOT NULL
);
CREATE TABLE IF NOT EXISTS cache_stats (
    id INTEGER PRIMARY KEY,
    total_hits BIGINT NOT NULL,
    total_misses BIGINT NOT NULL,
    total_saves BIGINT NOT NULL
);
";

/// Stores the cache document in an embedded `DuckDB` file.
///
/// A connection is opened per operation; the file is the only shared state.
#[derive(Debug, Clone)]
pub struct DuckDbBackend {
    path: PathBuf,
}

impl DuckDbBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn open(&self) -> Result<Connection, CacheBackendError> {
        let connection = Connection::open(&self.path).map_err(database_error)?;
        connection
            .execute_batch("PRAGMA disable_progress_bar;")
            .map_err(database_error)?;
        connection.execute_batch(SCHEMA).map_err(database_error)?;
        Ok(connection)
    }
}

impl CacheBackend for DuckDbBackend {
    fn load(&self) -> Result<CacheDocument, CacheBackendError> {
        let connection = self.open()?;

        let mut statement = connection
            .prepare(
                "SELECT key, offering, request, result, timestamp_ms, hit_count \
                 FROM cache_entries ORDER BY position",
            )
            .map_err(database_error)?;
        let rows = statement
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, i64>(4)?,
                    row.get::<_, i64>(5)?,
                ))
            })
            .map_err(database_error)?;

        let mut entries = Vec::new();
        for row in rows {
            let (key, offering, request, result, timestamp_ms, hit_count) =
                row.map_err(database_error)?;
            entries.push(CacheEntry {
                key,
                offering,
                request: serde_json::from_str(&request)?,
                result,
                timestamp: Timestamp::from_unix_millis(timestamp_ms),
                hit_count: u64::try_from(hit_count).unwrap_or(0),
            });
        }

        let mut statement = connection
            .prepare("SELECT total_hits, total_misses, total_saves FROM cache_stats WHERE id = 1")
            .map_err(database_error)?;
        let stats = statement
            .query_map([], |row| {
                Ok(CacheStats {
                    total_hits: to_count(row.get::<_, i64>(0)?),
                    total_misses: to_count(row.get::<_, i64>(1)?),
                    total_saves: to_count(row.get::<_, i64>(2)?),
                })
            })
            .map_err(database_error)?
            .next()
            .transpose()
            .map_err(database_error)?
            .unwrap_or_default();

        Ok(CacheDocument { entries, stats })
    }

    fn save(&self, document: &CacheDocument) -> Result<(), CacheBackendError> {
        let mut connection = self.open()?;
        let transaction = connection.transaction().map_err(database_error)?;

        transaction
            .execute("DELETE FROM cache_entries", [])
            .map_err(database_error)?;
        for (position, entry) in document.entries.iter().enumerate() {
            let request = serde_json::to_string(&entry.request)?;
            transaction
                .execute(
                    "INSERT INTO cache_entries VALUES (?, ?, ?, ?, ?, ?, ?)",
                    params![
                        to_sql_int(position as u64),
                        entry.key,
                        entry.offering,
                        request,
                        entry.timestamp.unix_millis(),
                        to_sql_int(entry.hit_count),
                    ],
                )
                .map_err(database_error)?;
        }

        transaction
            .execute(
                "INSERT OR REPLACE INTO cache_stats VALUES (1, ?, ?, ?)",
                params![
                    to_sql_int(document.stats.total_hits),
                    to_sql_int(document.stats.total_misses),
                    to_sql_int(document.stats.total_saves),
                ],
            )
            .map_err(database_error)?;

        transaction.commit().map_err(database_error)
    }
}

fn database_error(error: ::duckdb::Error) -> CacheBackendError {
    CacheBackendError::Database(error.to_string())
}

fn to_sql_int(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn to_count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}
