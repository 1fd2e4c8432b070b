//! Upstream endpoint identities, error classification and JSON fetching.
//!
//! Every upstream call goes through [`fetch_json`], which turns transport
//! failures and non-2xx statuses into an [`UpstreamError`] tagged with the
//! [`Endpoint`] that produced it. The retry executor reads the status and
//! transport kind back out through [`RetrySignal`].
//!
//! | Endpoint | Timeout | Retried |
//! |----------|---------|---------|
//! | [`Endpoint::Search`] | 5s | no (fast tier) |
//! | [`Endpoint::Listing`] | 15s | yes (reliable tier) |
//! | [`Endpoint::AgentMetrics`] | 10s | no (best-effort enrichment) |
//! | [`Endpoint::TokenPairs`] | 30s | yes |

use std::fmt::{Display, Formatter};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::http_client::{HttpClient, HttpError, HttpErrorKind, HttpRequest};
use crate::retry::RetrySignal;

/// Upstream endpoint consumed by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    Search,
    Listing,
    AgentMetrics,
    TokenPairs,
}

impl Endpoint {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Listing => "listing",
            Self::AgentMetrics => "agent_metrics",
            Self::TokenPairs => "token_pairs",
        }
    }

    pub const fn timeout_ms(self) -> u64 {
        match self {
            Self::Search => 5_000,
            Self::Listing => 15_000,
            Self::AgentMetrics => 10_000,
            Self::TokenPairs => 30_000,
        }
    }
}

impl Display for Endpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of one upstream call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    #[error("{endpoint} returned status {status}")]
    Status { endpoint: Endpoint, status: u16 },

    #[error("{endpoint} transport error: {source}")]
    Transport {
        endpoint: Endpoint,
        #[source]
        source: HttpError,
    },

    #[error("{endpoint} returned an unreadable payload: {message}")]
    Decode { endpoint: Endpoint, message: String },
}

impl UpstreamError {
    pub const fn endpoint(&self) -> Endpoint {
        match self {
            Self::Status { endpoint, .. }
            | Self::Transport { endpoint, .. }
            | Self::Decode { endpoint, .. } => *endpoint,
        }
    }

    pub const fn code(&self) -> &'static str {
        match self {
            Self::Status { .. } => "upstream.status",
            Self::Transport { .. } => "upstream.transport",
            Self::Decode { .. } => "upstream.decode",
        }
    }

    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }
}

impl RetrySignal for UpstreamError {
    fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    fn transport_kind(&self) -> Option<HttpErrorKind> {
        match self {
            Self::Transport { source, .. } => Some(source.kind()),
            _ => None,
        }
    }
}

/// Executes `request` against `endpoint` and decodes a JSON body.
pub async fn fetch_json<T>(
    http: &dyn HttpClient,
    endpoint: Endpoint,
    request: HttpRequest,
) -> Result<T, UpstreamError>
where
    T: DeserializeOwned,
{
    let request = request.with_timeout_ms(endpoint.timeout_ms());
    let response = http
        .execute(request)
        .await
        .map_err(|source| UpstreamError::Transport { endpoint, source })?;

    if !response.is_success() {
        return Err(UpstreamError::Status {
            endpoint,
            status: response.status,
        });
    }

    serde_json::from_str(&response.body).map_err(|error| UpstreamError::Decode {
        endpoint,
        message: error.to_string(),
    })
}
