//! # Seller Offerings
//!
//! Job handlers exposed to the job-lifecycle collaborator.
//!
//! | Offering | Request | Upstream |
//! |----------|---------|----------|
//! | [`AgentBrief`] | `agentName` | marketplace resolution |
//! | [`EcosystemHealthCheck`] | `tokenAddress` | token pairs + health scoring |
//! | [`OfferingsDigest`] | `query`, `maxResults?`, `onlineOnly?` | marketplace resolution (many) |
//!
//! Every handler follows the same flow: cache lookup, upstream work, build a
//! deliverable, cache it when it is a success. Failures never escape
//! `execute_job`; they become an error deliverable.

mod agent_brief;
mod digest;
mod health_check;
mod registry;

use std::future::Future;
use std::pin::Pin;

use serde::Serialize;
use serde_json::Value;

use crate::error::ValidationError;

pub use agent_brief::AgentBrief;
pub use digest::{OfferingsDigest, DEFAULT_MAX_RESULTS, MAX_RESULTS_LIMIT};
pub use health_check::EcosystemHealthCheck;
pub use registry::OfferingRegistry;

/// Incoming job requirements; expected to be a JSON object.
pub type JobRequest = Value;

/// Serialized deliverable handed back to the job lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobResult {
    pub deliverable: String,
}

impl JobResult {
    pub fn new(deliverable: impl Into<String>) -> Self {
        Self {
            deliverable: deliverable.into(),
        }
    }

    /// Parsed deliverable, for callers that inspect it.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(&self.deliverable)
    }

    /// Error code carried by an error deliverable.
    pub fn error_code(&self) -> Option<String> {
        self.to_value()
            .ok()?
            .get("error")?
            .as_str()
            .map(str::to_string)
    }
}

/// Outcome of `validate_requirements`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Validation {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Validation {
    pub const fn accepted() -> Self {
        Self {
            valid: true,
            reason: None,
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            reason: Some(reason.into()),
        }
    }
}

impl From<Result<(), ValidationError>> for Validation {
    fn from(result: Result<(), ValidationError>) -> Self {
        match result {
            Ok(()) => Self::accepted(),
            Err(error) => Self::rejected(error.to_string()),
        }
    }
}

/// A priced job this seller can fulfil.
pub trait JobOffering: Send + Sync {
    fn name(&self) -> &'static str;

    fn validate_requirements(&self, request: &JobRequest) -> Validation;

    fn request_payment(&self, request: &JobRequest) -> String;

    fn execute_job<'a>(
        &'a self,
        request: &'a JobRequest,
    ) -> Pin<Box<dyn Future<Output = JobResult> + Send + 'a>>;
}

/// Structured failure deliverable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ErrorDeliverable {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    token_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(rename = "human_summary")]
    human_summary: String,
}

impl ErrorDeliverable {
    pub fn new(code: impl Into<String>, human_summary: impl Into<String>) -> Self {
        Self {
            error: code.into(),
            query: None,
            token_address: None,
            message: None,
            human_summary: human_summary.into(),
        }
    }

    /// `"<field> is required"` input error.
    pub fn missing_field(field: &str, human_summary: impl Into<String>) -> Self {
        Self::new(format!("{field} is required"), human_summary)
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_token_address(mut self, address: impl Into<String>) -> Self {
        self.token_address = Some(address.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn into_result(self) -> JobResult {
        JobResult::new(to_deliverable(&self))
    }
}

/// Serializes a deliverable; serialization failure becomes an error deliverable.
pub(crate) fn to_deliverable<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|error| {
        tracing::error!(%error, "deliverable serialization failed");
        serde_json::json!({
            "error": "serialization_failed",
            "message": error.to_string(),
            "human_summary": "Failed to serialize the deliverable.",
        })
        .to_string()
    })
}

/// Trimmed, non-empty string field of the request.
pub(crate) fn text_field(request: &JobRequest, field: &str) -> Option<String> {
    request
        .get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Raw field rendered for payment prompts.
pub(crate) fn display_field(request: &JobRequest, field: &str) -> String {
    match request.get(field) {
        Some(Value::String(value)) => value.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

pub(crate) fn require_text(
    request: &JobRequest,
    field: &'static str,
) -> Result<String, ValidationError> {
    text_field(request, field).ok_or(ValidationError::MissingField { field })
}

/// Footer shared by every human summary.
pub(crate) const SUMMARY_FOOTER: &str = "\n---\nProvided by AnonBase Sentinel";

pub(crate) fn summary_rule() -> String {
    "=".repeat(40)
}
