// src/error.rs
// Typed failures for every stage of a resolution.
// Only `ResolveError::InvalidInput` ever reaches the HTTP boundary; the rest are
// handled inside the resolver's tier loop.

use std::time::Duration;

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;

/// Failures raised while talking to a model tier.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("no API key configured for the generation backend")]
    MissingApiKey,

    #[error("request to generation backend failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("generation backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("generation backend returned an empty reply")]
    EmptyReply,

    #[error("generation timed out after {0:?}")]
    Timeout(Duration),
}

/// Failures of the curated-entry store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read curated entries: {0}")]
    Io(#[from] std::io::Error),

    #[error("curated entries are not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid curated entry: {0}")]
    InvalidEntry(String),

    #[error("curated store lock poisoned")]
    Poisoned,
}

/// Failures of a query-log sink.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("query log io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("query log csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("query log lock poisoned")]
    Poisoned,

    #[error("query log writer task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// The resolution taxonomy.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("model tier {tier} failed: {source}")]
    GenerationFailure {
        tier: usize,
        #[source]
        source: GenerationError,
    },

    #[error("model tier {tier} replied without a trusted link")]
    NoValidLink { tier: usize, reply: String },

    #[error("failed to record query: {0}")]
    LogWriteFailure(#[from] LogError),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Errors surfaced by HTTP handlers. Always rendered as `{"error": "..."}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Internal(String),
}

impl From<ResolveError> for ApiError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::InvalidInput(msg) => ApiError::BadRequest(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}
