//! Error handling and custom error types
//!
//! `Error` is the raw failure raised inside the crate. Before anything leaves
//! the pipeline, aggregator or job poller it is classified into a
//! [`GenerationError`], which is the only error callers ever see.

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend error (status {status}): {message}")]
    Backend { status: u16, message: String },

    #[error("Request blocked by safety policy: {0}")]
    PolicyBlocked(String),

    #[error("Model returned text instead of an image: {0}")]
    TextInsteadOfArtifact(String),

    #[error("Failed to parse structured response: {0}")]
    MalformedResponse(String),

    #[error("No artifact in response: {0}")]
    NoArtifact(String),

    #[error("Job failed: {0}")]
    JobFailed(String),

    #[error("Job poll ceiling exceeded: {0}")]
    PollCeilingExceeded(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Generic error: {0}")]
    Generic(String),
}

impl Error {
    /// HTTP status carried by the failure, when the backend reported one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Backend { status, .. } => Some(*status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Closed set of user-facing failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    ContentPolicyViolation,
    QuotaExceeded,
    TransientServiceError,
    MalformedResponse,
    NoArtifactProduced,
    TimeoutExceeded,
    Unknown,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ContentPolicyViolation => "content_policy_violation",
            Self::QuotaExceeded => "quota_exceeded",
            Self::TransientServiceError => "transient_service_error",
            Self::MalformedResponse => "malformed_response",
            Self::NoArtifactProduced => "no_artifact_produced",
            Self::TimeoutExceeded => "timeout_exceeded",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified failure: the category plus the message shown to users.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{message}")]
pub struct GenerationError {
    pub category: ErrorCategory,
    pub message: String,
}

impl GenerationError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
        }
    }
}

pub type GenerationResult<T> = std::result::Result<T, GenerationError>;
