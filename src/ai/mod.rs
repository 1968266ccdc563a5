//! Generative backend integration
//!
//! [`GenerativeBackend`] is the single outbound boundary: one content call
//! shape plus the submit/poll/fetch calls long-running video jobs need.
//! [`GeminiClient`] talks to the real service, [`MockBackend`] is scripted.

pub mod gemini;
pub mod mime;
pub mod mock;

pub use gemini::GeminiClient;
pub use mock::{MockBackend, MockReply};

use crate::models::{GenerationRequest, MediaBlob};
use crate::Result;
use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq)]
pub enum ContentPart {
    Text(String),
    Binary(MediaBlob),
}

/// Backend-neutral view of one content response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackendResponse {
    pub parts: Vec<ContentPart>,
    /// Completion-reason tag of the first candidate (`STOP`, `SAFETY`, ...).
    pub finish_reason: Option<String>,
    /// Set when the prompt itself was rejected before generation.
    pub block_reason: Option<String>,
}

impl BackendResponse {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            parts: vec![ContentPart::Text(text.into())],
            finish_reason: Some("STOP".to_string()),
            block_reason: None,
        }
    }

    pub fn from_media(blob: MediaBlob) -> Self {
        Self {
            parts: vec![ContentPart::Binary(blob)],
            finish_reason: Some("STOP".to_string()),
            block_reason: None,
        }
    }

    pub fn with_finish_reason(mut self, reason: impl Into<String>) -> Self {
        self.finish_reason = Some(reason.into());
        self
    }
}

/// Opaque handle of a submitted long-running job.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationHandle(pub String);

impl std::fmt::Display for OperationHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationStatus {
    Pending,
    Done { artifact_uri: String },
    Failed { message: String },
}

#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    async fn generate_content(&self, request: &GenerationRequest) -> Result<BackendResponse>;
    async fn submit_job(&self, request: &GenerationRequest) -> Result<OperationHandle>;
    async fn poll_job(&self, handle: &OperationHandle) -> Result<OperationStatus>;
    async fn fetch_artifact(&self, uri: &str) -> Result<MediaBlob>;
}
