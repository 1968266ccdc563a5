use super::{BackendResponse, GenerativeBackend, OperationHandle, OperationStatus};
use crate::models::{GenerationRequest, MediaBlob};
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// Scripted outcome of one mock backend call.
#[derive(Debug, Clone)]
pub enum MockReply {
    Response(BackendResponse),
    Status { status: u16, message: String },
    Message(String),
}

impl MockReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Response(BackendResponse::from_text(text))
    }

    pub fn media(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self::Response(BackendResponse::from_media(MediaBlob::new(mime_type, data)))
    }

    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    fn into_result(self) -> Result<BackendResponse> {
        match self {
            Self::Response(response) => Ok(response),
            Self::Status { status, message } => Err(Error::Backend { status, message }),
            Self::Message(message) => Err(Error::Generic(message)),
        }
    }
}

/// Take the next scripted item; the last one repeats forever.
fn next_scripted<T: Clone>(queue: &Mutex<VecDeque<T>>) -> Option<T> {
    let mut queue = queue.lock().unwrap();
    if queue.len() > 1 {
        queue.pop_front()
    } else {
        queue.front().cloned()
    }
}

/// In-memory [`GenerativeBackend`] driven by scripted replies.
///
/// Cloning shares the script and counters, so a clone can be kept as a probe
/// after the original is handed to a pipeline.
#[derive(Clone, Default)]
pub struct MockBackend {
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    routes: Arc<Mutex<Vec<(String, MockReply)>>>,
    submit_failures: Arc<Mutex<VecDeque<MockReply>>>,
    poll_script: Arc<Mutex<VecDeque<OperationStatus>>>,
    fetch_failures: Arc<Mutex<VecDeque<MockReply>>>,
    artifacts: Arc<Mutex<HashMap<String, MediaBlob>>>,
    requests: Arc<Mutex<Vec<GenerationRequest>>>,
    submit_calls: Arc<Mutex<usize>>,
    poll_calls: Arc<Mutex<usize>>,
    fetch_calls: Arc<Mutex<usize>>,
}

impl MockBackend {
    pub const DEFAULT_ARTIFACT_URI: &'static str = "mock://artifacts/video.mp4";

    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for `generate_content`.
    pub fn with_reply(self, reply: MockReply) -> Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }

    /// Always answer with `reply` when the prompt contains `fragment`.
    pub fn with_route(self, fragment: impl Into<String>, reply: MockReply) -> Self {
        self.routes.lock().unwrap().push((fragment.into(), reply));
        self
    }

    /// Fail the next job submission with `reply` (a successful reply is ignored).
    pub fn with_submit_failure(self, reply: MockReply) -> Self {
        self.submit_failures.lock().unwrap().push_back(reply);
        self
    }

    pub fn with_poll_status(self, status: OperationStatus) -> Self {
        self.poll_script.lock().unwrap().push_back(status);
        self
    }

    /// Fail the next artifact fetch with `reply` before succeeding.
    pub fn with_fetch_failure(self, reply: MockReply) -> Self {
        self.fetch_failures.lock().unwrap().push_back(reply);
        self
    }

    pub fn with_artifact(self, uri: impl Into<String>, blob: MediaBlob) -> Self {
        self.artifacts.lock().unwrap().insert(uri.into(), blob);
        self
    }

    pub fn generate_calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn submit_calls(&self) -> usize {
        *self.submit_calls.lock().unwrap()
    }

    pub fn poll_calls(&self) -> usize {
        *self.poll_calls.lock().unwrap()
    }

    pub fn fetch_calls(&self) -> usize {
        *self.fetch_calls.lock().unwrap()
    }
}

#[async_trait]
impl GenerativeBackend for MockBackend {
    async fn generate_content(&self, request: &GenerationRequest) -> Result<BackendResponse> {
        self.requests.lock().unwrap().push(request.clone());

        let routed = self
            .routes
            .lock()
            .unwrap()
            .iter()
            .find(|(fragment, _)| request.prompt.contains(fragment.as_str()))
            .map(|(_, reply)| reply.clone());

        match routed.or_else(|| next_scripted(&self.replies)) {
            Some(reply) => reply.into_result(),
            None => Ok(BackendResponse::from_text("mock response")),
        }
    }

    async fn submit_job(&self, _request: &GenerationRequest) -> Result<OperationHandle> {
        let call = {
            let mut count = self.submit_calls.lock().unwrap();
            *count += 1;
            *count
        };

        let failure = self.submit_failures.lock().unwrap().pop_front();
        if let Some(reply) = failure {
            reply.into_result()?;
        }

        Ok(OperationHandle(format!("operations/mock-{}", call)))
    }

    async fn poll_job(&self, _handle: &OperationHandle) -> Result<OperationStatus> {
        *self.poll_calls.lock().unwrap() += 1;

        Ok(next_scripted(&self.poll_script).unwrap_or_else(|| OperationStatus::Done {
            artifact_uri: Self::DEFAULT_ARTIFACT_URI.to_string(),
        }))
    }

    async fn fetch_artifact(&self, uri: &str) -> Result<MediaBlob> {
        *self.fetch_calls.lock().unwrap() += 1;

        let failure = self.fetch_failures.lock().unwrap().pop_front();
        if let Some(reply) = failure {
            reply.into_result()?;
        }

        // Unknown references echo the URI back as the payload.
        Ok(self
            .artifacts
            .lock()
            .unwrap()
            .get(uri)
            .cloned()
            .unwrap_or_else(|| MediaBlob::new("video/mp4", uri.as_bytes().to_vec())))
    }
}
