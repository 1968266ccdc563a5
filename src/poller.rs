//! Long-running job polling
//!
//! Video generation is asynchronous on the backend: a job is submitted, its
//! status is polled at a fixed interval, and the finished artifact is fetched
//! from the reference the backend hands back.
//!
//! ```text
//! Created --submit--> Pending --poll(done)--> Done
//!                       |  ^
//!                       |  +--poll(pending)
//!                       +----poll(error)----> Failed
//! ```

use crate::ai::{GenerativeBackend, OperationHandle, OperationStatus};
use crate::classifier::classify;
use crate::error::GenerationResult;
use crate::events::{EventSink, GenerationEvent};
use crate::models::{ArtifactPayload, ArtifactResult, GenerationRequest, OperationKind};
use crate::retry::{self, RetryPolicy};
use crate::{Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Polling cadence and optional ceiling. Unbounded unless a limit is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub max_polls: Option<u32>,
    pub max_elapsed: Option<Duration>,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_polls: None,
            max_elapsed: None,
        }
    }
}

impl PollSettings {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_max_polls(mut self, max_polls: u32) -> Self {
        self.max_polls = Some(max_polls);
        self
    }

    pub fn with_max_elapsed(mut self, max_elapsed: Duration) -> Self {
        self.max_elapsed = Some(max_elapsed);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Created,
    Pending,
    Done,
    Failed,
}

#[derive(Debug, Clone)]
pub struct LongRunningJob {
    pub handle: Option<OperationHandle>,
    pub state: JobState,
    pub polls: u32,
    pub result: Option<ArtifactResult>,
}

impl LongRunningJob {
    fn new() -> Self {
        Self {
            handle: None,
            state: JobState::Created,
            polls: 0,
            result: None,
        }
    }

    fn transition(&mut self, next: JobState) {
        debug!("Job {:?}: {:?} -> {:?}", self.handle, self.state, next);
        self.state = next;
    }
}

#[derive(Clone)]
pub struct JobPoller {
    backend: Arc<dyn GenerativeBackend>,
    retry: RetryPolicy,
    settings: PollSettings,
}

impl JobPoller {
    pub fn new(backend: Arc<dyn GenerativeBackend>, retry: RetryPolicy, settings: PollSettings) -> Self {
        Self {
            backend,
            retry,
            settings,
        }
    }

    /// Submit `request`, poll until it settles and fetch the artifact.
    pub async fn run(
        &self,
        request: &GenerationRequest,
        events: &EventSink,
    ) -> GenerationResult<LongRunningJob> {
        events.emit(GenerationEvent::Started {
            kind: request.kind,
            model_id: request.model_id.clone(),
        });

        let mut job = LongRunningJob::new();
        match self.drive(request, events, &mut job).await {
            Ok(artifact) => {
                job.result = Some(artifact);
                job.transition(JobState::Done);
                info!(
                    "Job {} finished after {} polls",
                    job.handle.as_ref().map(|h| h.0.as_str()).unwrap_or("-"),
                    job.polls
                );
                events.emit(GenerationEvent::Completed { kind: request.kind });
                Ok(job)
            }
            Err(e) => {
                job.transition(JobState::Failed);
                let classified = classify(&e);
                error!(
                    "Job {:?} failed after {} polls ({}): {}",
                    job.handle, job.polls, classified.category, e
                );
                events.emit(GenerationEvent::Failed {
                    category: classified.category,
                });
                Err(classified)
            }
        }
    }

    async fn drive(
        &self,
        request: &GenerationRequest,
        events: &EventSink,
        job: &mut LongRunningJob,
    ) -> Result<ArtifactResult> {
        if request.kind != OperationKind::Video {
            return Err(Error::InvalidRequest(format!(
                "{:?} requests cannot run as long-running jobs",
                request.kind
            )));
        }

        // Nothing exists on the backend until a handle comes back, so
        // submission is safe to retry.
        let handle = retry::execute(&self.retry, events, || self.backend.submit_job(request)).await?;
        info!("Submitted job {} to {}", handle, request.model_id);
        events.emit(GenerationEvent::JobSubmitted {
            handle: handle.0.clone(),
        });
        job.handle = Some(handle.clone());
        job.transition(JobState::Pending);

        let started = Instant::now();
        loop {
            sleep(self.settings.interval).await;

            let status = self.backend.poll_job(&handle).await?;
            job.polls += 1;

            match status {
                OperationStatus::Pending => {
                    debug!("Job {} still running (poll {})", handle, job.polls);
                    events.emit(GenerationEvent::JobPolled {
                        handle: handle.0.clone(),
                        poll: job.polls,
                        done: false,
                    });
                    self.check_ceiling(&handle, job.polls, started)?;
                }
                OperationStatus::Failed { message } => {
                    events.emit(GenerationEvent::JobPolled {
                        handle: handle.0.clone(),
                        poll: job.polls,
                        done: true,
                    });
                    return Err(Error::JobFailed(message));
                }
                OperationStatus::Done { artifact_uri } => {
                    events.emit(GenerationEvent::JobPolled {
                        handle: handle.0.clone(),
                        poll: job.polls,
                        done: true,
                    });
                    let blob = retry::execute(&self.retry, events, || {
                        self.backend.fetch_artifact(&artifact_uri)
                    })
                    .await?;
                    return Ok(ArtifactResult {
                        payload: ArtifactPayload::Binary(blob),
                        source_request: request.clone(),
                    });
                }
            }
        }
    }

    fn check_ceiling(&self, handle: &OperationHandle, polls: u32, started: Instant) -> Result<()> {
        if let Some(max_polls) = self.settings.max_polls {
            if polls >= max_polls {
                return Err(Error::PollCeilingExceeded(format!(
                    "job {} still running after {} polls",
                    handle, polls
                )));
            }
        }
        if let Some(max_elapsed) = self.settings.max_elapsed {
            let elapsed = started.elapsed();
            if elapsed >= max_elapsed {
                return Err(Error::PollCeilingExceeded(format!(
                    "job {} still running after {:?}",
                    handle, elapsed
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{MockBackend, MockReply};
    use crate::error::ErrorCategory;
    use crate::models::{GenerationConfig, MediaBlob};

    fn video_request() -> GenerationRequest {
        GenerationRequest {
            kind: OperationKind::Video,
            model_id: "video-model".to_string(),
            prompt: "waves".to_string(),
            reference_media: vec![],
            history: vec![],
            config: GenerationConfig::default(),
        }
    }

    fn poller(backend: &MockBackend, settings: PollSettings) -> JobPoller {
        let policy = RetryPolicy::new(3, Duration::from_millis(1), 2.0).unwrap();
        JobPoller::new(Arc::new(backend.clone()), policy, settings)
    }

    fn fast() -> PollSettings {
        PollSettings::default().with_interval(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_done_after_k_polls_fetches_artifact() {
        let uri = "https://storage.example/video-1.mp4";
        let clip = MediaBlob::new("video/mp4", vec![0, 0, 0, 24, b'f', b't', b'y', b'p']);
        let backend = MockBackend::new()
            .with_poll_status(OperationStatus::Pending)
            .with_poll_status(OperationStatus::Pending)
            .with_poll_status(OperationStatus::Done {
                artifact_uri: uri.to_string(),
            })
            .with_artifact(uri, clip.clone());
        let (sink, mut rx) = EventSink::channel();

        let job = poller(&backend, fast()).run(&video_request(), &sink).await.unwrap();

        assert_eq!(job.state, JobState::Done);
        assert_eq!(job.polls, 3);
        assert_eq!(backend.poll_calls(), 3);
        assert_eq!(backend.submit_calls(), 1);
        assert_eq!(job.handle, Some(OperationHandle("operations/mock-1".to_string())));
        assert_eq!(job.result.unwrap().into_media(), Some(clip));

        let polled: Vec<(u32, bool)> = std::iter::from_fn(|| rx.try_recv().ok())
            .filter_map(|e| match e {
                GenerationEvent::JobPolled { poll, done, .. } => Some((poll, done)),
                _ => None,
            })
            .collect();
        assert_eq!(polled, vec![(1, false), (2, false), (3, true)]);
    }

    #[tokio::test]
    async fn test_backend_failure_is_terminal_and_not_resubmitted() {
        let backend = MockBackend::new()
            .with_poll_status(OperationStatus::Pending)
            .with_poll_status(OperationStatus::Failed {
                message: "Video blocked by safety filters: celebrity".to_string(),
            });

        let err = poller(&backend, fast())
            .run(&video_request(), &EventSink::none())
            .await
            .unwrap_err();

        assert_eq!(err.category, ErrorCategory::ContentPolicyViolation);
        assert_eq!(backend.submit_calls(), 1);
        assert_eq!(backend.poll_calls(), 2);
        assert_eq!(backend.fetch_calls(), 0);
    }

    #[tokio::test]
    async fn test_job_error_message_passes_through() {
        let backend = MockBackend::new().with_poll_status(OperationStatus::Failed {
            message: "Unsupported duration".to_string(),
        });
        let err = poller(&backend, fast())
            .run(&video_request(), &EventSink::none())
            .await
            .unwrap_err();
        assert_eq!(err.category, ErrorCategory::Unknown);
        assert_eq!(err.message, "Unsupported duration");
    }

    #[tokio::test]
    async fn test_transient_submission_failure_is_retried() {
        let backend = MockBackend::new()
            .with_submit_failure(MockReply::status(503, "Service Unavailable"));
        let job = poller(&backend, fast())
            .run(&video_request(), &EventSink::none())
            .await
            .unwrap();
        assert_eq!(backend.submit_calls(), 2);
        assert_eq!(job.handle, Some(OperationHandle("operations/mock-2".to_string())));
    }

    #[tokio::test]
    async fn test_quota_on_submission_fails_before_any_poll() {
        let backend = MockBackend::new().with_submit_failure(MockReply::status(429, "quota"));
        let err = poller(&backend, fast())
            .run(&video_request(), &EventSink::none())
            .await
            .unwrap_err();
        assert_eq!(err.category, ErrorCategory::QuotaExceeded);
        assert_eq!(backend.submit_calls(), 1);
        assert_eq!(backend.poll_calls(), 0);
    }

    #[tokio::test]
    async fn test_transient_fetch_failure_is_retried() {
        let backend = MockBackend::new()
            .with_fetch_failure(MockReply::status(500, "Internal error"));
        let job = poller(&backend, fast())
            .run(&video_request(), &EventSink::none())
            .await
            .unwrap();
        assert_eq!(backend.fetch_calls(), 2);
        assert_eq!(
            job.result.unwrap().media().map(|m| m.data.clone()),
            Some(MockBackend::DEFAULT_ARTIFACT_URI.as_bytes().to_vec())
        );
    }

    #[tokio::test]
    async fn test_max_polls_ceiling_times_out() {
        let backend = MockBackend::new().with_poll_status(OperationStatus::Pending);
        let err = poller(&backend, fast().with_max_polls(2))
            .run(&video_request(), &EventSink::none())
            .await
            .unwrap_err();
        assert_eq!(err.category, ErrorCategory::TimeoutExceeded);
        assert_eq!(backend.poll_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_max_elapsed_ceiling_uses_default_interval() {
        let backend = MockBackend::new().with_poll_status(OperationStatus::Pending);
        let settings = PollSettings::default().with_max_elapsed(Duration::from_secs(12));

        let started = Instant::now();
        let err = poller(&backend, settings)
            .run(&video_request(), &EventSink::none())
            .await
            .unwrap_err();

        assert_eq!(err.category, ErrorCategory::TimeoutExceeded);
        assert_eq!(backend.poll_calls(), 3);
        assert!(started.elapsed() >= Duration::from_secs(15));
    }

    #[tokio::test]
    async fn test_non_video_request_is_rejected() {
        let backend = MockBackend::new();
        let mut request = video_request();
        request.kind = OperationKind::Image;
        let err = poller(&backend, fast())
            .run(&request, &EventSink::none())
            .await
            .unwrap_err();
        assert_eq!(err.category, ErrorCategory::Unknown);
        assert_eq!(backend.submit_calls(), 0);
    }
}
