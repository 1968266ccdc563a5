//! Single-artifact generation pipeline
//!
//! One request in, one artifact (or one classified failure) out. The backend
//! call goes through the retry executor; the response is then validated for
//! the request's kind. Errors stay raw inside the pipeline and are classified
//! exactly once, on the way out.

use crate::ai::{BackendResponse, ContentPart, GenerativeBackend};
use crate::classifier::classify;
use crate::error::GenerationResult;
use crate::events::{EventSink, GenerationEvent};
use crate::extract::extract_payload;
use crate::models::{ArtifactPayload, ArtifactResult, GenerationRequest, MediaBlob, OperationKind};
use crate::retry::{self, RetryPolicy};
use crate::{Error, Result};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Completion reasons that mean the output was withheld by a safety system.
const POLICY_FINISH_REASONS: &[&str] = &[
    "SAFETY",
    "PROHIBITED_CONTENT",
    "BLOCKLIST",
    "SPII",
    "RECITATION",
    "IMAGE_SAFETY",
    "IMAGE_PROHIBITED_CONTENT",
];

#[derive(Clone)]
pub struct Pipeline {
    backend: Arc<dyn GenerativeBackend>,
    retry: RetryPolicy,
}

impl Pipeline {
    pub fn new(backend: Arc<dyn GenerativeBackend>, retry: RetryPolicy) -> Self {
        Self { backend, retry }
    }

    pub async fn run(
        &self,
        request: &GenerationRequest,
        events: &EventSink,
    ) -> GenerationResult<ArtifactResult> {
        events.emit(GenerationEvent::Started {
            kind: request.kind,
            model_id: request.model_id.clone(),
        });

        match self.run_inner(request, events).await {
            Ok(payload) => {
                info!("{:?} generation with {} succeeded", request.kind, request.model_id);
                events.emit(GenerationEvent::Completed { kind: request.kind });
                Ok(ArtifactResult {
                    payload,
                    source_request: request.clone(),
                })
            }
            Err(e) => {
                let classified = classify(&e);
                error!(
                    "{:?} generation with {} failed ({}): {}",
                    request.kind, request.model_id, classified.category, e
                );
                events.emit(GenerationEvent::Failed {
                    category: classified.category,
                });
                Err(classified)
            }
        }
    }

    async fn run_inner(
        &self,
        request: &GenerationRequest,
        events: &EventSink,
    ) -> Result<ArtifactPayload> {
        if request.kind == OperationKind::Video {
            return Err(Error::InvalidRequest(
                "video requests must be submitted as long-running jobs".to_string(),
            ));
        }

        debug!(
            "Sending {:?} request to {} ({} reference media, {} history turns)",
            request.kind,
            request.model_id,
            request.reference_media.len(),
            request.history.len()
        );

        let response = retry::execute(&self.retry, events, || {
            self.backend.generate_content(request)
        })
        .await?;

        check_policy(&response)?;

        if request.kind.is_binary() {
            return binary_payload(response, request.kind).map(ArtifactPayload::Binary);
        }

        let text = extract_payload(&collect_text(&response));
        if request.kind == OperationKind::StructuredText {
            let value = serde_json::from_str(&text).map_err(|e| {
                Error::MalformedResponse(format!("failed to parse structured output: {}", e))
            })?;
            return Ok(ArtifactPayload::Structured(value));
        }
        if text.is_empty() {
            return Err(Error::NoArtifact(
                "The model returned an empty response".to_string(),
            ));
        }
        Ok(ArtifactPayload::Text(text))
    }
}

fn check_policy(response: &BackendResponse) -> Result<()> {
    if let Some(reason) = response.block_reason.as_deref().filter(|r| !r.is_empty()) {
        return Err(Error::PolicyBlocked(format!("prompt blocked: {}", reason)));
    }
    if let Some(reason) = response.finish_reason.as_deref() {
        if POLICY_FINISH_REASONS.contains(&reason) {
            return Err(Error::PolicyBlocked(format!("generation stopped: {}", reason)));
        }
    }
    Ok(())
}

fn collect_text(response: &BackendResponse) -> String {
    response
        .parts
        .iter()
        .filter_map(|part| match part {
            ContentPart::Text(text) => Some(text.as_str()),
            ContentPart::Binary(_) => None,
        })
        .collect()
}

fn binary_payload(response: BackendResponse, kind: OperationKind) -> Result<MediaBlob> {
    let mut text = String::new();
    for part in response.parts {
        match part {
            ContentPart::Binary(blob) if !blob.data.is_empty() => return Ok(blob),
            ContentPart::Binary(_) => {}
            ContentPart::Text(t) => text.push_str(&t),
        }
    }

    if !text.trim().is_empty() {
        return Err(Error::TextInsteadOfArtifact(text.trim().to_string()));
    }
    let what = if kind == OperationKind::Speech { "audio" } else { "image" };
    Err(Error::NoArtifact(format!("No {} was generated", what)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{MockBackend, MockReply};
    use crate::classifier::{EXCERPT_CHARS, POLICY_MESSAGE};
    use crate::error::ErrorCategory;
    use crate::models::GenerationConfig;
    use std::time::Duration;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_millis(1), 2.0).unwrap()
    }

    fn request(kind: OperationKind) -> GenerationRequest {
        GenerationRequest {
            kind,
            model_id: "test-model".to_string(),
            prompt: "prompt".to_string(),
            reference_media: vec![],
            history: vec![],
            config: GenerationConfig::default(),
        }
    }

    fn pipeline(backend: &MockBackend) -> Pipeline {
        Pipeline::new(Arc::new(backend.clone()), fast_policy())
    }

    #[tokio::test]
    async fn test_text_is_extracted_from_fences() {
        let backend = MockBackend::new().with_reply(MockReply::text("```\nHello there\n```"));
        let result = pipeline(&backend)
            .run(&request(OperationKind::Text), &EventSink::none())
            .await
            .unwrap();
        assert_eq!(result.text(), Some("Hello there"));
        assert_eq!(result.source_request.model_id, "test-model");
    }

    #[tokio::test]
    async fn test_structured_output_is_parsed() {
        let backend = MockBackend::new()
            .with_reply(MockReply::text("```json\n{\"summary\": \"s\", \"key_points\": []}\n```"));
        let result = pipeline(&backend)
            .run(&request(OperationKind::StructuredText), &EventSink::none())
            .await
            .unwrap();
        assert_eq!(
            result.payload,
            ArtifactPayload::Structured(serde_json::json!({"summary": "s", "key_points": []}))
        );
    }

    #[tokio::test]
    async fn test_unparseable_structured_output_is_malformed() {
        let backend = MockBackend::new().with_reply(MockReply::text("Sure! Here you go: {caption"));
        let err = pipeline(&backend)
            .run(&request(OperationKind::StructuredText), &EventSink::none())
            .await
            .unwrap_err();
        assert_eq!(err.category, ErrorCategory::MalformedResponse);
        assert_eq!(backend.generate_calls(), 1);
    }

    #[tokio::test]
    async fn test_safety_finish_reason_short_circuits() {
        let backend = MockBackend::new().with_reply(MockReply::Response(
            BackendResponse::from_text("partial").with_finish_reason("SAFETY"),
        ));
        let err = pipeline(&backend)
            .run(&request(OperationKind::Text), &EventSink::none())
            .await
            .unwrap_err();
        assert_eq!(err.category, ErrorCategory::ContentPolicyViolation);
        assert_eq!(err.message, POLICY_MESSAGE);
        assert_eq!(backend.generate_calls(), 1);
    }

    #[tokio::test]
    async fn test_prompt_block_reason_is_policy_violation() {
        let backend = MockBackend::new().with_reply(MockReply::Response(BackendResponse {
            block_reason: Some("OTHER".to_string()),
            ..Default::default()
        }));
        let err = pipeline(&backend)
            .run(&request(OperationKind::Image), &EventSink::none())
            .await
            .unwrap_err();
        assert_eq!(err.category, ErrorCategory::ContentPolicyViolation);
    }

    #[tokio::test]
    async fn test_image_returns_inline_media() {
        let backend = MockBackend::new().with_reply(MockReply::Response(BackendResponse {
            parts: vec![
                ContentPart::Text("Here is your image".to_string()),
                ContentPart::Binary(MediaBlob::new("image/png", vec![1, 2, 3])),
            ],
            finish_reason: Some("STOP".to_string()),
            block_reason: None,
        }));
        let result = pipeline(&backend)
            .run(&request(OperationKind::Image), &EventSink::none())
            .await
            .unwrap();
        assert_eq!(result.media(), Some(&MediaBlob::new("image/png", vec![1, 2, 3])));
    }

    #[tokio::test]
    async fn test_image_with_only_text_is_no_artifact() {
        let long_reply = "I would love to help, but here is a description of a lovely latte on a rustic wooden table instead.";
        let backend = MockBackend::new().with_reply(MockReply::text(long_reply));
        let err = pipeline(&backend)
            .run(&request(OperationKind::Image), &EventSink::none())
            .await
            .unwrap_err();

        assert_eq!(err.category, ErrorCategory::NoArtifactProduced);
        let excerpt: String = long_reply.chars().take(EXCERPT_CHARS).collect();
        assert!(err.message.contains(&excerpt));
        assert!(!err.message.contains(long_reply));
    }

    #[tokio::test]
    async fn test_empty_speech_response_is_generic_failure() {
        let backend = MockBackend::new().with_reply(MockReply::Response(BackendResponse::default()));
        let err = pipeline(&backend)
            .run(&request(OperationKind::Speech), &EventSink::none())
            .await
            .unwrap_err();
        assert_eq!(err.category, ErrorCategory::Unknown);
        assert_eq!(err.message, "No audio was generated");
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried_then_classified() {
        let backend = MockBackend::new().with_reply(MockReply::status(503, "Service Unavailable"));
        let (sink, mut rx) = EventSink::channel();
        let err = pipeline(&backend)
            .run(&request(OperationKind::Text), &sink)
            .await
            .unwrap_err();

        assert_eq!(err.category, ErrorCategory::TransientServiceError);
        assert_eq!(backend.generate_calls(), 4);

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert!(matches!(events.first(), Some(GenerationEvent::Started { .. })));
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, GenerationEvent::RetryScheduled { .. }))
                .count(),
            3
        );
        assert_eq!(
            events.last(),
            Some(&GenerationEvent::Failed {
                category: ErrorCategory::TransientServiceError
            })
        );
    }

    #[tokio::test]
    async fn test_quota_is_not_retried() {
        let backend = MockBackend::new().with_reply(MockReply::status(429, "Resource exhausted"));
        let err = pipeline(&backend)
            .run(&request(OperationKind::Text), &EventSink::none())
            .await
            .unwrap_err();
        assert_eq!(err.category, ErrorCategory::QuotaExceeded);
        assert_eq!(backend.generate_calls(), 1);
    }

    #[tokio::test]
    async fn test_video_requests_are_rejected() {
        let backend = MockBackend::new();
        let err = pipeline(&backend)
            .run(&request(OperationKind::Video), &EventSink::none())
            .await
            .unwrap_err();
        assert_eq!(err.category, ErrorCategory::Unknown);
        assert_eq!(backend.generate_calls(), 0);
    }
}
