//! Failure classification
//!
//! Maps raw [`Error`]s to the closed [`ErrorCategory`] taxonomy with the
//! message a user should see, and decides which failures are worth retrying.

use crate::error::{ErrorCategory, GenerationError};
use crate::Error;

pub const POLICY_MESSAGE: &str =
    "This request was blocked by the content safety policy. Please rephrase it and try again.";
pub const QUOTA_MESSAGE: &str =
    "The generation quota has been reached. Please wait a few minutes before trying again.";
pub const TRANSIENT_MESSAGE: &str =
    "The generation service is temporarily unavailable. Please try again shortly.";
pub const MALFORMED_MESSAGE: &str =
    "The service returned a response in an unexpected format. Please try again.";
pub const TIMEOUT_MESSAGE: &str = "The generation job did not finish within the allowed time.";

/// Longest excerpt of substituted text embedded in a NoArtifactProduced message.
pub const EXCERPT_CHARS: usize = 60;

const POLICY_MARKERS: &[&str] = &[
    "safety",
    "policy",
    "blocked",
    "prohibited",
    "blocklist",
    "usage guidelines",
];
const QUOTA_MARKERS: &[&str] = &["quota", "resource_exhausted", "rate limit"];
const TRANSIENT_MARKERS: &[&str] = &["internal", "unavailable", "overloaded"];
const NO_ARTIFACT_MARKERS: &[&str] = &["text instead of", "instead of an image"];
const MALFORMED_MARKERS: &[&str] = &["failed to parse", "malformed", "invalid json"];

fn contains_any(haystack: &str, markers: &[&str]) -> bool {
    markers.iter().any(|m| haystack.contains(m))
}

fn is_transport_failure(error: &Error) -> bool {
    matches!(error, Error::Http(e) if e.is_timeout() || e.is_connect())
}

/// Classify a terminal failure.
///
/// The error variant and HTTP status decide first. Keyword rules (first match
/// wins) only read messages written by the backend or transport, never text
/// the model generated.
pub fn classify(error: &Error) -> GenerationError {
    match error {
        Error::PolicyBlocked(_) => {
            return GenerationError::new(ErrorCategory::ContentPolicyViolation, POLICY_MESSAGE)
        }
        Error::TextInsteadOfArtifact(text) => return no_artifact(text),
        Error::MalformedResponse(_) | Error::Serialization(_) => {
            return GenerationError::new(ErrorCategory::MalformedResponse, MALFORMED_MESSAGE)
        }
        Error::PollCeilingExceeded(_) => {
            return GenerationError::new(ErrorCategory::TimeoutExceeded, TIMEOUT_MESSAGE)
        }
        Error::Backend { .. } | Error::Http(_) | Error::Generic(_) | Error::JobFailed(_) => {}
        _ => return GenerationError::new(ErrorCategory::Unknown, passthrough_message(error)),
    }

    let status = error.status();
    let lower = passthrough_message(error).to_lowercase();

    if contains_any(&lower, POLICY_MARKERS) {
        return GenerationError::new(ErrorCategory::ContentPolicyViolation, POLICY_MESSAGE);
    }

    if status == Some(429) || contains_any(&lower, QUOTA_MARKERS) {
        return GenerationError::new(ErrorCategory::QuotaExceeded, QUOTA_MESSAGE);
    }

    if matches!(status, Some(500) | Some(503))
        || is_transport_failure(error)
        || contains_any(&lower, TRANSIENT_MARKERS)
    {
        return GenerationError::new(ErrorCategory::TransientServiceError, TRANSIENT_MESSAGE);
    }

    if contains_any(&lower, NO_ARTIFACT_MARKERS) {
        return no_artifact(&passthrough_message(error));
    }

    if contains_any(&lower, MALFORMED_MARKERS) {
        return GenerationError::new(ErrorCategory::MalformedResponse, MALFORMED_MESSAGE);
    }

    GenerationError::new(ErrorCategory::Unknown, passthrough_message(error))
}

fn no_artifact(offending_text: &str) -> GenerationError {
    GenerationError::new(
        ErrorCategory::NoArtifactProduced,
        format!(
            "The model replied with text instead of the requested media: \"{}\"",
            excerpt(offending_text)
        ),
    )
}

fn excerpt(text: &str) -> String {
    text.trim().chars().take(EXCERPT_CHARS).collect()
}

/// Unknown failures surface the backend's own words, not our wrapper prefix.
fn passthrough_message(error: &Error) -> String {
    match error {
        Error::Backend { message, .. }
        | Error::JobFailed(message)
        | Error::NoArtifact(message)
        | Error::InvalidRequest(message)
        | Error::Generic(message) => message.clone(),
        other => other.to_string(),
    }
}

/// Retry predicate: is this failure expected to clear up on its own?
///
/// Structured signals (transport errors, HTTP status) decide first. Message
/// matching is only a fallback for failures that carry no status at all.
pub fn is_transient(error: &Error) -> bool {
    if is_transport_failure(error) {
        return true;
    }

    if let Some(status) = error.status() {
        return matches!(status, 500 | 502 | 503 | 504);
    }

    match error {
        Error::Http(_) | Error::Generic(_) => {
            contains_any(&error.to_string().to_lowercase(), TRANSIENT_MARKERS)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(status: u16, message: &str) -> Error {
        Error::Backend {
            status,
            message: message.to_string(),
        }
    }

    #[test]
    fn test_policy_markers_classify_as_policy_violation() {
        let err = classify(&Error::Generic("blocked due to policy".to_string()));
        assert_eq!(err.category, ErrorCategory::ContentPolicyViolation);
        assert_eq!(err.message, POLICY_MESSAGE);

        let err = classify(&Error::PolicyBlocked("IMAGE_SAFETY".to_string()));
        assert_eq!(err.category, ErrorCategory::ContentPolicyViolation);
    }

    #[test]
    fn test_rate_limit_status_classifies_as_quota() {
        let err = classify(&backend(429, "Too many requests"));
        assert_eq!(err.category, ErrorCategory::QuotaExceeded);
        assert_eq!(err.message, QUOTA_MESSAGE);

        let err = classify(&Error::Generic("Quota exceeded for project".to_string()));
        assert_eq!(err.category, ErrorCategory::QuotaExceeded);
    }

    #[test]
    fn test_server_errors_classify_as_transient() {
        assert_eq!(
            classify(&backend(500, "oops")).category,
            ErrorCategory::TransientServiceError
        );
        assert_eq!(
            classify(&Error::Generic("Internal error".to_string())).category,
            ErrorCategory::TransientServiceError
        );
    }

    #[test]
    fn test_substituted_text_classifies_as_no_artifact_with_excerpt() {
        let err = classify(&Error::Generic(
            "model returned text instead of an image".to_string(),
        ));
        assert_eq!(err.category, ErrorCategory::NoArtifactProduced);

        let long_text = "I would love to draw that for you, but here is a long description of a sunset over the sea";
        let err = classify(&Error::TextInsteadOfArtifact(long_text.to_string()));
        assert_eq!(err.category, ErrorCategory::NoArtifactProduced);
        let embedded = err.message.split('"').nth(1).unwrap();
        assert_eq!(embedded.chars().count(), EXCERPT_CHARS);
        assert!(long_text.starts_with(embedded));
    }

    #[test]
    fn test_generated_text_never_drives_keyword_rules() {
        let reply = "Image generation is currently unavailable, but here is a description of a calm lake";
        let err = classify(&Error::TextInsteadOfArtifact(reply.to_string()));
        assert_eq!(err.category, ErrorCategory::NoArtifactProduced);
        assert!(err.message.contains("Image generation is currently unavailable"));
        assert!(!is_transient(&Error::TextInsteadOfArtifact(reply.to_string())));

        let reply = "A chart showing the sales quota for each region, with internal targets highlighted";
        let err = classify(&Error::TextInsteadOfArtifact(reply.to_string()));
        assert_eq!(err.category, ErrorCategory::NoArtifactProduced);

        let reply = "I cannot draw that because of my safety policy";
        assert_eq!(
            classify(&Error::TextInsteadOfArtifact(reply.to_string())).category,
            ErrorCategory::NoArtifactProduced
        );
    }

    #[test]
    fn test_error_kind_decides_before_message_text() {
        let err = classify(&Error::MalformedResponse("quota field missing".to_string()));
        assert_eq!(err.category, ErrorCategory::MalformedResponse);

        let err = classify(&Error::PollCeilingExceeded("service unavailable after 3 polls".to_string()));
        assert_eq!(err.category, ErrorCategory::TimeoutExceeded);

        let err = classify(&Error::InvalidRequest("blocked words are not allowed".to_string()));
        assert_eq!(err.category, ErrorCategory::Unknown);
        assert_eq!(err.message, "blocked words are not allowed");
    }

    #[test]
    fn test_job_failure_messages_still_use_keywords() {
        assert_eq!(
            classify(&Error::JobFailed("Quota exceeded for video generation".to_string())).category,
            ErrorCategory::QuotaExceeded
        );
        assert_eq!(
            classify(&Error::JobFailed("Video blocked by safety filters".to_string())).category,
            ErrorCategory::ContentPolicyViolation
        );
    }

    #[test]
    fn test_parse_failures_classify_as_malformed() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        assert_eq!(
            classify(&Error::Serialization(parse_err)).category,
            ErrorCategory::MalformedResponse
        );
        assert_eq!(
            classify(&Error::MalformedResponse("missing field".to_string())).category,
            ErrorCategory::MalformedResponse
        );
    }

    #[test]
    fn test_poll_ceiling_classifies_as_timeout() {
        let err = classify(&Error::PollCeilingExceeded("after 3 polls".to_string()));
        assert_eq!(err.category, ErrorCategory::TimeoutExceeded);
    }

    #[test]
    fn test_unknown_passes_message_through() {
        let err = classify(&backend(400, "API key not valid"));
        assert_eq!(err.category, ErrorCategory::Unknown);
        assert_eq!(err.message, "API key not valid");
    }

    #[test]
    fn test_rules_apply_in_order() {
        // Policy wins over a rate-limit status.
        let err = classify(&backend(429, "request blocked"));
        assert_eq!(err.category, ErrorCategory::ContentPolicyViolation);
    }

    #[test]
    fn test_transient_predicate_prefers_status() {
        assert!(is_transient(&backend(503, "try again")));
        assert!(is_transient(&backend(500, "")));
        assert!(!is_transient(&backend(400, "internal validation failed")));
        assert!(!is_transient(&backend(429, "quota")));
    }

    #[test]
    fn test_transient_predicate_message_fallback() {
        assert!(is_transient(&Error::Generic("Internal error".to_string())));
        assert!(is_transient(&Error::Generic("model overloaded".to_string())));
        assert!(!is_transient(&Error::Generic("bad prompt".to_string())));
    }

    #[test]
    fn test_terminal_kinds_are_never_transient() {
        assert!(!is_transient(&Error::PolicyBlocked("SAFETY".to_string())));
        assert!(!is_transient(&Error::MalformedResponse("x".to_string())));
        assert!(!is_transient(&Error::JobFailed("internal".to_string())));
    }
}
