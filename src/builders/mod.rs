//! Per-intent request builders
//!
//! Each builder is a pure function: it validates and normalizes intent
//! parameters, picks a model for the quality tier, renders a prompt template
//! and sets configuration flags. None of them perform I/O.

pub mod media;
pub mod text;
pub mod visual;

pub use media::{speech, video, SpeechParams, VideoParams};
pub use text::{
    ad_copy, brand_kit, chat_turn, content_summary, creative_idea, seo_analysis, social_post,
    translation, website_copy, AdCopyParams, BrandKitParams, ChatParams, CreativeIdeaParams,
    SeoParams, SocialPostParams, SummaryParams, TranslationParams, WebsiteCopyParams,
};
pub use visual::{
    image, image_edit, infographic, logo_concept, product_scene, style_analysis, ImageEditParams,
    ImageParams, InfographicParams, LogoParams, ProductSceneParams, StyleAnalysisParams,
};

use crate::models::{
    GenerationConfig, GenerationRequest, MediaBlob, OperationKind, QualityTier, SafetySetting,
};
use crate::{prompts, Error, Result};
use serde_json::{json, Value};

pub const SPEECH_MODEL: &str = "gemini-2.5-flash-preview-tts";

pub fn text_model(tier: QualityTier) -> &'static str {
    match tier {
        QualityTier::Standard => "gemini-2.5-flash",
        QualityTier::Pro => "gemini-2.5-pro",
    }
}

pub fn image_model(tier: QualityTier) -> &'static str {
    match tier {
        QualityTier::Standard => "gemini-2.5-flash-image",
        QualityTier::Pro => "gemini-3-pro-image-preview",
    }
}

pub fn video_model(tier: QualityTier) -> &'static str {
    match tier {
        QualityTier::Standard => "veo-3.1-fast-generate-preview",
        QualityTier::Pro => "veo-3.1-generate-preview",
    }
}

const HARM_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

pub(crate) fn default_safety_settings() -> Vec<SafetySetting> {
    HARM_CATEGORIES
        .iter()
        .map(|&category| SafetySetting {
            category,
            threshold: "BLOCK_MEDIUM_AND_ABOVE",
        })
        .collect()
}

/// Trim a required field, rejecting empty input.
pub(crate) fn required(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidRequest(format!("{} must not be empty", field)));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn optional_or(value: Option<&str>, fallback: &str) -> String {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

pub(crate) fn require_media(field: &str, blob: &MediaBlob) -> Result<MediaBlob> {
    if blob.data.is_empty() {
        return Err(Error::InvalidRequest(format!("{} must not be empty", field)));
    }
    let mime_type = if blob.mime_type.trim().is_empty() {
        crate::ai::mime::detect_image_mime(&blob.data).to_string()
    } else {
        blob.mime_type.trim().to_string()
    };
    Ok(MediaBlob::new(mime_type, blob.data.clone()))
}

/// Base configuration shared by every builder: safety directive and settings.
pub(crate) fn safe_config() -> GenerationConfig {
    GenerationConfig {
        system_instruction: Some(prompts::SAFETY.trim().to_string()),
        safety_settings: default_safety_settings(),
        ..GenerationConfig::default()
    }
}

/// Structured-output mode: JSON mime type plus a response schema.
pub(crate) fn structured_config(schema: Value) -> GenerationConfig {
    GenerationConfig {
        response_mime_type: Some("application/json".to_string()),
        response_schema: Some(schema),
        ..safe_config()
    }
}

pub(crate) fn request(
    kind: OperationKind,
    model_id: &str,
    prompt: String,
    config: GenerationConfig,
) -> GenerationRequest {
    GenerationRequest {
        kind,
        model_id: model_id.to_string(),
        prompt,
        reference_media: Vec::new(),
        history: Vec::new(),
        config,
    }
}

pub(crate) fn string_schema() -> Value {
    json!({ "type": "STRING" })
}

pub(crate) fn string_array_schema() -> Value {
    json!({ "type": "ARRAY", "items": { "type": "STRING" } })
}

pub(crate) fn object_schema(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "OBJECT",
        "properties": properties,
        "required": required,
    })
}
