//! Builders for long-running video jobs and speech synthesis.

use super::{optional_or, request, require_media, required, safe_config, video_model, SPEECH_MODEL};
use crate::aspect::{self, AspectRatio};
use crate::models::{GenerationRequest, MediaBlob, OperationKind, QualityTier};
use crate::{prompts, Result};

pub const DEFAULT_VOICE: &str = "Kore";
const DEFAULT_DURATION_SECS: u32 = 8;
const MIN_DURATION_SECS: u32 = 4;
const MAX_DURATION_SECS: u32 = 8;
const MAX_SPEECH_CHARS: usize = 5000;

/// Video models only render 16:9 and 9:16.
fn video_ratio(size: &str) -> AspectRatio {
    if aspect::resolve(size).is_portrait() {
        AspectRatio::Vertical
    } else {
        AspectRatio::Widescreen
    }
}

#[derive(Debug, Clone, Default)]
pub struct VideoParams {
    pub description: String,
    pub style: Option<String>,
    pub size: String,
    /// Optional first frame to animate.
    pub reference_image: Option<MediaBlob>,
    pub duration_seconds: Option<u32>,
    pub negative_prompt: Option<String>,
    pub tier: QualityTier,
}

pub fn video(params: &VideoParams) -> Result<GenerationRequest> {
    let description = required("description", &params.description)?;

    let prompt = prompts::render(
        prompts::VIDEO,
        &[
            ("description", &description),
            ("style", &optional_or(params.style.as_deref(), "cinematic, natural lighting")),
        ],
    );

    let mut config = safe_config();
    config.aspect_ratio = Some(video_ratio(&params.size));
    config.duration_seconds = Some(
        params
            .duration_seconds
            .unwrap_or(DEFAULT_DURATION_SECS)
            .clamp(MIN_DURATION_SECS, MAX_DURATION_SECS),
    );
    config.negative_prompt = params
        .negative_prompt
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string);

    let mut req = request(OperationKind::Video, video_model(params.tier), prompt, config);
    if let Some(image) = &params.reference_image {
        req.reference_media = vec![require_media("reference image", image)?];
    }
    Ok(req)
}

#[derive(Debug, Clone, Default)]
pub struct SpeechParams {
    pub text: String,
    pub voice: Option<String>,
    /// Delivery direction, e.g. "Say cheerfully".
    pub delivery: Option<String>,
}

pub fn speech(params: &SpeechParams) -> Result<GenerationRequest> {
    let text = required("text", &params.text)?;
    let text: String = text.chars().take(MAX_SPEECH_CHARS).collect();

    let prompt = prompts::render(
        prompts::SPEECH,
        &[
            ("delivery", &optional_or(params.delivery.as_deref(), "Say clearly and warmly")),
            ("text", &text),
        ],
    );

    // TTS models reject system instructions; only safety settings are sent.
    let mut config = safe_config();
    config.system_instruction = None;
    config.voice_name = Some(optional_or(params.voice.as_deref(), DEFAULT_VOICE));

    Ok(request(OperationKind::Speech, SPEECH_MODEL, prompt, config))
}
