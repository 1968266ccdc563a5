//! Data models and structures
//!
//! Defines the backend-neutral request/result types that flow through the
//! orchestration layer, the intent parameter vocabulary shared by builders,
//! typed structured results, and environment configuration.

use crate::aspect::AspectRatio;
use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Text,
    StructuredText,
    Image,
    ImageEdit,
    Video,
    Speech,
}

impl OperationKind {
    /// Whether the request expects inline binary media in the response.
    pub fn is_binary(&self) -> bool {
        matches!(self, Self::Image | Self::ImageEdit | Self::Speech)
    }
}

/// Binary payload paired with its MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaBlob {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl MediaBlob {
    pub fn new(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafetySetting {
    pub category: &'static str,
    pub threshold: &'static str,
}

/// Per-call backend configuration flags.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationConfig {
    pub system_instruction: Option<String>,
    /// Structured-output mode: set together with `response_schema`.
    pub response_mime_type: Option<String>,
    pub response_schema: Option<serde_json::Value>,
    /// Enables the backend's retrieval (search grounding) tool.
    pub use_search: bool,
    pub aspect_ratio: Option<AspectRatio>,
    pub safety_settings: Vec<SafetySetting>,
    pub temperature: Option<f32>,
    pub voice_name: Option<String>,
    pub negative_prompt: Option<String>,
    pub duration_seconds: Option<u32>,
}

/// A fully composed backend call. Built fresh per call by a builder.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub kind: OperationKind,
    pub model_id: String,
    pub prompt: String,
    pub reference_media: Vec<MediaBlob>,
    pub history: Vec<ChatTurn>,
    pub config: GenerationConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArtifactPayload {
    Text(String),
    Structured(serde_json::Value),
    Binary(MediaBlob),
}

/// Successful output of a pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactResult {
    pub payload: ArtifactPayload,
    pub source_request: GenerationRequest,
}

impl ArtifactResult {
    pub fn text(&self) -> Option<&str> {
        match &self.payload {
            ArtifactPayload::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn media(&self) -> Option<&MediaBlob> {
        match &self.payload {
            ArtifactPayload::Binary(blob) => Some(blob),
            _ => None,
        }
    }

    pub fn into_media(self) -> Option<MediaBlob> {
        match self.payload {
            ArtifactPayload::Binary(blob) => Some(blob),
            _ => None,
        }
    }

    /// Deserialize a structured payload into `T`. Never yields a partial value.
    pub fn parse_as<T: DeserializeOwned>(&self) -> Result<T> {
        match &self.payload {
            ArtifactPayload::Structured(value) => serde_json::from_value(value.clone())
                .map_err(|e| Error::MalformedResponse(e.to_string())),
            _ => Err(Error::MalformedResponse(
                "expected a structured payload".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum QualityTier {
    #[default]
    Standard,
    Pro,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Tone {
    #[default]
    Professional,
    Friendly,
    Playful,
    Formal,
    Inspirational,
    Persuasive,
}

impl Tone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Professional => "professional",
            Self::Friendly => "friendly",
            Self::Playful => "playful",
            Self::Formal => "formal",
            Self::Inspirational => "inspirational",
            Self::Persuasive => "persuasive",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Platform {
    #[default]
    Instagram,
    Facebook,
    X,
    Linkedin,
    Tiktok,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Instagram => "Instagram",
            Self::Facebook => "Facebook",
            Self::X => "X (Twitter)",
            Self::Linkedin => "LinkedIn",
            Self::Tiktok => "TikTok",
        }
    }

    /// Rough caption length ceiling for the platform.
    pub fn max_caption_chars(&self) -> usize {
        match self {
            Self::X => 280,
            Self::Linkedin => 3000,
            Self::Tiktok => 2200,
            Self::Instagram => 2200,
            Self::Facebook => 5000,
        }
    }
}

/// Target output language, with an optional regional dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageSpec {
    pub language: String,
    pub dialect: Option<String>,
}

impl LanguageSpec {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            dialect: None,
        }
    }

    pub fn with_dialect(mut self, dialect: impl Into<String>) -> Self {
        self.dialect = Some(dialect.into());
        self
    }

    /// Human-readable form used inside prompts, e.g. `Arabic (Egyptian dialect)`.
    pub fn describe(&self) -> String {
        match self.dialect.as_deref().map(str::trim) {
            Some(dialect) if !dialect.is_empty() => {
                format!("{} ({} dialect)", self.language.trim(), dialect)
            }
            _ => self.language.trim().to_string(),
        }
    }
}

impl Default for LanguageSpec {
    fn default() -> Self {
        Self::new("English")
    }
}

// Typed structured results

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialPost {
    pub caption: String,
    pub hashtags: Vec<String>,
    pub call_to_action: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdCopy {
    pub headlines: Vec<String>,
    pub body: String,
    pub call_to_action: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebsiteSection {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebsiteCopy {
    pub headline: String,
    pub subheadline: String,
    pub sections: Vec<WebsiteSection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaletteColor {
    pub name: String,
    pub hex: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandKit {
    pub tagline: String,
    pub mission: String,
    pub palette: Vec<PaletteColor>,
    pub fonts: Vec<String>,
    pub voice: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreativeIdea {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreativeIdeas {
    pub ideas: Vec<CreativeIdea>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentSummary {
    pub summary: String,
    pub key_points: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeoReport {
    pub score: u32,
    pub title_suggestion: String,
    pub meta_description: String,
    pub keywords: Vec<String>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleAnalysis {
    pub style: String,
    pub mood: String,
    pub palette: Vec<String>,
    pub keywords: Vec<String>,
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub base_url: Option<String>,
    pub timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| Error::Config("GEMINI_API_KEY not set".to_string()))?;
        if api_key.trim().is_empty() {
            return Err(Error::Config("GEMINI_API_KEY is empty".to_string()));
        }

        let timeout = match std::env::var("GEMINI_TIMEOUT_SECS") {
            Ok(raw) => raw.parse::<u64>().map(Duration::from_secs).map_err(|_| {
                Error::Config(format!("GEMINI_TIMEOUT_SECS must be an integer, got '{}'", raw))
            })?,
            Err(_) => Duration::from_secs(120),
        };

        Ok(Self {
            api_key,
            base_url: std::env::var("GEMINI_BASE_URL").ok(),
            timeout,
        })
    }
}
