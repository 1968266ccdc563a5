//! Intent-level facade over the generation pipelines.

use crate::aggregate::{Aggregator, MultiArtifact};
use crate::ai::mime::{extension_for_mime, is_raw_pcm, pcm_sample_rate, pcm_to_wav};
use crate::ai::{GeminiClient, GenerativeBackend};
use crate::builders::{
    self, visual::LOGO_VARIATIONS, AdCopyParams, BrandKitParams, ChatParams, CreativeIdeaParams,
    ImageEditParams, ImageParams, InfographicParams, LogoParams, ProductSceneParams, SeoParams,
    SocialPostParams, SpeechParams, StyleAnalysisParams, SummaryParams, TranslationParams,
    VideoParams, WebsiteCopyParams,
};
use crate::classifier::classify;
use crate::error::GenerationResult;
use crate::events::EventSink;
use crate::models::{
    AdCopy, BrandKit, Config, ContentSummary, CreativeIdeas, GenerationRequest, MediaBlob,
    SeoReport, SocialPost, StyleAnalysis, WebsiteCopy,
};
use crate::pipeline::Pipeline;
use crate::poller::{JobPoller, PollSettings};
use crate::retry::RetryPolicy;
use crate::{Error, Result};
use chrono::Local;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Runs every supported intent against one backend.
pub struct Studio {
    pipeline: Pipeline,
    aggregator: Aggregator,
    poller: JobPoller,
    output_dir: PathBuf,
}

/// Injectable dependencies used to construct [`Studio`] in tests/harnesses.
pub struct StudioServices {
    pub backend: Arc<dyn GenerativeBackend>,
    pub retry: RetryPolicy,
    pub poll: PollSettings,
}

impl Studio {
    pub fn with_services(services: StudioServices, output_dir: PathBuf) -> Self {
        let pipeline = Pipeline::new(services.backend.clone(), services.retry);
        Self {
            aggregator: Aggregator::new(pipeline.clone()),
            poller: JobPoller::new(services.backend, services.retry, services.poll),
            pipeline,
            output_dir,
        }
    }

    /// Construct a studio talking to Gemini, configured from the environment.
    pub fn new() -> Result<Self> {
        let config = Config::from_env()?;
        let backend = GeminiClient::from_config(&config);
        info!(
            "Gemini backend configured (timeout {:?}{})",
            config.timeout,
            config
                .base_url
                .as_deref()
                .map(|url| format!(", base URL {}", url))
                .unwrap_or_default()
        );

        let date = Local::now().format("%Y-%m-%d").to_string();
        let output_dir = PathBuf::from("output").join(format!("{}_{}", date, Uuid::new_v4()));

        Ok(Self::with_services(
            StudioServices {
                backend: Arc::new(backend),
                retry: RetryPolicy::default(),
                poll: PollSettings::default(),
            },
            output_dir,
        ))
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write a binary artifact to the session output directory.
    pub fn save_artifact(&self, name: &str, blob: &MediaBlob) -> Result<PathBuf> {
        if name.trim().is_empty() || name.contains(['/', '\\']) {
            return Err(Error::InvalidRequest(format!(
                "invalid artifact name '{}'",
                name
            )));
        }
        fs::create_dir_all(&self.output_dir)?;
        let path = self
            .output_dir
            .join(format!("{}.{}", name, extension_for_mime(&blob.mime_type)));
        fs::write(&path, &blob.data)?;
        info!("Saved {} ({} bytes)", path.display(), blob.data.len());
        Ok(path)
    }

    async fn text(
        &self,
        request: Result<GenerationRequest>,
        events: &EventSink,
    ) -> GenerationResult<String> {
        let request = request.map_err(|e| classify(&e))?;
        let artifact = self.pipeline.run(&request, events).await?;
        artifact
            .text()
            .map(str::to_string)
            .ok_or_else(|| classify(&Error::NoArtifact("expected a text response".to_string())))
    }

    async fn structured<T: DeserializeOwned>(
        &self,
        request: Result<GenerationRequest>,
        events: &EventSink,
    ) -> GenerationResult<T> {
        let request = request.map_err(|e| classify(&e))?;
        let artifact = self.pipeline.run(&request, events).await?;
        artifact.parse_as().map_err(|e| classify(&e))
    }

    async fn media(
        &self,
        request: Result<GenerationRequest>,
        events: &EventSink,
    ) -> GenerationResult<MediaBlob> {
        let request = request.map_err(|e| classify(&e))?;
        let artifact = self.pipeline.run(&request, events).await?;
        artifact
            .into_media()
            .ok_or_else(|| classify(&Error::NoArtifact("expected a media response".to_string())))
    }

    pub async fn social_post(
        &self,
        params: &SocialPostParams,
        events: &EventSink,
    ) -> GenerationResult<SocialPost> {
        self.structured(builders::social_post(params), events).await
    }

    pub async fn ad_copy(&self, params: &AdCopyParams, events: &EventSink) -> GenerationResult<AdCopy> {
        self.structured(builders::ad_copy(params), events).await
    }

    pub async fn website_copy(
        &self,
        params: &WebsiteCopyParams,
        events: &EventSink,
    ) -> GenerationResult<WebsiteCopy> {
        self.structured(builders::website_copy(params), events).await
    }

    pub async fn brand_kit(
        &self,
        params: &BrandKitParams,
        events: &EventSink,
    ) -> GenerationResult<BrandKit> {
        self.structured(builders::brand_kit(params), events).await
    }

    pub async fn creative_ideas(
        &self,
        params: &CreativeIdeaParams,
        events: &EventSink,
    ) -> GenerationResult<CreativeIdeas> {
        self.structured(builders::creative_idea(params), events).await
    }

    pub async fn image(&self, params: &ImageParams, events: &EventSink) -> GenerationResult<MediaBlob> {
        self.media(builders::image(params), events).await
    }

    pub async fn edit_image(
        &self,
        params: &ImageEditParams,
        events: &EventSink,
    ) -> GenerationResult<MediaBlob> {
        self.media(builders::image_edit(params), events).await
    }

    pub async fn product_scene(
        &self,
        params: &ProductSceneParams,
        events: &EventSink,
    ) -> GenerationResult<MediaBlob> {
        self.media(builders::product_scene(params), events).await
    }

    pub async fn infographic(
        &self,
        params: &InfographicParams,
        events: &EventSink,
    ) -> GenerationResult<MediaBlob> {
        self.media(builders::infographic(params), events).await
    }

    /// Generate `count` logo concepts concurrently, each in a different
    /// design direction. Concepts that fail are reported in `failures`.
    pub async fn logo_concepts(
        &self,
        params: &LogoParams,
        count: usize,
        events: &EventSink,
    ) -> GenerationResult<MultiArtifact> {
        let variations: Vec<String> = LOGO_VARIATIONS.iter().map(|v| v.to_string()).collect();
        self.aggregator
            .run(
                count,
                &variations,
                |_, variation| builders::logo_concept(params, variation),
                events,
            )
            .await
    }

    pub async fn video(&self, params: &VideoParams, events: &EventSink) -> GenerationResult<MediaBlob> {
        let request = builders::video(params).map_err(|e| classify(&e))?;
        let job = self.poller.run(&request, events).await?;
        job.result
            .and_then(|artifact| artifact.into_media())
            .ok_or_else(|| classify(&Error::NoArtifact("No video was generated".to_string())))
    }

    /// Synthesize speech. Raw PCM from the backend is wrapped into WAV.
    pub async fn speech(&self, params: &SpeechParams, events: &EventSink) -> GenerationResult<MediaBlob> {
        let audio = self.media(builders::speech(params), events).await?;
        if is_raw_pcm(&audio.mime_type) {
            let rate = pcm_sample_rate(&audio.mime_type);
            return Ok(MediaBlob::new("audio/wav", pcm_to_wav(&audio.data, rate)));
        }
        Ok(audio)
    }

    pub async fn chat(&self, params: &ChatParams, events: &EventSink) -> GenerationResult<String> {
        self.text(builders::chat_turn(params), events).await
    }

    pub async fn summarize(
        &self,
        params: &SummaryParams,
        events: &EventSink,
    ) -> GenerationResult<ContentSummary> {
        self.structured(builders::content_summary(params), events).await
    }

    pub async fn seo_analysis(
        &self,
        params: &SeoParams,
        events: &EventSink,
    ) -> GenerationResult<SeoReport> {
        self.structured(builders::seo_analysis(params), events).await
    }

    pub async fn translate(
        &self,
        params: &TranslationParams,
        events: &EventSink,
    ) -> GenerationResult<String> {
        self.text(builders::translation(params), events).await
    }

    pub async fn analyze_style(
        &self,
        params: &StyleAnalysisParams,
        events: &EventSink,
    ) -> GenerationResult<StyleAnalysis> {
        self.structured(builders::style_analysis(params), events).await
    }
}
