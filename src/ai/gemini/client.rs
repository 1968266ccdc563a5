use super::types::{
    ApiErrorEnvelope, Content, GenerateContentRequest, GenerateContentResponse, GoogleSearch,
    ImageConfig, InlineData, Operation, Part, PredictLongRunningRequest, PrebuiltVoiceConfig,
    SpeechConfig, Tool, VideoImage, VideoInstance, VideoParameters, VoiceConfig,
    WireGenerationConfig, WireSafetySetting,
};
use crate::ai::{BackendResponse, ContentPart, GenerativeBackend, OperationHandle, OperationStatus};
use crate::models::{ChatRole, Config, GenerationRequest, MediaBlob, OperationKind};
use crate::{Error, Result};
use async_trait::async_trait;
use base64::Engine as _;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_VIDEO_MIME: &str = "video/mp4";

/// Gemini REST client implementing [`GenerativeBackend`].
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl GeminiClient {
    pub fn new(api_key: String, timeout: Duration) -> Self {
        Self::new_with_client(api_key, timeout, Client::new())
    }

    pub fn new_with_client(api_key: String, timeout: Duration, client: Client) -> Self {
        Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout,
        }
    }

    /// Construct from environment configuration. The key is read once here.
    pub fn from_config(config: &Config) -> Self {
        let client = Self::new(config.api_key.clone(), config.timeout);
        match &config.base_url {
            Some(base_url) => client.with_base_url(base_url.clone()),
            None => client,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Model IDs may be given with or without the `models/` prefix.
    fn model_url(&self, model_id: &str, method: &str) -> String {
        let model = model_id.strip_prefix("models/").unwrap_or(model_id);
        format!("{}/v1beta/models/{}:{}", self.base_url, model, method)
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response> {
        let response = request
            .timeout(self.timeout)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send request to Gemini: {}", e);
                e
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            tracing::error!("Gemini API error (status {}): {}", status, error_text);
            return Err(Error::Backend {
                status: status.as_u16(),
                message: backend_message(&error_text),
            });
        }

        Ok(response)
    }

    async fn decode<Resp: DeserializeOwned>(response: reqwest::Response) -> Result<Resp> {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse Gemini response: {}\nBody: {}", e, body);
            Error::MalformedResponse(format!("Failed to parse Gemini response: {}", e))
        })
    }

    async fn post_json<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        url: String,
        request: &Req,
    ) -> Result<Resp> {
        let response = self.send(self.client.post(&url).json(request)).await?;
        Self::decode(response).await
    }
}

/// Prefer the structured `error.message (error.status)` over the raw body.
fn backend_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrorEnvelope>(body) {
        Ok(envelope) => match envelope.error.status {
            Some(status) => format!("{} ({})", envelope.error.message, status),
            None => envelope.error.message,
        },
        Err(_) => body.trim().to_string(),
    }
}

fn inline_part(blob: &MediaBlob) -> Part {
    Part::InlineData {
        inline_data: InlineData {
            mime_type: blob.mime_type.clone(),
            data: base64::engine::general_purpose::STANDARD.encode(&blob.data),
        },
    }
}

fn role_name(role: ChatRole) -> &'static str {
    match role {
        ChatRole::User => "user",
        ChatRole::Model => "model",
    }
}

/// Translate a backend-neutral request into a `generateContent` body.
pub(crate) fn content_request(request: &GenerationRequest) -> GenerateContentRequest {
    let config = &request.config;

    let mut contents: Vec<Content> = request
        .history
        .iter()
        .map(|turn| Content {
            role: Some(role_name(turn.role).to_string()),
            parts: vec![Part::Text {
                text: turn.text.clone(),
            }],
        })
        .collect();

    let mut parts: Vec<Part> = request.reference_media.iter().map(inline_part).collect();
    parts.push(Part::Text {
        text: request.prompt.clone(),
    });
    contents.push(Content {
        role: Some("user".to_string()),
        parts,
    });

    let response_modalities = match request.kind {
        OperationKind::Image | OperationKind::ImageEdit => Some(vec!["IMAGE".to_string()]),
        OperationKind::Speech => Some(vec!["AUDIO".to_string()]),
        _ => None,
    };
    let image_config = match request.kind {
        OperationKind::Image | OperationKind::ImageEdit => {
            config.aspect_ratio.map(|ratio| ImageConfig {
                aspect_ratio: ratio.as_str().to_string(),
            })
        }
        _ => None,
    };
    let speech_config = config.voice_name.as_ref().map(|voice| SpeechConfig {
        voice_config: VoiceConfig {
            prebuilt_voice_config: PrebuiltVoiceConfig {
                voice_name: voice.clone(),
            },
        },
    });

    GenerateContentRequest {
        system_instruction: config.system_instruction.as_ref().map(|text| Content {
            role: None,
            parts: vec![Part::Text { text: text.clone() }],
        }),
        contents,
        generation_config: Some(WireGenerationConfig {
            temperature: config.temperature,
            response_mime_type: config.response_mime_type.clone(),
            response_schema: config.response_schema.clone(),
            response_modalities,
            image_config,
            speech_config,
        }),
        tools: if config.use_search {
            vec![Tool {
                google_search: GoogleSearch::default(),
            }]
        } else {
            Vec::new()
        },
        safety_settings: config
            .safety_settings
            .iter()
            .map(|s| WireSafetySetting {
                category: s.category.to_string(),
                threshold: s.threshold.to_string(),
            })
            .collect(),
    }
}

pub(crate) fn video_request(request: &GenerationRequest) -> PredictLongRunningRequest {
    let config = &request.config;
    PredictLongRunningRequest {
        instances: vec![VideoInstance {
            prompt: request.prompt.clone(),
            image: request.reference_media.first().map(|blob| VideoImage {
                bytes_base64_encoded: base64::engine::general_purpose::STANDARD.encode(&blob.data),
                mime_type: blob.mime_type.clone(),
            }),
        }],
        parameters: VideoParameters {
            aspect_ratio: config.aspect_ratio.map(|r| r.as_str().to_string()),
            negative_prompt: config.negative_prompt.clone(),
            duration_seconds: config.duration_seconds,
        },
    }
}

fn backend_response(response: GenerateContentResponse) -> Result<BackendResponse> {
    let block_reason = response.prompt_feedback.and_then(|f| f.block_reason);
    let Some(candidate) = response.candidates.into_iter().next() else {
        return Ok(BackendResponse {
            parts: Vec::new(),
            finish_reason: None,
            block_reason,
        });
    };

    let mut parts = Vec::new();
    for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
        match part {
            Part::Text { text } => parts.push(ContentPart::Text(text)),
            Part::InlineData { inline_data } => {
                let data = base64::engine::general_purpose::STANDARD
                    .decode(&inline_data.data)
                    .map_err(|e| {
                        Error::MalformedResponse(format!("Failed to decode inline media: {}", e))
                    })?;
                tracing::debug!(
                    "Gemini returned inline media with mime_type: {}",
                    inline_data.mime_type
                );
                parts.push(ContentPart::Binary(MediaBlob::new(inline_data.mime_type, data)));
            }
            Part::Other(_) => {}
        }
    }

    Ok(BackendResponse {
        parts,
        finish_reason: candidate.finish_reason,
        block_reason,
    })
}

fn operation_status(operation: Operation) -> OperationStatus {
    if let Some(error) = operation.error {
        return OperationStatus::Failed {
            message: error.message,
        };
    }
    if !operation.done {
        return OperationStatus::Pending;
    }

    let video = operation
        .response
        .as_ref()
        .and_then(|r| r.get("generateVideoResponse"));
    if let Some(uri) = video
        .and_then(|v| v.pointer("/generatedSamples/0/video/uri"))
        .and_then(|u| u.as_str())
    {
        return OperationStatus::Done {
            artifact_uri: uri.to_string(),
        };
    }
    if let Some(reason) = video
        .and_then(|v| v.pointer("/raiMediaFilteredReasons/0"))
        .and_then(|r| r.as_str())
    {
        return OperationStatus::Failed {
            message: format!("Video blocked by safety filters: {}", reason),
        };
    }

    OperationStatus::Failed {
        message: "Job finished without a video reference".to_string(),
    }
}

#[async_trait]
impl GenerativeBackend for GeminiClient {
    async fn generate_content(&self, request: &GenerationRequest) -> Result<BackendResponse> {
        tracing::debug!(
            "Sending {:?} request to Gemini model {}",
            request.kind,
            request.model_id
        );
        let url = self.model_url(&request.model_id, "generateContent");
        let response: GenerateContentResponse =
            self.post_json(url, &content_request(request)).await?;
        backend_response(response)
    }

    async fn submit_job(&self, request: &GenerationRequest) -> Result<OperationHandle> {
        tracing::debug!("Submitting video job to Gemini model {}", request.model_id);
        let url = self.model_url(&request.model_id, "predictLongRunning");
        let operation: Operation = self.post_json(url, &video_request(request)).await?;
        if let Some(error) = operation.error {
            return Err(Error::JobFailed(error.message));
        }
        Ok(OperationHandle(operation.name))
    }

    async fn poll_job(&self, handle: &OperationHandle) -> Result<OperationStatus> {
        let url = format!("{}/v1beta/{}", self.base_url, handle.0);
        let response = self.send(self.client.get(&url)).await?;
        let operation: Operation = Self::decode(response).await?;
        Ok(operation_status(operation))
    }

    async fn fetch_artifact(&self, uri: &str) -> Result<MediaBlob> {
        tracing::debug!("Fetching artifact from {}", uri);
        let response = self.send(self.client.get(uri)).await?;
        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(DEFAULT_VIDEO_MIME)
            .to_string();
        let data = response.bytes().await?.to_vec();
        Ok(MediaBlob::new(mime_type, data))
    }
}
