//! Builders for textual and structured-text intents.

use super::{
    object_schema, optional_or, request, required, safe_config, string_array_schema,
    string_schema, structured_config, text_model,
};
use crate::models::{
    ChatTurn, GenerationRequest, LanguageSpec, OperationKind, Platform, QualityTier, Tone,
};
use crate::{prompts, Error, Result};
use serde_json::json;

const MAX_HEADLINES: usize = 5;
const MAX_IDEAS: usize = 10;
const MIN_SUMMARY_WORDS: usize = 20;
const MAX_SUMMARY_WORDS: usize = 500;

#[derive(Debug, Clone, Default)]
pub struct SocialPostParams {
    pub topic: String,
    pub platform: Platform,
    pub language: LanguageSpec,
    pub tone: Tone,
    pub industry: Option<String>,
    pub include_hashtags: bool,
    pub tier: QualityTier,
}

pub fn social_post(params: &SocialPostParams) -> Result<GenerationRequest> {
    let topic = required("topic", &params.topic)?;
    let hashtag_rule = if params.include_hashtags {
        "Include 3 to 8 relevant hashtags."
    } else {
        "Do not use hashtags; return an empty hashtags array."
    };

    let prompt = prompts::render(
        prompts::SOCIAL_POST,
        &[
            ("platform", params.platform.as_str()),
            ("topic", &topic),
            ("language", &params.language.describe()),
            ("tone", params.tone.as_str()),
            ("industry", &optional_or(params.industry.as_deref(), "general")),
            ("max_chars", &params.platform.max_caption_chars().to_string()),
            ("hashtag_rule", hashtag_rule),
        ],
    );

    let schema = object_schema(
        json!({
            "caption": string_schema(),
            "hashtags": string_array_schema(),
            "call_to_action": string_schema(),
        }),
        &["caption", "hashtags", "call_to_action"],
    );

    Ok(request(
        OperationKind::StructuredText,
        text_model(params.tier),
        prompt,
        structured_config(schema),
    ))
}

#[derive(Debug, Clone)]
pub struct AdCopyParams {
    pub product: String,
    pub audience: Option<String>,
    pub language: LanguageSpec,
    pub tone: Tone,
    pub headline_count: usize,
    pub tier: QualityTier,
}

impl Default for AdCopyParams {
    fn default() -> Self {
        Self {
            product: String::new(),
            audience: None,
            language: LanguageSpec::default(),
            tone: Tone::Persuasive,
            headline_count: 3,
            tier: QualityTier::default(),
        }
    }
}

pub fn ad_copy(params: &AdCopyParams) -> Result<GenerationRequest> {
    let product = required("product", &params.product)?;
    let headline_count = params.headline_count.clamp(1, MAX_HEADLINES);

    let prompt = prompts::render(
        prompts::AD_COPY,
        &[
            ("product", &product),
            (
                "audience",
                &optional_or(params.audience.as_deref(), "a broad general audience"),
            ),
            ("language", &params.language.describe()),
            ("tone", params.tone.as_str()),
            ("headline_count", &headline_count.to_string()),
        ],
    );

    let schema = object_schema(
        json!({
            "headlines": string_array_schema(),
            "body": string_schema(),
            "call_to_action": string_schema(),
        }),
        &["headlines", "body", "call_to_action"],
    );

    Ok(request(
        OperationKind::StructuredText,
        text_model(params.tier),
        prompt,
        structured_config(schema),
    ))
}

#[derive(Debug, Clone, Default)]
pub struct WebsiteCopyParams {
    pub business_name: String,
    pub industry: String,
    pub sections: Vec<String>,
    pub language: LanguageSpec,
    pub tone: Tone,
    pub tier: QualityTier,
}

const DEFAULT_SECTIONS: [&str; 3] = ["About us", "Services", "Contact"];

pub fn website_copy(params: &WebsiteCopyParams) -> Result<GenerationRequest> {
    let business_name = required("business name", &params.business_name)?;
    let industry = required("industry", &params.industry)?;

    let mut sections: Vec<String> = params
        .sections
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if sections.is_empty() {
        sections = DEFAULT_SECTIONS.iter().map(|s| s.to_string()).collect();
    }

    let prompt = prompts::render(
        prompts::WEBSITE_COPY,
        &[
            ("business_name", &business_name),
            ("industry", &industry),
            ("language", &params.language.describe()),
            ("tone", params.tone.as_str()),
            ("sections", &sections.join(", ")),
        ],
    );

    let section_schema = object_schema(
        json!({ "title": string_schema(), "body": string_schema() }),
        &["title", "body"],
    );
    let schema = object_schema(
        json!({
            "headline": string_schema(),
            "subheadline": string_schema(),
            "sections": { "type": "ARRAY", "items": section_schema },
        }),
        &["headline", "subheadline", "sections"],
    );

    Ok(request(
        OperationKind::StructuredText,
        text_model(params.tier),
        prompt,
        structured_config(schema),
    ))
}

#[derive(Debug, Clone, Default)]
pub struct BrandKitParams {
    pub brand_name: String,
    pub industry: String,
    pub values: Vec<String>,
    pub language: LanguageSpec,
    pub tier: QualityTier,
}

pub fn brand_kit(params: &BrandKitParams) -> Result<GenerationRequest> {
    let brand_name = required("brand name", &params.brand_name)?;
    let industry = required("industry", &params.industry)?;
    let values: Vec<&str> = params
        .values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .collect();
    let values = if values.is_empty() {
        "not specified, infer suitable values from the industry".to_string()
    } else {
        values.join(", ")
    };

    let prompt = prompts::render(
        prompts::BRAND_KIT,
        &[
            ("brand_name", &brand_name),
            ("industry", &industry),
            ("values", &values),
            ("language", &params.language.describe()),
        ],
    );

    let color_schema = object_schema(
        json!({ "name": string_schema(), "hex": string_schema() }),
        &["name", "hex"],
    );
    let schema = object_schema(
        json!({
            "tagline": string_schema(),
            "mission": string_schema(),
            "palette": { "type": "ARRAY", "items": color_schema },
            "fonts": string_array_schema(),
            "voice": string_schema(),
        }),
        &["tagline", "mission", "palette", "fonts", "voice"],
    );

    Ok(request(
        OperationKind::StructuredText,
        text_model(params.tier),
        prompt,
        structured_config(schema),
    ))
}

#[derive(Debug, Clone)]
pub struct CreativeIdeaParams {
    pub topic: String,
    pub industry: Option<String>,
    pub count: usize,
    pub language: LanguageSpec,
    pub tier: QualityTier,
}

impl Default for CreativeIdeaParams {
    fn default() -> Self {
        Self {
            topic: String::new(),
            industry: None,
            count: 5,
            language: LanguageSpec::default(),
            tier: QualityTier::default(),
        }
    }
}

pub fn creative_idea(params: &CreativeIdeaParams) -> Result<GenerationRequest> {
    let topic = required("topic", &params.topic)?;
    let count = params.count.clamp(1, MAX_IDEAS);

    let prompt = prompts::render(
        prompts::CREATIVE_IDEA,
        &[
            ("count", &count.to_string()),
            ("topic", &topic),
            ("industry", &optional_or(params.industry.as_deref(), "general")),
            ("language", &params.language.describe()),
        ],
    );

    let idea_schema = object_schema(
        json!({ "title": string_schema(), "description": string_schema() }),
        &["title", "description"],
    );
    let schema = object_schema(
        json!({ "ideas": { "type": "ARRAY", "items": idea_schema } }),
        &["ideas"],
    );

    let mut config = structured_config(schema);
    config.temperature = Some(1.0);

    Ok(request(
        OperationKind::StructuredText,
        text_model(params.tier),
        prompt,
        config,
    ))
}

#[derive(Debug, Clone, Default)]
pub struct ChatParams {
    pub history: Vec<ChatTurn>,
    pub message: String,
    pub language: LanguageSpec,
    /// Ground answers with web search.
    pub use_search: bool,
    pub tier: QualityTier,
}

pub fn chat_turn(params: &ChatParams) -> Result<GenerationRequest> {
    let message = required("message", &params.message)?;

    let persona = prompts::render(
        prompts::CHAT_SYSTEM,
        &[("language", &params.language.describe())],
    );
    let mut config = safe_config();
    config.system_instruction = Some(format!("{}\n\n{}", persona, prompts::SAFETY.trim()));
    config.use_search = params.use_search;

    let mut req = request(
        OperationKind::Text,
        text_model(params.tier),
        message,
        config,
    );
    req.history = params
        .history
        .iter()
        .filter(|turn| !turn.text.trim().is_empty())
        .cloned()
        .collect();
    Ok(req)
}

#[derive(Debug, Clone)]
pub struct SummaryParams {
    pub content: String,
    pub language: LanguageSpec,
    pub max_words: usize,
    pub tier: QualityTier,
}

impl Default for SummaryParams {
    fn default() -> Self {
        Self {
            content: String::new(),
            language: LanguageSpec::default(),
            max_words: 120,
            tier: QualityTier::default(),
        }
    }
}

pub fn content_summary(params: &SummaryParams) -> Result<GenerationRequest> {
    let content = required("content", &params.content)?;
    let max_words = params.max_words.clamp(MIN_SUMMARY_WORDS, MAX_SUMMARY_WORDS);

    let prompt = prompts::render(
        prompts::SUMMARY,
        &[
            ("max_words", &max_words.to_string()),
            ("language", &params.language.describe()),
            ("content", &content),
        ],
    );

    let schema = object_schema(
        json!({
            "summary": string_schema(),
            "key_points": string_array_schema(),
        }),
        &["summary", "key_points"],
    );

    Ok(request(
        OperationKind::StructuredText,
        text_model(params.tier),
        prompt,
        structured_config(schema),
    ))
}

#[derive(Debug, Clone, Default)]
pub struct SeoParams {
    /// A page URL, or the page content itself.
    pub target: String,
    pub keywords: Vec<String>,
    pub language: LanguageSpec,
    pub tier: QualityTier,
}

fn looks_like_url(target: &str) -> bool {
    let lower = target.to_ascii_lowercase();
    (lower.starts_with("http://") || lower.starts_with("https://")) && !target.contains(char::is_whitespace)
}

/// SEO analysis. URLs need source lookup, so the search tool is enabled and
/// JSON mode (which the backend refuses to combine with tools) is left off;
/// the pipeline still extracts and parses the JSON reply.
pub fn seo_analysis(params: &SeoParams) -> Result<GenerationRequest> {
    let target = required("target", &params.target)?;
    let keywords: Vec<&str> = params
        .keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .collect();
    let keywords = if keywords.is_empty() {
        "infer from the content".to_string()
    } else {
        keywords.join(", ")
    };

    let use_search = looks_like_url(&target);
    let source_rule = if use_search {
        "Look up the page with search before analyzing it and base every finding on what you retrieve."
    } else {
        "Analyze only the content given above."
    };

    let prompt = prompts::render(
        prompts::SEO,
        &[
            ("target", &target),
            ("keywords", &keywords),
            ("language", &params.language.describe()),
            ("source_rule", source_rule),
        ],
    );

    let config = if use_search {
        let mut config = safe_config();
        config.use_search = true;
        config
    } else {
        structured_config(object_schema(
            json!({
                "score": { "type": "INTEGER" },
                "title_suggestion": string_schema(),
                "meta_description": string_schema(),
                "keywords": string_array_schema(),
                "recommendations": string_array_schema(),
            }),
            &[
                "score",
                "title_suggestion",
                "meta_description",
                "keywords",
                "recommendations",
            ],
        ))
    };

    Ok(request(
        OperationKind::StructuredText,
        text_model(params.tier),
        prompt,
        config,
    ))
}

#[derive(Debug, Clone, Default)]
pub struct TranslationParams {
    pub text: String,
    pub source_language: Option<String>,
    pub target: LanguageSpec,
    pub tier: QualityTier,
}

pub fn translation(params: &TranslationParams) -> Result<GenerationRequest> {
    let text = required("text", &params.text)?;
    let target = required("target language", &params.target.language)?;
    let source = optional_or(params.source_language.as_deref(), "the detected source language");
    if source.eq_ignore_ascii_case(&target) && params.target.dialect.is_none() {
        return Err(Error::InvalidRequest(format!(
            "source and target language are both {}",
            target
        )));
    }

    let prompt = prompts::render(
        prompts::TRANSLATION,
        &[
            ("source", &source),
            ("target", &params.target.describe()),
            ("text", &text),
        ],
    );

    let mut config = safe_config();
    config.temperature = Some(0.2);

    Ok(request(
        OperationKind::Text,
        text_model(params.tier),
        prompt,
        config,
    ))
}
