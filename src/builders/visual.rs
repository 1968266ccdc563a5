//! Builders for image intents and image understanding.

use super::{
    image_model, object_schema, optional_or, request, require_media, required, safe_config,
    string_array_schema, string_schema, structured_config, text_model,
};
use crate::aspect::{self, AspectRatio};
use crate::models::{GenerationRequest, LanguageSpec, MediaBlob, OperationKind, QualityTier};
use crate::{prompts, Result};
use serde_json::json;

/// Design directions cycled through when several logo concepts are requested.
pub const LOGO_VARIATIONS: [&str; 4] = [
    "a minimal geometric symbol",
    "a bold custom wordmark",
    "a friendly hand-drawn emblem",
    "a modern monogram lettermark",
];

const DEFAULT_STYLE: &str = "clean, modern and professional";
const MAX_DATA_POINTS: usize = 8;

fn image_request(
    kind: OperationKind,
    tier: QualityTier,
    prompt: String,
    ratio: AspectRatio,
    reference_media: Vec<MediaBlob>,
) -> GenerationRequest {
    let mut config = safe_config();
    config.aspect_ratio = Some(ratio);
    let mut req = request(kind, image_model(tier), prompt, config);
    req.reference_media = reference_media;
    req
}

#[derive(Debug, Clone, Default)]
pub struct ImageParams {
    pub description: String,
    pub style: Option<String>,
    /// Ratio or named format, e.g. `16:9`, `instagram story`, `A4 landscape`.
    pub size: String,
    pub constraints: Option<String>,
    pub negative_prompt: Option<String>,
    pub tier: QualityTier,
}

pub fn image(params: &ImageParams) -> Result<GenerationRequest> {
    let description = required("description", &params.description)?;

    let mut constraints = Vec::new();
    if let Some(extra) = params.constraints.as_deref().map(str::trim) {
        if !extra.is_empty() {
            constraints.push(extra.to_string());
        }
    }
    if let Some(avoid) = params.negative_prompt.as_deref().map(str::trim) {
        if !avoid.is_empty() {
            constraints.push(format!("Avoid: {}", avoid));
        }
    }

    let prompt = prompts::render(
        prompts::IMAGE,
        &[
            ("description", &description),
            ("style", &optional_or(params.style.as_deref(), DEFAULT_STYLE)),
            ("constraints", &constraints.join("\n")),
        ],
    );

    Ok(image_request(
        OperationKind::Image,
        params.tier,
        prompt,
        aspect::resolve(&params.size),
        Vec::new(),
    ))
}

#[derive(Debug, Clone)]
pub struct ImageEditParams {
    pub instruction: String,
    pub source: MediaBlob,
    pub tier: QualityTier,
}

pub fn image_edit(params: &ImageEditParams) -> Result<GenerationRequest> {
    let instruction = required("instruction", &params.instruction)?;
    let source = require_media("source image", &params.source)?;

    let prompt = prompts::render(prompts::IMAGE_EDIT, &[("instruction", &instruction)]);

    let mut req = request(
        OperationKind::ImageEdit,
        image_model(params.tier),
        prompt,
        safe_config(),
    );
    req.reference_media = vec![source];
    Ok(req)
}

#[derive(Debug, Clone)]
pub struct ProductSceneParams {
    pub product: MediaBlob,
    pub scene: String,
    pub style: Option<String>,
    pub size: String,
    pub tier: QualityTier,
}

pub fn product_scene(params: &ProductSceneParams) -> Result<GenerationRequest> {
    let scene = required("scene", &params.scene)?;
    let product = require_media("product photo", &params.product)?;

    let prompt = prompts::render(
        prompts::PRODUCT_SCENE,
        &[
            ("scene", &scene),
            ("style", &optional_or(params.style.as_deref(), "photorealistic commercial photography")),
        ],
    );

    Ok(image_request(
        OperationKind::ImageEdit,
        params.tier,
        prompt,
        aspect::resolve(&params.size),
        vec![product],
    ))
}

#[derive(Debug, Clone, Default)]
pub struct InfographicParams {
    pub topic: String,
    pub data_points: Vec<String>,
    pub language: LanguageSpec,
    pub size: String,
    pub tier: QualityTier,
}

pub fn infographic(params: &InfographicParams) -> Result<GenerationRequest> {
    let topic = required("topic", &params.topic)?;

    let points: Vec<String> = params
        .data_points
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .take(MAX_DATA_POINTS)
        .map(|p| format!("- {}", p))
        .collect();
    let data_points = if points.is_empty() {
        "- Choose the three to five most useful facts about the topic".to_string()
    } else {
        points.join("\n")
    };

    let prompt = prompts::render(
        prompts::INFOGRAPHIC,
        &[
            ("topic", &topic),
            ("data_points", &data_points),
            ("language", &params.language.describe()),
        ],
    );

    // Infographics read top to bottom; default to a portrait sheet.
    let ratio = if params.size.trim().is_empty() {
        AspectRatio::Portrait
    } else {
        aspect::resolve(&params.size)
    };

    Ok(image_request(
        OperationKind::Image,
        params.tier,
        prompt,
        ratio,
        Vec::new(),
    ))
}

#[derive(Debug, Clone, Default)]
pub struct LogoParams {
    pub brand_name: String,
    pub industry: String,
    pub style: Option<String>,
    pub tier: QualityTier,
}

/// One logo concept. `variation` steers the design direction so that
/// concurrent concepts differ from each other.
pub fn logo_concept(params: &LogoParams, variation: Option<&str>) -> Result<GenerationRequest> {
    let brand_name = required("brand name", &params.brand_name)?;
    let industry = required("industry", &params.industry)?;

    let prompt = prompts::render(
        prompts::LOGO,
        &[
            ("brand_name", &brand_name),
            ("industry", &industry),
            ("style", &optional_or(params.style.as_deref(), DEFAULT_STYLE)),
            ("variation", &optional_or(variation, LOGO_VARIATIONS[0])),
        ],
    );

    Ok(image_request(
        OperationKind::Image,
        params.tier,
        prompt,
        AspectRatio::Square,
        Vec::new(),
    ))
}

#[derive(Debug, Clone)]
pub struct StyleAnalysisParams {
    pub image: MediaBlob,
    pub language: LanguageSpec,
    pub tier: QualityTier,
}

pub fn style_analysis(params: &StyleAnalysisParams) -> Result<GenerationRequest> {
    let image = require_media("image", &params.image)?;

    let prompt = prompts::render(
        prompts::STYLE_ANALYSIS,
        &[("language", &params.language.describe())],
    );

    let schema = object_schema(
        json!({
            "style": string_schema(),
            "mood": string_schema(),
            "palette": string_array_schema(),
            "keywords": string_array_schema(),
        }),
        &["style", "mood", "palette", "keywords"],
    );

    let mut req = request(
        OperationKind::StructuredText,
        text_model(params.tier),
        prompt,
        structured_config(schema),
    );
    req.reference_media = vec![image];
    Ok(req)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use pretty_assertions::assert_eq;

    const PNG: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_image_resolves_named_size() {
        let req = image(&ImageParams {
            description: "a cup of coffee on a wooden table".to_string(),
            size: "Instagram Story".to_string(),
            negative_prompt: Some("text".to_string()),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(req.kind, OperationKind::Image);
        assert_eq!(req.model_id, "gemini-2.5-flash-image");
        assert_eq!(req.config.aspect_ratio, Some(AspectRatio::Vertical));
        assert!(req.prompt.contains("Avoid: text"));
        assert!(req.prompt.contains(DEFAULT_STYLE));
        assert!(req.config.response_schema.is_none());
    }

    #[test]
    fn test_image_unknown_size_is_square() {
        let req = image(&ImageParams {
            description: "sunset".to_string(),
            size: "whatever".to_string(),
            tier: QualityTier::Pro,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(req.config.aspect_ratio, Some(AspectRatio::Square));
        assert_eq!(req.model_id, "gemini-3-pro-image-preview");
    }

    #[test]
    fn test_image_edit_attaches_source() {
        let req = image_edit(&ImageEditParams {
            instruction: "make the sky purple".to_string(),
            source: MediaBlob::new("", PNG.to_vec()),
            tier: QualityTier::Standard,
        })
        .unwrap();
        assert_eq!(req.kind, OperationKind::ImageEdit);
        assert_eq!(req.reference_media.len(), 1);
        assert_eq!(req.reference_media[0].mime_type, "image/png");
        assert!(req.config.aspect_ratio.is_none());
    }

    #[test]
    fn test_image_edit_rejects_empty_source() {
        let err = image_edit(&ImageEditParams {
            instruction: "crop".to_string(),
            source: MediaBlob::new("image/png", vec![]),
            tier: QualityTier::Standard,
        })
        .unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
    }

    #[test]
    fn test_product_scene_uses_reference_and_ratio() {
        let req = product_scene(&ProductSceneParams {
            product: MediaBlob::new("image/png", PNG.to_vec()),
            scene: "a marble kitchen counter".to_string(),
            style: None,
            size: "16x9".to_string(),
            tier: QualityTier::Standard,
        })
        .unwrap();
        assert_eq!(req.config.aspect_ratio, Some(AspectRatio::Widescreen));
        assert_eq!(req.reference_media.len(), 1);
        assert!(req.prompt.contains("a marble kitchen counter"));
    }

    #[test]
    fn test_infographic_lists_points_and_defaults_portrait() {
        let req = infographic(&InfographicParams {
            topic: "coffee exports".to_string(),
            data_points: vec!["Brazil 35%".to_string(), " ".to_string(), "Vietnam 17%".to_string()],
            language: LanguageSpec::new("Arabic"),
            ..Default::default()
        })
        .unwrap();
        assert!(req.prompt.contains("- Brazil 35%\n- Vietnam 17%"));
        assert!(req.prompt.contains("must be in Arabic"));
        assert_eq!(req.config.aspect_ratio, Some(AspectRatio::Portrait));
    }

    #[test]
    fn test_logo_concept_variation_changes_prompt() {
        let params = LogoParams {
            brand_name: "Sahra".to_string(),
            industry: "cosmetics".to_string(),
            ..Default::default()
        };
        let first = logo_concept(&params, Some(LOGO_VARIATIONS[1])).unwrap();
        let default = logo_concept(&params, None).unwrap();

        assert!(first.prompt.contains(LOGO_VARIATIONS[1]));
        assert!(default.prompt.contains(LOGO_VARIATIONS[0]));
        assert_eq!(first.config.aspect_ratio, Some(AspectRatio::Square));
    }

    #[test]
    fn test_style_analysis_is_structured_with_media() {
        let req = style_analysis(&StyleAnalysisParams {
            image: MediaBlob::new("image/png", PNG.to_vec()),
            language: LanguageSpec::default(),
            tier: QualityTier::Standard,
        })
        .unwrap();
        assert_eq!(req.kind, OperationKind::StructuredText);
        assert_eq!(req.model_id, "gemini-2.5-flash");
        assert_eq!(req.reference_media.len(), 1);
        assert!(req.config.response_schema.is_some());
    }
}
