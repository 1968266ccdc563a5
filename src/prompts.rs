pub const SAFETY: &str = include_str!("../data/prompts/safety.txt");
pub const SOCIAL_POST: &str = include_str!("../data/prompts/social_post.txt");
pub const AD_COPY: &str = include_str!("../data/prompts/ad_copy.txt");
pub const WEBSITE_COPY: &str = include_str!("../data/prompts/website_copy.txt");
pub const BRAND_KIT: &str = include_str!("../data/prompts/brand_kit.txt");
pub const CREATIVE_IDEA: &str = include_str!("../data/prompts/creative_idea.txt");
pub const IMAGE: &str = include_str!("../data/prompts/image.txt");
pub const IMAGE_EDIT: &str = include_str!("../data/prompts/image_edit.txt");
pub const PRODUCT_SCENE: &str = include_str!("../data/prompts/product_scene.txt");
pub const INFOGRAPHIC: &str = include_str!("../data/prompts/infographic.txt");
pub const LOGO: &str = include_str!("../data/prompts/logo.txt");
pub const VIDEO: &str = include_str!("../data/prompts/video.txt");
pub const SPEECH: &str = include_str!("../data/prompts/speech.txt");
pub const CHAT_SYSTEM: &str = include_str!("../data/prompts/chat_system.txt");
pub const SUMMARY: &str = include_str!("../data/prompts/summary.txt");
pub const SEO: &str = include_str!("../data/prompts/seo.txt");
pub const TRANSLATION: &str = include_str!("../data/prompts/translation.txt");
pub const STYLE_ANALYSIS: &str = include_str!("../data/prompts/style_analysis.txt");

/// Replace `{{key}}` placeholders in a template string.
///
/// The template is scanned once, so placeholders inside substituted values are
/// left as written. Unknown placeholders stay in place.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find("{{") {
        result.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        let Some(close) = after.find("}}") else {
            rest = &rest[open..];
            break;
        };
        let key = &after[..close];
        match vars.iter().find(|(name, _)| *name == key) {
            Some((_, value)) => result.push_str(value),
            None => result.push_str(&rest[open..open + close + 4]),
        }
        rest = &after[close + 2..];
    }
    result.push_str(rest);
    result.trim().to_string()
}
