//! Response text extraction
//!
//! Models frequently wrap JSON in a Markdown code fence even when asked not
//! to. [`extract_payload`] unwraps it so the caller can parse the body.

const FENCE: &str = "```";

/// Strip a fenced code block (and its language tag) or any stray fence
/// markers, then trim. Clean input is returned unchanged.
pub fn extract_payload(raw: &str) -> String {
    let trimmed = raw.trim();

    if let Some(open) = trimmed.find(FENCE) {
        let body = skip_language_tag(&trimmed[open + FENCE.len()..]);
        if let Some(close) = body.find(FENCE) {
            return body[..close].trim().to_string();
        }
    }

    if trimmed.contains(FENCE) {
        return strip_stray_fences(trimmed);
    }

    trimmed.to_string()
}

/// A language tag is a single word running up to the end of the fence line.
fn skip_language_tag(after_fence: &str) -> &str {
    let tag_len = after_fence
        .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+')))
        .unwrap_or(after_fence.len());
    let rest = &after_fence[tag_len..];
    let ends_line = rest.is_empty() || rest.starts_with('\n') || rest.starts_with("\r\n");
    // Text glued to the fence on the same line is content, not a tag.
    if tag_len > 0 && ends_line {
        rest
    } else {
        after_fence
    }
}

fn strip_stray_fences(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find(FENCE) {
        out.push_str(&rest[..pos]);
        rest = skip_language_tag(&rest[pos + FENCE.len()..]);
    }
    out.push_str(rest);
    out.trim().to_string()
}
