//! Aspect ratio resolution
//!
//! Maps free-form size tokens ("16:9 (YouTube)", "A4", "roll-up banner") onto
//! the fixed set of ratios the image and video models accept.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AspectRatio {
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "16:9")]
    Widescreen,
    #[serde(rename = "9:16")]
    Vertical,
    #[serde(rename = "3:4")]
    Portrait,
    #[serde(rename = "4:3")]
    Landscape,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 5] = [
        Self::Square,
        Self::Widescreen,
        Self::Vertical,
        Self::Portrait,
        Self::Landscape,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::Widescreen => "16:9",
            Self::Vertical => "9:16",
            Self::Portrait => "3:4",
            Self::Landscape => "4:3",
        }
    }

    pub fn is_portrait(&self) -> bool {
        matches!(self, Self::Vertical | Self::Portrait)
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// Longest first so "16:9" is never read as "1:..."
const CANONICAL: [(&str, AspectRatio); 5] = [
    ("16:9", AspectRatio::Widescreen),
    ("9:16", AspectRatio::Vertical),
    ("1:1", AspectRatio::Square),
    ("3:4", AspectRatio::Portrait),
    ("4:3", AspectRatio::Landscape),
];

// More specific keys must precede their prefixes.
const PRESETS: &[(&str, AspectRatio)] = &[
    ("a3-landscape", AspectRatio::Landscape),
    ("a4-landscape", AspectRatio::Landscape),
    ("a5-landscape", AspectRatio::Landscape),
    ("letter-landscape", AspectRatio::Landscape),
    ("a3", AspectRatio::Portrait),
    ("a4", AspectRatio::Portrait),
    ("a5", AspectRatio::Portrait),
    ("letter", AspectRatio::Portrait),
    ("poster", AspectRatio::Portrait),
    ("flyer", AspectRatio::Portrait),
    ("brochure", AspectRatio::Portrait),
    ("menu", AspectRatio::Portrait),
    ("postcard", AspectRatio::Landscape),
    ("presentation", AspectRatio::Widescreen),
    ("business-card", AspectRatio::Widescreen),
    ("roll-up", AspectRatio::Vertical),
    ("rollup", AspectRatio::Vertical),
    ("pull-up", AspectRatio::Vertical),
    ("backdrop", AspectRatio::Widescreen),
    ("billboard", AspectRatio::Widescreen),
    ("web-banner", AspectRatio::Widescreen),
    ("leaderboard", AspectRatio::Widescreen),
    ("banner", AspectRatio::Widescreen),
    ("facebook-cover", AspectRatio::Widescreen),
    ("linkedin-cover", AspectRatio::Widescreen),
    ("twitter-header", AspectRatio::Widescreen),
    ("youtube-thumbnail", AspectRatio::Widescreen),
    ("youtube", AspectRatio::Widescreen),
    ("instagram-story", AspectRatio::Vertical),
    ("instagram-portrait", AspectRatio::Portrait),
    ("instagram-post", AspectRatio::Square),
    ("story", AspectRatio::Vertical),
    ("reel", AspectRatio::Vertical),
    ("tiktok", AspectRatio::Vertical),
    ("profile-picture", AspectRatio::Square),
    ("logo", AspectRatio::Square),
    ("square", AspectRatio::Square),
    ("landscape", AspectRatio::Landscape),
    ("portrait", AspectRatio::Portrait),
];

/// Resolve any size/ratio token to a supported ratio. Never fails.
pub fn resolve(token: &str) -> AspectRatio {
    let trimmed = token.trim();
    let canonical_form: String = trimmed
        .chars()
        .map(|c| match c {
            'x' | 'X' | '/' | '×' => ':',
            other => other,
        })
        .collect();

    for (prefix, ratio) in CANONICAL {
        let Some(rest) = canonical_form.strip_prefix(prefix) else {
            continue;
        };
        if !rest.starts_with(|c: char| c.is_ascii_digit()) {
            return ratio;
        }
    }

    let key = normalize_preset_key(trimmed);
    PRESETS
        .iter()
        .find(|(preset, _)| key.starts_with(preset))
        .map(|(_, ratio)| *ratio)
        .unwrap_or(AspectRatio::Square)
}

fn normalize_preset_key(token: &str) -> String {
    let mut key = String::with_capacity(token.len());
    for c in token.chars() {
        if c.is_alphanumeric() {
            key.extend(c.to_lowercase());
        } else if !key.ends_with('-') && !key.is_empty() {
            key.push('-');
        }
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_prefix_wins_over_qualifiers() {
        assert_eq!(resolve("16:9 (YouTube)"), AspectRatio::Widescreen);
        assert_eq!(resolve("9:16 story"), AspectRatio::Vertical);
        assert_eq!(resolve("3:4 A4 poster"), AspectRatio::Portrait);
        assert_eq!(resolve(" 4:3"), AspectRatio::Landscape);
        assert_eq!(resolve("1:1"), AspectRatio::Square);
    }

    #[test]
    fn test_canonical_ratio_needs_a_boundary() {
        assert_eq!(resolve("1:10"), AspectRatio::Square);
        assert_eq!(resolve("9:160"), AspectRatio::Square);
        assert_eq!(resolve("3:45"), AspectRatio::Square);
        assert_eq!(resolve("4:3, landscape"), AspectRatio::Landscape);
    }

    #[test]
    fn test_portrait_ratios() {
        assert!(AspectRatio::Vertical.is_portrait());
        assert!(AspectRatio::Portrait.is_portrait());
        assert!(!AspectRatio::Landscape.is_portrait());
    }

    #[test]
    fn test_alternate_separators() {
        assert_eq!(resolve("16x9"), AspectRatio::Widescreen);
        assert_eq!(resolve("9/16"), AspectRatio::Vertical);
    }

    #[test]
    fn test_named_presets() {
        assert_eq!(resolve("A4"), AspectRatio::Portrait);
        assert_eq!(resolve("A4 Landscape"), AspectRatio::Landscape);
        assert_eq!(resolve("Business Card"), AspectRatio::Widescreen);
        assert_eq!(resolve("roll_up 85x200cm"), AspectRatio::Vertical);
        assert_eq!(resolve("Backdrop"), AspectRatio::Widescreen);
        assert_eq!(resolve("Instagram Story"), AspectRatio::Vertical);
        assert_eq!(resolve("instagram post"), AspectRatio::Square);
    }

    #[test]
    fn test_unknown_tokens_default_to_square() {
        assert_eq!(resolve("something odd"), AspectRatio::Square);
        assert_eq!(resolve(""), AspectRatio::Square);
        assert_eq!(resolve("21:9"), AspectRatio::Square);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        for token in ["A3", "banner", "7:5", "reel", "x"] {
            assert_eq!(resolve(token), resolve(token));
        }
    }

    #[test]
    fn test_every_preset_maps_into_supported_set() {
        for (preset, _) in PRESETS {
            assert!(AspectRatio::ALL.contains(&resolve(preset)));
        }
    }
}
