//! Prompt validation and style composition.

use crate::error::GenerationError;
use serde::{Deserialize, Serialize};

/// Style presets and the prompt suffix each one appends.
pub const STYLE_PRESETS: &[(&str, &str)] = &[
    (
        "photorealistic",
        "photorealistic, ultra realistic, 8k, highly detailed, professional photography",
    ),
    (
        "anime",
        "anime style, in the style of Studio Ghibli, detailed anime art, vibrant colors",
    ),
    (
        "digital-art",
        "digital art, concept art, trending on artstation, highly detailed",
    ),
    (
        "oil-painting",
        "oil painting, fine art, masterpiece, classical painting style",
    ),
    (
        "watercolor",
        "watercolor painting, soft colors, artistic, dreamy atmosphere",
    ),
    (
        "sketch",
        "pencil sketch, hand-drawn, artistic sketch, detailed line art",
    ),
    (
        "3d-render",
        "3D render, octane render, unreal engine, photorealistic 3D",
    ),
    (
        "cyberpunk",
        "cyberpunk style, neon lights, futuristic city, sci-fi, blade runner aesthetic",
    ),
    (
        "fantasy",
        "fantasy art, magical, ethereal, epic fantasy illustration",
    ),
    (
        "minimalist",
        "minimalist design, simple, clean, modern aesthetic",
    ),
    (
        "vintage",
        "vintage style, retro, old photograph, nostalgic",
    ),
    (
        "comic",
        "comic book style, pop art, vibrant colors, graphic novel",
    ),
    (
        "surreal",
        "surrealist art, dreamlike, abstract, Salvador Dali inspired",
    ),
];

/// Output resolution hint appended to the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Resolution {
    #[serde(rename = "1K")]
    Standard,
    #[default]
    #[serde(rename = "2K")]
    High,
    #[serde(rename = "4K")]
    Ultra,
}

impl Resolution {
    fn suffix(self) -> Option<&'static str> {
        match self {
            Resolution::Standard => None,
            Resolution::High => Some("2K high quality"),
            Resolution::Ultra => Some("4K ultra high resolution"),
        }
    }
}

/// Prompt suffix for a style key, `None` for unknown or empty keys.
pub fn style_suffix(style: &str) -> Option<&'static str> {
    STYLE_PRESETS
        .iter()
        .find(|(key, _)| *key == style.trim())
        .map(|(_, suffix)| *suffix)
}

/// Trim a prompt and reject it when empty.
pub fn validate_prompt(prompt: &str) -> Result<&str, GenerationError> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(GenerationError::InvalidInput(
            "prompt must not be empty".to_string(),
        ));
    }
    Ok(prompt)
}

/// Full prompt: base, then the style suffix, then the resolution hint.
pub fn compose_prompt(
    base: &str,
    style: Option<&str>,
    resolution: Option<Resolution>,
) -> Result<String, GenerationError> {
    let mut prompt = validate_prompt(base)?.to_string();
    if let Some(suffix) = style.and_then(style_suffix) {
        prompt.push_str(", ");
        prompt.push_str(suffix);
    }
    if let Some(suffix) = resolution.and_then(Resolution::suffix) {
        prompt.push_str(", ");
        prompt.push_str(suffix);
    }
    Ok(prompt)
}

/// Prompt for the `index`-th (zero based) variant of a batch.
pub fn variant_prompt(prompt: &str, index: usize) -> String {
    format!("{prompt}, variation {}", index + 1)
}

#[cfg(test)]
mod tests {
    use super::{Resolution, compose_prompt, style_suffix, validate_prompt, variant_prompt};
    use crate::GenerationError;
    use pretty_assertions::assert_eq;

    #[test]
    fn compose_appends_style_then_resolution() {
        let prompt = compose_prompt("  a fox ", Some("sketch"), Some(Resolution::Ultra))
            .expect("prompt");
        assert_eq!(
            prompt,
            "a fox, pencil sketch, hand-drawn, artistic sketch, detailed line art, 4K ultra high resolution"
        );
    }

    #[test]
    fn compose_ignores_unknown_style_and_standard_resolution() {
        let prompt =
            compose_prompt("a fox", Some("unknown"), Some(Resolution::Standard)).expect("prompt");
        assert_eq!(prompt, "a fox");
        assert_eq!(style_suffix(""), None);
    }

    #[test]
    fn empty_prompt_is_rejected() {
        assert!(matches!(
            validate_prompt("   "),
            Err(GenerationError::InvalidInput(_))
        ));
        assert!(compose_prompt("", Some("anime"), None).is_err());
    }

    #[test]
    fn variants_are_one_based() {
        assert_eq!(variant_prompt("cat", 0), "cat, variation 1");
    }
}
