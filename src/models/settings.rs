use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::video;

/// Which generation pipeline a request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenerationMode {
    TextToVideo,
    ImageToVideo,
}

impl GenerationMode {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::TextToVideo => "T2V",
            Self::ImageToVideo => "I2V",
        }
    }
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Finalized parameters handed to the render backend.
///
/// Ratio and quality stay plain strings: the step wizard only ever offers the
/// fixed choices, but the JSON fast-path forwards whatever the user supplied
/// verbatim and lets the backend reject values it does not support.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationSettings {
    pub prompt: String,
    pub aspect_ratio: String,
    pub quality: String,
    pub seed: Option<i64>,
    pub video_model_key: Option<String>,
    pub mute_audio: bool,
}

impl GenerationSettings {
    /// Settings assembled step by step through the wizard.
    #[must_use]
    pub fn from_wizard(prompt: String, aspect_ratio: String, quality: String) -> Self {
        Self {
            prompt,
            aspect_ratio,
            quality,
            seed: None,
            video_model_key: None,
            mute_audio: false,
        }
    }
}

/// Structured fast-path payload. A text message that parses into this shape
/// skips the step wizard entirely.
#[derive(Debug, Clone, Deserialize)]
pub struct QuickRequest {
    pub prompt: String,
    #[serde(rename = "aspectRatio")]
    pub aspect_ratio: String,
    pub quality: Option<String>,
    pub seed: Option<i64>,
    #[serde(rename = "videoModelKey")]
    pub video_model_key: Option<String>,
}

impl QuickRequest {
    /// Two-outcome branch, not an error: anything that fails to parse or
    /// lacks `prompt`/`aspectRatio` is plain wizard input.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        serde_json::from_str(text).ok()
    }

    #[must_use]
    pub fn into_settings(self) -> GenerationSettings {
        GenerationSettings {
            prompt: self.prompt,
            aspect_ratio: self.aspect_ratio,
            quality: self.quality.unwrap_or_else(|| video::DEFAULT_QUALITY.to_string()),
            seed: self.seed,
            video_model_key: self.video_model_key,
            mute_audio: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quick_request_parses_full_payload() {
        let req = QuickRequest::parse(
            r#"{"prompt":"sunset","aspectRatio":"9:16","quality":"1080p","seed":42,"videoModelKey":"v2"}"#,
        )
        .expect("payload should parse");

        let settings = req.into_settings();
        assert_eq!(settings.prompt, "sunset");
        assert_eq!(settings.aspect_ratio, "9:16");
        assert_eq!(settings.quality, "1080p");
        assert_eq!(settings.seed, Some(42));
        assert_eq!(settings.video_model_key.as_deref(), Some("v2"));
        assert!(!settings.mute_audio);
    }

    #[test]
    fn quick_request_defaults_quality() {
        let req = QuickRequest::parse(r#"{"prompt":"sunset","aspectRatio":"9:16"}"#).unwrap();
        assert_eq!(req.into_settings().quality, "720p");
    }

    #[test]
    fn quick_request_rejects_missing_fields() {
        assert!(QuickRequest::parse(r#"{"prompt":"sunset"}"#).is_none());
        assert!(QuickRequest::parse(r#"{"aspectRatio":"9:16"}"#).is_none());
    }

    #[test]
    fn quick_request_rejects_plain_text() {
        assert!(QuickRequest::parse("a cat on the moon").is_none());
        assert!(QuickRequest::parse("{not json").is_none());
    }
}
