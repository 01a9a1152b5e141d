use crate::types::{QualityTier, TargetFormat};
use std::path::{Path, PathBuf};

/// Placeholder the fetcher replaces with the container it actually chose
pub const EXTENSION_PLACEHOLDER: &str = "%(ext)s";

/// How to ask the fetcher for media. Derived once per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSpec {
    pub format_selector: String,

    /// Ask the fetcher to extract audio to MP3 after downloading
    pub extract_audio: bool,

    pub target: TargetFormat,
}

impl FetchSpec {
    /// `<dir>/<title>.%(ext)s`
    pub fn output_template(&self, dir: &Path, sanitized_title: &str) -> PathBuf {
        dir.join(format!("{}.{}", sanitized_title, EXTENSION_PLACEHOLDER))
    }
}

/// Map a quality tier (or audio-only flag) to fetcher format settings
pub fn select(quality: QualityTier, audio_only: bool) -> FetchSpec {
    if audio_only {
        return FetchSpec {
            format_selector: "bestaudio".to_string(),
            extract_audio: true,
            target: TargetFormat::for_request(audio_only),
        };
    }

    let height = quality.height();
    FetchSpec {
        format_selector: format!(
            "bestvideo[height<={h}]+bestaudio/best[height<={h}]",
            h = height
        ),
        extract_audio: false,
        target: TargetFormat::for_request(audio_only),
    }
}
