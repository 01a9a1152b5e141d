use crate::error::ValidationError;
use std::fmt;
use url::Url;

/// Hosts whose URLs the pipeline accepts, subdomains included
const VIDEO_HOSTS: &[&str] = &["youtube.com", "youtu.be"];

/// A source URL that has been checked against the recognized video hosts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoUrl(Url);

impl VideoUrl {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::MissingUrl);
        }

        let url = Url::parse(trimmed)
            .map_err(|_| ValidationError::UnrecognizedHost(trimmed.to_string()))?;

        if !matches!(url.scheme(), "http" | "https") || !Self::is_video_host(&url) {
            return Err(ValidationError::UnrecognizedHost(trimmed.to_string()));
        }

        Ok(VideoUrl(url))
    }

    fn is_video_host(url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();
        VIDEO_HOSTS
            .iter()
            .any(|known| host == *known || host.ends_with(&format!(".{}", known)))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for VideoUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Requested maximum video height
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QualityTier {
    P144,
    P240,
    P360,
    P480,
    #[default]
    P720,
    P1080,
}

impl QualityTier {
    pub const ALL: [QualityTier; 6] = [
        QualityTier::P144,
        QualityTier::P240,
        QualityTier::P360,
        QualityTier::P480,
        QualityTier::P720,
        QualityTier::P1080,
    ];

    /// Parse a tier label such as `"480p"`. Unknown labels degrade to 720p.
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "144p" => QualityTier::P144,
            "240p" => QualityTier::P240,
            "360p" => QualityTier::P360,
            "480p" => QualityTier::P480,
            "720p" => QualityTier::P720,
            "1080p" => QualityTier::P1080,
            other => {
                tracing::debug!("Unknown quality tier '{}', using 720p", other);
                QualityTier::default()
            }
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            QualityTier::P144 => 144,
            QualityTier::P240 => 240,
            QualityTier::P360 => 360,
            QualityTier::P480 => 480,
            QualityTier::P720 => 720,
            QualityTier::P1080 => 1080,
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}p", self.height())
    }
}

/// Container the caller receives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetFormat {
    Mp4,
    Mp3,
}

impl TargetFormat {
    pub fn for_request(audio_only: bool) -> Self {
        if audio_only {
            TargetFormat::Mp3
        } else {
            TargetFormat::Mp4
        }
    }

    /// Extension including the leading dot
    pub fn extension(&self) -> &'static str {
        match self {
            TargetFormat::Mp4 => ".mp4",
            TargetFormat::Mp3 => ".mp3",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            TargetFormat::Mp4 => "video/mp4",
            TargetFormat::Mp3 => "audio/mpeg",
        }
    }

    /// Whether `file_name` already carries this format's extension
    pub fn matches(&self, file_name: &str) -> bool {
        file_name.ends_with(self.extension())
    }
}

/// One inbound download request, validated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: VideoUrl,
    pub quality: QualityTier,
    pub audio_only: bool,
}

impl DownloadRequest {
    pub fn new(url: VideoUrl, quality: QualityTier, audio_only: bool) -> Self {
        Self {
            url,
            quality,
            audio_only,
        }
    }

    /// Build a request from loosely-typed inputs, rejecting unknown hosts
    pub fn parse(
        url: Option<&str>,
        quality: Option<&str>,
        audio_only: bool,
    ) -> Result<Self, ValidationError> {
        let url = VideoUrl::parse(url.ok_or(ValidationError::MissingUrl)?)?;
        let quality = quality.map(QualityTier::from_label).unwrap_or_default();
        Ok(Self::new(url, quality, audio_only))
    }
}

/// Title reported by the fetcher, and its filesystem-safe form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTitle {
    pub raw: String,
    pub sanitized: String,
}

impl ResolvedTitle {
    /// File name the caller sees for the given target
    pub fn file_name(&self, target: TargetFormat) -> String {
        format!("{}{}", self.sanitized, target.extension())
    }
}

impl fmt::Display for ResolvedTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sanitized)
    }
}
