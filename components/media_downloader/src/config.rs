use crate::command::CommandRunner;
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_FETCHER: &str = "yt-dlp";
pub const DEFAULT_TRANSCODER: &str = "ffmpeg";

/// Deadlines for each kind of external invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub metadata: Duration,
    pub fetch: Duration,
    pub transcode: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            metadata: Duration::from_secs(60),
            fetch: Duration::from_secs(30 * 60),
            transcode: Duration::from_secs(30 * 60),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DownloaderConfig {
    /// Shared temporary root; each request gets its own directory below it
    pub temp_root: PathBuf,

    /// Fetcher program (yt-dlp compatible command line)
    pub fetcher: String,

    /// Transcoder program (ffmpeg compatible command line)
    pub transcoder: String,

    pub timeouts: Timeouts,
}

impl DownloaderConfig {
    pub fn new(temp_root: impl Into<PathBuf>) -> Self {
        Self {
            temp_root: temp_root.into(),
            fetcher: DEFAULT_FETCHER.to_string(),
            transcoder: DEFAULT_TRANSCODER.to_string(),
            timeouts: Timeouts::default(),
        }
    }

    pub fn with_fetcher(mut self, program: impl Into<String>) -> Self {
        self.fetcher = program.into();
        self
    }

    pub fn with_transcoder(mut self, program: impl Into<String>) -> Self {
        self.transcoder = program.into();
        self
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }
}

/// What every stage needs to run external programs for one request
pub struct StageContext<'a> {
    pub runner: &'a dyn CommandRunner,
    pub config: &'a DownloaderConfig,
    pub cancel: &'a CancellationToken,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_standard_tools() {
        let config = DownloaderConfig::new("/tmp/relay");
        assert_eq!(config.fetcher, "yt-dlp");
        assert_eq!(config.transcoder, "ffmpeg");
        assert_eq!(config.timeouts.metadata, Duration::from_secs(60));
    }

    #[test]
    fn builders_override_tools() {
        let config = DownloaderConfig::new("/tmp/relay")
            .with_fetcher("/opt/bin/yt-dlp")
            .with_transcoder("/opt/bin/ffmpeg");
        assert_eq!(config.fetcher, "/opt/bin/yt-dlp");
        assert_eq!(config.transcoder, "/opt/bin/ffmpeg");
    }
}
