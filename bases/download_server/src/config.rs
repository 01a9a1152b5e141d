// bases/download_server/src/config.rs
use clap::Parser;
use media_downloader::{DownloaderConfig, Timeouts, DEFAULT_FETCHER, DEFAULT_TRANSCODER};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to listen on
    pub addr: SocketAddr,

    pub downloader: DownloaderConfig,
}

/// Media relay - download and transcode videos over HTTP
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 4000)]
    pub port: u16,

    /// Address to bind to
    #[arg(long, env = "BIND_ADDRESS", default_value = "0.0.0.0")]
    pub bind: IpAddr,

    /// Shared temporary directory (defaults to <os temp>/media-relay)
    #[arg(long, env = "DOWNLOAD_TEMP_DIR")]
    pub temp_dir: Option<PathBuf>,

    /// Fetcher executable
    #[arg(long, env = "FETCHER_BIN", default_value = DEFAULT_FETCHER)]
    pub fetcher: String,

    /// Transcoder executable
    #[arg(long, env = "TRANSCODER_BIN", default_value = DEFAULT_TRANSCODER)]
    pub transcoder: String,

    /// Seconds allowed for title lookup
    #[arg(long, default_value_t = 60)]
    pub metadata_timeout: u64,

    /// Seconds allowed for the fetcher to download
    #[arg(long, default_value_t = 1800)]
    pub fetch_timeout: u64,

    /// Seconds allowed for transcoding
    #[arg(long, default_value_t = 1800)]
    pub transcode_timeout: u64,
}

pub fn default_temp_root() -> PathBuf {
    std::env::temp_dir().join("media-relay")
}

impl Config {
    /// Create configuration from CLI arguments
    pub fn from_args(args: CliArgs) -> Self {
        let temp_root = args.temp_dir.unwrap_or_else(default_temp_root);

        let timeouts = Timeouts {
            metadata: Duration::from_secs(args.metadata_timeout),
            fetch: Duration::from_secs(args.fetch_timeout),
            transcode: Duration::from_secs(args.transcode_timeout),
        };

        let downloader = DownloaderConfig::new(temp_root)
            .with_fetcher(args.fetcher)
            .with_transcoder(args.transcoder)
            .with_timeouts(timeouts);

        Self {
            addr: SocketAddr::new(args.bind, args.port),
            downloader,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> CliArgs {
        CliArgs {
            port: 4000,
            bind: IpAddr::from([0, 0, 0, 0]),
            temp_dir: None,
            fetcher: DEFAULT_FETCHER.to_string(),
            transcoder: DEFAULT_TRANSCODER.to_string(),
            metadata_timeout: 60,
            fetch_timeout: 1800,
            transcode_timeout: 1800,
        }
    }

    #[test]
    fn defaults_listen_on_all_interfaces() {
        let config = Config::from_args(args());
        assert_eq!(config.addr, "0.0.0.0:4000".parse().unwrap());
        assert_eq!(config.downloader.temp_root, default_temp_root());
        assert_eq!(config.downloader.fetcher, "yt-dlp");
    }

    #[test]
    fn timeouts_are_seconds() {
        let config = Config::from_args(CliArgs {
            metadata_timeout: 5,
            fetch_timeout: 10,
            transcode_timeout: 20,
            ..args()
        });
        assert_eq!(config.downloader.timeouts.metadata, Duration::from_secs(5));
        assert_eq!(config.downloader.timeouts.fetch, Duration::from_secs(10));
        assert_eq!(config.downloader.timeouts.transcode, Duration::from_secs(20));
    }

    #[test]
    fn custom_paths_override_defaults() {
        let config = Config::from_args(CliArgs {
            port: 3001,
            temp_dir: Some(PathBuf::from("/var/tmp/relay")),
            fetcher: "/opt/homebrew/bin/yt-dlp".to_string(),
            ..args()
        });
        assert_eq!(config.addr.port(), 3001);
        assert_eq!(config.downloader.temp_root, PathBuf::from("/var/tmp/relay"));
        assert_eq!(config.downloader.fetcher, "/opt/homebrew/bin/yt-dlp");
    }

    #[test]
    fn parses_command_line() {
        let args = CliArgs::try_parse_from([
            "download-server",
            "--port",
            "8080",
            "--transcoder",
            "/usr/local/bin/ffmpeg",
        ])
        .unwrap();
        assert_eq!(args.port, 8080);
        assert_eq!(args.transcoder, "/usr/local/bin/ffmpeg");
    }
}
