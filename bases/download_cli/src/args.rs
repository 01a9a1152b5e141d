// bases/download_cli/src/args.rs
use clap::Parser;
use media_downloader::{DEFAULT_FETCHER, DEFAULT_TRANSCODER};
use std::path::PathBuf;

/// Download a video or its audio track and save it locally
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Directory to store the downloaded file
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// URL to download from
    pub url: String,

    /// Maximum video height (144p, 240p, 360p, 480p, 720p, 1080p)
    #[arg(short, long, default_value = "720p")]
    pub quality: String,

    /// Extract the audio track as mp3
    #[arg(short, long)]
    pub audio_only: bool,

    /// Scratch directory for in-progress downloads
    #[arg(long, env = "DOWNLOAD_TEMP_DIR")]
    pub temp_dir: Option<PathBuf>,

    /// Fetcher executable
    #[arg(long, env = "FETCHER_BIN", default_value = DEFAULT_FETCHER)]
    pub fetcher: String,

    /// Transcoder executable
    #[arg(long, env = "TRANSCODER_BIN", default_value = DEFAULT_TRANSCODER)]
    pub transcoder: String,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn temp_root(&self) -> PathBuf {
        self.temp_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("media-relay"))
    }
}
