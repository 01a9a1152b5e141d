// bases/download_cli/src/output.rs
use media_downloader::DownloadRequest;
use std::path::Path;

pub struct OutputHandler {
    verbose: bool,
}

impl OutputHandler {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    pub fn print_download_start(&self, request: &DownloadRequest) {
        println!("Starting download from: {}", request.url);
        if self.verbose {
            println!("Quality: {}", request.quality);
            println!("Audio only: {}", request.audio_only);
        }
    }

    pub fn print_download_complete(&self, path: &Path, content_type: &str, size_bytes: u64) {
        println!("Saved: {}", path.display());

        if self.verbose {
            println!("Type: {}", content_type);
            println!("Size: {:.1} MiB", size_bytes as f64 / (1024.0 * 1024.0));
        }
    }

    pub fn print_error(&self, error: &color_eyre::Report) {
        eprintln!("Error: {}", error);

        if self.verbose {
            eprintln!("\nError details:");
            error.chain().skip(1).for_each(|cause| {
                eprintln!("  caused by: {}", cause);
            });
        }
    }
}
