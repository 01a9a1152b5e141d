// bases/download_cli/src/app.rs
use crate::args::Args;
use crate::output::OutputHandler;
use color_eyre::Result;
use media_downloader::{DownloadRequest, DownloaderConfig, MediaDownloader};
use tokio_util::sync::CancellationToken;

pub struct App {
    args: Args,
    output: OutputHandler,
}

impl App {
    pub fn new(args: Args) -> Self {
        let output = OutputHandler::new(args.verbose);
        Self { args, output }
    }

    pub async fn run(&self) -> Result<()> {
        let request = DownloadRequest::parse(
            Some(&self.args.url),
            Some(&self.args.quality),
            self.args.audio_only,
        )?;

        let config = DownloaderConfig::new(self.args.temp_root())
            .with_fetcher(&self.args.fetcher)
            .with_transcoder(&self.args.transcoder);
        let downloader = MediaDownloader::new(config).await?;

        tokio::fs::create_dir_all(&self.args.output_dir).await?;

        self.output.print_download_start(&request);

        let cancel = CancellationToken::new();
        let delivery = tokio::select! {
            result = downloader.download(&request, &cancel) => result?,
            _ = tokio::signal::ctrl_c() => {
                cancel.cancel();
                color_eyre::eyre::bail!("interrupted");
            }
        };

        let size = delivery.size_bytes();
        let content_type = delivery.content_type();
        let path = delivery.persist_into(&self.args.output_dir).await?;

        self.output.print_download_complete(&path, content_type, size);

        Ok(())
    }

    pub fn print_error(&self, error: &color_eyre::Report) {
        self.output.print_error(error);
    }
}
