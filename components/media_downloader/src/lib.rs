// components/media_downloader/src/lib.rs
mod command;
mod config;
mod delivery;
mod error;
mod fetch;
mod format;
mod locator;
mod title;
mod transcode;
mod types;
mod utils;
mod workspace;

use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs::File;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

pub use command::{CommandOutput, CommandRunner, Invocation, ProcessRunner};
pub use config::{DownloaderConfig, StageContext, Timeouts, DEFAULT_FETCHER, DEFAULT_TRANSCODER};
pub use delivery::{Delivery, DeliveryStream};
pub use error::{DownloadError, ExecError, PipelineError, PipelineFailure, Stage, ValidationError};
pub use fetch::FetchReport;
pub use format::{select, FetchSpec};
pub use locator::LocatedArtifact;
pub use types::{DownloadRequest, QualityTier, ResolvedTitle, TargetFormat, VideoUrl};
pub use workspace::Workspace;

/// Runs the title → fetch → locate → transcode → deliver pipeline
pub struct MediaDownloader {
    config: DownloaderConfig,
    runner: Arc<dyn CommandRunner>,
}

impl MediaDownloader {
    /// Create a downloader that runs the configured tools as real processes
    pub async fn new(config: DownloaderConfig) -> Result<Self, DownloadError> {
        Self::new_with_runner(config, Arc::new(ProcessRunner)).await
    }

    /// Create a downloader with a specific command runner
    pub async fn new_with_runner(
        config: DownloaderConfig,
        runner: Arc<dyn CommandRunner>,
    ) -> Result<Self, DownloadError> {
        for program in [&config.fetcher, &config.transcoder] {
            runner
                .check_available(program)
                .await
                .map_err(|_| DownloadError::DependencyNotFound(program.clone()))?;
        }

        tokio::fs::create_dir_all(&config.temp_root).await?;

        Ok(Self { config, runner })
    }

    /// Run the whole pipeline for one request.
    ///
    /// On success the returned `Delivery` owns the final artifact and deletes
    /// it once dropped. On failure everything the request wrote is removed
    /// before the failure is returned.
    pub async fn download(
        &self,
        request: &DownloadRequest,
        cancel: &CancellationToken,
    ) -> Result<Delivery, PipelineFailure> {
        let span = tracing::info_span!("download", url = %request.url, id = tracing::field::Empty);
        self.run(request, cancel).instrument(span).await
    }

    async fn run(
        &self,
        request: &DownloadRequest,
        cancel: &CancellationToken,
    ) -> Result<Delivery, PipelineFailure> {
        let ctx = StageContext {
            runner: self.runner.as_ref(),
            config: &self.config,
            cancel,
        };

        tracing::info!("📍 Stage: {}", Stage::ResolvingTitle);
        let title = title::resolve_title(&ctx, &request.url)
            .await
            .map_err(|cause| self.failed(Stage::ResolvingTitle, cause, None))?;

        let spec = format::select(request.quality, request.audio_only);

        let workspace = Workspace::create(&self.config.temp_root)
            .map_err(|cause| self.failed(Stage::Fetching, cause, None))?;
        tracing::Span::current().record("id", workspace.id());

        let outcome = self.run_stages(&ctx, request, &title, &spec, &workspace).await;
        match outcome {
            Ok((final_path, file, size)) => {
                tracing::info!("✅ Ready to deliver {} ({} bytes)", final_path.display(), size);
                Ok(Delivery::new(
                    file,
                    size,
                    final_path,
                    title.file_name(spec.target),
                    spec.target,
                    workspace,
                ))
            }
            Err((stage, cause)) => Err(self.failed(stage, cause, Some(workspace))),
        }
    }

    async fn run_stages(
        &self,
        ctx: &StageContext<'_>,
        request: &DownloadRequest,
        title: &ResolvedTitle,
        spec: &FetchSpec,
        workspace: &Workspace,
    ) -> Result<(PathBuf, File, u64), (Stage, PipelineError)> {
        let fetch_dir = workspace.fetch_dir();

        tracing::info!("📍 Stage: {}", Stage::Fetching);
        let report = fetch::fetch(ctx, &request.url, title, spec, &fetch_dir)
            .await
            .map_err(|e| (Stage::Fetching, e))?;

        tracing::info!("📍 Stage: {}", Stage::Locating);
        let located = locator::locate(&fetch_dir, &title.sanitized, spec.target, &report)
            .await
            .map_err(|e| (Stage::Locating, e))?;

        tracing::info!("📍 Stage: {}", Stage::Transcoding);
        let final_path = workspace.final_path(&title.file_name(spec.target));
        let final_path = transcode::finalize(ctx, located, &final_path, spec.target)
            .await
            .map_err(|e| (Stage::Transcoding, e))?;

        tracing::info!("📍 Stage: {}", Stage::Delivering);
        let (file, size) = delivery::open_final(&final_path)
            .await
            .map_err(|e| (Stage::Delivering, e))?;

        Ok((final_path, file, size))
    }

    fn failed(
        &self,
        stage: Stage,
        cause: PipelineError,
        workspace: Option<Workspace>,
    ) -> PipelineFailure {
        if cause.is_cancelled() {
            tracing::info!("Request cancelled during {}", stage);
        } else {
            tracing::error!("❌ {} failed: {}", stage, cause);
        }

        if let Some(workspace) = workspace {
            workspace.discard();
        }

        PipelineFailure::new(stage, cause)
    }
}
