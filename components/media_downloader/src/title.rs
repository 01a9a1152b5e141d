use crate::command::Invocation;
use crate::config::StageContext;
use crate::error::PipelineError;
use crate::types::{ResolvedTitle, VideoUrl};
use crate::utils::sanitize_title;

/// Ask the fetcher for the display title and make it filesystem safe
pub async fn resolve_title(
    ctx: &StageContext<'_>,
    url: &VideoUrl,
) -> Result<ResolvedTitle, PipelineError> {
    let invocation = Invocation::new(&ctx.config.fetcher, ctx.config.timeouts.metadata)
        .args(["--get-title", "--no-playlist", "--"])
        .arg(url.as_str());

    let output = ctx
        .runner
        .run(&invocation, ctx.cancel)
        .await
        .map_err(PipelineError::TitleCommand)?;

    // Playlist-like URLs may still print several titles; the first one wins.
    let raw = output
        .stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .ok_or_else(|| PipelineError::TitleResolution("fetcher returned an empty title".to_string()))?
        .to_string();

    let sanitized = sanitize_title(&raw);
    if sanitized.is_empty() {
        return Err(PipelineError::TitleResolution(format!(
            "title '{}' has no filesystem-safe characters",
            raw
        )));
    }

    let title = ResolvedTitle { raw, sanitized };
    tracing::info!("Resolved title: {}", title);
    Ok(title)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::stub::{exit_with, stdout, RecordingRunner};
    use crate::config::DownloaderConfig;
    use assert_matches::assert_matches;
    use tokio_util::sync::CancellationToken;

    async fn resolve_with(runner: &RecordingRunner) -> Result<ResolvedTitle, PipelineError> {
        let config = DownloaderConfig::new("/unused");
        let cancel = CancellationToken::new();
        let ctx = StageContext {
            runner,
            config: &config,
            cancel: &cancel,
        };
        let url = VideoUrl::parse("https://youtu.be/abc").unwrap();
        resolve_title(&ctx, &url).await
    }

    #[tokio::test]
    async fn sanitizes_reported_title() {
        let runner = RecordingRunner::new(|_| stdout("  What? A \"Great\" Video: Part 1/2 \n"));

        let title = resolve_with(&runner).await.unwrap();

        assert_eq!(title.raw, "What? A \"Great\" Video: Part 1/2");
        assert_eq!(title.sanitized, "What A Great Video Part 12");
    }

    #[tokio::test]
    async fn passes_url_as_a_discrete_argument() {
        let runner = RecordingRunner::new(|_| stdout("title\n"));
        resolve_with(&runner).await.unwrap();

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, "yt-dlp");
        assert_eq!(calls[0].args.last().unwrap(), "https://youtu.be/abc");
        assert_eq!(calls[0].value_of("--").unwrap(), "https://youtu.be/abc");
    }

    #[tokio::test]
    async fn first_non_empty_line_is_used() {
        let runner = RecordingRunner::new(|_| stdout("\n  \nFirst\nSecond\n"));
        let title = resolve_with(&runner).await.unwrap();
        assert_eq!(title.sanitized, "First");
    }

    #[tokio::test]
    async fn empty_output_fails() {
        let runner = RecordingRunner::new(|_| stdout("   \n"));
        assert_matches!(
            resolve_with(&runner).await,
            Err(PipelineError::TitleResolution(_))
        );
    }

    #[tokio::test]
    async fn title_of_only_illegal_characters_fails() {
        let runner = RecordingRunner::new(|_| stdout("???***\n"));
        assert_matches!(
            resolve_with(&runner).await,
            Err(PipelineError::TitleResolution(_))
        );
    }

    #[tokio::test]
    async fn command_failure_is_a_title_error() {
        let runner = RecordingRunner::new(|_| exit_with("yt-dlp", "ERROR: Private video"));
        let err = resolve_with(&runner).await.unwrap_err();
        assert_matches!(err, PipelineError::TitleCommand(_));
        assert!(err.to_string().contains("Private video"));
    }
}
