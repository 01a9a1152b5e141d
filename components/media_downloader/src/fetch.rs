use crate::command::Invocation;
use crate::config::StageContext;
use crate::error::PipelineError;
use crate::format::FetchSpec;
use crate::types::{ResolvedTitle, VideoUrl};
use std::path::{Path, PathBuf};

/// What the fetcher told us about its output
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchReport {
    /// Final path printed by the fetcher, when it printed one
    pub reported_path: Option<PathBuf>,
}

fn fetch_invocation(
    ctx: &StageContext<'_>,
    url: &VideoUrl,
    template: &Path,
    spec: &FetchSpec,
) -> Invocation {
    let mut invocation = Invocation::new(&ctx.config.fetcher, ctx.config.timeouts.fetch)
        .args(["-f", spec.format_selector.as_str()]);

    if spec.extract_audio {
        invocation = invocation.args(["--extract-audio", "--audio-format", "mp3"]);
    }

    invocation
        .arg("--no-playlist")
        .arg("-o")
        .arg(template)
        .args(["--print", "after_move:filepath", "--no-simulate", "--"])
        .arg(url.as_str())
}

/// Download raw media into `fetch_dir`, named after the sanitized title
pub async fn fetch(
    ctx: &StageContext<'_>,
    url: &VideoUrl,
    title: &ResolvedTitle,
    spec: &FetchSpec,
    fetch_dir: &Path,
) -> Result<FetchReport, PipelineError> {
    let template = spec.output_template(fetch_dir, &title.sanitized);
    let invocation = fetch_invocation(ctx, url, &template, spec);

    tracing::info!("Fetching {} with format '{}'", url, spec.format_selector);

    let output = ctx
        .runner
        .run(&invocation, ctx.cancel)
        .await
        .map_err(PipelineError::Fetch)?;

    let reported_path = output
        .stdout
        .lines()
        .map(str::trim)
        .rev()
        .find(|line| !line.is_empty())
        .map(PathBuf::from);

    if let Some(path) = &reported_path {
        tracing::debug!("Fetcher reported {}", path.display());
    }

    Ok(FetchReport { reported_path })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::stub::{exit_with, stdout, write_fetched, RecordingRunner};
    use crate::config::DownloaderConfig;
    use crate::format::select;
    use crate::types::QualityTier;
    use assert_matches::assert_matches;
    use std::ffi::OsStr;
    use tempfile::TempDir;
    use tokio_util::sync::CancellationToken;

    fn title() -> ResolvedTitle {
        ResolvedTitle {
            raw: "abc_title".to_string(),
            sanitized: "abc_title".to_string(),
        }
    }

    async fn fetch_with(
        runner: &RecordingRunner,
        spec: &FetchSpec,
        dir: &Path,
    ) -> Result<FetchReport, PipelineError> {
        let config = DownloaderConfig::new(dir);
        let cancel = CancellationToken::new();
        let ctx = StageContext {
            runner,
            config: &config,
            cancel: &cancel,
        };
        let url = VideoUrl::parse("https://youtu.be/abc").unwrap();
        fetch(&ctx, &url, &title(), spec, dir).await
    }

    #[tokio::test]
    async fn video_fetch_uses_selector_and_template() {
        let dir = TempDir::new().unwrap();
        let runner = RecordingRunner::new(|inv| {
            write_fetched(inv, "webm", b"raw");
            stdout("")
        });

        let report = fetch_with(&runner, &select(QualityTier::P480, false), dir.path())
            .await
            .unwrap();

        assert_eq!(report.reported_path, None);
        assert!(dir.path().join("abc_title.webm").exists());

        let calls = runner.calls();
        assert_eq!(
            calls[0].value_of("-f"),
            Some(OsStr::new("bestvideo[height<=480]+bestaudio/best[height<=480]"))
        );
        assert_eq!(
            calls[0].value_of("-o").unwrap(),
            dir.path().join("abc_title.%(ext)s").as_os_str()
        );
        assert!(!calls[0].args.iter().any(|a| a == "--extract-audio"));
    }

    #[tokio::test]
    async fn audio_fetch_requests_mp3_extraction() {
        let dir = TempDir::new().unwrap();
        let runner = RecordingRunner::new(|_| stdout(""));

        fetch_with(&runner, &select(QualityTier::P720, true), dir.path())
            .await
            .unwrap();

        let calls = runner.calls();
        let call = &calls[0];
        assert_eq!(call.value_of("-f"), Some(OsStr::new("bestaudio")));
        assert_eq!(call.value_of("--audio-format"), Some(OsStr::new("mp3")));
    }

    #[tokio::test]
    async fn reported_path_is_last_printed_line() {
        let dir = TempDir::new().unwrap();
        let runner = RecordingRunner::new(|_| stdout("[info] noise\n/tmp/x/abc_title.mkv\n\n"));

        let report = fetch_with(&runner, &select(QualityTier::P720, false), dir.path())
            .await
            .unwrap();

        assert_eq!(
            report.reported_path,
            Some(PathBuf::from("/tmp/x/abc_title.mkv"))
        );
    }

    #[tokio::test]
    async fn non_zero_exit_carries_stderr() {
        let dir = TempDir::new().unwrap();
        let runner = RecordingRunner::new(|_| exit_with("yt-dlp", "ERROR: Requested format is not available"));

        let err = fetch_with(&runner, &select(QualityTier::P720, false), dir.path())
            .await
            .unwrap_err();

        assert_matches!(err, PipelineError::Fetch(_));
        assert!(err.to_string().contains("Requested format is not available"));
    }
}
