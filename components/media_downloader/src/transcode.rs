use crate::command::Invocation;
use crate::config::StageContext;
use crate::error::PipelineError;
use crate::locator::LocatedArtifact;
use crate::types::TargetFormat;
use std::path::{Path, PathBuf};

fn codec_args(target: TargetFormat) -> &'static [&'static str] {
    match target {
        TargetFormat::Mp4 => &["-c:v", "libx264", "-c:a", "aac"],
        TargetFormat::Mp3 => &["-vn", "-c:a", "libmp3lame", "-q:a", "2"],
    }
}

fn transcode_invocation(
    ctx: &StageContext<'_>,
    raw: &Path,
    final_path: &Path,
    target: TargetFormat,
) -> Invocation {
    Invocation::new(&ctx.config.transcoder, ctx.config.timeouts.transcode)
        .args(["-hide_banner", "-nostdin", "-y", "-i"])
        .arg(raw)
        .args(codec_args(target))
        .arg(final_path)
}

/// Turn the located artifact into the final artifact at `final_path`.
///
/// An artifact already in the target container is moved, not re-encoded.
/// A raw artifact is transcoded and removed afterwards; if transcoding
/// fails it is left in place.
pub async fn finalize(
    ctx: &StageContext<'_>,
    located: LocatedArtifact,
    final_path: &Path,
    target: TargetFormat,
) -> Result<PathBuf, PipelineError> {
    match located {
        LocatedArtifact::AlreadyFinal(path) => {
            tracing::info!("Fetcher produced {} directly, skipping transcode", target.extension());
            promote(&path, final_path).await?;
        }
        LocatedArtifact::Raw(raw) => {
            tracing::info!("Transcoding {} to {}", raw.display(), target.extension());
            let invocation = transcode_invocation(ctx, &raw, final_path, target);
            ctx.runner
                .run(&invocation, ctx.cancel)
                .await
                .map_err(PipelineError::Transcode)?;

            if let Err(e) = tokio::fs::remove_file(&raw).await {
                tracing::warn!("Failed to remove raw artifact {}: {}", raw.display(), e);
            }
        }
    }

    Ok(final_path.to_path_buf())
}

async fn promote(from: &Path, to: &Path) -> Result<(), PipelineError> {
    if from == to {
        return Ok(());
    }
    tokio::fs::rename(from, to).await.map_err(|e| {
        PipelineError::io(
            format!("moving {} to {}", from.display(), to.display()),
            e,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::stub::{exit_with, stdout, write_transcoded, RecordingRunner};
    use crate::config::DownloaderConfig;
    use assert_matches::assert_matches;
    use tempfile::TempDir;
    use tokio_util::sync::CancellationToken;

    async fn finalize_with(
        runner: &RecordingRunner,
        located: LocatedArtifact,
        final_path: &Path,
        target: TargetFormat,
    ) -> Result<PathBuf, PipelineError> {
        let config = DownloaderConfig::new("/unused");
        let cancel = CancellationToken::new();
        let ctx = StageContext {
            runner,
            config: &config,
            cancel: &cancel,
        };
        finalize(&ctx, located, final_path, target).await
    }

    #[tokio::test]
    async fn already_final_is_promoted_without_transcoding() {
        let dir = TempDir::new().unwrap();
        let raw = dir.path().join("fetched.mp4");
        let final_path = dir.path().join("final.mp4");
        std::fs::write(&raw, b"original bytes").unwrap();
        let runner = RecordingRunner::new(|_| stdout(""));

        finalize_with(
            &runner,
            LocatedArtifact::AlreadyFinal(raw.clone()),
            &final_path,
            TargetFormat::Mp4,
        )
        .await
        .unwrap();

        assert_eq!(runner.calls_to("ffmpeg"), 0);
        assert_eq!(std::fs::read(&final_path).unwrap(), b"original bytes");
        assert!(!raw.exists());
    }

    #[tokio::test]
    async fn raw_is_transcoded_then_removed() {
        let dir = TempDir::new().unwrap();
        let raw = dir.path().join("fetched.webm");
        let final_path = dir.path().join("final.mp4");
        std::fs::write(&raw, b"webm").unwrap();
        let runner = RecordingRunner::new(|inv| {
            write_transcoded(inv, b"mp4");
            stdout("")
        });

        finalize_with(
            &runner,
            LocatedArtifact::Raw(raw.clone()),
            &final_path,
            TargetFormat::Mp4,
        )
        .await
        .unwrap();

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].value_of("-i").unwrap(), raw.as_os_str());
        assert_eq!(calls[0].value_of("-c:v").unwrap(), "libx264");
        assert_eq!(calls[0].value_of("-c:a").unwrap(), "aac");
        assert_eq!(std::fs::read(&final_path).unwrap(), b"mp4");
        assert!(!raw.exists());
    }

    #[tokio::test]
    async fn raw_audio_is_encoded_to_mp3() {
        let dir = TempDir::new().unwrap();
        let raw = dir.path().join("fetched.m4a");
        std::fs::write(&raw, b"m4a").unwrap();
        let runner = RecordingRunner::new(|inv| {
            write_transcoded(inv, b"mp3");
            stdout("")
        });

        finalize_with(
            &runner,
            LocatedArtifact::Raw(raw),
            &dir.path().join("final.mp3"),
            TargetFormat::Mp3,
        )
        .await
        .unwrap();

        let calls = runner.calls();
        assert_eq!(calls[0].value_of("-c:a").unwrap(), "libmp3lame");
        assert!(calls[0].args.iter().any(|a| a == "-vn"));
    }

    #[tokio::test]
    async fn failed_transcode_leaves_raw_in_place() {
        let dir = TempDir::new().unwrap();
        let raw = dir.path().join("fetched.webm");
        std::fs::write(&raw, b"webm").unwrap();
        let runner = RecordingRunner::new(|_| exit_with("ffmpeg", "Invalid data found when processing input"));

        let err = finalize_with(
            &runner,
            LocatedArtifact::Raw(raw.clone()),
            &dir.path().join("final.mp4"),
            TargetFormat::Mp4,
        )
        .await
        .unwrap_err();

        assert_matches!(err, PipelineError::Transcode(_));
        assert!(err.to_string().contains("Invalid data"));
        assert!(raw.exists());
    }
}
