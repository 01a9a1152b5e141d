//! Handing the final artifact to the caller
//!
//! A `Delivery` owns the opened final artifact together with the request
//! workspace. Whatever happens to it, streamed to completion, abandoned
//! mid-stream, persisted or simply dropped, the artifact and the workspace
//! are deleted exactly once when it goes away.

use crate::error::PipelineError;
use crate::types::TargetFormat;
use crate::utils::ascii_fallback;
use crate::workspace::Workspace;
use bytes::Bytes;
use futures::Stream;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::fs::File;
use tokio_util::io::ReaderStream;

/// Open the final artifact, rejecting a missing or empty file
pub async fn open_final(path: &Path) -> Result<(File, u64), PipelineError> {
    let size = match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() && meta.len() > 0 => meta.len(),
        _ => return Err(PipelineError::EmptyArtifact(path.to_path_buf())),
    };

    let file = File::open(path)
        .await
        .map_err(|e| PipelineError::io(format!("opening {}", path.display()), e))?;

    Ok((file, size))
}

/// Successful pipeline outcome, ready to be sent
#[derive(Debug)]
pub struct Delivery {
    file: File,
    file_name: String,
    target: TargetFormat,
    size_bytes: u64,
    guard: CleanupGuard,
}

impl Delivery {
    pub(crate) fn new(
        file: File,
        size_bytes: u64,
        final_path: PathBuf,
        file_name: String,
        target: TargetFormat,
        workspace: Workspace,
    ) -> Self {
        Self {
            file,
            file_name,
            target,
            size_bytes,
            guard: CleanupGuard {
                path: final_path,
                workspace: Some(workspace),
                completed: false,
            },
        }
    }

    pub fn final_path(&self) -> &Path {
        &self.guard.path
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn content_type(&self) -> &'static str {
        self.target.content_type()
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// `attachment` disposition with an ASCII fallback and a UTF-8 name
    pub fn content_disposition(&self) -> String {
        format!(
            "attachment; filename=\"{}\"; filename*=UTF-8''{}",
            ascii_fallback(&self.file_name),
            urlencoding::encode(&self.file_name)
        )
    }

    /// Body stream. The artifact is deleted once the stream is dropped.
    pub fn into_stream(self) -> DeliveryStream {
        DeliveryStream {
            inner: ReaderStream::new(self.file),
            guard: self.guard,
        }
    }

    /// Copy the artifact into `dir`, then clean up
    pub async fn persist_into(mut self, dir: &Path) -> Result<PathBuf, PipelineError> {
        let destination = dir.join(&self.file_name);
        tokio::fs::copy(&self.guard.path, &destination)
            .await
            .map_err(|e| PipelineError::io(format!("copying to {}", destination.display()), e))?;
        self.guard.completed = true;
        Ok(destination)
    }
}

/// Media bytes of a `Delivery`
pub struct DeliveryStream {
    inner: ReaderStream<File>,
    guard: CleanupGuard,
}

impl Stream for DeliveryStream {
    type Item = std::io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let polled = Pin::new(&mut self.inner).poll_next(cx);
        if let Poll::Ready(None) = polled {
            self.guard.completed = true;
        }
        polled
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

#[derive(Debug)]
struct CleanupGuard {
    path: PathBuf,
    workspace: Option<Workspace>,
    completed: bool,
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        if self.completed {
            tracing::info!("Delivered {}", self.path.display());
        } else {
            tracing::warn!(
                "Delivery of {} ended before completion, cleaning up",
                self.path.display()
            );
        }

        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Failed to remove {}: {}", self.path.display(), e);
            }
        }

        if let Some(workspace) = self.workspace.take() {
            workspace.discard();
        }
    }
}
