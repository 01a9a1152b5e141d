//! Find what the fetcher actually wrote
//!
//! The container extension is chosen by the fetcher, so the raw file cannot
//! be named in advance. Disambiguation policy for the prefix scan:
//! 1. an entry not ending in the final extension is the raw artifact
//! 2. otherwise an entry already ending in it is final as-is
//! 3. otherwise the artifact was not found

use crate::error::PipelineError;
use crate::fetch::FetchReport;
use crate::types::TargetFormat;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocatedArtifact {
    /// Needs transcoding into the target container
    Raw(PathBuf),
    /// Fetcher produced the target container directly
    AlreadyFinal(PathBuf),
}

impl LocatedArtifact {
    pub fn path(&self) -> &Path {
        match self {
            LocatedArtifact::Raw(path) | LocatedArtifact::AlreadyFinal(path) => path,
        }
    }

    fn classify(path: PathBuf, target: TargetFormat) -> Self {
        let is_final = path
            .file_name()
            .map(|name| target.matches(&name.to_string_lossy()))
            .unwrap_or(false);
        if is_final {
            LocatedArtifact::AlreadyFinal(path)
        } else {
            LocatedArtifact::Raw(path)
        }
    }
}

pub async fn locate(
    fetch_dir: &Path,
    sanitized_title: &str,
    target: TargetFormat,
    report: &FetchReport,
) -> Result<LocatedArtifact, PipelineError> {
    if let Some(reported) = trusted_report(fetch_dir, report).await {
        tracing::debug!("Using fetcher-reported artifact {}", reported.display());
        return Ok(LocatedArtifact::classify(reported, target));
    }

    let candidates = scan(fetch_dir, sanitized_title).await?;
    tracing::debug!("Artifact candidates for '{}': {:?}", sanitized_title, candidates);

    let raw = candidates.iter().find(|name| !target.matches(name));
    let already_final = candidates.iter().find(|name| target.matches(name));

    match (raw, already_final) {
        (Some(name), _) => Ok(LocatedArtifact::Raw(fetch_dir.join(name))),
        (None, Some(name)) => Ok(LocatedArtifact::AlreadyFinal(fetch_dir.join(name))),
        (None, None) => Err(PipelineError::ArtifactNotFound {
            title: sanitized_title.to_string(),
            dir: fetch_dir.to_path_buf(),
        }),
    }
}

/// The reported path counts only if it is an existing file in our namespace
async fn trusted_report(fetch_dir: &Path, report: &FetchReport) -> Option<PathBuf> {
    let reported = report.reported_path.as_ref()?;
    if reported.parent() != Some(fetch_dir) {
        tracing::debug!(
            "Ignoring reported path {} outside {}",
            reported.display(),
            fetch_dir.display()
        );
        return None;
    }
    match tokio::fs::metadata(reported).await {
        Ok(meta) if meta.is_file() => Some(reported.clone()),
        _ => None,
    }
}

/// Sorted names of regular files starting with the title
async fn scan(fetch_dir: &Path, sanitized_title: &str) -> Result<Vec<String>, PipelineError> {
    let mut entries = tokio::fs::read_dir(fetch_dir)
        .await
        .map_err(|e| PipelineError::io(format!("listing {}", fetch_dir.display()), e))?;

    let mut names = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| PipelineError::io(format!("listing {}", fetch_dir.display()), e))?
    {
        let is_file = entry
            .file_type()
            .await
            .map(|t| t.is_file())
            .unwrap_or(false);
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_file && name.starts_with(sanitized_title) {
            names.push(name);
        }
    }

    names.sort();
    Ok(names)
}
