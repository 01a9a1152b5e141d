//! Error types for the download pipeline
//!
//! Every stage fails fast with a `PipelineError`. The orchestrator tags it
//! with the stage it happened in (`PipelineFailure`) after cleaning up.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failure of a single external program invocation
#[derive(Error, Debug)]
pub enum ExecError {
    #[error("failed to start {program}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed while waiting for {program}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {}: {}", exit_code_label(.code), .stderr.trim())]
    ExitCode {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("{program} did not finish within {}s", .timeout.as_secs())]
    TimedOut { program: String, timeout: Duration },

    #[error("{program} was cancelled")]
    Cancelled { program: String },

    #[error("required program not found: {program}")]
    NotFound { program: String },
}

fn exit_code_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code (killed by signal)".to_string(),
    }
}

impl ExecError {
    /// Captured standard error of the failed program, if it ran to completion
    pub fn stderr(&self) -> Option<&str> {
        match self {
            ExecError::ExitCode { stderr, .. } => Some(stderr),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ExecError::Cancelled { .. })
    }
}

/// A request rejected before any stage ran
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid YouTube URL")]
    MissingUrl,

    #[error("Invalid YouTube URL")]
    UnrecognizedHost(String),
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("title resolution failed: {0}")]
    TitleResolution(String),

    #[error("title resolution failed: {0}")]
    TitleCommand(#[source] ExecError),

    #[error("fetch failed: {0}")]
    Fetch(#[source] ExecError),

    #[error("downloaded artifact not found for '{title}' in {}", .dir.display())]
    ArtifactNotFound { title: String, dir: PathBuf },

    #[error("transcode failed: {0}")]
    Transcode(#[source] ExecError),

    #[error("final artifact {} is missing or empty", .0.display())]
    EmptyArtifact(PathBuf),

    #[error("io error during {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        PipelineError::Io {
            operation: operation.into(),
            source,
        }
    }

    /// True when the failure came from a cancelled external invocation
    pub fn is_cancelled(&self) -> bool {
        match self {
            PipelineError::TitleCommand(e)
            | PipelineError::Fetch(e)
            | PipelineError::Transcode(e) => e.is_cancelled(),
            _ => false,
        }
    }
}

/// Pipeline states, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validating,
    ResolvingTitle,
    Fetching,
    Locating,
    Transcoding,
    Delivering,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Validating => "validating",
            Stage::ResolvingTitle => "resolving-title",
            Stage::Fetching => "fetching",
            Stage::Locating => "locating",
            Stage::Transcoding => "transcoding",
            Stage::Delivering => "delivering",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Terminal `Failed(stage, cause)` state of a pipeline run
#[derive(Error, Debug)]
#[error("{stage} failed: {cause}")]
pub struct PipelineFailure {
    pub stage: Stage,
    #[source]
    pub cause: PipelineError,
}

impl PipelineFailure {
    pub fn new(stage: Stage, cause: PipelineError) -> Self {
        Self { stage, cause }
    }
}

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("Required dependency not found: {0}")]
    DependencyNotFound(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
