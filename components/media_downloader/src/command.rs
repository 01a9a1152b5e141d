//! External program execution
//!
//! Arguments are always passed as a discrete vector, never through a shell.
//! Every invocation carries a deadline and observes a cancellation token;
//! the child is killed if either fires or the future is dropped.

use crate::error::ExecError;
use async_trait::async_trait;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

/// One program run: what to execute, with which arguments, for how long
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<OsString>,
    pub timeout: Duration,
}

impl Invocation {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Value following `flag` in the argument list, if any
    pub fn value_of(&self, flag: &str) -> Option<&OsStr> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(OsString::as_os_str)
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Captured streams of a successful run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Check that `program` can be executed at all
    async fn check_available(&self, program: &str) -> Result<(), ExecError>;

    /// Run to completion. Non-zero exit is an error carrying stderr.
    async fn run(
        &self,
        invocation: &Invocation,
        cancel: &CancellationToken,
    ) -> Result<CommandOutput, ExecError>;
}

/// Runs invocations as real OS processes
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn check_available(&self, program: &str) -> Result<(), ExecError> {
        which::which(program)
            .map(|_| ())
            .map_err(|_| ExecError::NotFound {
                program: program.to_string(),
            })
    }

    async fn run(
        &self,
        invocation: &Invocation,
        cancel: &CancellationToken,
    ) -> Result<CommandOutput, ExecError> {
        let program = invocation.program.clone();
        tracing::debug!("Running: {}", invocation);

        let child = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ExecError::Spawn {
                program: program.clone(),
                source,
            })?;

        // Dropping the wait future drops the child, which kills it.
        let output = tokio::select! {
            waited = tokio::time::timeout(invocation.timeout, child.wait_with_output()) => {
                match waited {
                    Ok(result) => result.map_err(|source| ExecError::Wait {
                        program: program.clone(),
                        source,
                    })?,
                    Err(_) => {
                        tracing::warn!(
                            "{} timed out after {}s, killed",
                            program,
                            invocation.timeout.as_secs()
                        );
                        return Err(ExecError::TimedOut {
                            program,
                            timeout: invocation.timeout,
                        });
                    }
                }
            }
            _ = cancel.cancelled() => {
                tracing::info!("{} cancelled, killed", program);
                return Err(ExecError::Cancelled { program });
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            return Err(ExecError::ExitCode {
                program,
                code: output.status.code(),
                stderr,
            });
        }

        Ok(CommandOutput { stdout, stderr })
    }
}
