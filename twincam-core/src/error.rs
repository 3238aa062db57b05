// ============================================================================
// twincam-core/src/error.rs
// ============================================================================
//
// ERROR HANDLING: Error Types for the Twincam Pipeline
//
// Every fallible operation in the core returns `CoreResult<T>`. Variants are
// grouped into the categories the job manager reports to callers: input
// validation, tool invocation, probe failures, I/O problems and job lookups.

use std::io;
use std::process::ExitStatus;
use thiserror::Error;

/// Custom error types for twincam-core
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid input: {0}")]
    InputValidation(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to start {0}: {1}")]
    CommandStart(String, #[source] io::Error),

    #[error("Failed waiting for {0}: {1}")]
    CommandWait(String, #[source] io::Error),

    #[error("{cmd} exited with {status}: {stderr}")]
    CommandFailed {
        cmd: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("{0} reported an error: {1}")]
    ToolReported(String, String),

    #[error("{stage} failed: {source}")]
    StageFailed {
        stage: String,
        #[source]
        source: Box<CoreError>,
    },

    #[error("Could not determine duration: {0}")]
    ProbeFailure(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Cannot list path in concat manifest: {0}")]
    ConcatList(String),

    #[error("Intermediate artifact missing: {0}")]
    MissingArtifact(String),

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Job {0} has not finished successfully")]
    JobNotReady(String),

    #[error("Required dependency not found: {0}")]
    DependencyNotFound(String),

    #[error("Notification error: {0}")]
    NotificationError(String),

    #[error("JSON parse error: {0}")]
    JsonParse(String),

    #[error("{0}")]
    OperationFailed(String),
}

/// Broad error classes, used for status reporting and exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    InputValidation,
    ToolInvocation,
    ProbeFailure,
    IoFailure,
    Lookup,
    Other,
}

impl CoreError {
    /// Wraps an error with the label of the stage that produced it.
    pub fn in_stage(self, stage: impl Into<String>) -> Self {
        CoreError::StageFailed {
            stage: stage.into(),
            source: Box::new(self),
        }
    }

    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            CoreError::StageFailed { source, .. } => source.category(),
            CoreError::InputValidation(_) | CoreError::InvalidConfig(_) => {
                ErrorCategory::InputValidation
            }
            CoreError::CommandStart(..)
            | CoreError::CommandWait(..)
            | CoreError::CommandFailed { .. }
            | CoreError::ToolReported(..)
            | CoreError::DependencyNotFound(_) => ErrorCategory::ToolInvocation,
            CoreError::ProbeFailure(_) => ErrorCategory::ProbeFailure,
            CoreError::Io(_) | CoreError::ConcatList(_) | CoreError::MissingArtifact(_) => {
                ErrorCategory::IoFailure
            }
            CoreError::JobNotFound(_) | CoreError::JobNotReady(_) => ErrorCategory::Lookup,
            CoreError::NotificationError(_)
            | CoreError::JsonParse(_)
            | CoreError::OperationFailed(_) => ErrorCategory::Other,
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::JsonParse(err.to_string())
    }
}

/// Result type for twincam-core operations
pub type CoreResult<T> = std::result::Result<T, CoreError>;

/// Builds a `CommandStart` error for a tool that could not be launched.
pub fn command_start_error(cmd: impl Into<String>, err: io::Error) -> CoreError {
    CoreError::CommandStart(cmd.into(), err)
}

/// Builds a `CommandWait` error for a tool whose exit status could not be read.
pub fn command_wait_error(cmd: impl Into<String>, err: io::Error) -> CoreError {
    CoreError::CommandWait(cmd.into(), err)
}

/// Builds a `CommandFailed` error from an exit status and captured stderr.
pub fn command_failed_error(
    cmd: impl Into<String>,
    status: ExitStatus,
    stderr: impl Into<String>,
) -> CoreError {
    CoreError::CommandFailed {
        cmd: cmd.into(),
        status,
        stderr: stderr.into(),
    }
}
