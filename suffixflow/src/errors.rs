//! Error types for the suffixflow engine.
//!
//! Two layers exist: [`SuffixflowError`] for crate-level APIs (configuration,
//! logging setup, I/O) and [`StageError`] for stage bodies. Stage errors never
//! cross the runner boundary as values; the dispatcher folds them into
//! [`crate::pipeline::SampleOutcome`]s and the halt flag.

use crate::core::ExecutionMode;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for suffixflow operations.
#[derive(Debug, Error)]
pub enum SuffixflowError {
    /// Invalid runner configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The global logging subscriber could not be installed.
    #[error("Logging error: {0}")]
    Logging(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for SuffixflowError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Errors raised by stage bodies and hooks.
#[derive(Debug, Error)]
pub enum StageError {
    /// A file the stage reads was not present.
    #[error("Missing required input: {}", .0.display())]
    MissingInput(PathBuf),

    /// An external command exited unsuccessfully.
    #[error("Command `{command}` exited with {status}: {stderr}")]
    CommandFailed {
        /// The rendered command line.
        command: String,
        /// The exit status as reported by the OS.
        status: String,
        /// Tail of the captured stderr.
        stderr: String,
    },

    /// The stage was configured in a way it cannot run with.
    #[error("Invalid stage configuration: {0}")]
    InvalidConfig(String),

    /// A link alias would overwrite a regular file.
    #[error("Refusing to replace existing file {}", .0.display())]
    AliasConflict(PathBuf),

    /// A worker task for a sample panicked or was aborted.
    #[error("Worker for sample '{sample}' did not complete: {message}")]
    TaskPanicked {
        /// The sample the task was processing.
        sample: String,
        /// The join error message.
        message: String,
    },

    /// The stage does not implement the body its mode calls for.
    #[error("Stage '{stage}' has no body for {mode} execution")]
    Unsupported {
        /// The stage name.
        stage: String,
        /// The mode that was dispatched.
        mode: ExecutionMode,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other error from an opaque stage body.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StageError {
    /// Creates an unsupported-mode error.
    #[must_use]
    pub fn unsupported(stage: impl Into<String>, mode: ExecutionMode) -> Self {
        Self::Unsupported {
            stage: stage.into(),
            mode,
        }
    }

    /// Creates an invalid configuration error.
    #[must_use]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_input_display() {
        let err = StageError::MissingInput(PathBuf::from("data/tmp.s1.R1.fq.gz"));
        assert_eq!(
            err.to_string(),
            "Missing required input: data/tmp.s1.R1.fq.gz"
        );
    }

    #[test]
    fn test_unsupported_display() {
        let err = StageError::unsupported("SortBam", ExecutionMode::Whole);
        assert!(err.to_string().contains("SortBam"));
        assert!(err.to_string().contains("none"));
    }

    #[test]
    fn test_anyhow_conversion() {
        fn body() -> Result<(), StageError> {
            Err(anyhow::anyhow!("tool crashed"))?;
            Ok(())
        }

        let err = body().unwrap_err();
        assert!(matches!(err, StageError::Other(_)));
        assert_eq!(err.to_string(), "tool crashed");
    }

    #[test]
    fn test_serde_error_conversion() {
        let parse = serde_json::from_str::<serde_json::Value>("{not json");
        let err: SuffixflowError = parse.unwrap_err().into();
        assert!(matches!(err, SuffixflowError::Serialization(_)));
    }
}
