//! Error types shared by every stage of a manufactured-solution study.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while deriving, generating, running or analysing a study.
#[derive(Error, Debug)]
pub enum MmsError {
    /// Configuration file could not be parsed or failed validation.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Expression text could not be parsed.
    #[error("Cannot parse expression '{input}': {reason}")]
    Parse { input: String, reason: String },

    /// Evaluation met a symbol with no value bound to it.
    #[error("No value supplied for symbol '{0}'")]
    UnknownSymbol(String),

    /// A generated temporary clashes with an identifier already in use.
    #[error("Temporary name '{0}' collides with an identifier of the generated chunk")]
    NameCollision(String),

    /// Generated chunk could not be checked against its expression.
    #[error("Generated code check failed: {0}")]
    CodeCheck(String),

    /// Filesystem failure with the offending path.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// External solver script returned a failure status.
    #[error("Solver run for {level}x{level} exited with status {status}")]
    ExternalProcess { level: usize, status: String },

    /// Norm log is missing or malformed.
    #[error("Norm log {path}: {reason}")]
    NormLog { path: PathBuf, reason: String },

    /// Report could not be written.
    #[error("Report error: {0}")]
    Report(String),
}

impl MmsError {
    /// Wrap an I/O error together with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a parse error.
    pub fn parse(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Create a norm-log error.
    pub fn norm_log(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::NormLog {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type MmsResult<T> = Result<T, MmsError>;
