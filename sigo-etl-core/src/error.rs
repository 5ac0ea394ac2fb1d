//! Error types for the SIGO ETL pipeline.
//!
//! Every failure aborts the run. Variants map onto the pipeline stage that
//! raised them so the caller can tell which step broke.

use crate::data::transform::ColumnType;
use std::fmt;
use std::path::PathBuf;

/// Pipeline stage an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Config,
    Extract,
    Transform,
    Load,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Config => write!(f, "config"),
            Stage::Extract => write!(f, "extract"),
            Stage::Transform => write!(f, "transform"),
            Stage::Load => write!(f, "load"),
        }
    }
}

/// Top-level error type for the ETL pipeline.
#[derive(Debug, thiserror::Error)]
pub enum EtlError {
    #[error("Source unavailable at {endpoint}: {message}")]
    SourceUnavailable {
        endpoint: String,
        status: Option<u16>,
        message: String,
    },

    #[error("Malformed response: {message}")]
    MalformedResponse { message: String },

    #[error("Cast error: {0}")]
    Cast(#[from] CastError),

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl EtlError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    /// The stage that raised this error.
    pub fn stage(&self) -> Stage {
        match self {
            EtlError::Config(_) => Stage::Config,
            EtlError::SourceUnavailable { .. } | EtlError::MalformedResponse { .. } => {
                Stage::Extract
            }
            EtlError::Cast(_) => Stage::Transform,
            EtlError::Write { .. } => Stage::Load,
        }
    }

    /// HTTP status carried by a `SourceUnavailable` error, if any.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            EtlError::SourceUnavailable { status, .. } => *status,
            _ => None,
        }
    }
}

/// A raw field value that could not be coerced to its declared type.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("row {row}: field '{field}' expected {expected}, got {raw_value}")]
pub struct CastError {
    pub row: usize,
    pub field: String,
    pub expected: ColumnType,
    pub raw_value: String,
}

/// Errors from the configuration system.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("API token not configured (set `source.token` or env var {env_var})")]
    MissingToken { env_var: String },

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

impl ConfigError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}

pub type Result<T, E = EtlError> = std::result::Result<T, E>;
