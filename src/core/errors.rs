//! SRE-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, SreError>;

/// Top-level error type for the sales report engine.
#[derive(Debug, Error)]
pub enum SreError {
    #[error("[SRE-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[SRE-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[SRE-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[SRE-1101] report already registered: {id}")]
    DuplicateReport { id: String },

    #[error("[SRE-1102] unknown report: {id}")]
    UnknownReport { id: String },

    #[error("[SRE-1103] invalid report definition {id}: {details}")]
    InvalidDefinition { id: String, details: String },

    #[error("[SRE-2001] database connection unavailable: {details}")]
    ConnectionUnavailable { details: String },

    #[error("[SRE-2101] query execution failed: {details}")]
    QueryExecution { details: String },

    #[error("[SRE-2102] invalid parameter {name}: {details}")]
    InvalidParameter { name: String, details: String },

    #[error("[SRE-2201] result normalization failed: {details}")]
    Normalization { details: String },

    #[error("[SRE-3001] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[SRE-3002] SQL failure in {context}: {details}")]
    Sql {
        context: &'static str,
        details: String,
    },

    #[error("[SRE-3003] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SreError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "SRE-1001",
            Self::MissingConfig { .. } => "SRE-1002",
            Self::ConfigParse { .. } => "SRE-1003",
            Self::DuplicateReport { .. } => "SRE-1101",
            Self::UnknownReport { .. } => "SRE-1102",
            Self::InvalidDefinition { .. } => "SRE-1103",
            Self::ConnectionUnavailable { .. } => "SRE-2001",
            Self::QueryExecution { .. } => "SRE-2101",
            Self::InvalidParameter { .. } => "SRE-2102",
            Self::Normalization { .. } => "SRE-2201",
            Self::Serialization { .. } => "SRE-3001",
            Self::Sql { .. } => "SRE-3002",
            Self::Io { .. } => "SRE-3003",
        }
    }

    /// Failures scoped to a single report run. The dispatcher turns these into
    /// a warning and returns to idle; the session continues.
    #[must_use]
    pub const fn is_report_local(&self) -> bool {
        matches!(
            self,
            Self::QueryExecution { .. } | Self::InvalidParameter { .. } | Self::Normalization { .. }
        )
    }

    /// Failures that end the interactive session.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !self.is_report_local()
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Report-local normalization failure.
    #[must_use]
    pub fn normalization(details: impl Into<String>) -> Self {
        Self::Normalization {
            details: details.into(),
        }
    }
}

impl From<rusqlite::Error> for SreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sql {
            context: "rusqlite",
            details: value.to_string(),
        }
    }
}

impl From<serde_json::Error> for SreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for SreError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}
