//! Error types for uavo-upgrader.
//!
//! This module defines the crate-wide error type. Sanitation has its own
//! recoverable error type in [`crate::sanitize`]; it only appears here when a
//! caller explicitly asks for sanitation failures to be fatal.

use std::path::PathBuf;
use thiserror::Error;

use crate::sanitize::SanitizeError;

/// The main error type for uavo-upgrader operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Request Errors ===
    /// The request did not name a source version.
    #[error("missing githash")]
    MissingGithash,

    /// The uploaded payload exceeds the configured limit.
    #[error("payload of {size} bytes exceeds limit of {limit} bytes")]
    PayloadTooLarge {
        /// Size observed so far.
        size: usize,
        /// Configured limit.
        limit: usize,
    },

    // === Definition Errors ===
    /// No definition bundle is known for the version identifier.
    #[error("no definitions for version '{githash}'")]
    UnknownVersion {
        /// The requested version identifier.
        githash: String,
    },

    /// A definition bundle could not be read.
    #[error("failed to read definitions for '{githash}' from {path}: {source}")]
    DefinitionRead {
        /// The requested version identifier.
        githash: String,
        /// Path of the archive.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A definition bundle did not match its pinned digest.
    #[error("definition digest mismatch for '{githash}': expected {expected}, got {actual}")]
    DefinitionDigest {
        /// The requested version identifier.
        githash: String,
        /// Digest pinned in configuration.
        expected: String,
        /// Digest of the bytes on disk.
        actual: String,
    },

    // === Collaborator Errors ===
    /// The importer rejected the payload.
    #[error("import failed: {0}")]
    Import(String),

    /// The exporter failed to render the settings.
    #[error("export failed: {0}")]
    Export(String),

    /// Sanitation failed and the caller asked for it to be fatal.
    #[error("sanitation failed: {0}")]
    Sanitize(#[from] SanitizeError),

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for uavo-upgrader operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new import error.
    #[must_use]
    pub fn import(message: impl Into<String>) -> Self {
        Self::Import(message.into())
    }

    /// Create a new export error.
    #[must_use]
    pub fn export(message: impl Into<String>) -> Self {
        Self::Export(message.into())
    }

    /// Create an unknown version error.
    #[must_use]
    pub fn unknown_version(githash: impl Into<String>) -> Self {
        Self::UnknownVersion {
            githash: githash.into(),
        }
    }

    /// Check if this error means the version identifier is not known.
    #[must_use]
    pub fn is_unknown_version(&self) -> bool {
        matches!(self, Self::UnknownVersion { .. })
    }

    /// Check if this error was caused by the request itself rather than the
    /// server's definitions or collaborators.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MissingGithash | Self::PayloadTooLarge { .. } | Self::Import(_)
        )
    }
}
