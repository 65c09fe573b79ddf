//! Error types for CIS Policy Sync operations.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::rhacs::ClientError;

/// Top-level error for catalog loading, configuration and synchronization.
#[derive(Debug, Error)]
pub enum PolicySyncError {
    /// A file could not be read.
    #[error("Failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The catalog is not well-formed structured data.
    #[error("Catalog parse error: {0}")]
    Parsing(String),

    /// A catalog entry is missing a required field or carries an invalid value.
    #[error("Catalog schema error: {0}")]
    Schema(String),

    /// The runtime configuration is incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A remote call failed.
    #[error(transparent)]
    Client(#[from] ClientError),
}

impl PolicySyncError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn parsing(msg: impl Into<String>) -> Self {
        Self::Parsing(msg.into())
    }

    pub(crate) fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }

    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

pub type PolicySyncResult<T> = Result<T, PolicySyncError>;
