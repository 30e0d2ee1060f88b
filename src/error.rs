//! Error types for tree assembly.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::crypto::CryptoError;

/// Boxed error returned by caller-supplied index and content functions
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised while preparing or writing a tree
#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("index function of directory '{directory}' failed: {source}")]
    Index {
        directory: String,
        #[source]
        source: BoxError,
    },

    #[error("name collision in directory '{directory}': '{name}' already exists")]
    NameCollision { directory: String, name: String },

    #[error("invalid node name: {0:?}")]
    InvalidName(String),

    #[error("file '{0}' was written before being prepared")]
    NotPrepared(String),

    #[error("content of file '{file}' could not be produced: {source}")]
    Content {
        file: String,
        #[source]
        source: BoxError,
    },

    #[error("signing '{file}' failed: {source}")]
    Crypto {
        file: String,
        #[source]
        source: CryptoError,
    },

    #[error("archive '{archive}' could not be built: {source}")]
    Archive {
        archive: String,
        #[source]
        source: io::Error,
    },

    #[error("output sink failed at {}: {source}", path.display())]
    Sink {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for assembly operations
pub type AssemblyResult<T> = Result<T, AssemblyError>;
