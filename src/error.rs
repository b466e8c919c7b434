//! Error types for the resolution pipeline.
//!
//! Stage-local failures inside a resolution never surface here: they degrade
//! to "no data" for the affected field. These variants cover what a caller of
//! [`Resolver`](crate::scanner::Resolver), [`ScanRegistry`](crate::state::ScanRegistry)
//! or [`ArtworkCache`](crate::images::ArtworkCache) can actually observe.

use std::path::PathBuf;

/// Errors surfaced by the registry, the artwork cache and the resolver.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The file vanished between discovery and resolution.
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// An HTTP request to a metadata provider or image host failed.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Input was rejected before any I/O (bad cache key, bad id, bad URL).
    #[error("validation failed: {0}")]
    Validation(String),

    /// The registry document could not be written.
    #[error("failed to persist {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A probe tool failed outside the degrading paths.
    #[error("probe error: {0}")]
    Probe(#[from] hdrscan_av::Error),
}

impl Error {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a persistence error for `path`.
    pub fn persist(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Persist {
            path: path.into(),
            source,
        }
    }

    /// Whether this error means the target file does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
