//! Error types for relnotes.
//!
//! Library crates use [`ReleaseNotesError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` and turns it into the process exit status.

use std::path::PathBuf;

/// Top-level error type for every release-note stage.
#[derive(Debug, thiserror::Error)]
pub enum ReleaseNotesError {
    /// Missing or invalid configuration (environment or config file).
    #[error("config error: {message}")]
    Config { message: String },

    /// Transport-level failure talking to the source-hosting API.
    #[error("network error: {0}")]
    Network(String),

    /// The API answered with a non-2xx status.
    #[error("API error: {url} returned HTTP {status}: {message}")]
    Api {
        url: String,
        status: u16,
        message: String,
    },

    /// Malformed lockfile, JSON, base64 or source file content.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// An expected entry is absent from an otherwise well-formed document.
    #[error("lookup error: {message}")]
    Lookup { message: String },

    /// Template compilation or rendering failure.
    #[error("render error: {0}")]
    Render(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ReleaseNotesError>;

impl ReleaseNotesError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a lookup error from any displayable message.
    pub fn lookup(msg: impl Into<String>) -> Self {
        Self::Lookup {
            message: msg.into(),
        }
    }

    /// Whether the API reported the requested resource as absent (HTTP 404).
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status: 404, .. })
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
