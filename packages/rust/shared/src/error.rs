//! Error types for componentgen.
//!
//! Library crates use [`ComponentGenError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all componentgen operations.
#[derive(Debug, thiserror::Error)]
pub enum ComponentGenError {
    /// The requested component type has no registered template bundle.
    #[error(
        "templates for {requested}s are not available, choose one of: {}",
        available.join(", ")
    )]
    UnknownComponentType {
        requested: String,
        available: Vec<String>,
    },

    /// A request field failed validation.
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),

    /// A template bundle or the config file is unusable. Not a user input error.
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// A file under the app root could not be read during context assembly.
    #[error("cannot read {path:?} while assembling context: {source}")]
    FileAccess {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Filesystem I/O error outside of context assembly (config, instructions).
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failure reported by the external generation pipeline.
    #[error("generation error: {0}")]
    Generation(String),
}

/// One variant per request validation rule.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("app must be a non-empty identifier")]
    EmptyApp,

    #[error("app {app:?} is not a valid app slug (a single path segment is required)")]
    InvalidApp { app: String },

    #[error("instructions must be non-empty text")]
    EmptyInstructions,

    #[error("tries must be a positive integer (at most {}), got {tries}", u32::MAX)]
    NonPositiveTries { tries: i64 },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ComponentGenError>;

impl ComponentGenError {
    /// Create a configuration error from any displayable message.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` raised while reading the app tree.
    pub fn file_access(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileAccess {
            path: path.into(),
            source,
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
