use std::path::PathBuf;
use thiserror::Error;

/// Shorthand for results carrying this crate's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can stop an export.
///
/// Per-file read failures never surface here; they are rendered inline in
/// the document instead.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// A filesystem operation on `path` failed.
    #[error("Cannot access '{path}': {message}")]
    Io {
        /// File or directory being touched
        path: PathBuf,
        /// OS error text
        message: String,
    },

    /// Options that do not describe a usable export.
    #[error("Invalid configuration: {message}")]
    Config {
        /// What was wrong
        message: String,
    },

    /// A folder or file pattern could not be compiled.
    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// Pattern as supplied
        pattern: String,
        /// Compiler message from globset
        reason: String,
    },

    /// The export aborted after traversal had started.
    #[error("Export failed: {message}")]
    Export {
        /// Underlying failure
        message: String,
    },
}

impl Error {
    /// Wraps an I/O failure on `path`.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: source.to_string(),
        }
    }

    /// Rejects a configuration value.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Rejects a glob that does not compile.
    #[must_use]
    pub fn invalid_pattern(pattern: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }

    /// Wraps any failure that escaped the per-file guard during a walk.
    #[must_use]
    pub fn export(cause: impl std::fmt::Display) -> Self {
        Self::Export {
            message: cause.to_string(),
        }
    }

    /// Filesystem failure?
    #[must_use]
    pub const fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// Bad option or bad pattern?
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. } | Self::InvalidPattern { .. })
    }

    /// Walk aborted?
    #[must_use]
    pub const fn is_export(&self) -> bool {
        matches!(self, Self::Export { .. })
    }
}

impl From<walkdir::Error> for Error {
    fn from(e: walkdir::Error) -> Self {
        let path = e.path().map(PathBuf::from).unwrap_or_default();
        Self::Io {
            path,
            message: e.to_string(),
        }
    }
}
