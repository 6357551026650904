//! Error types for Mediasync.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (2=db, 4=validation, 7=config, 8=io)
//! - Context-aware recovery hints
//! - Structured JSON output for `--json` consumers
//!
//! Missing identity mappings and unparseable prior view counts are not
//! errors here: the reconcilers recover from them locally.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::storage::StoreDomain;

/// Result type alias for Mediasync operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Database (exit 2)
    NotInitialized,
    AlreadyInitialized,
    DatabaseError,
    SessionCloseError,

    // Validation (exit 4)
    InvalidArgument,
    InvalidFeed,

    // Config (exit 7)
    ConfigError,

    // I/O (exit 8)
    IoError,
    JsonError,

    // Internal (exit 1)
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::AlreadyInitialized => "ALREADY_INITIALIZED",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::SessionCloseError => "SESSION_CLOSE_ERROR",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::InvalidFeed => "INVALID_FEED",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category-based exit code.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InternalError => 1,
            Self::NotInitialized
            | Self::AlreadyInitialized
            | Self::DatabaseError
            | Self::SessionCloseError => 2,
            Self::InvalidArgument | Self::InvalidFeed => 4,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError => 8,
        }
    }

    /// Whether the same invocation may succeed when retried.
    ///
    /// Storage errors are usually lock contention with the media center
    /// itself, so they are worth a second attempt.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::DatabaseError | Self::SessionCloseError)
    }
}

// ── Session close failures ────────────────────────────────────

/// The cleanup step of a session exit that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseStep {
    Commit,
    Checkpoint,
    Close,
}

impl fmt::Display for CloseStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Commit => write!(f, "commit"),
            Self::Checkpoint => write!(f, "checkpoint"),
            Self::Close => write!(f, "close"),
        }
    }
}

/// One failed cleanup step on one storage domain.
#[derive(Debug)]
pub struct CloseFailure {
    pub domain: StoreDomain,
    pub step: CloseStep,
    pub source: rusqlite::Error,
}

/// Every cleanup failure collected while closing a reconciliation session.
///
/// Never empty when carried by [`Error::SessionClose`].
#[derive(Debug, Default)]
pub struct CloseErrors {
    failures: Vec<CloseFailure>,
}

impl CloseErrors {
    /// Record a failed step.
    pub fn push(&mut self, domain: StoreDomain, step: CloseStep, source: rusqlite::Error) {
        self.failures.push(CloseFailure {
            domain,
            step,
            source,
        });
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    /// The first failure, in cleanup order.
    #[must_use]
    pub fn first(&self) -> Option<&CloseFailure> {
        self.failures.first()
    }

    /// All failures, in cleanup order.
    #[must_use]
    pub fn failures(&self) -> &[CloseFailure] {
        &self.failures
    }

    /// `Ok(())` when nothing failed, otherwise the collected failures as an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionClose`] when at least one step failed.
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::SessionClose(self))
        }
    }
}

impl fmt::Display for CloseErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.failures.split_first() {
            None => write!(f, "no failures"),
            Some((first, rest)) => {
                write!(
                    f,
                    "{} {} failed: {}",
                    first.domain, first.step, first.source
                )?;
                if !rest.is_empty() {
                    write!(f, " (and {} more)", rest.len())?;
                }
                Ok(())
            }
        }
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in Mediasync operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Not initialized: run `mediasync init` first")]
    NotInitialized,

    #[error("Already initialized at {path}")]
    AlreadyInitialized { path: PathBuf },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Session close failed: {0}")]
    SessionClose(CloseErrors),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid record at line {line}: {message}")]
    Feed { line: usize, message: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::NotInitialized => ErrorCode::NotInitialized,
            Self::AlreadyInitialized { .. } => ErrorCode::AlreadyInitialized,
            Self::Database(_) => ErrorCode::DatabaseError,
            Self::SessionClose(_) => ErrorCode::SessionCloseError,
            Self::Feed { .. } => ErrorCode::InvalidFeed,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Context-aware recovery hint.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::NotInitialized => {
                Some("Run `mediasync init` to create the local databases".to_string())
            }

            Self::AlreadyInitialized { path } => Some(format!(
                "Databases already exist in {}. Use `--force` to re-apply their schemas.",
                path.display()
            )),

            Self::SessionClose(errors) => {
                let mut hint = String::from("Cleanup failures:\n");
                for failure in errors.failures() {
                    hint.push_str(&format!(
                        "    {} {}: {}\n",
                        failure.domain, failure.step, failure.source
                    ));
                }
                hint.push_str("  Is the media center holding a write lock? Retry when it is idle.");
                Some(hint)
            }

            Self::Feed { line, .. } => Some(format!(
                "Line {line} is not a valid JSON object for this feed. \
                 Each line must hold exactly one record."
            )),

            Self::Database(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::InvalidArgument(_)
            | Self::Config(_)
            | Self::Other(_) => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn busy() -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            Some("database is locked".to_string()),
        )
    }

    #[test]
    fn test_close_errors_display_first_and_count() {
        let mut errors = CloseErrors::default();
        errors.push(StoreDomain::Mirror, CloseStep::Commit, busy());
        errors.push(StoreDomain::Textures, CloseStep::Close, busy());

        let message = Error::SessionClose(errors).to_string();
        assert!(message.contains("mirror commit failed"));
        assert!(message.contains("and 1 more"));
    }

    #[test]
    fn test_empty_close_errors_is_ok() {
        assert!(CloseErrors::default().into_result().is_ok());
    }

    #[test]
    fn test_structured_json_has_code_and_hint() {
        let json = Error::NotInitialized.to_structured_json();
        assert_eq!(json["error"]["code"], "NOT_INITIALIZED");
        assert_eq!(json["error"]["exit_code"], 2);
        assert!(json["error"]["hint"].is_string());
    }

    #[test]
    fn test_feed_error_code() {
        let err = Error::Feed {
            line: 3,
            message: "expected value".to_string(),
        };
        assert_eq!(err.error_code(), ErrorCode::InvalidFeed);
        assert_eq!(err.exit_code(), 4);
        assert!(!err.error_code().is_retryable());
    }
}
