//! Error types and recovery strategies for Bookdeck
//!
//! Errors carry a severity tier and a recovery action:
//! - **Recoverable**: the player handles it in place (failed start reverts to paused)
//! - **Degraded**: a refinement is lost but the player continues (duration probe failed)
//! - **Fatal**: the player cannot start (catalog missing or invalid)
//!
//! Nothing in the playback core is fatal; only loading the catalog can be.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Recovery actions that can be taken when an error occurs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Revert the playing flag to paused and keep going
    RevertToPaused,
    /// Keep the static fallback value and never retry
    UseFallback,
    /// Drop the request without changing state
    Ignore,
    /// No automatic recovery - user intervention required
    UserIntervention,
}

impl fmt::Display for RecoveryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RevertToPaused => write!(f, "Reverting to paused"),
            Self::UseFallback => write!(f, "Using fallback value"),
            Self::Ignore => write!(f, "Ignoring request"),
            Self::UserIntervention => write!(f, "User intervention required"),
        }
    }
}

/// Error severity classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Error is handled in place
    Recoverable,
    /// Feature degraded but player continues
    Degraded,
    /// Player cannot continue
    Fatal,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recoverable => write!(f, "Recoverable"),
            Self::Degraded => write!(f, "Degraded"),
            Self::Fatal => write!(f, "Fatal"),
        }
    }
}

/// Main error type for Bookdeck
#[derive(Error, Debug)]
pub enum AppError {
    // ===== Catalog Errors =====
    /// Catalog file could not be read
    #[error("Failed to read catalog at {path}: {source}")]
    CatalogRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Catalog file is not valid JSON for a list of books
    #[error("Failed to parse catalog at {path}: {source}")]
    CatalogParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Catalog content violates an invariant
    #[error("Invalid catalog: {}", errors.join("; "))]
    InvalidCatalog { errors: Vec<String> },

    // ===== Playback Errors =====
    /// The transport refused to start
    #[error("Playback failed for chapter {chapter}: {reason}")]
    PlaybackStart { chapter: String, reason: String },

    /// Chapter reference could not be resolved against its book
    #[error("Chapter {target} not found in book {book}")]
    ChapterNotFound { book: String, target: String },

    // ===== Metadata Errors =====
    /// Duration probe failed for an audio resource
    #[error("Metadata probe failed for {resource}: {reason}")]
    MetadataProbe { resource: String, reason: String },

    // ===== Generic Errors =====
    /// General I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl AppError {
    /// Returns the severity level of this error
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::PlaybackStart { .. } | Self::ChapterNotFound { .. } => {
                ErrorSeverity::Recoverable
            }

            Self::MetadataProbe { .. } => ErrorSeverity::Degraded,

            Self::CatalogRead { .. }
            | Self::CatalogParse { .. }
            | Self::InvalidCatalog { .. }
            | Self::Io(_) => ErrorSeverity::Fatal,
        }
    }

    /// Returns the recommended recovery action for this error
    pub fn recovery_action(&self) -> RecoveryAction {
        match self {
            Self::PlaybackStart { .. } => RecoveryAction::RevertToPaused,
            Self::MetadataProbe { .. } => RecoveryAction::UseFallback,
            Self::ChapterNotFound { .. } => RecoveryAction::Ignore,
            _ => RecoveryAction::UserIntervention,
        }
    }

    /// Returns a user-friendly error message suitable for display
    pub fn user_message(&self) -> String {
        match self {
            Self::CatalogRead { path, .. } => {
                format!("Cannot open the catalog file {}.", path.display())
            }
            Self::CatalogParse { .. } => "The catalog file is not in the expected format.".to_string(),
            Self::InvalidCatalog { errors } => {
                format!("The catalog has {} problem(s) and cannot be used.", errors.len())
            }
            Self::PlaybackStart { .. } => "This chapter could not be started.".to_string(),
            Self::ChapterNotFound { .. } => "That chapter is not part of this book.".to_string(),
            Self::MetadataProbe { .. } => "Chapter length could not be measured.".to_string(),
            Self::Io(_) => "A file operation failed. Please try again.".to_string(),
        }
    }

    /// Returns true if this error should stop the player
    pub fn is_critical(&self) -> bool {
        self.severity() == ErrorSeverity::Fatal
    }
}

/// Convenience type alias for Results using AppError
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recovery_action_display() {
        assert_eq!(RecoveryAction::RevertToPaused.to_string(), "Reverting to paused");
        assert_eq!(RecoveryAction::Ignore.to_string(), "Ignoring request");
    }

    #[test]
    fn test_error_severity_ordering() {
        assert!(ErrorSeverity::Recoverable < ErrorSeverity::Degraded);
        assert!(ErrorSeverity::Degraded < ErrorSeverity::Fatal);
    }

    #[test]
    fn test_playback_start_is_recoverable() {
        let err = AppError::PlaybackStart {
            chapter: "1-chapter-1".to_string(),
            reason: "blocked".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Recoverable);
        assert_eq!(err.recovery_action(), RecoveryAction::RevertToPaused);
        assert!(!err.is_critical());
    }

    #[test]
    fn test_probe_failure_uses_fallback() {
        let err = AppError::MetadataProbe {
            resource: "https://example.com/a.ogg".to_string(),
            reason: "timeout".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Degraded);
        assert_eq!(err.recovery_action(), RecoveryAction::UseFallback);
    }

    #[test]
    fn test_chapter_miss_is_ignored() {
        let err = AppError::ChapterNotFound {
            book: "5".to_string(),
            target: "#99".to_string(),
        };
        assert_eq!(err.recovery_action(), RecoveryAction::Ignore);
        assert_eq!(err.to_string(), "Chapter #99 not found in book 5");
    }

    #[test]
    fn test_catalog_errors_are_fatal() {
        let err = AppError::InvalidCatalog {
            errors: vec!["a".to_string(), "b".to_string()],
        };
        assert!(err.is_critical());
        assert_eq!(err.to_string(), "Invalid catalog: a; b");
        assert!(err.user_message().contains("2 problem"));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = io::Error::new(io::ErrorKind::Other, "boom");
        let err: AppError = io_err.into();
        assert!(matches!(err, AppError::Io(_)));
    }
}
