// crates/catalog/src/error.rs
//! Error types for the catalog panel and duration probing

use bookdeck_resilience::ResilienceError;
use thiserror::Error;

/// Result type for catalog panel operations
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors raised by catalog panel operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CatalogError {
    /// The catalog has no books to highlight
    #[error("Catalog is empty")]
    EmptyCatalog,

    /// A book id that is not in the catalog
    #[error("Book not found: {0}")]
    BookNotFound(String),

    /// A book without chapters cannot be highlighted
    #[error("Book {0} has no chapters")]
    EmptyBook(String),

    /// A chapter id that is not in the highlighted book
    #[error("Chapter {chapter} not found in book {book}")]
    ChapterNotFound { book: String, chapter: String },

    /// The probe concurrency limit must allow at least one probe
    #[error("Invalid probe concurrency: {0}")]
    InvalidConcurrency(usize),
}

/// Reasons a duration probe did not produce a usable length
#[derive(Error, Debug)]
pub enum ProbeError {
    /// The resource could not be read from disk
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The resource could not be fetched over HTTP
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("HTTP {0}")]
    Status(u16),

    /// The locator scheme is not one the probe can read
    #[error("Unsupported source: {0}")]
    UnsupportedSource(String),

    /// The container or codec could not be probed
    #[error("Decode failed: {0}")]
    Decode(String),

    /// The media has no default track
    #[error("No audio track found")]
    NoTrack,

    /// The media does not declare its length
    #[error("Unknown length")]
    UnknownLength,

    /// The measured length is zero, negative or not finite
    #[error("Unusable length: {0}")]
    InvalidLength(f64),

    /// The probe did not finish in time
    #[error("Probe timed out: {0}")]
    Timeout(#[from] ResilienceError),

    /// The blocking probe task panicked or was cancelled
    #[error("Probe task failed: {0}")]
    Task(String),
}

impl ProbeError {
    /// Checks a measured length, rejecting values that cannot be displayed
    pub fn check_length(seconds: f64) -> Result<f64, ProbeError> {
        if seconds.is_finite() && seconds > 0.0 {
            Ok(seconds)
        } else {
            Err(ProbeError::InvalidLength(seconds))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_catalog_error_display() {
        let err = CatalogError::ChapterNotFound {
            book: "2".to_string(),
            chapter: "9-chapter-1".to_string(),
        };
        assert_eq!(err.to_string(), "Chapter 9-chapter-1 not found in book 2");
        assert_eq!(CatalogError::BookNotFound("7".to_string()).to_string(), "Book not found: 7");
    }

    #[test]
    fn test_check_length() {
        assert_eq!(ProbeError::check_length(12.5).unwrap(), 12.5);
        assert!(matches!(
            ProbeError::check_length(0.0),
            Err(ProbeError::InvalidLength(_))
        ));
        assert!(ProbeError::check_length(f64::INFINITY).is_err());
        assert!(ProbeError::check_length(f64::NAN).is_err());
    }

    #[test]
    fn test_timeout_conversion() {
        let err: ProbeError = ResilienceError::Timeout(Duration::from_millis(100)).into();
        assert!(err.to_string().contains("timed out"));
    }
}
