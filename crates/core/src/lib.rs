//! Core types for Bookdeck: the catalog model, typed signals and errors

pub mod error;
pub mod signal;
pub mod types;

// Re-export commonly used types
pub use error::{AppError, ErrorSeverity, RecoveryAction, Result};
pub use signal::{
    log_diagnostics, ChapterSelection, Diagnostic, DiagnosticHook, Origin, Signal, SignalBus,
};
pub use types::{format_time, Book, BookId, Catalog, Chapter, ChapterId, Validator};
