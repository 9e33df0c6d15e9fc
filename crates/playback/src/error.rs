// FILE: crates/playback/src/error.rs

use thiserror::Error;

/// Failures reported by a media transport
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("No source loaded")]
    NoSource,

    #[error("Source unavailable: {0}")]
    Unavailable(String),

    #[error("Playback blocked: {0}")]
    Blocked(String),

    #[error("Transport closed")]
    Closed,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlaybackError {
    #[error("Invalid volume: {0}")]
    InvalidVolume(f32),

    #[error("Invalid rate: {0}")]
    InvalidRate(f32),

    #[error("Rate cycle is empty")]
    EmptyRateCycle,

    #[error("Rate {0} does not follow a lower rate")]
    UnorderedRate(f32),

    #[error("Book {0} has no chapters")]
    EmptyBook(String),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

pub type PlaybackResult<T> = Result<T, PlaybackError>;
