//! The media element seam
//!
//! A transport plays one chapter at a time. Everything it observes while
//! playing comes back as a `TransportReport` on the channel it was built
//! with, tagged with the `LoadId` of the `load` call that produced it.

use crate::error::TransportError;
use bookdeck_core::Chapter;
use futures::future::BoxFuture;
use std::fmt;
use tokio::sync::mpsc;

/// Identifies one `load` of a transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct LoadId(u64);

impl LoadId {
    /// Returns the id that follows this one
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for LoadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "load#{}", self.0)
    }
}

/// Something the transport observed
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// Current position in seconds
    TimeUpdate(f64),
    /// Length of the loaded media in seconds, possibly non-finite
    MetadataLoaded { duration: f64 },
    /// Playback reached the end of the media
    Ended,
    /// The media failed after loading
    Error(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransportReport {
    pub load: LoadId,
    pub event: TransportEvent,
}

impl TransportReport {
    pub fn new(load: LoadId, event: TransportEvent) -> Self {
        Self { load, event }
    }
}

pub type ReportSender = mpsc::UnboundedSender<TransportReport>;
pub type ReportReceiver = mpsc::UnboundedReceiver<TransportReport>;

/// Creates the channel a transport reports into
pub fn report_channel() -> (ReportSender, ReportReceiver) {
    mpsc::unbounded_channel()
}

/// A single media element
pub trait Transport: Send {
    /// Replaces the current media with `chapter`'s audio, paused at 0
    fn load(&mut self, chapter: &Chapter, load: LoadId);

    /// Starts playing the loaded media
    ///
    /// The returned future resolves once playback has actually started, or
    /// with the reason it could not.
    fn start(&mut self) -> BoxFuture<'static, Result<(), TransportError>>;

    fn pause(&mut self);

    fn seek(&mut self, seconds: f64);

    /// Sets the output level, 0.0 to 1.0
    fn set_volume(&mut self, level: f32);

    fn set_rate(&mut self, rate: f32);
}
