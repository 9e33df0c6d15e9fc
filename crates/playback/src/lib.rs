//! Playback panel for Bookdeck
//!
//! The panel owns one [`Transport`] and the authoritative [`NowPlaying`]
//! state. It reacts to selection signals, drives the transport, and
//! announces its own chapter changes on the signal bus.

mod clock;
mod error;
mod panel;
mod rate;
mod state;
mod transport;

pub use clock::{ClockTransport, BLOCKED_PREFIX, DEFAULT_TICK};
pub use error::{PlaybackError, PlaybackResult, TransportError};
pub use panel::{PlaybackPanel, StartOutcome, StartReceiver};
pub use rate::{format_rate, RateCycle};
pub use state::{NowPlaying, UNKNOWN_DURATION_SEEK_MAX};
pub use transport::{
    report_channel, LoadId, ReportReceiver, ReportSender, Transport, TransportEvent,
    TransportReport,
};
