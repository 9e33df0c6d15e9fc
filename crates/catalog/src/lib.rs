//! Catalog panel for Bookdeck
//!
//! Presents the chapters of the highlighted book, announces selections on
//! the signal bus and measures real chapter lengths with a [`DurationProbe`].

mod durations;
mod error;
mod panel;
mod probe;
mod remote;

pub use durations::{DurationCache, UNAVAILABLE};
pub use error::{CatalogError, CatalogResult, ProbeError};
pub use panel::{CatalogPanel, ProbeOutcome, ProbeReceiver};
pub use probe::{DurationProbe, SymphoniaProbe};
pub use remote::WINDOW_BYTES;
