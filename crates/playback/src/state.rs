//! Playback state management

use bookdeck_core::{format_time, Book, Chapter};
use std::sync::Arc;

/// Seek bar maximum used while the duration is still unknown
pub const UNKNOWN_DURATION_SEEK_MAX: f64 = 100.0;

/// Everything the playback panel owns, published as snapshots
///
/// `chapter` always belongs to `book`.
#[derive(Debug, Clone, PartialEq)]
pub struct NowPlaying {
    pub book: Arc<Book>,
    pub chapter: Chapter,
    pub playing: bool,
    /// Seconds into the chapter
    pub elapsed: f64,
    /// Seconds, 0 until the transport reports metadata
    pub duration: f64,
    /// Stored level, kept while muted
    pub volume: f32,
    pub muted: bool,
    pub rate: f32,
    pub immersive: bool,
}

impl NowPlaying {
    /// Paused state at the start of `chapter`
    pub fn new(book: Arc<Book>, chapter: Chapter, volume: f32, rate: f32) -> Self {
        Self {
            book,
            chapter,
            playing: false,
            elapsed: 0.0,
            duration: 0.0,
            volume,
            muted: false,
            rate,
            immersive: false,
        }
    }

    /// Level actually sent to the transport
    pub fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.volume
        }
    }

    pub fn chapter_number(&self) -> u32 {
        self.chapter.number
    }

    /// Chapter cover, falling back to the book cover
    pub fn cover(&self) -> &str {
        self.chapter.cover_or(&self.book)
    }

    pub fn has_duration(&self) -> bool {
        self.duration > 0.0
    }

    pub fn elapsed_label(&self) -> String {
        format_time(self.elapsed)
    }

    /// Duration for display, "Loading..." until metadata arrives
    pub fn duration_label(&self) -> String {
        if self.has_duration() {
            format_time(self.duration)
        } else {
            "Loading...".to_string()
        }
    }

    /// Upper bound of the seek bar
    pub fn seek_max(&self) -> f64 {
        if self.has_duration() {
            self.duration
        } else {
            UNKNOWN_DURATION_SEEK_MAX
        }
    }

    /// Clamps a seek target into the playable range
    ///
    /// Returns `None` for non-finite targets.
    pub fn clamp_seek(&self, seconds: f64) -> Option<f64> {
        if !seconds.is_finite() {
            return None;
        }

        let floor = seconds.max(0.0);
        if self.has_duration() {
            Some(floor.min(self.duration))
        } else {
            Some(floor)
        }
    }

    pub fn progress_percentage(&self) -> f32 {
        if !self.has_duration() {
            return 0.0;
        }
        ((self.elapsed / self.duration) * 100.0) as f32
    }
}
