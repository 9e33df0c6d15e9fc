//! Measured chapter durations
//!
//! A chapter is either unmeasured (absent), measured (positive seconds) or
//! unavailable (the zero sentinel left by a failed probe). Both measured and
//! unavailable entries are final.

use bookdeck_core::{format_time, Chapter, ChapterId};
use std::collections::HashMap;

/// Seconds cached for a chapter whose probe failed
pub const UNAVAILABLE: f64 = 0.0;

#[derive(Debug, Clone, Default)]
pub struct DurationCache {
    seconds: HashMap<ChapterId, f64>,
}

impl DurationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the chapter has a final entry and must not be probed
    pub fn contains(&self, chapter: &ChapterId) -> bool {
        self.seconds.contains_key(chapter)
    }

    /// Stores a successful measurement; non-positive values become the sentinel
    pub fn record(&mut self, chapter: ChapterId, seconds: f64) {
        let value = if seconds.is_finite() && seconds > 0.0 {
            seconds
        } else {
            UNAVAILABLE
        };
        self.seconds.insert(chapter, value);
    }

    /// Marks a chapter as unmeasurable
    pub fn record_failure(&mut self, chapter: ChapterId) {
        self.seconds.insert(chapter, UNAVAILABLE);
    }

    /// Returns the measured length, if a positive one is cached
    pub fn measured(&self, chapter: &ChapterId) -> Option<f64> {
        self.seconds
            .get(chapter)
            .copied()
            .filter(|seconds| *seconds > UNAVAILABLE)
    }

    /// Text shown next to a chapter: the measurement, else the static label
    pub fn display(&self, chapter: &Chapter) -> String {
        match self.measured(&chapter.id) {
            Some(seconds) => format_time(seconds),
            None => chapter.duration.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.seconds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seconds.is_empty()
    }
}
