//! Playback rate cycle

use crate::error::{PlaybackError, PlaybackResult};
use bookdeck_config::DEFAULT_RATES;

/// Ordered set of rates the rate button steps through
#[derive(Debug, Clone, PartialEq)]
pub struct RateCycle {
    rates: Vec<f32>,
}

impl RateCycle {
    pub const MIN: f32 = 0.5;
    pub const MAX: f32 = 3.0;

    /// Creates a cycle of strictly increasing rates within MIN..=MAX
    pub fn new(rates: Vec<f32>) -> PlaybackResult<Self> {
        if rates.is_empty() {
            return Err(PlaybackError::EmptyRateCycle);
        }

        if let Some(bad) = rates
            .iter()
            .copied()
            .find(|r| !r.is_finite() || *r < Self::MIN || *r > Self::MAX)
        {
            return Err(PlaybackError::InvalidRate(bad));
        }

        if let Some(pair) = rates.windows(2).find(|pair| pair[1] <= pair[0]) {
            return Err(PlaybackError::UnorderedRate(pair[1]));
        }

        Ok(Self { rates })
    }

    /// Returns the rate that follows `current`
    ///
    /// Wraps from the last rate to the first. A rate that is not part of the
    /// cycle steps to the first rate.
    pub fn next_after(&self, current: f32) -> f32 {
        match self.position(current) {
            Some(index) => self.rates[(index + 1) % self.rates.len()],
            None => self.rates[0],
        }
    }

    /// Returns true if `rate` is one of the cycle's rates
    pub fn contains(&self, rate: f32) -> bool {
        self.position(rate).is_some()
    }

    pub fn first(&self) -> f32 {
        self.rates[0]
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    fn position(&self, rate: f32) -> Option<usize> {
        self.rates
            .iter()
            .position(|r| (r - rate).abs() < f32::EPSILON)
    }
}

impl Default for RateCycle {
    fn default() -> Self {
        Self {
            rates: DEFAULT_RATES.to_vec(),
        }
    }
}

/// Formats a rate for display, e.g. "1.25x"
pub fn format_rate(rate: f32) -> String {
    format!("{}x", rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cycle_order() {
        let cycle = RateCycle::default();
        assert_eq!(cycle.next_after(0.75), 1.0);
        assert_eq!(cycle.next_after(1.0), 1.25);
        assert_eq!(cycle.next_after(1.25), 1.5);
        assert_eq!(cycle.next_after(1.5), 2.0);
        assert_eq!(cycle.next_after(2.0), 0.75);
    }

    #[test]
    fn test_full_cycle_returns_to_start() {
        let cycle = RateCycle::default();
        let mut rate = 1.25;
        for _ in 0..cycle.len() {
            rate = cycle.next_after(rate);
        }
        assert_eq!(rate, 1.25);
    }

    #[test]
    fn test_unknown_rate_steps_to_first() {
        let cycle = RateCycle::default();
        assert!(!cycle.contains(1.1));
        assert_eq!(cycle.next_after(1.1), 0.75);
    }

    #[test]
    fn test_new_rejects_invalid() {
        assert_eq!(RateCycle::new(Vec::new()), Err(PlaybackError::EmptyRateCycle));
        assert_eq!(
            RateCycle::new(vec![1.0, 5.0]),
            Err(PlaybackError::InvalidRate(5.0))
        );
        assert!(RateCycle::new(vec![f32::NAN]).is_err());
    }

    #[test]
    fn test_new_rejects_unsorted_and_duplicate_rates() {
        assert_eq!(
            RateCycle::new(vec![1.0, 2.0, 1.5]),
            Err(PlaybackError::UnorderedRate(1.5))
        );
        assert_eq!(
            RateCycle::new(vec![1.0, 1.25, 1.25]),
            Err(PlaybackError::UnorderedRate(1.25))
        );
        assert!(RateCycle::new(vec![0.75, 1.0, 2.0]).is_ok());
    }

    #[test]
    fn test_single_rate_cycle() {
        let cycle = RateCycle::new(vec![1.0]).unwrap();
        assert_eq!(cycle.next_after(1.0), 1.0);
        assert_eq!(cycle.first(), 1.0);
    }

    #[test]
    fn test_format_rate() {
        assert_eq!(format_rate(1.0), "1x");
        assert_eq!(format_rate(1.25), "1.25x");
    }
}
