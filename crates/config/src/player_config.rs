//! Player configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};

/// Playback rates the rate button cycles through
pub const DEFAULT_RATES: [f32; 5] = [0.75, 1.0, 1.25, 1.5, 2.0];

/// Playback panel defaults
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlayerConfig {
    /// Initial volume level (0.0 - 1.0)
    pub default_volume: f32,

    /// Initial playback rate, one of `rates`
    pub default_rate: f32,

    /// Rate cycle order (each 0.5 - 3.0, strictly increasing)
    pub rates: Vec<f32>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            default_volume: 0.7,
            default_rate: 1.0,
            rates: DEFAULT_RATES.to_vec(),
        }
    }
}

impl ConfigSection for PlayerConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut results = vec![
            Validator::in_range(self.default_volume, 0.0, 1.0, "player.default_volume"),
            Validator::strictly_increasing(&self.rates, "player.rates"),
        ];

        for rate in &self.rates {
            results.push(Validator::in_range(*rate, 0.5, 3.0, "player.rates"));
        }

        if !self.rates.is_empty() {
            results.push(Validator::one_of(
                &self.default_rate,
                &self.rates,
                "player.default_rate",
            ));
        }

        Validator::collect_errors(results)
    }

    fn merge(&mut self, other: Self) {
        self.default_volume = other.default_volume;
        self.default_rate = other.default_rate;
        self.rates = other.rates;
    }

    fn section_name(&self) -> &'static str {
        "player"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = PlayerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.rates, vec![0.75, 1.0, 1.25, 1.5, 2.0]);
    }

    #[test]
    fn test_invalid_volume() {
        let mut config = PlayerConfig::default();
        config.default_volume = 1.01;
        assert!(config.validate().is_err());

        config.default_volume = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_rate_must_be_in_cycle() {
        let mut config = PlayerConfig::default();
        config.default_rate = 1.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_rates() {
        let config = PlayerConfig {
            rates: Vec::new(),
            ..Default::default()
        };
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "player.rates");
    }

    #[test]
    fn test_rates_out_of_range_and_unsorted() {
        let config = PlayerConfig {
            rates: vec![1.0, 4.0, 2.0],
            ..Default::default()
        };

        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_merge() {
        let mut base = PlayerConfig::default();
        let other = PlayerConfig {
            default_volume: 0.25,
            default_rate: 1.5,
            rates: vec![1.0, 1.5],
        };

        base.merge(other);
        assert_eq!(base.default_volume, 0.25);
        assert_eq!(base.rates, vec![1.0, 1.5]);
    }
}
