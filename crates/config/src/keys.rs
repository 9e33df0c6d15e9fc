//! Dotted key access to single settings
//!
//! Keys are `section.field`, matching the TOML layout. The same keys drive
//! `bookdeck config set` and the `BOOKDECK_SECTION_FIELD` environment
//! overrides.

use crate::{Config, ConfigError, ConfigResult};
use std::str::FromStr;

/// Every key accepted by [`Config::set`]
pub const KEYS: [&str; 7] = [
    "app.log_level",
    "player.default_volume",
    "player.default_rate",
    "player.rates",
    "catalog.start_collapsed",
    "catalog.probe_timeout_ms",
    "catalog.max_concurrent_probes",
];

/// Prefix shared by all override variables
pub const ENV_PREFIX: &str = "BOOKDECK_";

/// Name of the environment variable that overrides `key`
pub fn env_var_name(key: &str) -> String {
    format!("{}{}", ENV_PREFIX, key.replace('.', "_").to_ascii_uppercase())
}

impl Config {
    /// Sets one value from its text form
    ///
    /// `player.rates` takes a comma-separated list. The result is not
    /// validated here.
    pub fn set(&mut self, key: &str, value: &str) -> ConfigResult<()> {
        match key {
            "app.log_level" => self.app.log_level = parse(key, value)?,
            "player.default_volume" => self.player.default_volume = parse(key, value)?,
            "player.default_rate" => self.player.default_rate = parse(key, value)?,
            "player.rates" => {
                self.player.rates = value
                    .split(',')
                    .map(|rate| parse(key, rate))
                    .collect::<ConfigResult<Vec<f32>>>()?;
            }
            "catalog.start_collapsed" => self.catalog.start_collapsed = parse(key, value)?,
            "catalog.probe_timeout_ms" => self.catalog.probe_timeout_ms = parse(key, value)?,
            "catalog.max_concurrent_probes" => {
                self.catalog.max_concurrent_probes = parse(key, value)?
            }
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    /// Returns one value in the form `set` accepts
    pub fn get(&self, key: &str) -> ConfigResult<String> {
        let value = match key {
            "app.log_level" => self.app.log_level.to_string(),
            "player.default_volume" => self.player.default_volume.to_string(),
            "player.default_rate" => self.player.default_rate.to_string(),
            "player.rates" => self
                .player
                .rates
                .iter()
                .map(f32::to_string)
                .collect::<Vec<_>>()
                .join(","),
            "catalog.start_collapsed" => self.catalog.start_collapsed.to_string(),
            "catalog.probe_timeout_ms" => self.catalog.probe_timeout_ms.to_string(),
            "catalog.max_concurrent_probes" => self.catalog.max_concurrent_probes.to_string(),
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        };
        Ok(value)
    }

    /// Applies every override `lookup` finds, keyed by variable name
    ///
    /// Values that do not parse are skipped with a warning.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for key in KEYS {
            let name = env_var_name(key);
            let Some(raw) = lookup(&name) else {
                continue;
            };

            match self.set(key, &raw) {
                Ok(()) => log::info!("Config override from {}", name),
                Err(e) => log::warn!("Ignoring {}: {}", name, e),
            }
        }
    }
}

fn parse<T: FromStr>(key: &str, value: &str) -> ConfigResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        })
}
