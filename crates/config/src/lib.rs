//! Bookdeck configuration system
//!
//! Settings live in a single TOML file split into sections. Each section is a
//! type implementing `ConfigSection`, so it validates itself and can be merged
//! over another instance.
//!
//! A section holding an invalid value is replaced by its defaults when the
//! effective settings are loaded, so a bad file never stops the player.
//! Saving validates first and writes atomically. Missing files and missing
//! keys fall back to defaults.
//!
//! # Example
//!
//! ```rust
//! use bookdeck_config::{Config, ConfigManager};
//!
//! let dir = tempfile::tempdir().expect("temp dir");
//! let manager = ConfigManager::with_directory(dir.path().to_path_buf())
//!     .expect("Failed to initialize config");
//! let config = manager.load_or_default();
//!
//! assert_eq!(config, Config::default());
//! println!("Volume: {}", config.player.default_volume);
//! ```

mod error;
mod keys;
mod manager;
mod persistence;
mod validation;

// Config sections
pub mod app_config;
mod catalog_config;
mod player_config;

pub use error::{ConfigError, ConfigResult, ValidationError};
pub use keys::{env_var_name, ENV_PREFIX, KEYS};
pub use manager::ConfigManager;
pub use validation::{ConfigSection, Validator};

pub use app_config::{AppConfig, LogLevel};
pub use catalog_config::CatalogConfig;
pub use player_config::{PlayerConfig, DEFAULT_RATES};

use serde::{Deserialize, Serialize};

/// Current config file format version
pub const CONFIG_VERSION: u32 = 1;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Config file format version
    pub version: u32,

    /// Application-level settings
    pub app: AppConfig,

    /// Playback panel defaults
    pub player: PlayerConfig,

    /// Catalog panel and duration probing
    pub catalog: CatalogConfig,
}

impl Config {
    /// Creates a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates the entire configuration
    ///
    /// Returns all validation errors found across all sections.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(mut e) = self.app.validate() {
            errors.append(&mut e);
        }

        if let Err(mut e) = self.player.validate() {
            errors.append(&mut e);
        }

        if let Err(mut e) = self.catalog.validate() {
            errors.append(&mut e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Merges this config with another, preferring values from `other`
    ///
    /// Used for override chains: defaults < file < env vars < CLI args
    pub fn merge(&mut self, other: Config) {
        self.app.merge(other.app);
        self.player.merge(other.player);
        self.catalog.merge(other.catalog);
    }

    /// Replaces each section that fails validation with its defaults
    ///
    /// Returns the problems that caused a reset, empty when nothing changed.
    pub fn reset_invalid_sections(&mut self) -> Vec<ValidationError> {
        let mut problems = Vec::new();
        reset_if_invalid(&mut self.app, &mut problems);
        reset_if_invalid(&mut self.player, &mut problems);
        reset_if_invalid(&mut self.catalog, &mut problems);
        problems
    }

    /// Renders the config the way it is written to disk
    pub fn to_toml(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

fn reset_if_invalid<S: ConfigSection>(section: &mut S, problems: &mut Vec<ValidationError>) {
    if let Err(mut errors) = section.validate() {
        log::warn!(
            "Invalid [{}] settings, using defaults: {}",
            section.section_name(),
            error::describe(&errors)
        );
        problems.append(&mut errors);
        *section = S::default();
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            app: AppConfig::default(),
            player: PlayerConfig::default(),
            catalog: CatalogConfig::default(),
        }
    }
}
