//! Entry point for reading and changing settings

use crate::persistence::ConfigFile;
use crate::{Config, ConfigError, ConfigResult, ValidationError};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Owns the config file of one directory
///
/// [`load`](Self::load) returns the file as written. The player runs with
/// [`load_effective`](Self::load_effective), which layers environment
/// overrides on top and resets invalid sections to their defaults.
pub struct ConfigManager {
    dir: PathBuf,
    file: ConfigFile,
}

impl ConfigManager {
    /// Uses the platform config directory, e.g. `~/.config/bookdeck/` on Linux
    pub fn new() -> ConfigResult<Self> {
        let dirs = ProjectDirs::from("", "", "bookdeck").ok_or_else(|| {
            ConfigError::PathResolutionError {
                reason: "no home directory for this user".to_string(),
            }
        })?;
        Self::with_directory(dirs.config_dir().to_path_buf())
    }

    pub fn with_directory(dir: PathBuf) -> ConfigResult<Self> {
        let file = ConfigFile::new(dir.join("config.toml"));
        Ok(Self { dir, file })
    }

    pub fn config_dir(&self) -> &Path {
        &self.dir
    }

    pub fn config_path(&self) -> &Path {
        self.file.path()
    }

    /// Where the previous file is kept after a save
    pub fn backup_path(&self) -> PathBuf {
        self.file.backup_path()
    }

    /// The file as written; defaults when there is no file yet
    pub fn load(&self) -> ConfigResult<Config> {
        Ok(self.file.read()?.unwrap_or_default())
    }

    /// Settings to run with: the file, then `BOOKDECK_*` variables
    pub fn load_effective(&self) -> ConfigResult<Config> {
        self.load_with_overrides(|name| std::env::var(name).ok())
    }

    /// Like [`load_effective`](Self::load_effective) with overrides from `lookup`
    pub fn load_with_overrides<F>(&self, lookup: F) -> ConfigResult<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = self.load()?;
        config.apply_overrides(lookup);
        config.reset_invalid_sections();
        Ok(config)
    }

    /// Effective settings, or defaults when the file cannot be read
    pub fn load_or_default(&self) -> Config {
        self.load_effective().unwrap_or_else(|e| {
            log::warn!("{}, using default settings", e);
            Config::default()
        })
    }

    pub fn save(&self, config: &Config) -> ConfigResult<()> {
        self.file.write(config)
    }

    /// Writes a default file unless one exists; returns whether it wrote
    pub fn initialize(&self) -> ConfigResult<bool> {
        if self.file.exists() {
            return Ok(false);
        }
        self.save(&Config::default())?;
        Ok(true)
    }

    pub fn reset(&self) -> ConfigResult<()> {
        self.save(&Config::default())
    }

    /// Changes one key in the file
    ///
    /// The file is left untouched when the new value does not parse or makes
    /// the config invalid.
    pub fn set(&self, key: &str, value: &str) -> ConfigResult<Config> {
        let mut config = self.load()?;
        config.set(key, value)?;
        self.save(&config)?;
        Ok(config)
    }

    /// Validation problems in the file as written
    pub fn problems(&self) -> ConfigResult<Vec<ValidationError>> {
        Ok(self.load()?.validate().err().unwrap_or_default())
    }
}
