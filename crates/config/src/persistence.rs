//! The config file on disk
//!
//! A write stages the new contents in a temporary file next to the target
//! and renames it into place. The file being replaced is copied to
//! `config.toml.backup` first.

use crate::error::describe;
use crate::{Config, ConfigError, ConfigResult, CONFIG_VERSION};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub(crate) struct ConfigFile {
    path: PathBuf,
}

impl ConfigFile {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn backup_path(&self) -> PathBuf {
        self.path.with_extension("toml.backup")
    }

    pub(crate) fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Parses the file, `None` when it has not been written yet
    ///
    /// Blank files count as corrupted rather than as defaults.
    pub(crate) fn read(&self) -> ConfigResult<Option<Config>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::info!("No config file at {}", self.path.display());
                return Ok(None);
            }
            Err(source) => return Err(self.read_error(source)),
        };

        if contents.trim().is_empty() {
            return Err(self.read_error(io::Error::new(
                io::ErrorKind::InvalidData,
                "config file is blank",
            )));
        }

        let config: Config = toml::from_str(&contents).map_err(|source| ConfigError::ParseError {
            path: self.path.clone(),
            source,
        })?;

        if config.version > CONFIG_VERSION {
            return Err(ConfigError::UnsupportedVersion {
                found: config.version,
                supported: CONFIG_VERSION,
            });
        }

        Ok(Some(config))
    }

    /// Replaces the file with `config`, refusing configs that fail validation
    pub(crate) fn write(&self, config: &Config) -> ConfigResult<()> {
        config
            .validate()
            .map_err(|errors| ConfigError::ValidationError(describe(&errors)))?;

        let dir = self
            .path
            .parent()
            .ok_or_else(|| ConfigError::PathResolutionError {
                reason: format!("{} has no parent directory", self.path.display()),
            })?;
        fs::create_dir_all(dir).map_err(|source| ConfigError::DirectoryCreationError {
            path: dir.to_path_buf(),
            source,
        })?;

        if self.exists() {
            fs::copy(&self.path, self.backup_path())
                .map_err(|source| ConfigError::BackupError { source })?;
        }

        let mut staged = NamedTempFile::new_in(dir)?;
        staged.write_all(config.to_toml()?.as_bytes())?;
        staged.flush()?;
        staged
            .persist(&self.path)
            .map_err(|e| ConfigError::WriteError {
                path: self.path.clone(),
                source: e.error,
            })?;

        log::info!("Config saved to {}", self.path.display());
        Ok(())
    }

    fn read_error(&self, source: io::Error) -> ConfigError {
        ConfigError::ReadError {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_file() -> (TempDir, ConfigFile) {
        let dir = TempDir::new().unwrap();
        let file = ConfigFile::new(dir.path().join("config.toml"));
        (dir, file)
    }

    #[test]
    fn test_missing_file_reads_as_none() {
        let (_dir, file) = config_file();
        assert!(file.read().unwrap().is_none());
        assert!(!file.exists());
    }

    #[test]
    fn test_write_then_read() {
        let (_dir, file) = config_file();
        let mut config = Config::default();
        config.player.default_volume = 0.85;

        file.write(&config).unwrap();
        assert_eq!(file.read().unwrap(), Some(config));
        assert!(!file.backup_path().exists());
    }

    #[test]
    fn test_write_creates_directory() {
        let dir = TempDir::new().unwrap();
        let file = ConfigFile::new(dir.path().join("nested").join("config.toml"));

        file.write(&Config::default()).unwrap();
        assert!(file.exists());
    }

    #[test]
    fn test_second_write_keeps_backup() {
        let (_dir, file) = config_file();
        let mut config = Config::default();
        file.write(&config).unwrap();

        config.catalog.start_collapsed = true;
        file.write(&config).unwrap();

        let backup: Config = toml::from_str(&fs::read_to_string(file.backup_path()).unwrap()).unwrap();
        assert!(!backup.catalog.start_collapsed);
    }

    #[test]
    fn test_invalid_config_is_not_written() {
        let (_dir, file) = config_file();
        let mut config = Config::default();
        config.player.default_volume = 1.5;

        assert!(matches!(
            file.write(&config),
            Err(ConfigError::ValidationError(_))
        ));
        assert!(!file.exists());
    }

    #[test]
    fn test_unparseable_and_blank_files() {
        let (_dir, file) = config_file();

        fs::write(file.path(), "this is not valid TOML {{{").unwrap();
        assert!(matches!(file.read(), Err(ConfigError::ParseError { .. })));

        fs::write(file.path(), "  \n").unwrap();
        assert!(matches!(file.read(), Err(ConfigError::ReadError { .. })));
    }

    #[test]
    fn test_newer_version_rejected() {
        let (_dir, file) = config_file();
        fs::write(file.path(), "version = 99\n").unwrap();

        assert!(matches!(
            file.read(),
            Err(ConfigError::UnsupportedVersion { found: 99, .. })
        ));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let (_dir, file) = config_file();
        fs::write(file.path(), "[catalog]\nstart_collapsed = true\n").unwrap();

        let config = file.read().unwrap().unwrap();
        assert!(config.catalog.start_collapsed);
        assert_eq!(config.player, crate::PlayerConfig::default());
    }
}
