use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::state::data::Coordinate;
use crate::state::library::Library;

/// User settings read from `config.toml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Catalog location; falls back to the per-user data directory
    pub database_path: Option<PathBuf>,
    /// Default `env_logger` filter, `RUST_LOG` still wins
    pub log_level: String,
    pub location: LocationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    /// Whether the app may use the device's location at all
    pub enabled: bool,
    /// Fixed on-device position for machines without a positioning sensor
    pub device_latitude: Option<f64>,
    pub device_longitude: Option<f64>,
    /// Bounded wait for the precise fix
    pub fix_timeout_ms: u64,
    /// Endpoint that maps the public egress address to a coordinate
    pub lookup_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: None,
            log_level: "info".to_string(),
            location: LocationConfig::default(),
        }
    }
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            device_latitude: None,
            device_longitude: None,
            fix_timeout_ms: 5000,
            lookup_url: "https://ipapi.co/json/".to_string(),
        }
    }
}

impl LocationConfig {
    pub fn fix_timeout(&self) -> Duration {
        Duration::from_millis(self.fix_timeout_ms)
    }

    /// The configured device position, only when both halves are present
    pub fn device_coordinate(&self) -> Option<Coordinate> {
        let coordinate = Coordinate::new(self.device_latitude?, self.device_longitude?);
        coordinate.is_valid().then_some(coordinate)
    }
}

impl Config {
    /// ~/.config/geo-gallery/config.toml on Linux
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("geo-gallery").join("config.toml"))
    }

    /// Read the config file; a missing file means defaults
    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let buf = fs::read_to_string(path)?;
        Ok(toml::from_str(&buf)?)
    }

    /// Load from the default location, logging and falling back to defaults on error
    pub fn load() -> Config {
        let Some(path) = Self::default_path() else {
            return Config::default();
        };
        Self::load_from(&path).unwrap_or_else(|e| {
            warn!("⚠️  Ignoring config at {}: {}", path.display(), e);
            Config::default()
        })
    }

    pub fn database_path(&self) -> Option<PathBuf> {
        self.database_path.clone().or_else(Library::default_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.location.fix_timeout(), Duration::from_millis(5000));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "log_level = \"debug\"\n[location]\ndevice_latitude = 48.85\ndevice_longitude = 2.35\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.log_level, "debug");
        assert!(config.location.enabled);
        assert_eq!(config.location.lookup_url, "https://ipapi.co/json/");
        assert_eq!(
            config.location.device_coordinate(),
            Some(Coordinate::new(48.85, 2.35))
        );
    }

    #[test]
    fn test_half_a_device_coordinate_is_ignored() {
        let location = LocationConfig {
            device_latitude: Some(10.0),
            ..Default::default()
        };
        assert_eq!(location.device_coordinate(), None);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "log_level = [").unwrap();
        assert!(matches!(Config::load_from(&path), Err(ConfigError::Toml(_))));
    }
}
