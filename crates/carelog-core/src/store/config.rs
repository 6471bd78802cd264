//! TOML-based application configuration.
//!
//! Stores facility-level settings:
//! - Facility name and tenant id
//! - Notification preferences (enable flag, poll cadence)
//!
//! Configuration is stored at `~/.config/carelog/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

use super::data_dir;

/// Facility identification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacilityConfig {
    #[serde(default = "default_facility_name")]
    pub name: String,
    #[serde(default = "default_tenant_id")]
    pub tenant_id: String,
}

/// Notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Seconds between reminder ticks in `notify watch`.
    #[serde(default = "default_poll_cadence_secs")]
    pub poll_cadence_secs: u64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/carelog/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub facility: FacilityConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

fn default_facility_name() -> String {
    "Main Facility".to_string()
}
fn default_tenant_id() -> String {
    "tenant-demo".to_string()
}
fn default_true() -> bool {
    true
}
fn default_poll_cadence_secs() -> u64 {
    60
}

impl Default for FacilityConfig {
    fn default() -> Self {
        Self {
            name: default_facility_name(),
            tenant_id: default_tenant_id(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_cadence_secs: default_poll_cadence_secs(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            facility: FacilityConfig::default(),
            notifications: NotificationsConfig::default(),
        }
    }
}

impl Config {
    fn config_path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("~/.config/carelog"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load the configuration, falling back to defaults when the file does
    /// not exist yet.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load from an explicit path (used by tests).
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        toml::from_str(&text).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Save the configuration.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path()?)
    }

    /// Save to an explicit path (used by tests).
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let text = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        std::fs::write(path, text).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Read a value by dotted key, e.g. `facility.name`.
    pub fn get_value(&self, key: &str) -> Result<String, ConfigError> {
        match key {
            "facility.name" => Ok(self.facility.name.clone()),
            "facility.tenant_id" => Ok(self.facility.tenant_id.clone()),
            "notifications.enabled" => Ok(self.notifications.enabled.to_string()),
            "notifications.poll_cadence_secs" => {
                Ok(self.notifications.poll_cadence_secs.to_string())
            }
            _ => Err(ConfigError::UnknownKey(key.to_string())),
        }
    }

    /// Set a value by dotted key.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: &str| ConfigError::InvalidValue {
            key: key.to_string(),
            message: message.to_string(),
        };
        match key {
            "facility.name" => self.facility.name = value.to_string(),
            "facility.tenant_id" => self.facility.tenant_id = value.to_string(),
            "notifications.enabled" => {
                self.notifications.enabled =
                    value.parse().map_err(|_| invalid("expected true or false"))?;
            }
            "notifications.poll_cadence_secs" => {
                let secs: u64 = value
                    .parse()
                    .map_err(|_| invalid("expected a positive integer"))?;
                if secs == 0 {
                    return Err(invalid("cadence must be at least 1 second"));
                }
                self.notifications.poll_cadence_secs = secs;
            }
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply() {
        let cfg = Config::default();
        assert_eq!(cfg.facility.name, "Main Facility");
        assert!(cfg.notifications.enabled);
        assert_eq!(cfg.notifications.poll_cadence_secs, 60);
    }

    #[test]
    fn roundtrip_via_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut cfg = Config::default();
        cfg.set_value("facility.name", "North Wing").unwrap();
        cfg.set_value("notifications.poll_cadence_secs", "30").unwrap();
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.facility.name, "North Wing");
        assert_eq!(loaded.notifications.poll_cadence_secs, 30);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(cfg.facility.tenant_id, "tenant-demo");
    }

    #[test]
    fn unknown_key_is_rejected() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set_value("facility.timezone", "UTC").unwrap_err(),
            ConfigError::UnknownKey(_)
        ));
        assert!(matches!(
            cfg.get_value("nope").unwrap_err(),
            ConfigError::UnknownKey(_)
        ));
    }

    #[test]
    fn zero_cadence_is_rejected() {
        let mut cfg = Config::default();
        assert!(cfg
            .set_value("notifications.poll_cadence_secs", "0")
            .is_err());
    }
}
