//! Runtime configuration of the control client.
//!
//! The configuration is a small JSON document. Every field has a default so a
//! missing file, or a file naming only some fields, is valid.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use log::{error, info};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::iw_link::{MonitorFlag, DEFAULT_MSG_CAPACITY, NL80211_GENL_NAME};

/// Default name of the configuration file inside the project config dir.
pub const CONFIG_FILE_NAME: &str = "iw-monitor-ctl.json";

/// Settings shared by every operation of an [`crate::IwLink`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Root of the per-interface sysfs tree.
    pub sysfs_net_root: PathBuf,
    /// Generic netlink family to resolve.
    pub family_name: String,
    /// Attribute capacity of a single request, in bytes.
    pub max_message_size: usize,
    /// Upper bound of replies accepted for one dump. `None` waits forever.
    pub max_dump_messages: Option<usize>,
    /// Monitor flags applied by the `flags` command when none are given.
    pub monitor_flags: Vec<MonitorFlag>,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            sysfs_net_root: PathBuf::from("/sys/class/net"),
            family_name: NL80211_GENL_NAME.to_string(),
            max_message_size: DEFAULT_MSG_CAPACITY,
            max_dump_messages: None,
            monitor_flags: Vec::new(),
        }
    }
}

impl ControlConfig {
    /// Reads the configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the file cannot be read or is not valid JSON.
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| {
            error!("Failed to read config file {:?}: {}", path, e);
            Error::Config(format!("failed to read {}: {}", path.display(), e))
        })?;

        serde_json::from_str(&data).map_err(|e| {
            error!("Failed to parse config file {:?}: {}", path, e);
            Error::Config(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    /// Reads `path` if it exists, otherwise returns the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            info!("Loading configuration from {:?}", path);
            Self::from_file(path)
        } else {
            info!("No configuration at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// The per-user configuration file location, if a home dir is known.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("org", "iw-monitor", "iw-monitor-ctl")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ControlConfig::default();
        assert_eq!(config.family_name, "nl80211");
        assert_eq!(config.sysfs_net_root, PathBuf::from("/sys/class/net"));
        assert_eq!(config.max_dump_messages, None);
        assert_eq!(config.max_message_size, 4096);
        assert_eq!(config.max_message_size, DEFAULT_MSG_CAPACITY);
    }

    #[test]
    fn test_partial_file_keeps_defaults() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "max_dump_messages": 64, "monitor_flags": ["control", "otherbss"] }}"#
        )
        .unwrap();

        let config = ControlConfig::from_file(file.path())?;

        assert_eq!(config.max_dump_messages, Some(64));
        assert_eq!(
            config.monitor_flags,
            vec![MonitorFlag::Control, MonitorFlag::OtherBss]
        );
        assert_eq!(config.max_message_size, DEFAULT_MSG_CAPACITY);
        Ok(())
    }

    #[test]
    fn test_invalid_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        let err = ControlConfig::from_file(file.path()).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Config);
    }

    #[test]
    fn test_load_or_default_missing_file() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let config = ControlConfig::load_or_default(&dir.path().join("none.json"))?;
        assert_eq!(config, ControlConfig::default());
        Ok(())
    }
}
