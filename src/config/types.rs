use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::repository::DEFAULT_WELCOME_MESSAGE;

/// Root configuration container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    pub screens: ScreensConfig,
}

/// Where preferences (and persisted screen state) live.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Preferences file. Defaults to `<data dir>/espert/preferences.toml`.
    pub path: Option<PathBuf>,
}

impl StorageConfig {
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(|| {
            let data_dir = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
            data_dir.join("espert").join("preferences.toml")
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
    /// Log to this file instead of stderr. `ESPERT_LOG` overrides it.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreensConfig {
    /// Restore screen state from the preference store and write it back.
    pub persist_state: bool,
    /// Greeting served by the welcome screen's repository.
    pub welcome_message: String,
}

impl Default for ScreensConfig {
    fn default() -> Self {
        Self {
            persist_state: true,
            welcome_message: DEFAULT_WELCOME_MESSAGE.to_string(),
        }
    }
}
