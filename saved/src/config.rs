use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::{fs, time::Duration};
use thiserror::Error;
use tracing::{info, warn};

// path to config file name.
const SETTINGS_PATH: &str = "JobBoard/";
const SETTINGS_FILE_NAME: &str = "SavedJobs.json";
const DATA_DIR: &str = "JobBoard";

pub const DEFAULT_STORAGE_KEY: &str = "savedJobs";

pub const ENV_STORAGE_KEY: &str = "JOBBOARD_STORAGE_KEY";
pub const ENV_DATA_DIR: &str = "JOBBOARD_DATA_DIR";
pub const ENV_WATCH_INTERVAL_MS: &str = "JOBBOARD_WATCH_INTERVAL_MS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unable to locate the config directory for this platform")]
    NoConfigDir,
    #[error("IO Error: {0}")]
    Io(String),
    #[error("Unable to parse config: {0}")]
    Parse(String),
    #[error("Invalid value for {name}: {value}")]
    InvalidOverride { name: &'static str, value: String },
    #[error("storage_key must not be empty")]
    EmptyStorageKey,
}

/// Settings for the saved items store. Lives next to the rest of the app config as json.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// The single storage key holding the saved collection.
    pub storage_key: String,
    /// Where file backed storage keeps its data.
    pub data_dir: PathBuf,
    /// How often the file watcher looks for changes from other processes.
    pub watch_interval_ms: u64,
    /// Buffered change events per session before it has to resync.
    pub bus_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        // no data dir on some platforms (and in some containers), fall back to temp.
        let data_dir = dirs::data_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(DATA_DIR);
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_owned(),
            data_dir,
            watch_interval_ms: 500,
            bus_capacity: 64,
        }
    }
}

impl StoreConfig {
    /// `<config dir>/JobBoard/SavedJobs.json`
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let path = dirs::config_dir()
            .ok_or(ConfigError::NoConfigDir)?
            .join(SETTINGS_PATH);
        Ok(path.join(SETTINGS_FILE_NAME))
    }

    /// Save the configuration, creating the parent directory if needed.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io(e.to_string()))?;
        }
        let data =
            serde_json::to_string_pretty(&self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        fs::write(path, data).map_err(|e| ConfigError::Io(e.to_string()))
    }

    /// Load the configuration from `path`. A missing or broken file gives the defaults,
    /// which are then written back so the user has something to edit.
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(data) => match serde_json::from_str(&data) {
                Ok(config) => return config,
                Err(e) => warn!("Fail to parse {path:?}, using defaults: {e}"),
            },
            Err(_) => info!("No config at {path:?}, creating a new default one"),
        }
        let config = Self::default();
        if let Err(e) = config.save_to(path) {
            warn!("Unable to save default config: {e}");
        }
        config
    }

    /// Load from the default location, or fall back to defaults when there's no config dir.
    pub fn load() -> Self {
        match Self::default_path() {
            Ok(path) => Self::load_from(&path),
            Err(e) => {
                warn!("{e}, using defaults");
                Self::default()
            }
        }
    }

    /// Apply overrides from the environment (including anything dotenv loaded).
    pub fn with_env(self) -> Result<Self, ConfigError> {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(key) = lookup(ENV_STORAGE_KEY) {
            if key.trim().is_empty() {
                return Err(ConfigError::InvalidOverride {
                    name: ENV_STORAGE_KEY,
                    value: key,
                });
            }
            self.storage_key = key;
        }
        if let Some(dir) = lookup(ENV_DATA_DIR) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(ms) = lookup(ENV_WATCH_INTERVAL_MS) {
            self.watch_interval_ms = match ms.parse::<u64>() {
                Ok(ms) if ms > 0 => ms,
                _ => {
                    return Err(ConfigError::InvalidOverride {
                        name: ENV_WATCH_INTERVAL_MS,
                        value: ms,
                    })
                }
            };
        }
        self.validate()?;
        Ok(self)
    }

    /// Catch values a hand edited config file can get wrong.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage_key.trim().is_empty() {
            return Err(ConfigError::EmptyStorageKey);
        }
        Ok(())
    }

    pub fn watch_interval(&self) -> Duration {
        Duration::from_millis(self.watch_interval_ms.max(1))
    }
}
