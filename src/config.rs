//! Configuration for the notes core.
//!
//! This module handles where the durable database and the legacy blob live
//! on disk. Configuration is persisted as a JSON file inside the data
//! directory so hosts can override the file names without recompiling.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{NotesError, NotesResult};

/// Name of the configuration file inside the data directory
const CONFIG_FILE: &str = "config.json";

fn default_database_file() -> String {
    "offline-notes.db".to_string()
}

fn default_legacy_file() -> String {
    "notes.json".to_string()
}

/// Serializable configuration data
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigData {
    /// File name of the SQLite database inside the data directory
    #[serde(default = "default_database_file")]
    database_file: String,
    /// File name of the legacy single-blob store inside the data directory
    #[serde(default = "default_legacy_file")]
    legacy_file: String,
}

impl Default for ConfigData {
    fn default() -> Self {
        Self {
            database_file: default_database_file(),
            legacy_file: default_legacy_file(),
        }
    }
}

/// Store configuration: a data directory plus file naming.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    data_dir: PathBuf,
    data: ConfigData,
}

impl StoreConfig {
    /// Create a configuration with default file names under `data_dir`.
    ///
    /// Does not touch the filesystem; use [`StoreConfig::load`] to read a
    /// persisted configuration.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            data: ConfigData::default(),
        }
    }

    /// Load configuration from `data_dir`, creating the directory and a
    /// default config file when absent.
    pub fn load(data_dir: impl Into<PathBuf>) -> NotesResult<Self> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir)
            .map_err(|e| NotesError::unavailable(format!("cannot create data dir: {}", e)))?;

        let config_file = data_dir.join(CONFIG_FILE);
        let data = if config_file.exists() {
            let content = fs::read_to_string(&config_file)
                .map_err(|e| NotesError::unavailable(format!("cannot read config: {}", e)))?;
            serde_json::from_str(&content)
                .map_err(|e| NotesError::unavailable(format!("invalid config: {}", e)))?
        } else {
            ConfigData::default()
        };

        let config = Self { data_dir, data };
        if !config_file.exists() {
            config.save()?;
        }
        Ok(config)
    }

    /// Save configuration to the config file
    pub fn save(&self) -> NotesResult<()> {
        let content = serde_json::to_string_pretty(&self.data)
            .map_err(|e| NotesError::unavailable(format!("cannot encode config: {}", e)))?;
        fs::write(self.data_dir.join(CONFIG_FILE), content)
            .map_err(|e| NotesError::unavailable(format!("cannot write config: {}", e)))?;
        Ok(())
    }

    /// The data directory
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Full path of the SQLite database file
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.data.database_file)
    }

    /// Full path of the legacy blob file
    pub fn legacy_path(&self) -> PathBuf {
        self.data_dir.join(&self.data.legacy_file)
    }
}
