use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{
    DEFAULT_ATTACHMENT_FIELD, DEFAULT_DATA_DIR, EMPLOYEE_NODE_TYPE, PERSONIO_BASE_URL,
};
use crate::error::{Result, SourceError};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub storage: StorageConfig,
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            base_url: PERSONIO_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Node type tag given to every employee node
    pub node_type: String,
    /// Cleaned field name that carries the attachment URL
    pub attachment_field: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            node_type: EMPLOYEE_NODE_TYPE.to_string(),
            attachment_field: DEFAULT_ATTACHMENT_FIELD.to_string(),
        }
    }
}

/// API client credentials; only constructed when both halves are present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl ApiConfig {
    pub fn credentials(&self) -> Option<Credentials> {
        let client_id = self.client_id.as_deref().filter(|s| !s.trim().is_empty())?;
        let client_secret = self
            .client_secret
            .as_deref()
            .filter(|s| !s.trim().is_empty())?;
        Some(Credentials {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
        })
    }
}

impl Config {
    /// Load from a TOML file (missing file means defaults), then apply
    /// `PERSONIO_*` environment overrides. A `.env` file is honoured.
    pub fn load(path: &Path) -> Result<Self> {
        let _ = dotenv::dotenv();

        let mut config = if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| {
                SourceError::Config(format!(
                    "Failed to read config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
            Self::from_toml_str(&content)?
        } else {
            Config::default()
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("PERSONIO_CLIENT_ID") {
            self.api.client_id = Some(v);
        }
        if let Some(v) = lookup("PERSONIO_CLIENT_SECRET") {
            self.api.client_secret = Some(v);
        }
        if let Some(v) = lookup("PERSONIO_BASE_URL") {
            self.api.base_url = v;
        }
        if let Some(v) = lookup("PERSONIO_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(v);
        }
    }
}
