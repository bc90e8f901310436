use directories::BaseDirs;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::client::ApiClient;
use crate::api::retry::RetryPolicy;
use crate::error::{Error, Result};
use crate::session::FixedCredentials;
use crate::storage::{self, Storage};
use crate::utils::normalize_url;

pub const ENV_API_URL: &str = "LISTMAILER_API_URL";
pub const ENV_TIMEOUT: &str = "LISTMAILER_TIMEOUT_SECS";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub base_url: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    pub retry_max_delay_ms: u64,
    pub username: String,
    pub password: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:4000/api".into(),
            timeout_secs: 15,
            max_retries: 2,
            retry_base_delay_ms: 250,
            retry_max_delay_ms: 4000,
            username: "fullstack".into(),
            password: "fullstack".into(),
        }
    }
}

impl Settings {
    pub fn path() -> Option<PathBuf> {
        let base = BaseDirs::new()?;
        Some(base.config_dir().join("listmailer.toml"))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }

    /// Settings file if present, then environment overrides.
    pub fn load() -> Result<Self> {
        let mut settings = match Self::path() {
            Some(path) if path.exists() => {
                debug!("reading settings from {}", path.display());
                Self::from_toml(&fs::read_to_string(&path)?)?
            }
            _ => Self::default(),
        };
        settings.apply_overrides(
            std::env::var(ENV_API_URL).ok(),
            std::env::var(ENV_TIMEOUT).ok(),
        )?;
        Ok(settings)
    }

    pub fn apply_overrides(&mut self, api_url: Option<String>, timeout: Option<String>) -> Result<()> {
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            self.base_url = url;
        }
        if let Some(t) = timeout {
            self.timeout_secs = t
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("{ENV_TIMEOUT}: not a number: {t:?}")))?;
        }
        self.base_url = normalize_url(&self.base_url);
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::path().ok_or_else(|| Error::Config("no config dir".into()))?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let toml = toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        fs::write(path, toml)?;
        debug!("saved settings to {}", path.display());
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
            max_delay: Duration::from_millis(self.retry_max_delay_ms),
        }
    }

    pub fn api_client(&self) -> Result<ApiClient> {
        ApiClient::new(
            &self.base_url,
            Duration::from_secs(self.timeout_secs),
            self.retry_policy(),
        )
        .map_err(Error::Config)
    }

    /// Session backed by the default on-disk storage.
    pub fn session(&self) -> Result<FixedCredentials> {
        let path = storage::default_db_path().ok_or_else(|| Error::Config("no data dir".into()))?;
        let storage = Storage::open(&path)?;
        FixedCredentials::new(storage, self.username.clone(), self.password.clone())
    }
}
