//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the Firebase web app config, the backend origin, and the
//! last email used to sign in.
//!
//! Configuration is stored at `~/.config/caplab/config.json`. Environment
//! variables override the file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::identity::{Endpoints, FirebaseConfig};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "caplab";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Backend origin used when none is configured
const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

pub const ENV_API_KEY: &str = "CAPLAB_API_KEY";
pub const ENV_BACKEND_URL: &str = "CAPLAB_BACKEND_URL";
pub const ENV_AUTH_EMULATOR_HOST: &str = "FIREBASE_AUTH_EMULATOR_HOST";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub firebase: FirebaseConfig,
    pub backend_url: String,
    pub auth_emulator_host: Option<String>,
    pub last_email: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            firebase: FirebaseConfig {
                api_key: String::new(),
                auth_domain: "caplab-81737.firebaseapp.com".to_string(),
                project_id: "caplab-81737".to_string(),
                storage_bucket: "caplab-81737.appspot.com".to_string(),
                messaging_sender_id: "533257203237".to_string(),
                app_id: "1:533257203237:web:b5b1079750e5aa5ce759cc".to_string(),
            },
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            auth_emulator_host: None,
            last_email: None,
        }
    }
}

impl Config {
    /// Load from the default location, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            let config = serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?;
            debug!(path = %path.display(), "Config loaded");
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// production). Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get(ENV_API_KEY) {
            self.firebase.api_key = key;
        }
        if let Some(url) = get(ENV_BACKEND_URL) {
            self.backend_url = url;
        }
        if let Some(host) = get(ENV_AUTH_EMULATOR_HOST) {
            self.auth_emulator_host = Some(host);
        }
    }

    /// Identity provider endpoints, routed to the emulator when one is set.
    pub fn endpoints(&self) -> Endpoints {
        match self.auth_emulator_host.as_deref() {
            Some(host) => Endpoints::emulator(host),
            None => Endpoints::production(),
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}
