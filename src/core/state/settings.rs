use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::assets::RESOURCES_URL;
use crate::core::downloader::RetryPolicy;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::APP_USER_AGENT;
use crate::core::version::manifest::VERSION_MANIFEST_URL;

pub const APP_DIR_NAME: &str = "BlockLaunch";
pub const SETTINGS_FILE: &str = "launcher_settings.json";
pub const HOME_ENV: &str = "BLOCKLAUNCH_HOME";

/// Persisted launcher settings. Missing fields take their defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LauncherSettings {
    pub catalog_url: String,
    pub asset_base_url: String,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub download_timeout_secs: u64,
    pub catalog_timeout_secs: u64,
    pub rate_limit_delay_ms: u64,
    /// Parallel asset object fetches. 1 keeps them sequential.
    pub asset_concurrency: usize,
    pub java_path: Option<PathBuf>,
    pub min_java_major: Option<u32>,
    pub user_agent: String,
}

impl Default for LauncherSettings {
    fn default() -> Self {
        Self {
            catalog_url: VERSION_MANIFEST_URL.to_string(),
            asset_base_url: RESOURCES_URL.to_string(),
            max_retries: 5,
            retry_delay_ms: 2000,
            download_timeout_secs: 60,
            catalog_timeout_secs: 10,
            rate_limit_delay_ms: 100,
            asset_concurrency: 1,
            java_path: None,
            min_java_major: None,
            user_agent: APP_USER_AGENT.to_string(),
        }
    }
}

impl LauncherSettings {
    /// Settings stored under `root`, or defaults when the file is absent or unreadable.
    pub fn load(root: &Path) -> Self {
        let path = root.join(SETTINGS_FILE);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(_) => {
                debug!("No settings at {:?}, using defaults", path);
                return Self::default();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Ignoring malformed settings {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    pub fn save(&self, root: &Path) -> LauncherResult<()> {
        std::fs::create_dir_all(root).map_err(|e| LauncherError::io(root, e))?;
        let path = root.join(SETTINGS_FILE);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json).map_err(|e| LauncherError::io(&path, e))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_retries.max(1),
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            timeout: Duration::from_secs(self.download_timeout_secs),
            rate_limit_delay: Duration::from_millis(self.rate_limit_delay_ms),
        }
    }

    pub fn catalog_timeout(&self) -> Duration {
        Duration::from_secs(self.catalog_timeout_secs)
    }
}

/// `--root`, then `BLOCKLAUNCH_HOME`, then `<data dir>/BlockLaunch`.
pub fn resolve_root(explicit: Option<PathBuf>) -> PathBuf {
    if let Some(root) = explicit {
        return root;
    }
    if let Some(home) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(home);
    }
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}
