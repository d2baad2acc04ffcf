use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

pub(crate) const CONFIG_FILE_NAME: &str = "xcel_config.json";
pub(crate) const DEFAULT_BASE_URL: &str = "https://haptic-xcel.onrender.com";
pub(crate) const BASE_URL_ENV: &str = "XCEL_BASE_URL";

pub(crate) const DEFAULT_POOLING_WINDOW_MS: u64 = 5_000;
pub(crate) const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
pub(crate) const DEFAULT_RUNTIME_SESSION_REFRESH_OFFSET_MS: u64 = 60_000;

/// On-disk overrides in `<data_dir>/xcel_config.json`. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: Option<String>,
    pub pooling_window_ms: Option<u64>,
    pub request_timeout_ms: Option<u64>,
    pub runtime_session_refresh_offset_ms: Option<u64>,
    pub disable_network: Option<bool>,
}

impl AppConfig {
    pub fn base_url(&self) -> String {
        if let Some(url) = &self.base_url {
            let url = url.trim();
            if !url.is_empty() {
                return url.trim_end_matches('/').to_string();
            }
        }
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            let url = url.trim();
            if !url.is_empty() {
                return url.trim_end_matches('/').to_string();
            }
        }
        DEFAULT_BASE_URL.to_string()
    }

    pub fn pooling_window_ms(&self) -> u64 {
        self.pooling_window_ms.unwrap_or(DEFAULT_POOLING_WINDOW_MS)
    }

    pub fn request_timeout_ms(&self) -> u64 {
        self.request_timeout_ms
            .filter(|ms| *ms > 0)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS)
    }

    pub fn runtime_session_refresh_offset_ms(&self) -> u64 {
        self.runtime_session_refresh_offset_ms
            .unwrap_or(DEFAULT_RUNTIME_SESSION_REFRESH_OFFSET_MS)
    }

    pub fn network_enabled(&self) -> bool {
        self.disable_network != Some(true)
    }
}

/// Missing file means defaults; a malformed file is logged and also means defaults.
pub fn load_app_config(data_dir: &str) -> AppConfig {
    let path = Path::new(data_dir).join(CONFIG_FILE_NAME);
    let data = match std::fs::read_to_string(&path) {
        Ok(data) => data,
        Err(_) => return AppConfig::default(),
    };
    match serde_json::from_str::<AppConfig>(&data) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(%e, path = %path.display(), "config: ignoring malformed file");
            AppConfig::default()
        }
    }
}

/// Writes `config` to `<data_dir>/xcel_config.json`, creating the directory if needed.
/// The running core picks it up on the next `ReloadConfig`.
pub fn save_app_config(data_dir: &str, config: &AppConfig) -> anyhow::Result<()> {
    std::fs::create_dir_all(data_dir).with_context(|| format!("create data dir {data_dir}"))?;
    let path = Path::new(data_dir).join(CONFIG_FILE_NAME);
    let data = serde_json::to_vec_pretty(config)?;
    std::fs::write(&path, data).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
