use std::{collections::HashMap, fs, path::Path, time::Duration};

use serde::Deserialize;

use crate::error::ClientError;

pub const DEFAULT_CONFIG_FILE: &str = "client.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientSettings {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub event_capacity: usize,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3030".into(),
            request_timeout_secs: 30,
            event_capacity: 64,
        }
    }
}

impl ClientSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

pub fn load_settings() -> Result<ClientSettings, ClientError> {
    load_settings_from(Path::new(DEFAULT_CONFIG_FILE), |key| std::env::var(key).ok())
}

/// File values override defaults; environment values override the file.
/// A missing file is not an error, an unreadable or malformed one is.
pub fn load_settings_from(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ClientSettings, ClientError> {
    let mut settings = ClientSettings::default();

    if path.exists() {
        let raw = fs::read_to_string(path).map_err(|err| ClientError::Config {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
        let file_cfg =
            toml::from_str::<HashMap<String, toml::Value>>(&raw).map_err(|err| {
                ClientError::Config {
                    path: path.display().to_string(),
                    message: err.to_string(),
                }
            })?;
        if let Some(v) = file_cfg.get("api_base_url").and_then(toml::Value::as_str) {
            settings.api_base_url = v.to_string();
        }
        if let Some(v) = file_cfg
            .get("request_timeout_secs")
            .and_then(toml::Value::as_integer)
        {
            settings.request_timeout_secs = u64::try_from(v).unwrap_or(settings.request_timeout_secs);
        }
        if let Some(v) = file_cfg.get("event_capacity").and_then(toml::Value::as_integer) {
            settings.event_capacity = usize::try_from(v).unwrap_or(settings.event_capacity);
        }
    }

    if let Some(v) = env("API_BASE_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = env("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }

    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_secs = parsed;
        }
    }

    if let Some(v) = env("APP__EVENT_CAPACITY") {
        if let Ok(parsed) = v.parse::<usize>() {
            settings.event_capacity = parsed;
        }
    }

    // broadcast::channel panics on zero capacity
    settings.event_capacity = settings.event_capacity.max(1);

    Ok(settings)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
