use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::backend::fetch::DEFAULT_VERIFY_TIMEOUT;

pub const APP_DIR: &str = "tribute-tui";
const BASE_URL_ENV: &str = "TRIBUTE_MEDIA_BASE_URL";

const MIN_CEILING_SECS: u64 = 45;
const MAX_CEILING_SECS: u64 = 60;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaEntry {
    pub id: String,
    pub file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TributeConfig {
    pub media_base_url: String,
    pub media: Vec<MediaEntry>,
    pub verify_timeout_secs: u64,
    pub loading_ceiling_secs: u64,
    pub min_loading_ms: u64,
    pub log_filter: String,
}

impl Default for TributeConfig {
    fn default() -> Self {
        let media = (1..=7)
            .map(|n| MediaEntry {
                id: format!("video{}", n),
                file: format!("{}.mp4", n),
            })
            .collect();

        Self {
            media_base_url: "http://127.0.0.1:8000/media".to_string(),
            media,
            verify_timeout_secs: DEFAULT_VERIFY_TIMEOUT.as_secs(),
            loading_ceiling_secs: MAX_CEILING_SECS,
            min_loading_ms: 2200,
            log_filter: "info".to_string(),
        }
    }
}

fn get_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("config.json")
}

impl TributeConfig {
    /// Loads `config.json` from the user config dir, falling back to defaults
    /// when it is missing or unreadable. The base URL env var always wins.
    pub fn load() -> Self {
        let path = get_config_path();

        let mut config = if path.exists() {
            match fs::read_to_string(&path)
                .map_err(ConfigError::from)
                .and_then(|content| Self::from_json(&content))
            {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Ignoring {}: {}", path.display(), e);
                    Self::default()
                }
            }
        } else {
            Self::default()
        };

        if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
            if !base_url.trim().is_empty() {
                config.media_base_url = base_url;
            }
        }

        config
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn verify_timeout(&self) -> Duration {
        Duration::from_secs(self.verify_timeout_secs.max(1))
    }

    pub fn loading_ceiling(&self) -> Duration {
        Duration::from_secs(
            self.loading_ceiling_secs
                .clamp(MIN_CEILING_SECS, MAX_CEILING_SECS),
        )
    }

    pub fn min_loading(&self) -> Duration {
        Duration::from_millis(self.min_loading_ms)
    }
}

/// Routes `log` output to a file under the cache dir, since the terminal
/// belongs to the UI while the app runs.
pub fn init_logging(config: &TributeConfig) {
    let env = env_logger::Env::default().filter_or("TRIBUTE_LOG", config.log_filter.as_str());
    let mut builder = env_logger::Builder::from_env(env);

    let log_dir = dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR);

    let log_file = fs::create_dir_all(&log_dir).and_then(|_| {
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_dir.join("tribute.log"))
    });

    match log_file {
        Ok(file) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        Err(e) => {
            eprintln!("Failed to open log file, logging to stderr: {}", e);
        }
    }

    // A second init (e.g. from tests) is harmless.
    let _ = builder.try_init();
}
