use crate::model::{Channel, ChannelKind, Species};
use serde::Deserialize;
use chrono::TimeDelta;
use std::fs;
use std::time::Duration;
use thiserror::Error;

/// Accepted range for `known_window_days` (one day up to a century).
pub const KNOWN_WINDOW_DAYS: std::ops::RangeInclusive<i64> = 1..=36500;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.3";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot parse config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Site codes used by the listing page's `sel_specie` query parameter.
#[derive(Debug, Clone, Deserialize)]
pub struct SpeciesCodes {
    #[serde(default = "default_cat_code")]
    pub cat: String,
    #[serde(default = "default_dog_code")]
    pub dog: String,
}

impl Default for SpeciesCodes {
    fn default() -> Self {
        Self {
            cat: default_cat_code(),
            dog: default_dog_code(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub main_url: String,
    #[serde(default)]
    pub species_codes: SpeciesCodes,
    pub telegram_bot_token: String,
    pub all_chat_id: String,
    pub cat_chat_id: String,
    pub error_chat_id: String,
    #[serde(default)]
    pub admin_chat_id: Option<String>,
    #[serde(default = "default_db_path")]
    pub db_path: String,
    #[serde(default = "default_check_interval")]
    pub check_interval_seconds: u64,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    #[serde(default = "default_known_window")]
    pub known_window_days: i64,
    #[serde(default = "default_batch_size")]
    pub notify_batch_size: usize,
    #[serde(default = "default_error_retries")]
    pub error_max_retries: u32,
    #[serde(default = "default_error_delay")]
    pub error_delay_seconds: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl AppConfig {
    pub fn listing_url(&self, species: Species) -> String {
        let code = match species {
            Species::Cat => &self.species_codes.cat,
            Species::Dog => &self.species_codes.dog,
        };
        format!("{}?sel_specie={}", self.main_url, code)
    }

    pub fn channel(&self, kind: ChannelKind) -> Channel {
        match kind {
            ChannelKind::All => Channel::new(kind, self.all_chat_id.clone()),
            ChannelKind::Cat => Channel::new(kind, self.cat_chat_id.clone()),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// How far back stored records count as known; `None` when out of range.
    pub fn known_window(&self) -> Option<TimeDelta> {
        if !KNOWN_WINDOW_DAYS.contains(&self.known_window_days) {
            return None;
        }
        TimeDelta::try_days(self.known_window_days)
    }

    pub fn error_delay(&self) -> Duration {
        Duration::from_secs(self.error_delay_seconds)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.main_url.trim().is_empty() {
            return Err(ConfigError::Invalid("main_url is empty".into()));
        }
        if self.telegram_bot_token.trim().is_empty() {
            return Err(ConfigError::Invalid("telegram_bot_token is empty".into()));
        }
        if self.workers == 0 {
            return Err(ConfigError::Invalid("workers must be at least 1".into()));
        }
        if self.max_pages == 0 {
            return Err(ConfigError::Invalid("max_pages must be at least 1".into()));
        }
        if self.known_window().is_none() {
            return Err(ConfigError::Invalid(format!(
                "known_window_days must be within {}..={}, got {}",
                KNOWN_WINDOW_DAYS.start(),
                KNOWN_WINDOW_DAYS.end(),
                self.known_window_days
            )));
        }
        Ok(())
    }
}

pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = serde_json::from_str(content)?;
    config.validate()?;
    Ok(config)
}

pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

fn default_cat_code() -> String {
    "96".into()
}

fn default_dog_code() -> String {
    "97".into()
}

fn default_db_path() -> String {
    "data.db".into()
}

fn default_check_interval() -> u64 {
    1800
}

fn default_workers() -> usize {
    5
}

fn default_max_pages() -> usize {
    50
}

fn default_request_timeout() -> u64 {
    30
}

fn default_known_window() -> i64 {
    365
}

fn default_batch_size() -> usize {
    15
}

fn default_error_retries() -> u32 {
    1
}

fn default_error_delay() -> u64 {
    3
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.into()
}
