use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Top-level configuration loaded from `~/.seedwarden/config.toml`.
///
/// **Security**: This struct NEVER stores passwords or bot tokens.
/// Secret-bearing fields hold the *name* of an environment variable which is
/// resolved at runtime via [`Config::secret`].
///
/// Built once at process start and shared by reference; nothing mutates it
/// after validation.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub qbittorrent: QbittorrentConfig,
    #[serde(default)]
    pub classification: ClassificationConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub retirement: RetirementConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
}

impl Config {
    /// Load config from `~/.seedwarden/config.toml`, falling back to
    /// defaults when the file does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(path)
        } else {
            let cfg = Config::default();
            cfg.validate()?;
            Ok(cfg)
        }
    }

    /// Load from a specific path.
    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let text = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        let cfg: Config = toml::from_str(&text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Serialize config to TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        self.validate()?;
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Semantic validation for settings that are not fully expressible via type checks.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.classification.validate()?;
        self.monitor.validate()?;
        self.retirement.validate()?;
        self.notifications.validate()?;
        Ok(())
    }

    /// Read a secret from the environment variable named by `env_name`.
    ///
    /// Empty values are treated as unset.
    pub fn secret(env_name: &str) -> Option<String> {
        std::env::var(env_name).ok().filter(|v| !v.trim().is_empty())
    }

    fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".seedwarden")
            .join("config.toml")
    }
}

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io: {0}")]
    Io(String),
    #[error("parse: {0}")]
    Parse(String),
    #[error("validation: {0}")]
    Validation(String),
}

// ---------------------------------------------------------------------------
// Section structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub json_logs: bool,
    /// Simulate every deletion; all other state transitions proceed normally.
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
            dry_run: false,
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

/// Download-client connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QbittorrentConfig {
    #[serde(default = "default_qbit_url")]
    pub url: String,
    /// Env var name holding the WebUI username.
    #[serde(default = "default_qbit_username_env")]
    pub username_env: String,
    /// Env var name holding the WebUI password.
    #[serde(default = "default_qbit_password_env")]
    pub password_env: String,
    #[serde(default = "default_true")]
    pub verify_cert: bool,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for QbittorrentConfig {
    fn default() -> Self {
        Self {
            url: default_qbit_url(),
            username_env: default_qbit_username_env(),
            password_env: default_qbit_password_env(),
            verify_cert: true,
            connect_timeout_secs: default_connect_timeout(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_qbit_url() -> String {
    "http://localhost:8080".into()
}
fn default_qbit_username_env() -> String {
    "QBIT_USERNAME".into()
}
fn default_qbit_password_env() -> String {
    "QBIT_PASSWORD".into()
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_request_timeout() -> u64 {
    30
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Category and tag sets that decide which population a task belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationConfig {
    #[serde(default = "default_managed_categories")]
    pub managed_categories: BTreeSet<String>,
    #[serde(default = "default_managed_tags")]
    pub managed_tags: BTreeSet<String>,
    #[serde(default = "default_protected_categories")]
    pub protected_categories: BTreeSet<String>,
    #[serde(default = "default_protected_tags")]
    pub protected_tags: BTreeSet<String>,
    #[serde(default = "default_freeleech_tags")]
    pub freeleech_tags: BTreeSet<String>,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            managed_categories: default_managed_categories(),
            managed_tags: default_managed_tags(),
            protected_categories: default_protected_categories(),
            protected_tags: default_protected_tags(),
            freeleech_tags: default_freeleech_tags(),
        }
    }
}

impl ClassificationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(cat) = self
            .managed_categories
            .intersection(&self.protected_categories)
            .next()
        {
            return Err(ConfigError::Validation(format!(
                "classification: category '{cat}' is both managed and protected"
            )));
        }
        if let Some(tag) = self.managed_tags.intersection(&self.protected_tags).next() {
            return Err(ConfigError::Validation(format!(
                "classification: tag '{tag}' is both managed and protected"
            )));
        }
        Ok(())
    }
}

fn string_set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_managed_categories() -> BTreeSet<String> {
    string_set(&["刷流"])
}
fn default_managed_tags() -> BTreeSet<String> {
    string_set(&["刷流"])
}
fn default_protected_categories() -> BTreeSet<String> {
    string_set(&[
        "keep",
        "collection",
        "archive",
        "电影",
        "电视剧",
        "音乐",
        "纪录片",
        "动漫",
        "儿童",
        "其他",
        "成人",
        "音乐视频",
    ])
}
fn default_protected_tags() -> BTreeSet<String> {
    string_set(&["personal", "archive_manual"])
}
fn default_freeleech_tags() -> BTreeSet<String> {
    string_set(&["freeleech", "FL", "FreeLeech"])
}

// ---------------------------------------------------------------------------
// Monitor (duration policy + store)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// JSON ledger path; a leading `~/` expands to the home directory.
    #[serde(default = "default_store_path")]
    pub store_path: String,
    /// Tasks added more recently than this are left alone entirely.
    #[serde(default = "default_grace_hours")]
    pub grace_period_hours: u64,
    /// Actively seeding tasks with less seeding time than this are left alone.
    #[serde(default = "default_grace_hours")]
    pub fresh_seed_grace_hours: u64,
    #[serde(default = "default_base_threshold")]
    pub base_threshold_minutes: u64,
    /// Non-freeleech upload stall while leechers are still connected.
    #[serde(default = "default_stalled_with_leechers")]
    pub stalled_with_leechers_minutes: u64,
    /// Freeleech upload stall with nobody left to serve.
    #[serde(default = "default_freeleech_stalled")]
    pub freeleech_stalled_minutes: u64,
    #[serde(default = "default_backups_retained")]
    pub corrupt_backups_retained: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            grace_period_hours: default_grace_hours(),
            fresh_seed_grace_hours: default_grace_hours(),
            base_threshold_minutes: default_base_threshold(),
            stalled_with_leechers_minutes: default_stalled_with_leechers(),
            freeleech_stalled_minutes: default_freeleech_stalled(),
            corrupt_backups_retained: default_backups_retained(),
        }
    }
}

impl MonitorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store_path.trim().is_empty() {
            return Err(ConfigError::Validation(
                "monitor.store_path must not be empty".to_string(),
            ));
        }
        if self.base_threshold_minutes == 0 {
            return Err(ConfigError::Validation(
                "monitor.base_threshold_minutes must be greater than 0".to_string(),
            ));
        }
        if self.stalled_with_leechers_minutes < self.base_threshold_minutes {
            return Err(ConfigError::Validation(
                "monitor.stalled_with_leechers_minutes must not be below base_threshold_minutes"
                    .to_string(),
            ));
        }
        if self.corrupt_backups_retained == 0 {
            return Err(ConfigError::Validation(
                "monitor.corrupt_backups_retained must be at least 1".to_string(),
            ));
        }
        if self.freeleech_stalled_minutes < self.base_threshold_minutes {
            return Err(ConfigError::Validation(
                "monitor.freeleech_stalled_minutes must not be below base_threshold_minutes"
                    .to_string(),
            ));
        }
        Ok(())
    }

    /// `store_path` with `~/` expanded.
    pub fn resolved_store_path(&self) -> PathBuf {
        match self.store_path.strip_prefix("~/") {
            Some(rest) => dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(rest),
            None => PathBuf::from(&self.store_path),
        }
    }
}

fn default_store_path() -> String {
    "~/.seedwarden/monitor.json".into()
}
fn default_grace_hours() -> u64 {
    24
}
fn default_base_threshold() -> u64 {
    15
}
fn default_stalled_with_leechers() -> u64 {
    45
}
fn default_freeleech_stalled() -> u64 {
    240
}
fn default_backups_retained() -> usize {
    5
}

// ---------------------------------------------------------------------------
// Retirement
// ---------------------------------------------------------------------------

/// Thresholds for retiring healthy, non-freeleech seeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetirementConfig {
    #[serde(default = "default_min_ratio")]
    pub min_ratio: f64,
    #[serde(default = "default_low_demand_leechers")]
    pub low_demand_leechers: u32,
    #[serde(default = "default_min_seeding_days")]
    pub min_seeding_days: u64,
    #[serde(default = "default_long_idle_seeding_days")]
    pub long_idle_seeding_days: u64,
    #[serde(default)]
    pub long_idle_max_leechers: u32,
    #[serde(default = "default_long_idle_inactive_days")]
    pub long_idle_inactive_days: u64,
}

impl Default for RetirementConfig {
    fn default() -> Self {
        Self {
            min_ratio: default_min_ratio(),
            low_demand_leechers: default_low_demand_leechers(),
            min_seeding_days: default_min_seeding_days(),
            long_idle_seeding_days: default_long_idle_seeding_days(),
            long_idle_max_leechers: 0,
            long_idle_inactive_days: default_long_idle_inactive_days(),
        }
    }
}

impl RetirementConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.min_ratio.is_finite() || self.min_ratio < 0.0 {
            return Err(ConfigError::Validation(format!(
                "retirement.min_ratio must be a finite non-negative number, got {}",
                self.min_ratio
            )));
        }
        Ok(())
    }
}

fn default_min_ratio() -> f64 {
    5.0
}
fn default_low_demand_leechers() -> u32 {
    1
}
fn default_min_seeding_days() -> u64 {
    14
}
fn default_long_idle_seeding_days() -> u64 {
    90
}
fn default_long_idle_inactive_days() -> u64 {
    7
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// Telegram report delivery. References env var names, NEVER stores tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_telegram_api_url")]
    pub telegram_api_url: String,
    #[serde(default = "default_telegram_token_env")]
    pub telegram_token_env: String,
    #[serde(default = "default_telegram_chat_id_env")]
    pub telegram_chat_id_env: String,
    #[serde(default = "default_max_report_items")]
    pub max_report_items: usize,
    /// Do not send a report for runs that changed nothing.
    #[serde(default = "default_true")]
    pub skip_idle_reports: bool,
    #[serde(default = "default_notify_timeout")]
    pub timeout_secs: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            telegram_api_url: default_telegram_api_url(),
            telegram_token_env: default_telegram_token_env(),
            telegram_chat_id_env: default_telegram_chat_id_env(),
            max_report_items: default_max_report_items(),
            skip_idle_reports: true,
            timeout_secs: default_notify_timeout(),
        }
    }
}

impl NotificationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_report_items == 0 {
            return Err(ConfigError::Validation(
                "notifications.max_report_items must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}
fn default_telegram_api_url() -> String {
    "https://api.telegram.org".into()
}
fn default_telegram_token_env() -> String {
    "TG_BOT_TOKEN_MONITOR".into()
}
fn default_telegram_chat_id_env() -> String {
    "TG_CHAT_ID".into()
}
fn default_max_report_items() -> usize {
    20
}
fn default_notify_timeout() -> u64 {
    20
}
