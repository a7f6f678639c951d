//! # Configuration Management Module
//!
//! TOML configuration for the `taskquest` host: where state lives, how loudly
//! to log, which XP table is in force, and the store's timing and size limits.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use taskquest::config::Config;
//! use taskquest::tasks::StoreSettings;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Config::create_default("taskquest.toml").await?;
//!     let config = Config::load("taskquest.toml").await?;
//!     let settings = StoreSettings::try_from(&config)?;
//!     println!("Data in {}, reminders at {}", config.storage.data_dir, settings.default_due_time);
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration File Format
//!
//! ```toml
//! [storage]
//! data_dir = "./data"
//! max_file_bytes = 8388608
//!
//! [logging]
//! level = "info"
//! file = "taskquest.log"
//!
//! [progression]
//! reward_table = "standard"   # or "reduced"
//!
//! [reminders]
//! enabled = true
//! default_due_time = "09:00"
//!
//! [store]
//! overdue_check_interval_secs = 60
//! celebration_secs = 3
//! highlight_secs = 5
//! max_messages = 500
//! ```
//!
//! Every section is optional; missing keys take the defaults shown above.

use anyhow::{anyhow, Result};
use chrono::{Duration, NaiveTime};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::tasks::progression::XpRewardTable;
use crate::tasks::storage::DEFAULT_MAX_FILE_BYTES;
use crate::tasks::store::{
    StoreSettings, DEFAULT_CELEBRATION_SECS, DEFAULT_HIGHLIGHT_SECS,
    DEFAULT_MAX_DESCRIPTION_CHARS, DEFAULT_MAX_TITLE_CHARS,
};
use crate::tasks::npc::DEFAULT_MAX_MESSAGES;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub progression: ProgressionConfig,
    #[serde(default)]
    pub reminders: ReminderConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: String,
    /// Stored documents above this size are treated as unreadable.
    pub max_file_bytes: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: Some("taskquest.log".to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ProgressionConfig {
    pub reward_table: XpRewardTable,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReminderConfig {
    pub enabled: bool,
    /// `HH:MM`, applied to tasks that have a due date but no due time.
    pub default_due_time: String,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_due_time: "09:00".to_string(),
        }
    }
}

impl ReminderConfig {
    pub fn parsed_due_time(&self) -> Result<NaiveTime> {
        NaiveTime::parse_from_str(self.default_due_time.trim(), "%H:%M").map_err(|e| {
            anyhow!(
                "Invalid reminders.default_due_time '{}': {}",
                self.default_due_time,
                e
            )
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    /// How often `watch` scans for overdue tasks and due reminders.
    pub overdue_check_interval_secs: u64,
    pub celebration_secs: u32,
    pub highlight_secs: u32,
    pub max_messages: usize,
    pub max_title_chars: usize,
    pub max_description_chars: usize,
    /// Optional JSON roster replacing the built-in NPCs.
    pub npc_seed_file: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            overdue_check_interval_secs: 60,
            celebration_secs: DEFAULT_CELEBRATION_SECS as u32,
            highlight_secs: DEFAULT_HIGHLIGHT_SECS as u32,
            max_messages: DEFAULT_MAX_MESSAGES,
            max_title_chars: DEFAULT_MAX_TITLE_CHARS,
            max_description_chars: DEFAULT_MAX_DESCRIPTION_CHARS,
            npc_seed_file: None,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.storage.data_dir.trim().is_empty() {
            return Err(anyhow!("storage.data_dir must not be empty"));
        }
        if self.storage.max_file_bytes == 0 {
            return Err(anyhow!("storage.max_file_bytes must be greater than 0"));
        }
        if self.store.overdue_check_interval_secs == 0 {
            return Err(anyhow!("store.overdue_check_interval_secs must be greater than 0"));
        }
        if self.store.max_messages == 0 {
            return Err(anyhow!("store.max_messages must be greater than 0"));
        }
        if self.store.max_title_chars == 0 || self.store.max_description_chars == 0 {
            return Err(anyhow!("store text limits must be greater than 0"));
        }
        self.reminders.parsed_due_time()?;
        Ok(())
    }
}

impl TryFrom<&Config> for StoreSettings {
    type Error = anyhow::Error;

    fn try_from(config: &Config) -> Result<Self> {
        Ok(StoreSettings {
            reward_table: config.progression.reward_table,
            reminders_enabled: config.reminders.enabled,
            default_due_time: config.reminders.parsed_due_time()?,
            celebration: Duration::seconds(config.store.celebration_secs as i64),
            highlight: Duration::seconds(config.store.highlight_secs as i64),
            max_messages: config.store.max_messages,
            max_title_chars: config.store.max_title_chars,
            max_description_chars: config.store.max_description_chars,
        })
    }
}
