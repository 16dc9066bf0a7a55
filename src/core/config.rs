use anyhow::{Context, Result};
use chrono::TimeDelta;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FeedConfig {
    pub url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_retries")]
    pub retries: usize,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_retries() -> usize {
    3
}

fn default_retry_delay_ms() -> u64 {
    2000
}

impl FeedConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ScheduleConfig {
    /// Publisher cadence; slots recur every `interval_hours` from midnight UTC.
    #[serde(default = "default_interval_hours")]
    pub interval_hours: u32,
    /// Minutes past each publisher slot at which we poll.
    #[serde(default = "default_offset_minutes")]
    pub offset_minutes: u32,
    #[serde(default = "default_resume_tolerance_minutes")]
    pub resume_tolerance_minutes: u32,
}

fn default_interval_hours() -> u32 {
    2
}

fn default_offset_minutes() -> u32 {
    10
}

fn default_resume_tolerance_minutes() -> u32 {
    15
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        ScheduleConfig {
            interval_hours: default_interval_hours(),
            offset_minutes: default_offset_minutes(),
            resume_tolerance_minutes: default_resume_tolerance_minutes(),
        }
    }
}

impl ScheduleConfig {
    /// Age past which a resumed consumer should refresh.
    pub fn resume_threshold(&self) -> TimeDelta {
        TimeDelta::hours(i64::from(self.interval_hours))
            + TimeDelta::minutes(i64::from(self.resume_tolerance_minutes))
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub feed: FeedConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    pub data_path: Option<String>,
    /// Overrides the snapshot compiled into the binary.
    pub bundled_snapshot: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("app", "factorypocket", "marketfeed")
            .context("Could not determine project directories")
    }

    pub fn default_config_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        Ok(Self::project_dirs()?.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}
