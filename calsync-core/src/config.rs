//! Global calsync configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono_tz::Tz;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::{SyncError, SyncResult};
use crate::event::Side;
use crate::remote::Remote;

static DEFAULT_STORE_DIR: &str = "~/.local/share/calsync/events";
static DEFAULT_TIMEZONE: &str = "UTC";
static DEFAULT_PASS_TIMEOUT: &str = "5m";
static DEFAULT_WATCH_INTERVAL: &str = "3m";

fn default_store_dir() -> PathBuf {
    PathBuf::from(DEFAULT_STORE_DIR)
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

fn default_pass_timeout() -> String {
    DEFAULT_PASS_TIMEOUT.to_string()
}

fn default_watch_interval() -> String {
    DEFAULT_WATCH_INTERVAL.to_string()
}

/// Configuration at ~/.config/calsync/config.toml
///
/// Every key can be overridden from the environment with a `CALSYNC_`
/// prefix, using `__` for nesting (e.g. `CALSYNC_TASKS__DATABASE_ID`).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SyncConfig {
    /// Where canonical records are kept.
    #[serde(default = "default_store_dir")]
    pub store_dir: PathBuf,

    /// Zone used to anchor all-day dates.
    #[serde(default = "default_timezone")]
    pub timezone: String,

    #[serde(default = "default_pass_timeout")]
    pub pass_timeout: String,

    #[serde(default = "default_watch_interval")]
    pub watch_interval: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Remote>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Remote>,
}

impl SyncConfig {
    pub fn config_path() -> SyncResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| SyncError::Config("Could not determine config directory".into()))?
            .join("calsync");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from the default location, writing a commented template first if
    /// no config file exists yet.
    pub fn load() -> SyncResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> SyncResult<Self> {
        Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix("CALSYNC")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(|e| SyncError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| SyncError::Config(e.to_string()))
    }

    /// Store directory with `~` expanded.
    pub fn store_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.store_dir.to_string_lossy()).into_owned())
    }

    pub fn tz(&self) -> SyncResult<Tz> {
        self.timezone.parse::<Tz>().map_err(|e| {
            SyncError::Config(format!("Unknown timezone '{}': {}", self.timezone, e))
        })
    }

    pub fn pass_timeout(&self) -> SyncResult<Duration> {
        parse_duration("pass_timeout", &self.pass_timeout)
    }

    pub fn watch_interval(&self) -> SyncResult<Duration> {
        parse_duration("watch_interval", &self.watch_interval)
    }

    pub fn remote(&self, side: Side) -> SyncResult<&Remote> {
        let remote = match side {
            Side::Tasks => self.tasks.as_ref(),
            Side::Schedule => self.schedule.as_ref(),
        };
        remote.ok_or_else(|| {
            SyncError::Config(format!(
                "No [{}] source configured in {}",
                side,
                Self::config_path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|_| "config.toml".to_string())
            ))
        })
    }

    /// Create a config file with every option commented out.
    pub fn create_default_config(path: &Path) -> SyncResult<()> {
        let contents = format!(
            "\
# calsync configuration

# Where canonical event records are stored:
# store_dir = \"{DEFAULT_STORE_DIR}\"

# Timezone used for all-day events:
# timezone = \"{DEFAULT_TIMEZONE}\"

# Give up on a sync pass after this long:
# pass_timeout = \"{DEFAULT_PASS_TIMEOUT}\"

# How often `calsync watch` runs a pass:
# watch_interval = \"{DEFAULT_WATCH_INTERVAL}\"

# The task database side (sole source of event colors):
# [tasks]
# provider = \"notion\"
# database_id = \"...\"

# The scheduling calendar side:
# [schedule]
# provider = \"google\"
# calendar_id = \"primary\"
"
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                SyncError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| SyncError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}

fn parse_duration(key: &str, value: &str) -> SyncResult<Duration> {
    humantime::parse_duration(value)
        .map_err(|e| SyncError::Config(format!("Invalid {key} '{value}': {e}")))
}
