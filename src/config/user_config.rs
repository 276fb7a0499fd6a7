//! User-level configuration for gitgamer
//!
//! Supports loading config from:
//! - Environment variables
//! - ~/.config/gitgamer/config.toml (or the file named by `GITGAMER_CONFIG`)

use crate::driver::DEFAULT_MAX_FILES_PER_COMMIT;
use crate::schedule::{DEFAULT_MAX_COMMITS_PER_DAY, DEFAULT_MAX_DAYS_IN_PAST, DEFAULT_MAX_GAP};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Overrides the config file location
pub const CONFIG_PATH_ENV: &str = "GITGAMER_CONFIG";
pub const AUTHOR_NAME_ENV: &str = "GITGAMER_AUTHOR_NAME";
pub const AUTHOR_EMAIL_ENV: &str = "GITGAMER_AUTHOR_EMAIL";

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct UserConfig {
    #[serde(default)]
    pub schedule: ScheduleDefaults,

    #[serde(default)]
    pub author: AuthorConfig,

    #[serde(default)]
    pub files: FilesConfig,
}

/// Defaults for values the CLI asks for
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct ScheduleDefaults {
    pub max_commits_per_day: Option<usize>,
    pub max_gap: Option<u32>,
    pub max_days_in_past: Option<u32>,
    pub max_files_per_commit: Option<usize>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct AuthorConfig {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FilesConfig {
    /// Extra gitignore-style patterns excluded from every run
    #[serde(default)]
    pub ignore: Vec<String>,
}

impl UserConfig {
    /// Load config from all sources, with priority:
    /// 1. Environment variables (highest)
    /// 2. User config file
    pub fn load() -> Result<Self> {
        let mut config = UserConfig::default();

        if let Some(path) = Self::user_config_path().filter(|p| p.exists()) {
            match Self::load_from(&path) {
                Ok(file_config) => config.merge(file_config),
                Err(err) => warn!("Ignoring config file: {:#}", err),
            }
        }

        if let Ok(name) = std::env::var(AUTHOR_NAME_ENV) {
            config.author.name = Some(name);
        }
        if let Ok(email) = std::env::var(AUTHOR_EMAIL_ENV) {
            config.author.email = Some(email);
        }

        Ok(config)
    }

    /// Parse a single config file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("Invalid TOML in {}", path.display()))?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Get the user config file path
    pub fn user_config_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|p| p.join("gitgamer").join("config.toml"))
    }

    /// Merge another config into this one (other takes priority)
    fn merge(&mut self, other: UserConfig) {
        let schedule = other.schedule;
        if schedule.max_commits_per_day.is_some() {
            self.schedule.max_commits_per_day = schedule.max_commits_per_day;
        }
        if schedule.max_gap.is_some() {
            self.schedule.max_gap = schedule.max_gap;
        }
        if schedule.max_days_in_past.is_some() {
            self.schedule.max_days_in_past = schedule.max_days_in_past;
        }
        if schedule.max_files_per_commit.is_some() {
            self.schedule.max_files_per_commit = schedule.max_files_per_commit;
        }
        if other.author.name.is_some() {
            self.author.name = other.author.name;
        }
        if other.author.email.is_some() {
            self.author.email = other.author.email;
        }
        self.files.ignore.extend(other.files.ignore);
    }

    pub fn max_commits_per_day(&self) -> usize {
        self.schedule
            .max_commits_per_day
            .unwrap_or(DEFAULT_MAX_COMMITS_PER_DAY)
    }

    pub fn max_gap(&self) -> u32 {
        self.schedule.max_gap.unwrap_or(DEFAULT_MAX_GAP)
    }

    pub fn max_days_in_past(&self) -> u32 {
        self.schedule
            .max_days_in_past
            .unwrap_or(DEFAULT_MAX_DAYS_IN_PAST)
    }

    pub fn max_files_per_commit(&self) -> usize {
        self.schedule
            .max_files_per_commit
            .unwrap_or(DEFAULT_MAX_FILES_PER_COMMIT)
    }

    pub fn ignore_patterns(&self) -> &[String] {
        &self.files.ignore
    }

    /// Create the config directory and an example config if none exists
    pub fn init_user_config() -> Result<PathBuf> {
        let config_path = Self::user_config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        if !config_path.exists() {
            let example = r#"# gitgamer user configuration

[schedule]
# Defaults offered at the prompts
# max_commits_per_day = 5
# max_gap = 2
# max_days_in_past = 30
# max_files_per_commit = 5

[author]
# Used when --name/--email are not given (before git's user.name/user.email)
# name = "Jane Doe"
# email = "jane@example.com"

[files]
# Extra gitignore-style patterns never touched by generated commits
# ignore = ["docs/", "*.lock"]
"#;
            std::fs::write(&config_path, example)?;
        }

        Ok(config_path)
    }
}
