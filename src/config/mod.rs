//! Configuration module for gitgamer
//!
//! This module handles:
//! - User-level defaults (~/.config/gitgamer/config.toml)
//! - Author identity overrides from the environment
//! - Extra ignore patterns

mod user_config;

pub use user_config::{
    AuthorConfig, FilesConfig, ScheduleDefaults, UserConfig, AUTHOR_EMAIL_ENV, AUTHOR_NAME_ENV,
    CONFIG_PATH_ENV,
};
