//! Application configuration for JiHou.
//!
//! [`ConfigStore`] owns `config.json` in the application directory and knows
//! where the notes data directory lives.

mod config;
mod data_dir;

pub use config::{AppConfig, ConfigError, ConfigStore, TagPreferences, CONFIG_FILE_NAME};
pub use data_dir::{copy_tree, fallback_data_dir, DOCUMENTS_FOLDER_NAME};
