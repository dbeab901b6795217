//! Configuration loading and parsing for branchpatch.
//!
//! This module handles:
//! - TOML rules file parsing and validation
//! - Locating the rules file for a repository
//! - The starter template written by `branchpatch init`

pub mod discover;
pub mod parser;
pub mod template;
pub mod types;

pub use discover::{
	CONFIG_ENV_VAR, CONFIG_FILE_NAME, default_config_path, load_config, resolve_config_path,
};
pub use parser::{parse_config_file, parse_config_str};
pub use template::INIT_TEMPLATE;
pub use types::{Config, LoadedConfig, PatternSpec, Rule};
