use crate::config::parser::parse_config_file;
use crate::config::types::LoadedConfig;
use crate::error::{PatchError, Result};
use std::path::{Path, PathBuf};

/// File name of the rules file at the repository root.
pub const CONFIG_FILE_NAME: &str = ".branchpatch.toml";

/// Environment variable naming an alternative rules file.
pub const CONFIG_ENV_VAR: &str = "BRANCHPATCH_CONFIG";

/// Resolve which config file to use.
///
/// The lookup order is:
/// 1. An explicit path (from `--config`)
/// 2. The `BRANCHPATCH_CONFIG` environment variable, if set and non-empty
/// 3. `.branchpatch.toml` in the repository root
pub fn resolve_config_path(explicit: Option<&Path>, root: &Path) -> PathBuf {
	if let Some(path) = explicit {
		return path.to_path_buf();
	}

	if let Ok(env_path) = std::env::var(CONFIG_ENV_VAR)
		&& !env_path.trim().is_empty()
	{
		return PathBuf::from(env_path);
	}

	default_config_path(root)
}

/// Get the path of the rules file inside a repository root.
pub fn default_config_path(root: &Path) -> PathBuf {
	root.join(CONFIG_FILE_NAME)
}

/// Resolve, read and validate the config file.
pub fn load_config(explicit: Option<&Path>, root: &Path) -> Result<LoadedConfig> {
	let path = resolve_config_path(explicit, root);

	if !path.exists() {
		return Err(PatchError::ConfigNotFound { path });
	}

	let config = parse_config_file(&path)?;
	Ok(LoadedConfig { config, path })
}
