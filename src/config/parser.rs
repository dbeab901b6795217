use crate::config::types::Config;
use crate::error::{PatchError, Result};
use std::path::Path;

/// Parse a config file from the given path.
pub fn parse_config_file(path: &Path) -> Result<Config> {
	let content = std::fs::read_to_string(path).map_err(|source| PatchError::ConfigReadError {
		path: path.to_path_buf(),
		source,
	})?;

	parse_config_str(&content, path)
}

/// Parse a config from a string (useful for testing).
pub fn parse_config_str(content: &str, path: &Path) -> Result<Config> {
	let config: Config =
		toml::from_str(content).map_err(|source| PatchError::ConfigParseError {
			path: path.to_path_buf(),
			source,
		})?;

	// Validate the parsed config
	config.validate()?;

	Ok(config)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::types::PatternSpec;
	use std::path::PathBuf;

	#[test]
	fn test_parse_empty_config() {
		let content = "";
		let path = PathBuf::from("test.toml");
		let config = parse_config_str(content, &path).unwrap();

		assert!(config.upstream.is_none());
		assert!(!config.dry_run);
		assert!(config.rules.is_empty());
	}

	#[test]
	fn test_parse_basic_config() {
		let content = r#"
upstream = "release"
dry-run = true
"#;
		let path = PathBuf::from("test.toml");
		let config = parse_config_str(content, &path).unwrap();

		assert_eq!(config.upstream, Some("release".to_string()));
		assert!(config.dry_run);
	}

	#[test]
	fn test_parse_rules_array_of_tables() {
		let content = r#"
[[rules]]
pattern = "src/**/*.rs"
replace = "s/OldName/NewName/g"

[[rules]]
pattern = ["**/*.json", "!vendor/**"]
filter = "jq -S ."
mode = "644"
"#;
		let path = PathBuf::from("test.toml");
		let config = parse_config_str(content, &path).unwrap();

		assert_eq!(config.rules.len(), 2);

		let rule1 = &config.rules[0];
		assert_eq!(rule1.pattern, PatternSpec::One("src/**/*.rs".to_string()));
		assert_eq!(rule1.replace, Some("s/OldName/NewName/g".to_string()));

		let rule2 = &config.rules[1];
		assert_eq!(rule2.pattern.as_slice(), ["**/*.json", "!vendor/**"]);
		assert_eq!(rule2.filter, Some("jq -S .".to_string()));
		assert_eq!(rule2.mode, Some("644".to_string()));
	}

	#[test]
	fn test_parse_rules_inline_tables() {
		let content = r#"
rules = [
    { pattern = "VERSION", content = "2.0.0\n" },
    { pattern = "LICENSE", content_from = "templates/LICENSE" },
]
"#;
		let path = PathBuf::from("test.toml");
		let config = parse_config_str(content, &path).unwrap();

		assert_eq!(config.rules.len(), 2);
		assert_eq!(config.rules[0].content, Some("2.0.0\n".to_string()));
		assert_eq!(
			config.rules[1].content_from,
			Some(PathBuf::from("templates/LICENSE"))
		);
	}

	#[test]
	fn test_mutually_exclusive_content_options() {
		let content = r#"
[[rules]]
pattern = "**"
replace = "s/foo/bar/"
filter = "cat"
"#;
		let path = PathBuf::from("test.toml");
		let result = parse_config_str(content, &path);

		assert!(result.is_err());
		match result.unwrap_err() {
			PatchError::MutuallyExclusive { option1, option2 } => {
				assert_eq!(option1, "replace");
				assert_eq!(option2, "filter");
			}
			_ => panic!("Expected MutuallyExclusive error"),
		}
	}

	#[test]
	fn test_rule_without_action() {
		let content = r#"
[[rules]]
pattern = "**"

[[rules]]
pattern = "*.md"
"#;
		let path = PathBuf::from("test.toml");
		match parse_config_str(content, &path).unwrap_err() {
			PatchError::EmptyRule { index } => assert_eq!(index, 0),
			_ => panic!("Expected EmptyRule error"),
		}
	}

	#[test]
	fn test_rule_without_pattern() {
		let content = r#"
[[rules]]
content = "x"
"#;
		let path = PathBuf::from("test.toml");
		assert!(matches!(
			parse_config_str(content, &path),
			Err(PatchError::MissingPattern { index: 0 })
		));
	}

	#[test]
	fn test_mode_only_rule_is_valid() {
		let content = r#"
[[rules]]
pattern = "bin/*"
mode = "755"
"#;
		let path = PathBuf::from("test.toml");
		assert!(parse_config_str(content, &path).is_ok());
	}

	#[test]
	fn test_invalid_mode() {
		let content = r#"
[[rules]]
pattern = "bin/*"
mode = "rwxr-xr-x"
"#;
		let path = PathBuf::from("test.toml");
		match parse_config_str(content, &path).unwrap_err() {
			PatchError::InvalidMode { value } => assert_eq!(value, "rwxr-xr-x"),
			_ => panic!("Expected InvalidMode error"),
		}
	}

	#[test]
	fn test_unknown_rule_key_is_rejected() {
		let content = r#"
[[rules]]
pattern = "*.md"
contnet = "typo"
"#;
		let path = PathBuf::from("test.toml");
		assert!(matches!(
			parse_config_str(content, &path),
			Err(PatchError::ConfigParseError { .. })
		));
	}
}
