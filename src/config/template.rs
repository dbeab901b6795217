/// Commented starter config written by `branchpatch init`.
///
/// Every rule is commented out, so the template parses to an empty rule set.
pub const INIT_TEMPLATE: &str = r#"# branchpatch configuration
#
# Files are read from the upstream branch snapshot, passed through every
# matching rule in order, and written to the working tree only when a rule
# replaced their content.

# Branch whose tree provides the original files.
upstream = "main"

# Report "edit <path>" for changed files instead of writing them.
dry-run = false

# Patterns match slash-separated paths segment by segment:
#   "*.md"          top-level markdown files
#   "**/*.md"       markdown files at any depth
#   "!vendor/**"    exclude; the first pattern that applies decides
#
# Each rule sets at most one of: replace, content, content_from, filter.
# A rule may also set (or only set) mode.

# [[rules]]
# pattern = ["src/**/*.rs", "!src/generated/**"]
# replace = "s/OldName/NewName/g"

# [[rules]]
# pattern = "VERSION"
# content = "2.0.0\n"

# [[rules]]
# pattern = "LICENSE"
# content_from = "templates/LICENSE"

# [[rules]]
# pattern = "**/*.json"
# filter = "jq -S ."

# [[rules]]
# pattern = "scripts/*.sh"
# mode = "755"
"#;

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::parse_config_str;
	use std::path::Path;

	#[test]
	fn test_template_parses() {
		let config = parse_config_str(INIT_TEMPLATE, Path::new(".branchpatch.toml")).unwrap();
		assert_eq!(config.upstream.as_deref(), Some("main"));
		assert!(!config.dry_run);
		assert!(config.rules.is_empty());
	}

	#[test]
	fn test_template_examples_parse_when_uncommented() {
		const RULE_LINES: [&str; 7] = [
			"[[rules]]",
			"pattern =",
			"replace =",
			"content =",
			"content_from =",
			"filter =",
			"mode =",
		];

		let uncommented: String = INIT_TEMPLATE
			.lines()
			.map(|line| match line.strip_prefix("# ") {
				Some(rest) if RULE_LINES.iter().any(|key| rest.starts_with(key)) => rest.to_string(),
				_ => line.to_string(),
			})
			.collect::<Vec<_>>()
			.join("\n");

		let config = parse_config_str(&uncommented, Path::new(".branchpatch.toml")).unwrap();
		assert_eq!(config.rules.len(), 5);
	}
}
