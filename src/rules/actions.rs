use crate::apply::{App, File, Handler};
use crate::config::types::{LoadedConfig, Rule};
use crate::error::{PatchError, Result};
use crate::hooks::{FilterContext, run_filter};
use crate::pattern::{Pattern, compile_all};
use crate::rules::rewriter::Substitution;
use crate::tree::FileMode;
use std::path::{Path, PathBuf};

/// How a rule produces new content.
#[derive(Debug)]
pub enum ContentAction {
	/// Regex substitution; content is only replaced when the regex matches.
	Replace(Substitution),

	/// Fixed bytes, from `content` or `content_from`.
	Set(Vec<u8>),

	/// Shell command filtering the content.
	Filter(String),
}

/// A rule compiled and ready to be installed as a handler.
#[derive(Debug)]
pub struct CompiledRule {
	/// Zero-based position in the config file.
	pub index: usize,

	/// Compiled path patterns.
	pub patterns: Vec<Pattern>,

	/// Content transformation, if any.
	pub action: Option<ContentAction>,

	/// Mode applied to matching files.
	pub mode: Option<FileMode>,

	/// Source config path (for debugging).
	pub source: PathBuf,
}

impl CompiledRule {
	/// Compile a rule. `base_dir` resolves relative `content_from` paths.
	pub fn from_rule(index: usize, rule: &Rule, base_dir: &Path, source: &Path) -> Result<Self> {
		rule.validate(index)?;

		let action = if let Some(ref replace) = rule.replace {
			Some(ContentAction::Replace(Substitution::parse(replace)?))
		} else if let Some(ref content) = rule.content {
			Some(ContentAction::Set(content.clone().into_bytes()))
		} else if let Some(ref content_from) = rule.content_from {
			let path = base_dir.join(content_from);
			let data =
				std::fs::read(&path).map_err(|source| PatchError::ContentFileRead { path, source })?;
			Some(ContentAction::Set(data))
		} else {
			rule.filter.clone().map(ContentAction::Filter)
		};

		Ok(CompiledRule {
			index,
			patterns: compile_all(rule.pattern.as_slice()),
			action,
			mode: rule.file_mode()?,
			source: source.to_path_buf(),
		})
	}

	/// Apply this rule to a file that matched its patterns.
	pub fn apply(&self, file: &mut File<'_>, ctx: &FilterContext) -> Result<()> {
		match &self.action {
			Some(ContentAction::Replace(sub)) => {
				let replaced = sub.apply(&file.content()?);
				if let Some(data) = replaced {
					file.set_content(data);
				}
			}
			Some(ContentAction::Set(data)) => file.set_content(data.clone()),
			Some(ContentAction::Filter(command)) => {
				let data = run_filter(command, file, ctx)?;
				file.set_content(data);
			}
			None => {}
		}

		if let Some(mode) = self.mode {
			file.set_mode(mode);
		}

		Ok(())
	}

	/// Turn this rule into a pipeline handler.
	pub fn into_handler(self, ctx: FilterContext) -> Handler {
		let patterns = self.patterns.clone();
		Handler::new(patterns, move |file| {
			self.apply(file, &ctx)?;
			Ok(())
		})
	}
}

/// Compile all rules in a loaded config, in file order.
pub fn compile_rules(loaded: &LoadedConfig) -> Result<Vec<CompiledRule>> {
	let base_dir = loaded.path.parent().unwrap_or(Path::new("."));
	loaded
		.config
		.rules
		.iter()
		.enumerate()
		.map(|(index, rule)| CompiledRule::from_rule(index, rule, base_dir, &loaded.path))
		.collect()
}

/// Register every compiled rule on `app` as a handler, preserving order.
pub fn install_rules(app: &mut App, rules: Vec<CompiledRule>, ctx: &FilterContext) {
	for rule in rules {
		app.add_handler(rule.into_handler(ctx.clone()));
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::parse_config_str;
	use crate::tree::MemoryTree;
	use std::fs;

	fn load(content: &str, dir: &Path) -> LoadedConfig {
		let path = dir.join(".branchpatch.toml");
		LoadedConfig {
			config: parse_config_str(content, &path).unwrap(),
			path,
		}
	}

	fn context(root: &Path) -> FilterContext {
		FilterContext {
			root: root.to_path_buf(),
			upstream: "main".to_string(),
		}
	}

	fn apply_config(content: &str, tree: &MemoryTree) -> (tempfile::TempDir, Vec<String>) {
		let temp_dir = tempfile::tempdir().unwrap();
		let loaded = load(content, temp_dir.path());
		let rules = compile_rules(&loaded).unwrap();

		let mut app = App::new();
		install_rules(&mut app, rules, &context(temp_dir.path()));
		let report = app
			.apply_tree(tree, temp_dir.path(), &mut Vec::new())
			.unwrap();
		(temp_dir, report.changed)
	}

	#[test]
	fn test_compile_rules_in_order() {
		let temp_dir = tempfile::tempdir().unwrap();
		let loaded = load(
			r#"
[[rules]]
pattern = ["src/**", "!src/gen/**"]
replace = "s/a/b/"

[[rules]]
pattern = "bin/*"
mode = "755"
"#,
			temp_dir.path(),
		);

		let rules = compile_rules(&loaded).unwrap();
		assert_eq!(rules.len(), 2);
		assert_eq!(rules[0].index, 0);
		assert_eq!(rules[0].patterns.len(), 2);
		assert!(matches!(rules[0].action, Some(ContentAction::Replace(_))));
		assert_eq!(rules[1].mode, Some(FileMode::EXECUTABLE));
		assert!(rules[1].action.is_none());
		assert_eq!(rules[1].source, loaded.path);
	}

	#[test]
	fn test_content_from_is_relative_to_config() {
		let temp_dir = tempfile::tempdir().unwrap();
		fs::create_dir_all(temp_dir.path().join("templates")).unwrap();
		fs::write(temp_dir.path().join("templates/LICENSE"), "MIT\n").unwrap();
		let loaded = load(
			"[[rules]]\npattern = \"LICENSE\"\ncontent_from = \"templates/LICENSE\"\n",
			temp_dir.path(),
		);

		let rules = compile_rules(&loaded).unwrap();
		match &rules[0].action {
			Some(ContentAction::Set(data)) => assert_eq!(data, b"MIT\n"),
			other => panic!("Expected Set action, got {:?}", other),
		}
	}

	#[test]
	fn test_missing_content_from_file() {
		let temp_dir = tempfile::tempdir().unwrap();
		let loaded = load(
			"[[rules]]\npattern = \"LICENSE\"\ncontent_from = \"nope\"\n",
			temp_dir.path(),
		);

		assert!(matches!(
			compile_rules(&loaded),
			Err(PatchError::ContentFileRead { .. })
		));
	}

	#[test]
	fn test_invalid_regex_is_reported_at_compile_time() {
		let temp_dir = tempfile::tempdir().unwrap();
		let loaded = load(
			"[[rules]]\npattern = \"**\"\nreplace = \"s/[/x/\"\n",
			temp_dir.path(),
		);

		assert!(matches!(
			compile_rules(&loaded),
			Err(PatchError::InvalidRegex { .. })
		));
	}

	#[test]
	fn test_replace_without_match_leaves_file_unchanged() {
		let tree = MemoryTree::new()
			.with_file("a.rs", "fn old_name() {}")
			.with_file("b.rs", "fn other() {}");

		let (temp_dir, changed) = apply_config(
			"[[rules]]\npattern = \"*.rs\"\nreplace = \"s/old_name/new_name/g\"\n",
			&tree,
		);

		assert_eq!(changed, vec!["a.rs".to_string()]);
		assert_eq!(
			fs::read_to_string(temp_dir.path().join("a.rs")).unwrap(),
			"fn new_name() {}"
		);
		assert!(!temp_dir.path().join("b.rs").exists());
	}

	#[test]
	fn test_rules_chain_in_file_order() {
		let tree = MemoryTree::new().with_file("VERSION", "1.0.0\n");

		let (temp_dir, changed) = apply_config(
			r#"
[[rules]]
pattern = "VERSION"
content = "2.0.0\n"

[[rules]]
pattern = "**"
replace = "s/2\\.0\\.0/2.0.1/"
"#,
			&tree,
		);

		assert_eq!(changed, vec!["VERSION".to_string()]);
		assert_eq!(
			fs::read_to_string(temp_dir.path().join("VERSION")).unwrap(),
			"2.0.1\n"
		);
	}

	#[test]
	fn test_mode_only_rule_does_not_write() {
		let tree = MemoryTree::new().with_file("bin/tool", "#!/bin/sh\n");

		let (temp_dir, changed) =
			apply_config("[[rules]]\npattern = \"bin/*\"\nmode = \"755\"\n", &tree);

		assert!(changed.is_empty());
		assert!(!temp_dir.path().join("bin/tool").exists());
		assert_eq!(tree.open_count("bin/tool"), 0);
	}

	#[cfg(unix)]
	#[test]
	fn test_filter_rule() {
		let tree = MemoryTree::new().with_file("notes.txt", "shout\n");

		let (temp_dir, changed) = apply_config(
			"[[rules]]\npattern = \"*.txt\"\nfilter = \"tr a-z A-Z\"\n",
			&tree,
		);

		assert_eq!(changed, vec!["notes.txt".to_string()]);
		assert_eq!(
			fs::read_to_string(temp_dir.path().join("notes.txt")).unwrap(),
			"SHOUT\n"
		);
	}

	#[cfg(unix)]
	#[test]
	fn test_failing_filter_aborts_with_path() {
		let temp_dir = tempfile::tempdir().unwrap();
		let loaded = load(
			"[[rules]]\npattern = \"*.txt\"\nfilter = \"exit 1\"\n",
			temp_dir.path(),
		);
		let mut app = App::new();
		install_rules(
			&mut app,
			compile_rules(&loaded).unwrap(),
			&context(temp_dir.path()),
		);

		let tree = MemoryTree::new().with_file("a.txt", "x");
		match app.apply_tree(&tree, temp_dir.path(), &mut Vec::new()) {
			Err(PatchError::Handler { path, source }) => {
				assert_eq!(path, "a.txt");
				assert!(source.to_string().contains("exit code: 1"));
			}
			other => panic!("Expected Handler error, got {:?}", other),
		}
	}
}
