use crate::error::PatchError;
use crate::tree::FileMode;
use serde::Deserialize;
use std::path::PathBuf;

/// Top-level configuration from a `.branchpatch.toml` file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
	/// Branch whose tree provides the original files. Defaults to `main`.
	#[serde(default)]
	pub upstream: Option<String>,

	/// If true, report changed files without writing them.
	#[serde(default)]
	pub dry_run: bool,

	/// Rules applied to every file, in order.
	/// Every matching rule runs; later rules see earlier edits.
	#[serde(default)]
	pub rules: Vec<Rule>,
}

/// One pattern or a list of patterns.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PatternSpec {
	One(String),
	Many(Vec<String>),
}

impl Default for PatternSpec {
	fn default() -> Self {
		PatternSpec::Many(Vec::new())
	}
}

impl PatternSpec {
	pub fn as_slice(&self) -> &[String] {
		match self {
			PatternSpec::One(pattern) => std::slice::from_ref(pattern),
			PatternSpec::Many(patterns) => patterns,
		}
	}
}

/// A rule for matching and transforming files.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct Rule {
	/// Path pattern(s) selecting the files this rule applies to.
	/// Prefix a pattern with `!` to exclude; the first pattern that applies wins.
	#[serde(default)]
	pub pattern: PatternSpec,

	/// Regex substitution applied to the file content (mutually exclusive with content,
	/// content_from and filter).
	/// Format: "s/pattern/replacement/" or "s/pattern/replacement/g" for global.
	pub replace: Option<String>,

	/// Literal replacement content.
	pub content: Option<String>,

	/// File whose bytes become the new content, relative to the config file.
	pub content_from: Option<PathBuf>,

	/// Shell command reading the content on stdin and writing the new content to stdout.
	pub filter: Option<String>,

	/// Octal file mode applied when the file is written, e.g. "755".
	pub mode: Option<String>,
}

/// A loaded configuration with its source path for debugging/display.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
	/// The parsed configuration.
	pub config: Config,

	/// The path this config was loaded from.
	pub path: PathBuf,
}

impl Rule {
	/// Validate a rule. `index` is the zero-based position in the config.
	pub fn validate(&self, index: usize) -> Result<(), PatchError> {
		if self.pattern.as_slice().is_empty() {
			return Err(PatchError::MissingPattern { index });
		}

		let content_fields = [
			("replace", self.replace.is_some()),
			("content", self.content.is_some()),
			("content_from", self.content_from.is_some()),
			("filter", self.filter.is_some()),
		];

		let set_fields: Vec<_> = content_fields
			.iter()
			.filter(|(_, is_set)| *is_set)
			.map(|(name, _)| *name)
			.collect();

		if set_fields.len() > 1 {
			return Err(PatchError::MutuallyExclusive {
				option1: set_fields[0].to_string(),
				option2: set_fields[1].to_string(),
			});
		}

		if set_fields.is_empty() && self.mode.is_none() {
			return Err(PatchError::EmptyRule { index });
		}

		self.file_mode()?;

		Ok(())
	}

	/// The parsed `mode`, if set.
	pub fn file_mode(&self) -> Result<Option<FileMode>, PatchError> {
		self.mode
			.as_deref()
			.map(|mode| {
				FileMode::parse(mode).ok_or_else(|| PatchError::InvalidMode {
					value: mode.to_string(),
				})
			})
			.transpose()
	}
}

impl Config {
	/// Validate all rules in this config.
	pub fn validate(&self) -> Result<(), PatchError> {
		for (index, rule) in self.rules.iter().enumerate() {
			rule.validate(index)?;
		}
		Ok(())
	}
}
