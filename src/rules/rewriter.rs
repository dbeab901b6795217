use crate::error::{PatchError, Result};
use regex::bytes::{Regex, RegexBuilder};

/// Parsed substitution command (sed-like syntax).
#[derive(Debug)]
pub struct Substitution {
	/// The pattern to match.
	pub pattern: Regex,

	/// The replacement, with `$1` / `${name}` capture references.
	pub replacement: Vec<u8>,

	/// Whether to replace all occurrences (global flag).
	pub global: bool,
}

impl Substitution {
	/// Parse a substitution string in sed-like format: "s/pattern/replacement/" with optional
	/// trailing flags `g` (global), `i` (case-insensitive) and `m` (multi-line anchors).
	pub fn parse(input: &str) -> Result<Self> {
		let invalid = |reason: &str| PatchError::InvalidSubstitution {
			input: input.to_string(),
			reason: reason.to_string(),
		};

		let mut chars = input.chars();
		if chars.next() != Some('s') {
			return Err(invalid("substitution must start with 's'"));
		}
		let delimiter = chars.next().ok_or_else(|| invalid("substitution too short"))?;
		if delimiter.is_alphanumeric() || delimiter == '\\' || delimiter.is_whitespace() {
			return Err(invalid("delimiter must be punctuation"));
		}

		let parts = split_by_delimiter(chars.as_str(), delimiter);
		if parts.len() < 2 {
			return Err(invalid("substitution must have pattern and replacement"));
		}
		if parts.len() > 3 {
			return Err(invalid("unescaped delimiter in substitution"));
		}

		let pattern_str = &parts[0];
		let replacement = parts[1].clone().into_bytes();
		let flags = parts.get(2).map(String::as_str).unwrap_or("");

		let mut builder = RegexBuilder::new(pattern_str);
		let mut global = false;
		for flag in flags.chars() {
			match flag {
				'g' => global = true,
				'i' => {
					builder.case_insensitive(true);
				}
				'm' => {
					builder.multi_line(true);
				}
				_ => return Err(invalid("unknown flag (expected g, i or m)")),
			}
		}

		let pattern = builder.build().map_err(|source| PatchError::InvalidRegex {
			pattern: pattern_str.to_string(),
			source,
		})?;

		Ok(Substitution {
			pattern,
			replacement,
			global,
		})
	}

	/// Apply this substitution. Returns `None` when the pattern does not match.
	pub fn apply(&self, input: &[u8]) -> Option<Vec<u8>> {
		if !self.pattern.is_match(input) {
			return None;
		}

		let replaced = if self.global {
			self.pattern.replace_all(input, self.replacement.as_slice())
		} else {
			self.pattern.replace(input, self.replacement.as_slice())
		};
		Some(replaced.into_owned())
	}
}

/// Split a string by a delimiter, respecting backslash escapes.
fn split_by_delimiter(input: &str, delimiter: char) -> Vec<String> {
	let mut parts = Vec::new();
	let mut current = String::new();
	let mut chars = input.chars().peekable();

	while let Some(c) = chars.next() {
		if c == '\\' && chars.peek() == Some(&delimiter) {
			// Escaped delimiter
			current.push(delimiter);
			chars.next();
		} else if c == delimiter {
			parts.push(std::mem::take(&mut current));
		} else {
			current.push(c);
		}
	}

	// Add the last part
	parts.push(current);

	parts
}
