use globset::{GlobBuilder, GlobMatcher};
use std::borrow::Cow;
use std::fmt;

const EXCLUDE_PREFIX: char = '!';
const RECURSIVE_SEGMENT: &str = "**";
const SEPARATOR: char = '/';

/// Outcome of matching one pattern against a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult {
	/// The pattern does not apply to the path.
	NotMatched,

	/// The path is selected by an inclusion pattern.
	Matched,

	/// The path is rejected by a `!`-prefixed pattern.
	Excluded,
}

impl MatchResult {
	/// Human readable label used by the CLI.
	pub fn as_str(&self) -> &'static str {
		match self {
			MatchResult::NotMatched => "not matched",
			MatchResult::Matched => "matched",
			MatchResult::Excluded => "excluded",
		}
	}
}

/// One path segment of a compiled pattern.
#[derive(Debug, Clone)]
struct Segment {
	/// `None` when the fragment is not a valid glob; such a segment never matches.
	matcher: Option<GlobMatcher>,
}

impl Segment {
	fn new(text: &str) -> Self {
		let matcher = GlobBuilder::new(&literal_braces(text))
			.literal_separator(true)
			.build()
			.ok()
			.map(|glob| glob.compile_matcher());

		Segment { matcher }
	}

	fn is_match(&self, name: &str) -> bool {
		self.matcher.as_ref().is_some_and(|m| m.is_match(name))
	}
}

/// Make `{` and `}` literal outside character classes.
///
/// Segments use plain filename globbing, which has no brace alternation.
fn literal_braces(text: &str) -> Cow<'_, str> {
	if !text.contains(['{', '}']) {
		return Cow::Borrowed(text);
	}

	let mut out = String::with_capacity(text.len() + 4);
	let mut in_class = false;
	let mut chars = text.chars();
	while let Some(c) = chars.next() {
		match c {
			'\\' => {
				out.push(c);
				if let Some(next) = chars.next() {
					out.push(next);
				}
			}
			'[' if !in_class => {
				in_class = true;
				out.push(c);
				// A leading `]` (after an optional negation) is a literal member.
				let rest = chars.as_str();
				let skip = match rest.as_bytes() {
					[b'!' | b'^', b']', ..] => 2,
					[b']', ..] => 1,
					_ => 0,
				};
				out.push_str(&rest[..skip]);
				chars = rest[skip..].chars();
			}
			']' if in_class => {
				in_class = false;
				out.push(c);
			}
			'{' | '}' if !in_class => {
				out.push('[');
				out.push(c);
				out.push(']');
			}
			_ => out.push(c),
		}
	}
	Cow::Owned(out)
}

/// A compiled path pattern.
///
/// Patterns are split on `/` into segments that are matched one-to-one
/// against path segments. A single `**` segment absorbs zero or more
/// path segments, and a leading `!` turns the pattern into an exclusion.
#[derive(Debug, Clone)]
pub struct Pattern {
	source: String,
	segments: Vec<Segment>,
	recursive: Option<usize>,
	exclude: bool,
}

impl Pattern {
	/// The pattern string this was compiled from.
	pub fn as_str(&self) -> &str {
		&self.source
	}

	/// Whether this is a `!`-prefixed exclusion pattern.
	pub fn is_exclude(&self) -> bool {
		self.exclude
	}

	/// Index of the `**` segment, if any.
	pub fn recursive_index(&self) -> Option<usize> {
		self.recursive
	}

	/// Number of segments, including the `**` segment.
	pub fn segment_count(&self) -> usize {
		self.segments.len()
	}

	/// Match this pattern against a path already split into segments.
	pub fn matches(&self, path: &[&str]) -> MatchResult {
		let hit = match self.recursive {
			None => path.len() == self.segments.len() && match_segments(&self.segments, path),
			Some(k) => {
				let after = &self.segments[k + 1..];
				path.len() + 1 >= self.segments.len()
					&& match_segments(&self.segments[..k], &path[..k])
					&& match_segments(after, &path[path.len() - after.len()..])
			}
		};

		match (hit, self.exclude) {
			(false, _) => MatchResult::NotMatched,
			(true, true) => MatchResult::Excluded,
			(true, false) => MatchResult::Matched,
		}
	}
}

impl fmt::Display for Pattern {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.source)
	}
}

fn match_segments(segments: &[Segment], path: &[&str]) -> bool {
	segments
		.iter()
		.zip(path)
		.all(|(segment, name)| segment.is_match(name))
}

/// Compile a single pattern string. Never fails.
pub fn compile(pattern: &str) -> Pattern {
	let (exclude, body) = match pattern.strip_prefix(EXCLUDE_PREFIX) {
		Some(rest) => (true, rest),
		None => (false, pattern),
	};

	let mut recursive = None;
	let segments = body
		.split(SEPARATOR)
		.enumerate()
		.map(|(i, text)| {
			if text == RECURSIVE_SEGMENT && recursive.is_none() {
				recursive = Some(i);
			}
			Segment::new(text)
		})
		.collect::<Vec<_>>();

	Pattern {
		source: pattern.to_string(),
		segments,
		recursive,
		exclude,
	}
}

/// Compile every pattern string, preserving order.
pub fn compile_all<I, S>(patterns: I) -> Vec<Pattern>
where
	I: IntoIterator<Item = S>,
	S: AsRef<str>,
{
	patterns.into_iter().map(|p| compile(p.as_ref())).collect()
}

/// Split a `/`-separated path into segments.
pub fn split_path(path: &str) -> Vec<&str> {
	path.split(SEPARATOR).collect()
}

/// Find the first pattern that matches or excludes `path`.
///
/// Returns the index of the deciding pattern and its outcome, or `None`
/// when no pattern applies.
pub fn first_hit(patterns: &[Pattern], path: &str) -> Option<(usize, MatchResult)> {
	let segments = split_path(path);
	patterns
		.iter()
		.enumerate()
		.map(|(i, p)| (i, p.matches(&segments)))
		.find(|(_, result)| *result != MatchResult::NotMatched)
}

/// First match wins: the earliest matching pattern selects the path, the
/// earliest excluding pattern rejects it.
pub fn match_any(patterns: &[Pattern], path: &str) -> bool {
	matches!(first_hit(patterns, path), Some((_, MatchResult::Matched)))
}
