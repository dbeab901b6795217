//! The apply pipeline for branchpatch.
//!
//! This module handles:
//! - Handler registration (patterns plus a file callback)
//! - Per-file dispatch over a tree snapshot
//! - Deciding whether each file is skipped, reported (dry run) or written

pub mod file;
pub mod pipeline;

pub use file::{Content, File};
pub use pipeline::{ApplyReport, write_file};

use crate::error::{HandlerError, PatchError, Result};
use crate::pattern::{Pattern, compile, compile_all, match_any};
use std::fmt;

/// Branch read when none is configured.
pub const DEFAULT_UPSTREAM: &str = "main";

type Callback = Box<dyn Fn(&mut File<'_>) -> std::result::Result<(), HandlerError>>;

/// Pattern arguments accepted by [`App::on_file`]: one pattern or a list.
pub trait IntoPatterns {
	fn into_patterns(self) -> Vec<Pattern>;
}

impl IntoPatterns for &str {
	fn into_patterns(self) -> Vec<Pattern> {
		vec![compile(self)]
	}
}

impl IntoPatterns for String {
	fn into_patterns(self) -> Vec<Pattern> {
		vec![compile(&self)]
	}
}

impl IntoPatterns for &String {
	fn into_patterns(self) -> Vec<Pattern> {
		vec![compile(self)]
	}
}

impl<S: AsRef<str>> IntoPatterns for &[S] {
	fn into_patterns(self) -> Vec<Pattern> {
		compile_all(self)
	}
}

impl<S: AsRef<str>, const N: usize> IntoPatterns for [S; N] {
	fn into_patterns(self) -> Vec<Pattern> {
		compile_all(self)
	}
}

impl<S: AsRef<str>> IntoPatterns for Vec<S> {
	fn into_patterns(self) -> Vec<Pattern> {
		compile_all(self)
	}
}

/// A pattern list paired with the callback it triggers.
///
/// The patterns are evaluated as one first-match-wins rule, so a handler
/// fires at most once per file.
pub struct Handler {
	patterns: Vec<Pattern>,
	callback: Callback,
}

impl Handler {
	pub fn new<F>(patterns: Vec<Pattern>, callback: F) -> Self
	where
		F: Fn(&mut File<'_>) -> std::result::Result<(), HandlerError> + 'static,
	{
		Handler {
			patterns,
			callback: Box::new(callback),
		}
	}

	pub fn patterns(&self) -> &[Pattern] {
		&self.patterns
	}

	pub fn matches(&self, path: &str) -> bool {
		match_any(&self.patterns, path)
	}

	pub(crate) fn call(&self, file: &mut File<'_>) -> Result<()> {
		(self.callback)(file).map_err(|source| PatchError::Handler {
			path: file.path().to_string(),
			source,
		})
	}
}

impl fmt::Debug for Handler {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Handler")
			.field("patterns", &self.patterns)
			.finish_non_exhaustive()
	}
}

/// An embeddable patch script: upstream branch, dry-run flag and handlers.
///
/// ```no_run
/// use branchpatch::App;
///
/// let mut app = App::new();
/// app.set_upstream("release");
/// app.on_file(["**/*.toml", "!vendor/**"], |file| {
///     let text = file.text()?.replace("edition = \"2021\"", "edition = \"2024\"");
///     file.set_content(text);
///     Ok(())
/// });
/// app.run().unwrap();
/// ```
#[derive(Debug)]
pub struct App {
	upstream: String,
	dry_run: bool,
	handlers: Vec<Handler>,
}

impl Default for App {
	fn default() -> Self {
		App {
			upstream: DEFAULT_UPSTREAM.to_string(),
			dry_run: false,
			handlers: Vec::new(),
		}
	}
}

impl From<&str> for App {
	fn from(upstream: &str) -> Self {
		let mut app = App::new();
		app.set_upstream(upstream);
		app
	}
}

impl From<String> for App {
	fn from(upstream: String) -> Self {
		let mut app = App::new();
		app.set_upstream(upstream);
		app
	}
}

impl App {
	pub fn new() -> Self {
		Self::default()
	}

	/// Set the branch whose tree provides the original files.
	pub fn set_upstream(&mut self, branch: impl Into<String>) -> &mut Self {
		self.upstream = branch.into();
		self
	}

	/// Report changed files instead of writing them.
	pub fn set_dry_run(&mut self, dry_run: bool) -> &mut Self {
		self.dry_run = dry_run;
		self
	}

	pub fn upstream(&self) -> &str {
		&self.upstream
	}

	pub fn is_dry_run(&self) -> bool {
		self.dry_run
	}

	pub fn handlers(&self) -> &[Handler] {
		&self.handlers
	}

	/// Register a callback for files matching `patterns`.
	///
	/// Handlers run in registration order; later callbacks see the edits
	/// of earlier ones.
	pub fn on_file<P, F>(&mut self, patterns: P, callback: F) -> &mut Self
	where
		P: IntoPatterns,
		F: Fn(&mut File<'_>) -> std::result::Result<(), HandlerError> + 'static,
	{
		self.add_handler(Handler::new(patterns.into_patterns(), callback))
	}

	pub fn add_handler(&mut self, handler: Handler) -> &mut Self {
		self.handlers.push(handler);
		self
	}
}
