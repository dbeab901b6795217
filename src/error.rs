use std::path::PathBuf;

/// Boxed error returned by file callbacks.
///
/// Callbacks may fail with anything that implements `std::error::Error`,
/// including `anyhow::Error` and [`PatchError`] itself.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Library-level structured errors for branchpatch.
///
/// Use `thiserror` for structured errors that library consumers can match on.
/// The CLI binary wraps these with `anyhow` for rich context chains.
#[derive(Debug, thiserror::Error)]
pub enum PatchError {
	#[error("not a git repository (or any of the parent directories): {start}")]
	NotARepository { start: PathBuf },

	#[error("Failed to determine current directory")]
	CurrentDir {
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to open git repository: {path}")]
	RepositoryOpen {
		path: PathBuf,
		#[source]
		source: git2::Error,
	},

	#[error("Failed to resolve upstream branch: {branch}")]
	BranchNotFound {
		branch: String,
		#[source]
		source: git2::Error,
	},

	#[error("Failed to resolve tree for branch: {branch}")]
	TreeResolve {
		branch: String,
		#[source]
		source: git2::Error,
	},

	#[error("Failed to walk tree at: {path}")]
	TreeWalk {
		path: String,
		#[source]
		source: git2::Error,
	},

	#[error("Tree entry name is not valid UTF-8 under: {parent}")]
	NonUtf8Name {
		parent: String,
		#[source]
		source: std::str::Utf8Error,
	},

	#[error("Failed to read blob: {path}")]
	BlobRead {
		path: String,
		#[source]
		source: std::io::Error,
	},

	#[error("File content is not valid UTF-8: {path}")]
	NotUtf8 {
		path: String,
		#[source]
		source: std::str::Utf8Error,
	},

	#[error("Failed to write file: {path}")]
	WriteFile {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to report edit for: {path}")]
	Notice {
		path: String,
		#[source]
		source: std::io::Error,
	},

	#[error("Handler failed on file: {path}")]
	Handler {
		path: String,
		#[source]
		source: HandlerError,
	},

	#[error("Config file not found: {path}")]
	ConfigNotFound { path: PathBuf },

	#[error("Failed to read config file: {path}")]
	ConfigReadError {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to parse config file: {path}")]
	ConfigParseError {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("Invalid regex pattern in rule: {pattern}")]
	InvalidRegex {
		pattern: String,
		#[source]
		source: regex::Error,
	},

	#[error("Invalid substitution: {input} ({reason})")]
	InvalidSubstitution { input: String, reason: String },

	#[error("Invalid file mode in rule: {value}")]
	InvalidMode { value: String },

	#[error("Mutually exclusive options: {option1} and {option2}")]
	MutuallyExclusive { option1: String, option2: String },

	#[error("Rule {index} has no pattern")]
	MissingPattern { index: usize },

	#[error("Rule {index} has no action")]
	EmptyRule { index: usize },

	#[error("Failed to read content file: {path}")]
	ContentFileRead {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Filter command failed: {command}")]
	FilterFailed {
		command: String,
		#[source]
		source: std::io::Error,
	},

	#[error("Filter returned non-zero exit code: {command} on {path} (exit code: {exit_code})")]
	FilterNonZeroExit {
		command: String,
		path: String,
		exit_code: i32,
	},
}

/// Result type alias using PatchError.
pub type Result<T> = std::result::Result<T, PatchError>;
