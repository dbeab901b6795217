//! Tree snapshots for branchpatch.
//!
//! This module handles:
//! - The read-only view of tracked files at a commit (path, mode, size, lazy reader)
//! - Git-backed snapshots resolved from a branch name
//! - In-memory snapshots for embedding and tests

pub mod git;
pub mod memory;

pub use git::{GitRepository, GitTree, find_repository_root};
pub use memory::MemoryTree;

use crate::error::{PatchError, Result};
use std::fmt;
use std::io::{self, Read};

/// Git file mode bits of a tracked entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileMode(u32);

impl FileMode {
	pub const REGULAR: FileMode = FileMode(0o100644);
	pub const EXECUTABLE: FileMode = FileMode(0o100755);
	pub const SYMLINK: FileMode = FileMode(0o120000);

	const TYPE_MASK: u32 = 0o170000;
	const TYPE_REGULAR: u32 = 0o100000;

	pub const fn from_bits(bits: u32) -> Self {
		FileMode(bits)
	}

	pub const fn bits(self) -> u32 {
		self.0
	}

	/// Permission bits (the low nine bits).
	pub const fn permissions(self) -> u32 {
		self.0 & 0o777
	}

	pub const fn is_regular(self) -> bool {
		self.0 & Self::TYPE_MASK == Self::TYPE_REGULAR
	}

	pub const fn is_executable(self) -> bool {
		self.is_regular() && self.0 & 0o111 != 0
	}

	pub const fn is_symlink(self) -> bool {
		self.0 & Self::TYPE_MASK == Self::SYMLINK.0
	}

	/// Parse an octal mode such as `755`, `0644` or `100755`.
	///
	/// Bare permission bits are combined with the regular-file type.
	pub fn parse(value: &str) -> Option<FileMode> {
		let bits = u32::from_str_radix(value.trim(), 8).ok()?;
		match bits {
			0..=0o777 => Some(FileMode(Self::TYPE_REGULAR | bits)),
			0o100000..=0o100777 => Some(FileMode(bits)),
			_ => None,
		}
	}
}

impl fmt::Display for FileMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{:06o}", self.0)
	}
}

/// Opens the content of a tracked blob on demand.
pub trait BlobReader {
	fn open(&self) -> io::Result<Box<dyn Read + '_>>;
}

/// Immutable facts about one tracked file in a snapshot.
pub struct TreeFile<'a> {
	path: String,
	mode: FileMode,
	size: u64,
	blob: Box<dyn BlobReader + 'a>,
}

impl<'a> TreeFile<'a> {
	pub fn new(
		path: impl Into<String>,
		mode: FileMode,
		size: u64,
		blob: impl BlobReader + 'a,
	) -> Self {
		TreeFile {
			path: path.into(),
			mode,
			size,
			blob: Box::new(blob),
		}
	}

	/// Path relative to the tree root, `/`-separated.
	pub fn path(&self) -> &str {
		&self.path
	}

	pub fn mode(&self) -> FileMode {
		self.mode
	}

	/// Uncompressed blob size in bytes.
	pub fn size(&self) -> u64 {
		self.size
	}

	/// Open the blob for streaming reads.
	pub fn open(&self) -> Result<Box<dyn Read + '_>> {
		self.blob.open().map_err(|source| PatchError::BlobRead {
			path: self.path.clone(),
			source,
		})
	}
}

impl fmt::Debug for TreeFile<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("TreeFile")
			.field("path", &self.path)
			.field("mode", &self.mode)
			.field("size", &self.size)
			.finish_non_exhaustive()
	}
}

/// A point-in-time view of all tracked files.
pub trait TreeSnapshot {
	/// Visit every file once, depth-first in path order.
	///
	/// The first error returned by `visit` stops the walk and is propagated.
	fn for_each_file(&self, visit: &mut dyn FnMut(&TreeFile<'_>) -> Result<()>) -> Result<()>;
}
