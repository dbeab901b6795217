use crate::error::{PatchError, Result};
use crate::tree::{FileMode, TreeFile};
use std::borrow::Cow;
use std::io::Read;

/// Where a file's content currently comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
	/// The tracked blob, read lazily and never cached.
	Original,

	/// Bytes supplied by a callback.
	Replaced(Vec<u8>),
}

/// The mutable view of a tracked file handed to callbacks.
///
/// The facts of the tracked blob stay in [`TreeFile`]; this record holds
/// the pending result. A file counts as changed only once its content has
/// been replaced. Mode and size edits alone never cause a write.
#[derive(Debug)]
pub struct File<'t> {
	original: &'t TreeFile<'t>,
	mode: FileMode,
	size: u64,
	content: Content,
}

impl<'t> File<'t> {
	pub fn new(original: &'t TreeFile<'t>) -> Self {
		File {
			original,
			mode: original.mode(),
			size: original.size(),
			content: Content::Original,
		}
	}

	/// Path relative to the tree root, `/`-separated.
	pub fn path(&self) -> &str {
		self.original.path()
	}

	pub fn mode(&self) -> FileMode {
		self.mode
	}

	pub fn set_mode(&mut self, mode: FileMode) {
		self.mode = mode;
	}

	/// Declared size in bytes.
	pub fn size(&self) -> u64 {
		self.size
	}

	pub fn set_size(&mut self, size: u64) {
		self.size = size;
	}

	/// The tracked blob this file started from.
	pub fn original(&self) -> &'t TreeFile<'t> {
		self.original
	}

	pub fn content_source(&self) -> &Content {
		&self.content
	}

	/// Current content. Reads the blob when the content is still original.
	pub fn content(&self) -> Result<Cow<'_, [u8]>> {
		match &self.content {
			Content::Replaced(data) => Ok(Cow::Borrowed(data)),
			Content::Original => {
				let mut data = Vec::with_capacity(self.original.size() as usize);
				self.original
					.open()?
					.read_to_end(&mut data)
					.map_err(|source| PatchError::BlobRead {
						path: self.path().to_string(),
						source,
					})?;
				Ok(Cow::Owned(data))
			}
		}
	}

	/// Current content as UTF-8 text.
	pub fn text(&self) -> Result<Cow<'_, str>> {
		let not_utf8 = |source| PatchError::NotUtf8 {
			path: self.path().to_string(),
			source,
		};
		match self.content()? {
			Cow::Borrowed(data) => std::str::from_utf8(data)
				.map(Cow::Borrowed)
				.map_err(not_utf8),
			Cow::Owned(data) => String::from_utf8(data)
				.map(Cow::Owned)
				.map_err(|e| not_utf8(e.utf8_error())),
		}
	}

	/// Replace the content. The declared size follows the new length.
	pub fn set_content(&mut self, data: impl Into<Vec<u8>>) {
		let data = data.into();
		self.size = data.len() as u64;
		self.content = Content::Replaced(data);
	}

	/// Stream the current content without buffering the original blob.
	pub fn reader(&self) -> Result<Box<dyn Read + '_>> {
		match &self.content {
			Content::Replaced(data) => Ok(Box::new(data.as_slice())),
			Content::Original => self.original.open(),
		}
	}

	/// True while the content is still the tracked blob.
	pub fn is_unchanged(&self) -> bool {
		matches!(self.content, Content::Original)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::tree::{MemoryTree, TreeSnapshot};

	fn with_file<F>(tree: &MemoryTree, mut check: F)
	where
		F: FnMut(&mut File<'_>),
	{
		tree.for_each_file(&mut |tree_file| {
			let mut file = File::new(tree_file);
			check(&mut file);
			Ok(())
		})
		.unwrap();
	}

	#[test]
	fn test_new_file_is_unchanged() {
		let tree = MemoryTree::new().with_file("a.txt", "hello");
		with_file(&tree, |file| {
			assert!(file.is_unchanged());
			assert_eq!(file.path(), "a.txt");
			assert_eq!(file.size(), 5);
			assert_eq!(file.mode(), FileMode::REGULAR);
			assert_eq!(file.content_source(), &Content::Original);
		});
		assert_eq!(tree.open_count("a.txt"), 0);
	}

	#[test]
	fn test_content_reads_blob_lazily() {
		let tree = MemoryTree::new().with_file("a.txt", "hello");
		with_file(&tree, |file| {
			assert_eq!(file.content().unwrap().as_ref(), b"hello");
			assert!(file.is_unchanged());
		});
		assert_eq!(tree.open_count("a.txt"), 1);
	}

	#[test]
	fn test_set_content_updates_size() {
		let tree = MemoryTree::new().with_file("a.txt", "hello");
		with_file(&tree, |file| {
			file.set_content("hi");
			assert!(!file.is_unchanged());
			assert_eq!(file.size(), 2);
			assert_eq!(file.original().size(), 5);
			assert_eq!(file.content().unwrap().as_ref(), b"hi");
			assert!(matches!(file.content().unwrap(), Cow::Borrowed(_)));
		});
		assert_eq!(tree.open_count("a.txt"), 0);
	}

	#[test]
	fn test_identical_bytes_still_count_as_change() {
		let tree = MemoryTree::new().with_file("a.txt", "hello");
		with_file(&tree, |file| {
			let same = file.content().unwrap().into_owned();
			file.set_content(same);
			assert!(!file.is_unchanged());
		});
	}

	#[test]
	fn test_mode_and_size_edits_do_not_change_content() {
		let tree = MemoryTree::new().with_file("run.sh", "#!/bin/sh\n");
		with_file(&tree, |file| {
			file.set_mode(FileMode::EXECUTABLE);
			file.set_size(0);
			assert!(file.is_unchanged());
			assert_eq!(file.mode(), FileMode::EXECUTABLE);
			assert_eq!(file.original().mode(), FileMode::REGULAR);
		});
	}

	#[test]
	fn test_text_rejects_invalid_utf8() {
		let mut tree = MemoryTree::new();
		tree.insert("bin.dat", FileMode::REGULAR, vec![0xff, 0xfe]);
		with_file(&tree, |file| {
			match file.text() {
				Err(PatchError::NotUtf8 { path, .. }) => assert_eq!(path, "bin.dat"),
				other => panic!("Expected NotUtf8 error, got {:?}", other),
			}
			file.set_content("ok");
			assert_eq!(file.text().unwrap(), "ok");
		});
	}

	#[test]
	fn test_reader_follows_current_content() {
		let tree = MemoryTree::new().with_file("a.txt", "hello");
		with_file(&tree, |file| {
			let mut out = String::new();
			file.reader().unwrap().read_to_string(&mut out).unwrap();
			assert_eq!(out, "hello");

			file.set_content("replaced");
			let mut out = String::new();
			file.reader().unwrap().read_to_string(&mut out).unwrap();
			assert_eq!(out, "replaced");
		});
		assert_eq!(tree.open_count("a.txt"), 1);
	}
}
