use crate::error::Result;
use crate::tree::{BlobReader, FileMode, TreeFile, TreeSnapshot};
use std::cell::Cell;
use std::collections::BTreeMap;
use std::io::{self, Read};

#[derive(Debug)]
struct MemoryEntry {
	mode: FileMode,
	data: Vec<u8>,
	opens: Cell<usize>,
}

/// A snapshot held entirely in memory.
///
/// Files are visited in lexicographic path order. Every blob open is
/// counted so callers can verify which files were actually read.
#[derive(Debug, Default)]
pub struct MemoryTree {
	entries: BTreeMap<String, MemoryEntry>,
}

impl MemoryTree {
	pub fn new() -> Self {
		Self::default()
	}

	/// Add or replace a file.
	pub fn insert(&mut self, path: impl Into<String>, mode: FileMode, data: impl Into<Vec<u8>>) {
		self.entries.insert(
			path.into(),
			MemoryEntry {
				mode,
				data: data.into(),
				opens: Cell::new(0),
			},
		);
	}

	/// Builder form of [`MemoryTree::insert`] for regular files.
	pub fn with_file(mut self, path: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
		self.insert(path, FileMode::REGULAR, data);
		self
	}

	/// How many times the blob at `path` has been opened.
	pub fn open_count(&self, path: &str) -> usize {
		self.entries.get(path).map_or(0, |e| e.opens.get())
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

struct MemoryBlob<'a> {
	entry: &'a MemoryEntry,
}

impl BlobReader for MemoryBlob<'_> {
	fn open(&self) -> io::Result<Box<dyn Read + '_>> {
		self.entry.opens.set(self.entry.opens.get() + 1);
		Ok(Box::new(self.entry.data.as_slice()))
	}
}

impl TreeSnapshot for MemoryTree {
	fn for_each_file(&self, visit: &mut dyn FnMut(&TreeFile<'_>) -> Result<()>) -> Result<()> {
		for (path, entry) in &self.entries {
			let file = TreeFile::new(
				path.as_str(),
				entry.mode,
				entry.data.len() as u64,
				MemoryBlob { entry },
			);
			visit(&file)?;
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::PatchError;

	#[test]
	fn test_visits_in_path_order() {
		let tree = MemoryTree::new()
			.with_file("src/main.rs", "fn main() {}")
			.with_file("README.md", "# readme")
			.with_file("src/lib.rs", "");

		let mut seen = Vec::new();
		tree.for_each_file(&mut |file| {
			seen.push((file.path().to_string(), file.size()));
			Ok(())
		})
		.unwrap();

		assert_eq!(
			seen,
			vec![
				("README.md".to_string(), 8),
				("src/lib.rs".to_string(), 0),
				("src/main.rs".to_string(), 12),
			]
		);
	}

	#[test]
	fn test_counts_opens() {
		let tree = MemoryTree::new().with_file("a.txt", "alpha");
		assert_eq!(tree.open_count("a.txt"), 0);

		tree.for_each_file(&mut |file| {
			let mut buf = String::new();
			file.open()?.read_to_string(&mut buf).unwrap();
			assert_eq!(buf, "alpha");
			Ok(())
		})
		.unwrap();

		assert_eq!(tree.open_count("a.txt"), 1);
		assert_eq!(tree.open_count("missing"), 0);
	}

	#[test]
	fn test_visit_error_stops_walk() {
		let tree = MemoryTree::new()
			.with_file("a", "")
			.with_file("b", "")
			.with_file("c", "");

		let mut visited = 0;
		let result = tree.for_each_file(&mut |file| {
			visited += 1;
			if file.path() == "b" {
				return Err(PatchError::EmptyRule { index: 0 });
			}
			Ok(())
		});

		assert!(result.is_err());
		assert_eq!(visited, 2);
	}
}
