use crate::error::{PatchError, Result};
use crate::tree::{BlobReader, FileMode, TreeFile, TreeSnapshot};
use git2::{BranchType, ObjectType, Odb, Oid, Reference, Repository, Tree};
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Find the repository root by walking up from `start`.
///
/// The root is the first directory containing a `.git` entry. Both a
/// `.git` directory and a `.git` file (linked worktrees) are accepted.
pub fn find_repository_root(start: &Path) -> Result<PathBuf> {
	let start = std::path::absolute(start).map_err(|source| PatchError::CurrentDir { source })?;
	let mut current = start.as_path();

	loop {
		if current.join(".git").exists() {
			return Ok(current.to_path_buf());
		}

		match current.parent() {
			Some(parent) => current = parent,
			None => return Err(PatchError::NotARepository { start }),
		}
	}
}

/// A git repository opened at its root.
pub struct GitRepository {
	repo: Repository,
	root: PathBuf,
}

impl GitRepository {
	pub fn open(root: &Path) -> Result<Self> {
		let repo = Repository::open(root).map_err(|source| PatchError::RepositoryOpen {
			path: root.to_path_buf(),
			source,
		})?;
		Ok(GitRepository {
			repo,
			root: root.to_path_buf(),
		})
	}

	/// Locate the repository containing `start` and open it.
	pub fn discover(start: &Path) -> Result<Self> {
		let root = find_repository_root(start)?;
		Self::open(&root)
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	/// Resolve a branch name to the tree of its tip commit.
	///
	/// Local branches take precedence over remote-tracking branches of the
	/// same short name (e.g. `origin/main`).
	pub fn resolve_branch_tree(&self, branch: &str) -> Result<GitTree<'_>> {
		let reference = self.find_branch_reference(branch)?;
		let tree_error = |source| PatchError::TreeResolve {
			branch: branch.to_string(),
			source,
		};

		let commit = reference.peel_to_commit().map_err(tree_error)?;
		let tree = commit.tree().map_err(tree_error)?;
		let odb = self.repo.odb().map_err(tree_error)?;
		debug!(branch, commit = %commit.id(), tree = %tree.id(), "resolved upstream tree");

		Ok(GitTree {
			repo: &self.repo,
			odb,
			tree,
		})
	}

	fn find_branch_reference(&self, branch: &str) -> Result<Reference<'_>> {
		match self.repo.find_branch(branch, BranchType::Local) {
			Ok(found) => Ok(found.into_reference()),
			Err(local_error) => self
				.repo
				.find_branch(branch, BranchType::Remote)
				.map(|found| found.into_reference())
				.map_err(|_| PatchError::BranchNotFound {
					branch: branch.to_string(),
					source: local_error,
				}),
		}
	}
}

/// The tree of one commit, enumerated lazily from the object database.
pub struct GitTree<'r> {
	repo: &'r Repository,
	odb: Odb<'r>,
	tree: Tree<'r>,
}

impl GitTree<'_> {
	fn walk(
		&self,
		tree: &Tree<'_>,
		prefix: &str,
		visit: &mut dyn FnMut(&TreeFile<'_>) -> Result<()>,
	) -> Result<()> {
		for entry in tree.iter() {
			let name = std::str::from_utf8(entry.name_bytes()).map_err(|source| {
				PatchError::NonUtf8Name {
					parent: prefix.to_string(),
					source,
				}
			})?;
			let path = if prefix.is_empty() {
				name.to_string()
			} else {
				format!("{prefix}/{name}")
			};

			match entry.kind() {
				Some(ObjectType::Tree) => {
					let subtree = self.repo.find_tree(entry.id()).map_err(|source| {
						PatchError::TreeWalk {
							path: path.clone(),
							source,
						}
					})?;
					self.walk(&subtree, &path, visit)?;
				}
				Some(ObjectType::Blob) => {
					let (size, _) = self.odb.read_header(entry.id()).map_err(|source| {
						PatchError::TreeWalk {
							path: path.clone(),
							source,
						}
					})?;
					let mode = FileMode::from_bits(entry.filemode() as u32);
					let blob = GitBlob {
						repo: self.repo,
						odb: &self.odb,
						oid: entry.id(),
					};
					visit(&TreeFile::new(path, mode, size as u64, blob))?;
				}
				// Submodule commits have no content in this repository.
				_ => continue,
			}
		}
		Ok(())
	}
}

impl TreeSnapshot for GitTree<'_> {
	fn for_each_file(&self, visit: &mut dyn FnMut(&TreeFile<'_>) -> Result<()>) -> Result<()> {
		self.walk(&self.tree, "", visit)
	}
}

struct GitBlob<'a> {
	repo: &'a Repository,
	odb: &'a Odb<'a>,
	oid: Oid,
}

impl BlobReader for GitBlob<'_> {
	fn open(&self) -> io::Result<Box<dyn Read + '_>> {
		// Packed objects cannot be streamed by libgit2; load those whole.
		match self.odb.reader(self.oid) {
			Ok((reader, _, _)) => Ok(Box::new(reader)),
			Err(_) => {
				let blob = self.repo.find_blob(self.oid).map_err(io::Error::other)?;
				Ok(Box::new(Cursor::new(blob.content().to_vec())))
			}
		}
	}
}
