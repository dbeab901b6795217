use crate::apply::{App, File};
use crate::error::{PatchError, Result};
use crate::tree::{FileMode, GitRepository, TreeFile, TreeSnapshot, find_repository_root};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tracing::{debug, info, trace};

/// Summary of one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
	/// Number of files enumerated from the snapshot.
	pub files_seen: usize,

	/// Paths whose content was replaced, in processing order.
	pub changed: Vec<String>,

	/// Whether changed files were only reported.
	pub dry_run: bool,
}

impl ApplyReport {
	/// Paths actually written to disk.
	pub fn written(&self) -> &[String] {
		if self.dry_run { &[] } else { &self.changed }
	}
}

impl App {
	/// Run against the repository containing the current directory.
	pub fn run(&self) -> Result<ApplyReport> {
		let cwd = std::env::current_dir().map_err(|source| PatchError::CurrentDir { source })?;
		self.run_in(&cwd)
	}

	/// Run against the repository containing `start_dir`.
	pub fn run_in(&self, start_dir: &Path) -> Result<ApplyReport> {
		let root = find_repository_root(start_dir)?;
		self.run_at(&root)
	}

	/// Run against the repository rooted at `root`. Dry-run notices go to stderr.
	pub fn run_at(&self, root: &Path) -> Result<ApplyReport> {
		let repo = GitRepository::open(root)?;
		let tree = repo.resolve_branch_tree(&self.upstream)?;
		info!(root = %root.display(), upstream = %self.upstream, dry_run = self.dry_run, "applying patch rules");
		self.apply_tree(&tree, repo.root(), &mut io::stderr().lock())
	}

	/// Apply every handler to every file of `tree`, writing results under `root`.
	///
	/// In dry-run mode one `edit <path>` line per changed file is written to
	/// `notices` and the filesystem is left alone.
	pub fn apply_tree(
		&self,
		tree: &dyn TreeSnapshot,
		root: &Path,
		notices: &mut dyn Write,
	) -> Result<ApplyReport> {
		let mut report = ApplyReport {
			dry_run: self.dry_run,
			..Default::default()
		};

		tree.for_each_file(&mut |tree_file| {
			report.files_seen += 1;
			if self.apply_file(tree_file, root, notices)? {
				report.changed.push(tree_file.path().to_string());
			}
			Ok(())
		})?;

		info!(
			files = report.files_seen,
			changed = report.changed.len(),
			dry_run = report.dry_run,
			"patch run finished"
		);
		Ok(report)
	}

	/// Returns whether the file was changed.
	fn apply_file(&self, tree_file: &TreeFile<'_>, root: &Path, notices: &mut dyn Write) -> Result<bool> {
		let path = tree_file.path();
		let mut file = File::new(tree_file);

		for handler in &self.handlers {
			if handler.matches(path) {
				handler.call(&mut file)?;
			}
		}

		if file.is_unchanged() {
			trace!(path, "unchanged");
			return Ok(false);
		}

		if self.dry_run {
			writeln!(notices, "edit {path}").map_err(|source| PatchError::Notice {
				path: path.to_string(),
				source,
			})?;
			debug!(path, "edit (dry run)");
			return Ok(true);
		}

		write_file(root, &file)?;
		Ok(true)
	}
}

/// Write the current content of `file` to `root/<path>`.
///
/// Parent directories are created as needed and an existing file is
/// truncated. Content is streamed, so an original blob is never buffered.
pub fn write_file(root: &Path, file: &File<'_>) -> Result<()> {
	let dest = root.join(file.path());
	let write_error = |source| PatchError::WriteFile {
		path: dest.clone(),
		source,
	};

	if let Some(parent) = dest.parent() {
		fs::create_dir_all(parent).map_err(write_error)?;
	}

	let mut reader = file.reader()?;
	let mut out = fs::File::create(&dest).map_err(write_error)?;
	let written = io::copy(&mut reader, &mut out).map_err(write_error)?;
	apply_mode(&dest, file.mode()).map_err(write_error)?;

	debug!(path = file.path(), bytes = written, "wrote file");
	Ok(())
}

#[cfg(unix)]
fn apply_mode(dest: &Path, mode: FileMode) -> io::Result<()> {
	use std::os::unix::fs::PermissionsExt;

	if !mode.is_regular() {
		return Ok(());
	}
	fs::set_permissions(dest, fs::Permissions::from_mode(mode.permissions()))
}

#[cfg(not(unix))]
fn apply_mode(_dest: &Path, _mode: FileMode) -> io::Result<()> {
	Ok(())
}
