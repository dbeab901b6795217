use crate::apply::File;
use crate::error::{PatchError, Result};
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::debug;

/// Run-wide context handed to filter commands.
#[derive(Debug, Clone)]
pub struct FilterContext {
	/// Repository root; filters run with this as their working directory.
	pub root: PathBuf,

	/// Upstream branch the files were read from.
	pub upstream: String,
}

/// Build environment variables for filter execution.
pub fn build_filter_env(file: &File<'_>, ctx: &FilterContext) -> HashMap<String, String> {
	let mut env = HashMap::new();

	env.insert("BRANCHPATCH_PATH".to_string(), file.path().to_string());
	env.insert("BRANCHPATCH_MODE".to_string(), file.mode().to_string());
	env.insert("BRANCHPATCH_SIZE".to_string(), file.size().to_string());
	env.insert("BRANCHPATCH_UPSTREAM".to_string(), ctx.upstream.clone());
	env.insert(
		"BRANCHPATCH_ROOT".to_string(),
		ctx.root.to_string_lossy().to_string(),
	);

	env
}

/// Pipe the current content of `file` through a shell command.
///
/// Returns the command's stdout. A non-zero exit status is an error.
pub fn run_filter(command: &str, file: &File<'_>, ctx: &FilterContext) -> Result<Vec<u8>> {
	let failed = |source| PatchError::FilterFailed {
		command: command.to_string(),
		source,
	};

	let input = file.content()?;
	let env = build_filter_env(file, ctx);

	let mut child = Command::new("sh")
		.arg("-c")
		.arg(command)
		.current_dir(&ctx.root)
		.stdin(Stdio::piped())
		.stdout(Stdio::piped())
		.stderr(Stdio::inherit())
		.envs(&env)
		.spawn()
		.map_err(failed)?;

	let stdin = child.stdin.take();
	let input = input.as_ref();

	// Feed stdin from a second thread so a filter that writes before it has
	// read everything cannot fill the stdout pipe and deadlock.
	let (fed, output) = std::thread::scope(|scope| {
		let feeder = scope.spawn(move || match stdin {
			Some(mut stdin) => stdin.write_all(input),
			None => Ok(()),
		});
		let output = child.wait_with_output();
		let fed = feeder
			.join()
			.unwrap_or_else(|_| Err(io::Error::other("stdin feeder panicked")));
		(fed, output)
	});

	let output = output.map_err(failed)?;
	// Filters are free to ignore their input.
	if let Err(err) = fed
		&& err.kind() != io::ErrorKind::BrokenPipe
	{
		return Err(failed(err));
	}

	let exit_code = output.status.code().unwrap_or(-1);
	if exit_code != 0 {
		return Err(PatchError::FilterNonZeroExit {
			command: command.to_string(),
			path: file.path().to_string(),
			exit_code,
		});
	}

	debug!(command, path = file.path(), bytes = output.stdout.len(), "filter finished");
	Ok(output.stdout)
}
