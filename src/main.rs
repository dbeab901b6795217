use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

use branchpatch::config::{INIT_TEMPLATE, LoadedConfig, default_config_path, load_config};
use branchpatch::hooks::FilterContext;
use branchpatch::pattern::{MatchResult, compile_all, first_hit};
use branchpatch::rules::{compile_rules, install_rules};
use branchpatch::tree::find_repository_root;
use branchpatch::{App, DEFAULT_UPSTREAM};

#[derive(Parser)]
#[command(name = "branchpatch")]
#[command(
	author,
	version,
	about = "Rewrite working-tree files from a git branch snapshot using declarative rules"
)]
struct Cli {
	#[command(subcommand)]
	command: Option<Commands>,

	/// Rules file to use instead of .branchpatch.toml at the repository root
	#[arg(long, global = true, value_name = "PATH")]
	config: Option<PathBuf>,

	/// Branch to read original files from (overrides `upstream` in the config)
	#[arg(long, global = true, value_name = "BRANCH")]
	from: Option<String>,

	/// Print "edit <path>" for changed files instead of writing them
	#[arg(short = 'n', long, global = true)]
	dry_run: bool,

	/// Run as if started in DIR
	#[arg(short = 'C', global = true, value_name = "DIR")]
	directory: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
	/// Apply the configured rules to the working tree (default)
	Apply,

	/// Create a template .branchpatch.toml at the repository root
	Init {
		/// Overwrite an existing config file
		#[arg(long)]
		force: bool,
	},

	/// Configuration management commands
	Config {
		#[command(subcommand)]
		action: ConfigAction,
	},

	/// Show which pattern decides whether PATH is selected
	Match {
		/// Slash-separated path relative to the repository root
		path: String,

		/// Patterns evaluated in order; prefix with `!` to exclude
		#[arg(required = true, allow_hyphen_values = true)]
		patterns: Vec<String>,
	},
}

#[derive(Subcommand)]
enum ConfigAction {
	/// Display the effective configuration and its rules
	Show,
	/// Parse the config and compile its rules without touching any file
	Validate,
}

fn main() -> ExitCode {
	init_logging();

	match run() {
		Ok(code) => code,
		Err(e) => {
			eprintln!("error: {e:?}");
			ExitCode::FAILURE
		}
	}
}

fn init_logging() {
	use tracing_subscriber::EnvFilter;

	let filter = std::env::var("BRANCHPATCH_LOG")
		.or_else(|_| std::env::var("RUST_LOG"))
		.unwrap_or_else(|_| "warn".to_string());

	let subscriber = tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::new(filter))
		.with_writer(std::io::stderr)
		.with_target(false)
		.compact()
		.finish();

	if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
		eprintln!("failed to initialize logging: {err}");
	}
}

fn run() -> Result<ExitCode> {
	let cli = Cli::parse();

	match cli.command {
		None | Some(Commands::Apply) => handle_apply(&cli),
		Some(Commands::Init { force }) => handle_init(&cli, force),
		Some(Commands::Config { ref action }) => match action {
			ConfigAction::Show => handle_config_show(&cli),
			ConfigAction::Validate => handle_config_validate(&cli),
		},
		Some(Commands::Match {
			ref path,
			ref patterns,
		}) => Ok(handle_match(path, patterns)),
	}
}

/// Find the repository root from `-C` or the current directory.
fn repository_root(cli: &Cli) -> Result<PathBuf> {
	let start = match cli.directory {
		Some(ref dir) => dir.clone(),
		None => std::env::current_dir().context("Failed to get current directory")?,
	};

	Ok(find_repository_root(&start)?)
}

fn load(cli: &Cli, root: &Path) -> Result<LoadedConfig> {
	load_config(cli.config.as_deref(), root).context("Failed to load configuration")
}

/// Upstream precedence: `--from`, then the config, then the default.
fn effective_upstream(cli: &Cli, loaded: &LoadedConfig) -> String {
	cli.from
		.clone()
		.or_else(|| loaded.config.upstream.clone())
		.unwrap_or_else(|| DEFAULT_UPSTREAM.to_string())
}

fn handle_apply(cli: &Cli) -> Result<ExitCode> {
	let root = repository_root(cli)?;
	let loaded = load(cli, &root)?;
	let rules = compile_rules(&loaded).context("Failed to compile rules")?;

	let upstream = effective_upstream(cli, &loaded);
	let mut app = App::from(upstream.as_str());
	app.set_dry_run(cli.dry_run || loaded.config.dry_run);

	let ctx = FilterContext {
		root: root.clone(),
		upstream,
	};
	install_rules(&mut app, rules, &ctx);

	let report = app
		.run_at(&root)
		.with_context(|| format!("Failed to apply rules from {}", loaded.path.display()))?;

	for path in report.written() {
		info!(path = %path, "written");
	}

	Ok(ExitCode::SUCCESS)
}

fn handle_init(cli: &Cli, force: bool) -> Result<ExitCode> {
	let root = repository_root(cli)?;
	let config_path = cli
		.config
		.clone()
		.unwrap_or_else(|| default_config_path(&root));

	if config_path.exists() && !force {
		anyhow::bail!(
			"{} already exists. Use --force to overwrite.",
			config_path.display()
		);
	}

	std::fs::write(&config_path, INIT_TEMPLATE)
		.with_context(|| format!("Failed to write {}", config_path.display()))?;

	println!("Created {}", config_path.display());
	Ok(ExitCode::SUCCESS)
}

fn handle_config_show(cli: &Cli) -> Result<ExitCode> {
	let root = repository_root(cli)?;
	let loaded = load(cli, &root)?;
	let config = &loaded.config;

	println!("# Source: {}", loaded.path.display());
	println!("# upstream: {}", effective_upstream(cli, &loaded));
	println!("# dry-run: {}", cli.dry_run || config.dry_run);
	println!("# rules: {}", config.rules.len());
	println!();

	for (i, rule) in config.rules.iter().enumerate() {
		println!("  Rule {}:", i + 1);
		println!("    pattern: {}", rule.pattern.as_slice().join(", "));
		if let Some(ref replace) = rule.replace {
			println!("    replace: {}", replace);
		}
		if let Some(ref content) = rule.content {
			println!("    content: {:?}", content);
		}
		if let Some(ref content_from) = rule.content_from {
			println!("    content_from: {}", content_from.display());
		}
		if let Some(ref filter) = rule.filter {
			println!("    filter: {}", filter);
		}
		if let Some(ref mode) = rule.mode {
			println!("    mode: {}", mode);
		}
		println!();
	}

	Ok(ExitCode::SUCCESS)
}

fn handle_config_validate(cli: &Cli) -> Result<ExitCode> {
	let root = repository_root(cli)?;

	let checked = load_config(cli.config.as_deref(), &root)
		.and_then(|loaded| compile_rules(&loaded).map(|rules| (loaded, rules.len())));

	match checked {
		Ok((loaded, count)) => {
			println!(
				"Configuration is valid: {} ({} rules)",
				loaded.path.display(),
				count
			);
			Ok(ExitCode::SUCCESS)
		}
		Err(e) => {
			eprintln!("Configuration error: {:#}", anyhow::Error::from(e));
			Ok(ExitCode::FAILURE)
		}
	}
}

fn handle_match(path: &str, patterns: &[String]) -> ExitCode {
	let compiled = compile_all(patterns);

	match first_hit(&compiled, path) {
		Some((index, result)) => {
			println!(
				"{}: {} by pattern {} ({})",
				path,
				result.as_str(),
				index + 1,
				compiled[index]
			);
			if result == MatchResult::Matched {
				ExitCode::SUCCESS
			} else {
				ExitCode::FAILURE
			}
		}
		None => {
			println!("{}: {}", path, MatchResult::NotMatched.as_str());
			ExitCode::FAILURE
		}
	}
}
