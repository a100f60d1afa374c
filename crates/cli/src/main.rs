//! `gbs` binary.
//!
//! Serves one client over stdin/stdout. Logs go to stderr, or to a per-process file when a
//! log directory is configured, since stdout carries the protocol.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use gbs_rpc::MainLoop;
use gbs_server::BuildServer;
use gbs_server::bridge::{CommandModelProvider, CommandTaskRunner};
use gbs_server::config::{CONFIG_FILE_NAME, ConfigError, ServerConfig};
use tracing::{error, info};

/// Command line arguments.
#[derive(Parser, Debug)]
#[command(name = "gbs", version)]
#[command(about = "Build server for Gradle-style workspaces")]
struct Args {
	/// Config file; defaults to ./gbs.toml, then the user config directory
	#[arg(short, long, value_name = "PATH")]
	config: Option<PathBuf>,

	/// Verbose logging
	#[arg(short, long)]
	verbose: bool,

	/// Write logs to a per-process file in this directory instead of stderr
	#[arg(long, value_name = "DIR")]
	log_dir: Option<PathBuf>,
}

impl Args {
	/// Config files to try, most specific first.
	fn config_candidates(&self) -> Vec<PathBuf> {
		if let Some(path) = &self.config {
			return vec![path.clone()];
		}
		let mut candidates = vec![PathBuf::from(CONFIG_FILE_NAME)];
		if let Some(dir) = dirs::config_dir() {
			candidates.push(dir.join("gbs").join(CONFIG_FILE_NAME));
		}
		candidates
	}

	fn load_config(&self) -> Result<(ServerConfig, Option<PathBuf>), ConfigError> {
		match &self.config {
			Some(path) => Ok((ServerConfig::load(path)?, Some(path.clone()))),
			None => ServerConfig::discover(&self.config_candidates()),
		}
	}

	fn log_dir(&self) -> Option<PathBuf> {
		self.log_dir
			.clone()
			.or_else(|| std::env::var_os("GBS_LOG_DIR").map(PathBuf::from))
	}
}

#[tokio::main]
async fn main() -> ExitCode {
	let args = Args::parse();
	let loaded = args.load_config();
	let configured_filter = loaded.as_ref().ok().and_then(|(config, _)| config.log.filter.clone());
	setup_tracing(args.verbose, args.log_dir(), configured_filter.as_deref());

	let (config, path) = match loaded {
		Ok(loaded) => loaded,
		Err(err) => {
			error!(error = %err, "config.invalid");
			return ExitCode::FAILURE;
		}
	};
	info!(version = env!("CARGO_PKG_VERSION"), config = ?path, "gbs.start");

	match serve(config).await {
		Ok(code) => ExitCode::from(code),
		Err(err) => {
			error!(error = %format!("{err:#}"), "gbs.failed");
			ExitCode::FAILURE
		}
	}
}

/// Serves stdio until `build/exit` or end of input; returns the process exit code.
async fn serve(config: ServerConfig) -> anyhow::Result<u8> {
	let provider = Arc::new(CommandModelProvider::new(config.provider));
	let runner = Arc::new(CommandTaskRunner::new(config.runner));

	let mut server = None;
	let (main_loop, _client) = MainLoop::new_server(|client| {
		let built = Arc::new(BuildServer::new(Arc::new(client), provider, runner));
		server = Some(built.clone());
		gbs_server::router(built)
	});
	let server = server.context("build server was not constructed")?;

	main_loop
		.run_buffered(tokio::io::stdin(), tokio::io::stdout())
		.await
		.context("serving stdio")?;

	let code = server.exit_code();
	info!(exit_code = code, lifecycle = ?server.lifecycle(), "gbs.exit");
	Ok(u8::try_from(code).unwrap_or(1))
}

fn setup_tracing(verbose: bool, log_dir: Option<PathBuf>, configured: Option<&str>) {
	use std::fs::OpenOptions;

	use tracing_subscriber::EnvFilter;
	use tracing_subscriber::prelude::*;

	let filter = || {
		EnvFilter::try_from_env("GBS_LOG")
			.or_else(|_| EnvFilter::try_from_default_env())
			.unwrap_or_else(|_| match (verbose, configured) {
				(true, _) => EnvFilter::new("gbs=debug,gbs_server=debug,gbs_targets=debug,gbs_rpc=debug,info"),
				(false, Some(directives)) => EnvFilter::new(directives),
				(false, None) => EnvFilter::new("info"),
			})
	};

	if let Some(log_dir) = log_dir
		&& std::fs::create_dir_all(&log_dir).is_ok()
	{
		let log_path = log_dir.join(format!("gbs.{}.log", std::process::id()));
		if let Ok(file) = OpenOptions::new().create(true).append(true).open(&log_path) {
			let file_layer = tracing_subscriber::fmt::layer()
				.with_writer(file)
				.with_ansi(false)
				.with_target(true);
			tracing_subscriber::registry().with(filter()).with(file_layer).init();
			info!(path = ?log_path, "tracing.file");
			return;
		}
	}

	tracing_subscriber::registry()
		.with(filter())
		.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
		.init();
}
