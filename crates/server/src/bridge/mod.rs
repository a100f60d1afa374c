//! Provider and runner adapters that drive the orchestrator through external commands.
//!
//! Both adapters run their configured command with the root project directory as working
//! directory. The provider command prints a JSON array of source sets; the runner command
//! prints one JSON [`ProgressEvent`](crate::runner::ProgressEvent) per line.

mod provider;
mod runner;

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;

pub use self::provider::CommandModelProvider;
pub use self::runner::CommandTaskRunner;
use crate::config::CommandConfig;

/// Command for `config` in `dir`, with piped output. The child dies with its handle.
fn command(config: &CommandConfig, dir: &Path) -> Command {
	let mut command = Command::new(&config.program);
	command
		.args(&config.args)
		.envs(&config.env)
		.current_dir(dir)
		.stdin(Stdio::null())
		.stdout(Stdio::piped())
		.stderr(Stdio::piped())
		.kill_on_drop(true);
	command
}

/// Drains `buf` into one line of console text without its terminator. Bytes that are not
/// UTF-8 are replaced rather than failing the stream.
fn take_line(buf: &mut Vec<u8>) -> String {
	let text = String::from_utf8_lossy(buf).trim_end_matches(['\r', '\n']).to_owned();
	buf.clear();
	text
}
