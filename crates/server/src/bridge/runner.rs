use anyhow::Context;
use async_trait::async_trait;
use gbs_protocol::StatusCode;
use gbs_worker::{CancellationToken, TaskClass};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, trace};

use crate::config::CommandConfig;
use crate::runner::{ProgressEvent, ProgressSink, RunRequest, TaskRunner};

/// Runs tasks through an external command that streams JSON progress events.
///
/// The command line is the configured one followed by the task paths, a `--tests <pattern>`
/// pair per test filter, the request arguments, and `-Dorg.gradle.jvmargs=...` when JVM
/// arguments are set. An application launch adds `--run-main <class>`,
/// `--run-source-set <project path>:<source set>`, then one `--run-jvm-option`,
/// `--run-env KEY=VALUE` or `--run-arg` pair per value.
#[derive(Debug, Clone)]
pub struct CommandTaskRunner {
	command: CommandConfig,
}

impl CommandTaskRunner {
	/// Runner invoking `command`.
	pub fn new(command: CommandConfig) -> Self {
		Self { command }
	}
}

/// One stdout line as an event; lines that are not events are console output.
fn decode_line(line: String) -> Option<ProgressEvent> {
	if line.trim().is_empty() {
		return None;
	}
	match serde_json::from_str(&line) {
		Ok(event) => Some(event),
		Err(error) => {
			if line.starts_with('{') {
				trace!(%error, "bridge.line.undecodable");
			}
			Some(ProgressEvent::Output {
				text: line,
				stderr: false,
			})
		}
	}
}

#[async_trait]
impl TaskRunner for CommandTaskRunner {
	async fn run(&self, request: RunRequest, token: CancellationToken, sink: ProgressSink) -> anyhow::Result<StatusCode> {
		let program = &self.command.program;
		let mut command = super::command(&self.command, &request.root);
		command.args(&request.tasks);
		for filter in &request.test_filters {
			command.arg("--tests").arg(filter.pattern());
		}
		command.args(&request.arguments);
		if !request.jvm_arguments.is_empty() {
			command.arg(format!("-Dorg.gradle.jvmargs={}", request.jvm_arguments.join(" ")));
		}
		if let Some(launch) = &request.launch {
			command
				.arg("--run-main")
				.arg(&launch.class_name)
				.arg("--run-source-set")
				.arg(format!("{}:{}", launch.project_path, launch.source_set_name));
			for option in &launch.jvm_options {
				command.arg("--run-jvm-option").arg(option);
			}
			for (key, value) in &launch.environment {
				command.arg("--run-env").arg(format!("{key}={value}"));
			}
			for arg in &launch.arguments {
				command.arg("--run-arg").arg(arg);
			}
		}

		let mut child = command.spawn().with_context(|| format!("spawning {program}"))?;
		let stdout = child.stdout.take().context("bridge stdout is not piped")?;
		let stderr = child.stderr.take().context("bridge stderr is not piped")?;

		let stderr_sink = sink.clone();
		let stderr_pump = gbs_worker::spawn(TaskClass::Bridge, async move {
			let mut stderr = BufReader::new(stderr);
			let mut buf = Vec::new();
			loop {
				match stderr.read_until(b'\n', &mut buf).await {
					Ok(0) => break,
					Ok(_) => stderr_sink.send(ProgressEvent::Output {
						text: super::take_line(&mut buf),
						stderr: true,
					}),
					Err(error) => {
						debug!(%error, "bridge.stderr.failed");
						break;
					}
				}
			}
		});

		let mut stdout = BufReader::new(stdout);
		let mut buf = Vec::new();
		let mut stdout_open = true;
		let status = loop {
			tokio::select! {
				biased;
				() = token.cancelled() => {
					debug!(root = %request.root.display(), "bridge.run.cancelled");
					child.kill().await.with_context(|| format!("killing {program}"))?;
					stderr_pump.abort();
					return Ok(StatusCode::Cancelled);
				}
				read = stdout.read_until(b'\n', &mut buf), if stdout_open => {
					if read.with_context(|| format!("reading output of {program}"))? == 0 {
						stdout_open = false;
					} else if let Some(event) = decode_line(super::take_line(&mut buf)) {
						sink.send(event);
					}
				}
				exit = child.wait(), if !stdout_open => {
					let exit = exit.with_context(|| format!("waiting for {program}"))?;
					debug!(root = %request.root.display(), %exit, "bridge.run.exited");
					break if exit.success() { StatusCode::Ok } else { StatusCode::Error };
				}
			}
		};
		if let Err(error) = stderr_pump.await {
			debug!(%error, "bridge.stderr.lost");
		}
		Ok(status)
	}
}
