use std::path::Path;

use anyhow::Context;
use async_trait::async_trait;
use gbs_model::SourceSetDescriptor;
use gbs_worker::CancellationToken;
use tracing::debug;

use crate::ProjectModelProvider;
use crate::config::CommandConfig;

/// Reads source sets from the stdout of an external command.
#[derive(Debug, Clone)]
pub struct CommandModelProvider {
	command: CommandConfig,
}

impl CommandModelProvider {
	/// Provider running `command`.
	pub fn new(command: CommandConfig) -> Self {
		Self { command }
	}
}

#[async_trait]
impl ProjectModelProvider for CommandModelProvider {
	async fn refresh(&self, root: &Path, token: CancellationToken) -> anyhow::Result<Vec<SourceSetDescriptor>> {
		let program = &self.command.program;
		let child = super::command(&self.command, root)
			.spawn()
			.with_context(|| format!("spawning {program}"))?;
		let output = tokio::select! {
			biased;
			() = token.cancelled() => anyhow::bail!("project model request cancelled"),
			output = child.wait_with_output() => output.with_context(|| format!("waiting for {program}"))?,
		};
		if !output.status.success() {
			let stderr = String::from_utf8_lossy(&output.stderr);
			anyhow::bail!("{program} exited with {}: {}", output.status, stderr.trim());
		}
		let descriptors: Vec<SourceSetDescriptor> =
			serde_json::from_slice(&output.stdout).with_context(|| format!("decoding source sets from {program}"))?;
		debug!(root = %root.display(), source_sets = descriptors.len(), "bridge.source_sets");
		Ok(descriptors)
	}
}
