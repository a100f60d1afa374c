use std::path::Path;

use async_trait::async_trait;
use gbs_model::SourceSetDescriptor;
use gbs_worker::CancellationToken;

/// Produces the full descriptor set of a workspace.
///
/// Implementations hide every orchestrator-version difference; the server never inspects
/// which version produced a descriptor. A call may take minutes and always runs on the
/// worker runtime.
#[async_trait]
pub trait ProjectModelProvider: Send + Sync {
	/// Reads every source set under `root`.
	async fn refresh(&self, root: &Path, token: CancellationToken) -> anyhow::Result<Vec<SourceSetDescriptor>>;
}
