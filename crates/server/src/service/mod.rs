//! Build server services: lifecycle, target queries, and task execution.
//!
//! One [`BuildServer`] backs a connection. Its only cross-request mutable state is the
//! target cache, which publishes immutable snapshots; everything a request reads comes
//! from the snapshot current when its body started.

mod lifecycle;
mod targets;
mod tasks;

use std::path::PathBuf;
use std::sync::Arc;

use gbs_protocol::{DidChangeBuildTarget, LogMessageParams};
use gbs_targets::{ChangeRecord, Snapshot, TargetCache};
use gbs_worker::{CancellationToken, TaskClass};
use parking_lot::{Mutex, RwLock};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

pub use self::lifecycle::LifecycleState;
use crate::preferences::Preferences;
use crate::runner::TaskRunner;
use crate::{BuildClient, ProjectModelProvider, ServiceError};

/// What `build/initialize` established.
#[derive(Debug, Clone)]
pub(crate) struct Session {
	root: PathBuf,
	preferences: Preferences,
}

/// Request handlers of one client connection.
pub struct BuildServer {
	client: Arc<dyn BuildClient>,
	provider: Arc<dyn ProjectModelProvider>,
	runner: Arc<dyn TaskRunner>,
	cache: TargetCache,
	session: RwLock<Option<Arc<Session>>>,
	lifecycle: Mutex<LifecycleState>,
	/// Set once the first refresh succeeded.
	loaded: OnceCell<()>,
	/// Serializes refreshes so refresh N is always diffed against refresh N-1.
	refreshing: tokio::sync::Mutex<()>,
}

impl std::fmt::Debug for BuildServer {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("BuildServer")
			.field("lifecycle", &*self.lifecycle.lock())
			.field("loaded", &self.loaded.initialized())
			.field("generation", &self.cache.snapshot().generation())
			.finish_non_exhaustive()
	}
}

impl BuildServer {
	/// Creates a server talking to `client` and driving the given collaborators.
	pub fn new(
		client: Arc<dyn BuildClient>,
		provider: Arc<dyn ProjectModelProvider>,
		runner: Arc<dyn TaskRunner>,
	) -> Self {
		Self {
			client,
			provider,
			runner,
			cache: TargetCache::new(),
			session: RwLock::new(None),
			lifecycle: Mutex::new(LifecycleState::Uninitialized),
			loaded: OnceCell::new(),
			refreshing: tokio::sync::Mutex::new(()),
		}
	}

	/// The target cache.
	pub fn cache(&self) -> &TargetCache {
		&self.cache
	}

	pub(crate) fn session(&self) -> Result<Arc<Session>, ServiceError> {
		self.session.read().clone().ok_or(ServiceError::NotInitialized)
	}

	/// Snapshot for one request, loading the workspace first if nothing was loaded yet.
	///
	/// Concurrent first callers share one refresh. A failed first load leaves the server
	/// unloaded, so the next caller tries again.
	pub(crate) async fn snapshot(&self, token: &CancellationToken) -> Result<Arc<Snapshot>, ServiceError> {
		self.loaded
			.get_or_try_init(|| async {
				self.refresh(token.clone(), false).await?;
				Ok::<(), ServiceError>(())
			})
			.await?;
		Ok(self.cache.snapshot())
	}

	/// `workspace/reload`. Does nothing until the workspace was loaded once.
	pub async fn reload(&self, token: CancellationToken) -> Result<(), ServiceError> {
		if !self.loaded.initialized() {
			debug!("targets.reload.skipped");
			return Ok(());
		}
		self.refresh(token, true).await.map(drop)
	}

	/// Reloads in the background, detached from any request.
	pub(crate) fn schedule_reload(self: &Arc<Self>) {
		let this = self.clone();
		gbs_worker::spawn(TaskClass::Background, async move {
			if let Err(err) = this.reload(CancellationToken::new()).await {
				warn!(error = %err.chain(), "targets.reload.background_failed");
			}
		});
	}

	/// Asks the provider for the full descriptor set and publishes it.
	///
	/// Failures are reported to the client as well as returned.
	async fn refresh(&self, token: CancellationToken, notify: bool) -> Result<Vec<ChangeRecord>, ServiceError> {
		let session = self.session()?;
		let _serial = self.refreshing.lock().await;
		if token.is_cancelled() {
			return Err(ServiceError::Cancelled);
		}
		let descriptors = match self.provider.refresh(&session.root, token).await {
			Ok(descriptors) => descriptors,
			Err(err) => {
				self.client.on_log_message(LogMessageParams::error(format!(
					"Failed to load the project model: {err:#}"
				)));
				return Err(ServiceError::ToolInvocation(err));
			}
		};
		let changes = self.cache.store(descriptors, session.preferences.naming());
		info!(
			root = %session.root.display(),
			targets = self.cache.snapshot().len(),
			changes = changes.len(),
			"targets.refreshed"
		);
		if notify && !changes.is_empty() {
			self.client.on_build_targets_changed(DidChangeBuildTarget {
				changes: changes.iter().map(ChangeRecord::to_event).collect(),
			});
		}
		Ok(changes)
	}
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
