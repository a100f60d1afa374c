use std::future::Future;

use tokio::task::{AbortHandle, Id, JoinError, JoinSet};

use crate::TaskClass;

/// Wrapper for a Tokio [`JoinSet`] whose tasks run on the worker runtime.
#[derive(Debug)]
pub struct WorkerJoinSet<T> {
	class: TaskClass,
	inner: JoinSet<T>,
}

impl<T> WorkerJoinSet<T>
where
	T: Send + 'static,
{
	/// Creates an empty worker join set for the given task class.
	pub fn new(class: TaskClass) -> Self {
		Self { class, inner: JoinSet::new() }
	}

	/// Returns the number of tasks currently in the set.
	pub fn len(&self) -> usize {
		self.inner.len()
	}

	/// Returns `true` if the set is empty.
	pub fn is_empty(&self) -> bool {
		self.inner.is_empty()
	}

	/// Spawns a future into the set on the worker runtime handle.
	///
	/// The returned handle aborts only this task.
	pub fn spawn<F>(&mut self, fut: F) -> AbortHandle
	where
		F: Future<Output = T> + Send + 'static,
	{
		tracing::trace!(worker_class = self.class.as_str(), pending = self.inner.len(), "worker.join_set.spawn");
		self.inner.spawn_on(fut, &crate::runtime_handle())
	}

	/// Waits for the next completed task, returning its task id.
	pub async fn join_next_with_id(&mut self) -> Option<Result<(Id, T), JoinError>> {
		self.inner.join_next_with_id().await
	}

	/// Aborts every task in the set.
	pub fn abort_all(&mut self) {
		self.inner.abort_all();
	}
}
