use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio_util::sync::CancellationToken;

/// Monotonic sequence clock for requests and refreshes.
#[derive(Debug, Default, Clone)]
pub struct GenerationClock {
	next: Arc<AtomicU64>,
}

impl GenerationClock {
	/// Creates a new clock whose first value is 1.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the next sequence number.
	pub fn next(&self) -> u64 {
		self.next.fetch_add(1, Ordering::AcqRel).wrapping_add(1)
	}
}

/// Cancellation source that fires at most once.
///
/// Work observes cancellation through child tokens handed out by [`Self::token`]; a child
/// cancelling itself never propagates back to the source or its siblings.
#[derive(Debug, Clone, Default)]
pub struct CancelSource {
	cancel: CancellationToken,
	fired: Arc<AtomicBool>,
}

impl CancelSource {
	/// Creates an unfired source.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns a child token observing this source.
	pub fn token(&self) -> CancellationToken {
		self.cancel.child_token()
	}

	/// Fires the source. Returns `true` only for the call that actually fired it.
	pub fn cancel(&self) -> bool {
		if self.fired.swap(true, Ordering::AcqRel) {
			return false;
		}
		self.cancel.cancel();
		true
	}

	/// Returns true once the source has fired.
	pub fn is_cancelled(&self) -> bool {
		self.fired.load(Ordering::Acquire)
	}

	/// Future resolving when the source fires.
	pub async fn cancelled(&self) {
		self.cancel.cancelled().await;
	}
}
