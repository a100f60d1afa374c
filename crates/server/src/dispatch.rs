//! Cancellable request dispatcher.
//!
//! Every request body runs on the worker runtime, never on the transport's read loop. The
//! caller gets a future that resolves with the body's result, a protocol error, or a
//! cancellation error, whichever comes first. Cancelling fires the request's
//! [`CancelSource`] exactly once and resolves the caller future right away; the body only
//! observes the token and stops when it next checks it.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Instant;

use futures::FutureExt;
use futures::future::BoxFuture;
use gbs_rpc::{JsonValue, RequestId, ResponseError};
use gbs_worker::{CancelSource, CancellationToken, GenerationClock, TaskClass};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::{debug, error, info};

use crate::ServiceError;

/// Lifecycle of one dispatched request.
///
/// `Created -> Running -> {Completed | Failed | Cancelled}`, or `Created -> Cancelled` when the
/// request is cancelled before its body starts. Terminal states never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RequestState {
	/// Scheduled, body not started.
	Created = 0,
	/// Body running.
	Running = 1,
	/// Body returned a result.
	Completed = 2,
	/// Body returned an error or panicked.
	Failed = 3,
	/// Caller cancelled.
	Cancelled = 4,
}

impl RequestState {
	/// True for states with no outgoing transition.
	pub fn is_terminal(self) -> bool {
		matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
	}

	fn can_advance_to(self, next: Self) -> bool {
		matches!(
			(self, next),
			(Self::Created, Self::Running | Self::Cancelled)
				| (Self::Running, Self::Completed | Self::Failed | Self::Cancelled)
		)
	}

	fn from_u8(raw: u8) -> Self {
		match raw {
			0 => Self::Created,
			1 => Self::Running,
			2 => Self::Completed,
			3 => Self::Failed,
			_ => Self::Cancelled,
		}
	}
}

/// Shared, atomically advanced [`RequestState`].
#[derive(Debug)]
struct StateCell(AtomicU8);

impl StateCell {
	fn new() -> Self {
		Self(AtomicU8::new(RequestState::Created as u8))
	}

	fn get(&self) -> RequestState {
		RequestState::from_u8(self.0.load(Ordering::Acquire))
	}

	/// Moves to `next` if the transition is allowed from the current state.
	fn advance(&self, next: RequestState) -> bool {
		self.0
			.fetch_update(Ordering::AcqRel, Ordering::Acquire, |raw| {
				RequestState::from_u8(raw).can_advance_to(next).then_some(next as u8)
			})
			.is_ok()
	}
}

/// Bookkeeping of one request while it is in flight.
struct PendingRequest {
	id: RequestId,
	seq: u64,
	operation: String,
	started: Instant,
	source: CancelSource,
	state: Arc<StateCell>,
	in_flight: InFlight,
}

type InFlight = Arc<Mutex<FxHashMap<RequestId, InFlightEntry>>>;

struct InFlightEntry {
	seq: u64,
	source: CancelSource,
	state: Arc<StateCell>,
}

impl PendingRequest {
	fn elapsed_ms(&self) -> u128 {
		self.started.elapsed().as_millis()
	}

	fn finish(&self, result: Result<JsonValue, ServiceError>) -> Result<JsonValue, ResponseError> {
		match result {
			Ok(value) => {
				self.state.advance(RequestState::Completed);
				debug!(
					id = %self.id,
					operation = %self.operation,
					elapsed_ms = self.elapsed_ms(),
					"Sending response"
				);
				Ok(value)
			}
			Err(ServiceError::Cancelled) => Err(self.cancelled()),
			Err(err) => {
				self.state.advance(RequestState::Failed);
				error!(
					id = %self.id,
					operation = %self.operation,
					elapsed_ms = self.elapsed_ms(),
					error = %err.chain(),
					root_cause = %err.root_cause(),
					"Request failed"
				);
				Err(err.into())
			}
		}
	}

	fn cancelled(&self) -> ResponseError {
		if self.state.advance(RequestState::Cancelled) {
			info!(
				id = %self.id,
				operation = %self.operation,
				elapsed_ms = self.elapsed_ms(),
				"Request cancelled"
			);
		}
		ServiceError::Cancelled.into()
	}
}

impl Drop for PendingRequest {
	fn drop(&mut self) {
		let mut in_flight = self.in_flight.lock();
		if in_flight.get(&self.id).is_some_and(|entry| entry.seq == self.seq) {
			in_flight.remove(&self.id);
		}
		drop(in_flight);
		// The caller stopped waiting without an outcome.
		if !self.state.get().is_terminal() {
			self.source.cancel();
			self.cancelled();
		}
	}
}

/// Runs request bodies off the transport and tracks them for cancellation.
#[derive(Clone, Default)]
pub struct Dispatcher {
	in_flight: InFlight,
	clock: GenerationClock,
}

impl std::fmt::Debug for Dispatcher {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Dispatcher")
			.field("in_flight", &self.in_flight())
			.finish_non_exhaustive()
	}
}

impl Dispatcher {
	/// Creates a dispatcher with nothing in flight.
	pub fn new() -> Self {
		Self::default()
	}

	/// Schedules `work` and returns the caller-visible future.
	///
	/// `work` receives a token that fires when the request is cancelled. Errors and panics of
	/// the body are logged and turned into protocol errors; the returned future never panics.
	pub fn handle<F, Fut>(
		&self,
		id: RequestId,
		operation: impl Into<String>,
		work: F,
	) -> BoxFuture<'static, Result<JsonValue, ResponseError>>
	where
		F: FnOnce(CancellationToken) -> Fut + Send + 'static,
		Fut: Future<Output = Result<JsonValue, ServiceError>> + Send + 'static,
	{
		let source = CancelSource::new();
		let state = Arc::new(StateCell::new());
		let seq = self.clock.next();
		let operation = operation.into();
		debug!(%id, %operation, "Request received");

		let previous = self.in_flight.lock().insert(
			id.clone(),
			InFlightEntry {
				seq,
				source: source.clone(),
				state: state.clone(),
			},
		);
		if previous.is_some() {
			debug!(%id, "dispatch.request.id_reused");
		}

		let pending = PendingRequest {
			id,
			seq,
			operation,
			started: Instant::now(),
			source: source.clone(),
			state: state.clone(),
			in_flight: self.in_flight.clone(),
		};

		let token = source.token();
		let body = async move {
			if !state.advance(RequestState::Running) {
				return Err(ServiceError::Cancelled);
			}
			match AssertUnwindSafe(work(token)).catch_unwind().await {
				Ok(result) => result,
				Err(payload) => Err(ServiceError::Internal(gbs_worker::panic_payload_message(
					payload.as_ref(),
				))),
			}
		};
		let task = gbs_worker::spawn(TaskClass::Request, body);

		async move {
			tokio::select! {
				biased;
				() = source.cancelled() => Err(pending.cancelled()),
				joined = task => {
					let result = joined.unwrap_or_else(|err| {
						Err(ServiceError::Internal(
							gbs_worker::join_error_panic_message(err)
								.unwrap_or_else(|| "request task aborted".to_owned()),
						))
					});
					pending.finish(result)
				}
			}
		}
		.boxed()
	}

	/// Cancels an in-flight request. Returns `true` only for the call that actually fired
	/// the request's cancellation source.
	pub fn cancel(&self, id: &RequestId) -> bool {
		let source = self.in_flight.lock().get(id).map(|entry| entry.source.clone());
		match source {
			Some(source) => source.cancel(),
			None => {
				debug!(%id, "dispatch.cancel.unknown");
				false
			}
		}
	}

	/// State of an in-flight request.
	pub fn state(&self, id: &RequestId) -> Option<RequestState> {
		self.in_flight.lock().get(id).map(|entry| entry.state.get())
	}

	/// Number of requests whose caller future has not resolved yet.
	pub fn in_flight(&self) -> usize {
		self.in_flight.lock().len()
	}
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
