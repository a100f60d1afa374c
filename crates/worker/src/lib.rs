//! Worker runtime primitives shared by the build server crates.
//!
//! * [`TaskClass`]: classification attached to every spawned task for observability.
//! * [`spawn`]: run work on the worker runtime, never on the
//!   transport's read loop.
//! * [`WorkerJoinSet`]: join set whose tasks are attached to the worker runtime.
//! * [`CancelSource`]: a cancellation source that fires at most once and reports whether
//!   the caller was the one that fired it.
//! * [`GenerationClock`]: monotonic sequence numbers for requests and refreshes.

#![warn(missing_docs)]

mod class;
mod join_set;
mod panic;
mod spawn;
mod token;

pub use class::TaskClass;
pub use join_set::WorkerJoinSet;
pub use panic::{join_error_panic_message, panic_payload_message};
pub use spawn::{runtime_handle, spawn};
pub use token::{CancelSource, GenerationClock};
/// Re-export so dependents share one token type.
pub use tokio_util::sync::CancellationToken;
