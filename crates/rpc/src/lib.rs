//! JSON-RPC 2.0 transport plumbing for the build server.
//!
//! This crate provides the protocol-agnostic pieces the server is driven by:
//! * [`Message`]: `Content-Length` framed JSON-RPC messages
//! * [`MainLoop`]: a tokio-driven pump that parses inbound messages and hands requests to an
//!   [`RpcService`] without ever awaiting the handler on the read path
//! * [`ClientSocket`]: cloneable handle used by handlers to push notifications to the peer
//! * [`Request`] / [`Notification`]: typed method descriptors

#![warn(missing_docs)]

use std::ops::ControlFlow;

pub use serde_json::Value as JsonValue;
use tower_service::Service;

mod error;
mod mainloop;
mod message;
mod protocol;
mod socket;
mod types;

pub use error::{Error, Result};
pub use mainloop::MainLoop;
pub use message::Message;
pub use protocol::{CancelParams, CounterIdGen, Notification, Request};
pub use socket::{ClientSocket, MainLoopEvent, PeerSocket};
pub use types::{AnyNotification, AnyRequest, AnyResponse, ErrorCode, RequestId, ResponseError};

/// Method name of the JSON-RPC cancellation notification.
pub const CANCEL_REQUEST_METHOD: &str = "$/cancelRequest";

/// The core service abstraction driven by [`MainLoop`].
pub trait RpcService: Service<AnyRequest, Response = JsonValue, Error = ResponseError> {
	/// Handles a notification.
	///
	/// Notifications are delivered in order and synchronously on the main loop; handlers must
	/// not block. The return value decides whether the main loop keeps running.
	fn notify(&mut self, notif: AnyNotification) -> ControlFlow<Result<()>>;
}
