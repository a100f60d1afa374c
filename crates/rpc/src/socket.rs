//! Handles used to push messages to the main loop.

use tokio::sync::mpsc;

use crate::protocol::Notification;
use crate::{AnyNotification, Error, Message, Result};

/// Events consumed by the main loop.
#[derive(Debug)]
pub enum MainLoopEvent {
	/// Write a message to the peer.
	Outgoing(Message),
}

/// Internal channel to the main loop.
#[derive(Debug, Clone)]
pub struct PeerSocket {
	pub(crate) tx: mpsc::UnboundedSender<MainLoopEvent>,
}

impl PeerSocket {
	/// Creates a socket whose main loop is already gone.
	#[must_use]
	pub fn new_closed() -> Self {
		let (tx, _) = mpsc::unbounded_channel();
		Self { tx }
	}

	/// Queues an event for the main loop.
	///
	/// # Errors
	///
	/// [`Error::ServiceStopped`] when the main loop has exited.
	pub fn send(&self, event: MainLoopEvent) -> Result<()> {
		self.tx.send(event).map_err(|_| Error::ServiceStopped)
	}
}

/// Handle for sending notifications to the connected client.
///
/// Messages queued from one task are written in the order they were queued, and before the
/// response of the request whose handler queued them.
#[derive(Debug, Clone)]
pub struct ClientSocket(pub(crate) PeerSocket);

impl ClientSocket {
	/// Creates a socket whose main loop is already gone.
	#[must_use]
	pub fn new_closed() -> Self {
		Self(PeerSocket::new_closed())
	}

	/// Sends a typed notification.
	///
	/// # Errors
	///
	/// - [`Error::Deserialize`] when the parameters fail to serialize.
	/// - [`Error::ServiceStopped`] when the main loop has exited.
	pub fn notify<N: Notification>(&self, params: N::Params) -> Result<()> {
		let params = serde_json::to_value(params)?;
		self.notify_any(AnyNotification {
			method: N::METHOD.into(),
			params,
		})
	}

	/// Sends an untyped notification.
	///
	/// # Errors
	///
	/// [`Error::ServiceStopped`] when the main loop has exited.
	pub fn notify_any(&self, notif: AnyNotification) -> Result<()> {
		self.0.send(MainLoopEvent::Outgoing(Message::Notification(notif)))
	}
}
