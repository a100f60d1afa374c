//! Service main loop driver.

use std::collections::HashMap;
use std::future::{Future, poll_fn};
use std::ops::ControlFlow;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use gbs_worker::{TaskClass, WorkerJoinSet};
use pin_project_lite::pin_project;
use serde_json::Value as JsonValue;
use tokio::io::{AsyncBufRead, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::socket::{ClientSocket, MainLoopEvent, PeerSocket};
use crate::types::{AnyResponse, ErrorCode, RequestId, ResponseError};
use crate::{Error, Message, Result, RpcService};

/// Inbound messages buffered between the reader task and the loop.
const INBOUND_CAPACITY: usize = 64;

/// Main loop driving an [`RpcService`] over a byte stream.
///
/// Inbound messages are parsed on a dedicated reader task. Requests are handed to the service
/// and their futures run on the worker runtime; the loop itself never awaits a handler.
/// Responses travel through the same queue as notifications, so every notification a handler
/// sends is written before that handler's response.
pub struct MainLoop<S: RpcService> {
	/// The wrapped service.
	service: S,
	/// Receiver for outgoing messages.
	rx: mpsc::UnboundedReceiver<MainLoopEvent>,
	/// Sender cloned into request tasks.
	socket: PeerSocket,
	/// Request handlers in flight.
	tasks: WorkerJoinSet<()>,
	/// Request id of every task in `tasks`.
	pending: HashMap<tokio::task::Id, RequestId>,
}

impl<S> MainLoop<S>
where
	S: RpcService,
	S::Future: Send + 'static,
{
	/// Creates a server main loop, handing the builder a socket to the client.
	#[must_use]
	pub fn new_server(builder: impl FnOnce(ClientSocket) -> S) -> (Self, ClientSocket) {
		let (tx, rx) = mpsc::unbounded_channel();
		let socket = PeerSocket { tx };
		let this = Self {
			service: builder(ClientSocket(socket.clone())),
			rx,
			socket: socket.clone(),
			tasks: WorkerJoinSet::new(TaskClass::Request),
			pending: HashMap::new(),
		};
		(this, ClientSocket(socket))
	}

	/// Returns a reference to the inner service.
	#[must_use]
	pub fn get_ref(&self) -> &S {
		&self.service
	}

	/// Shortcut to [`MainLoop::run`] wrapping `input` in a [`BufReader`].
	#[allow(clippy::missing_errors_doc, reason = "errors documented in Self::run")]
	pub async fn run_buffered(
		self,
		input: impl AsyncRead + Unpin + Send + 'static,
		output: impl AsyncWrite + Unpin,
	) -> Result<()> {
		self.run(BufReader::new(input), output).await
	}

	/// Drives the service until the input closes or a notification handler breaks the loop.
	///
	/// Messages queued when the loop stops are still written; requests still in flight are
	/// aborted.
	///
	/// # Errors
	///
	/// - `Error::Io` when `input` or `output` raises an error.
	/// - `Error::Protocol` when the peer breaks the framing.
	/// - Errors returned by the service's notification handler.
	pub async fn run(
		mut self,
		input: impl AsyncBufRead + Unpin + Send + 'static,
		mut output: impl AsyncWrite + Unpin,
	) -> Result<()> {
		let (in_tx, mut in_rx) = mpsc::channel(INBOUND_CAPACITY);
		let reader = gbs_worker::spawn(TaskClass::Background, read_loop(input, in_tx));

		let ret = loop {
			let ctl = tokio::select! {
				biased;

				event = self.rx.recv() => match event {
					Some(MainLoopEvent::Outgoing(msg)) => ControlFlow::Continue(Some(msg)),
					None => break Ok(()),
				},

				joined = self.tasks.join_next_with_id(), if !self.tasks.is_empty() => {
					self.reap(joined)
				}

				inbound = in_rx.recv() => match inbound {
					Some(Ok(msg)) => self.dispatch_message(msg).await,
					Some(Err(Error::Deserialize(e))) => {
						warn!(error = %e, "rpc.inbound.undecodable");
						ControlFlow::Continue(None)
					}
					Some(Err(Error::Eof)) | None => {
						debug!("rpc.inbound.closed");
						break Ok(());
					}
					Some(Err(e)) => break Err(e),
				},
			};

			match ctl {
				ControlFlow::Continue(Some(msg)) => msg.write(&mut output).await?,
				ControlFlow::Continue(None) => {}
				ControlFlow::Break(ret) => break ret,
			}
		};

		reader.abort();
		self.tasks.abort_all();
		while let Ok(MainLoopEvent::Outgoing(msg)) = self.rx.try_recv() {
			msg.write(&mut output).await?;
		}
		output.shutdown().await?;
		ret
	}

	/// Routes an inbound message.
	async fn dispatch_message(&mut self, msg: Message) -> ControlFlow<Result<()>, Option<Message>> {
		match msg {
			Message::Request(req) => {
				if let Err(err) = poll_fn(|cx| self.service.poll_ready(cx)).await {
					return ControlFlow::Continue(Some(Message::Response(AnyResponse {
						id: req.id,
						result: None,
						error: Some(err),
					})));
				}
				let id = req.id.clone();
				let fut = RequestFuture {
					fut: self.service.call(req),
					id: id.clone(),
				};
				let socket = self.socket.clone();
				let handle = self.tasks.spawn(async move {
					let resp = fut.await;
					// The loop may already be gone; nobody is left to answer.
					let _ = socket.send(MainLoopEvent::Outgoing(Message::Response(resp)));
				});
				self.pending.insert(handle.id(), id);
				ControlFlow::Continue(None)
			}
			Message::Response(resp) => {
				debug!(id = %resp.id, "rpc.response.unsolicited");
				ControlFlow::Continue(None)
			}
			Message::Notification(notif) => match self.service.notify(notif) {
				ControlFlow::Continue(()) => ControlFlow::Continue(None),
				ControlFlow::Break(ret) => ControlFlow::Break(ret),
			},
		}
	}

	/// Forgets a finished request task. A task that panicked past the service is answered with
	/// an internal error so the client is never left waiting.
	fn reap(
		&mut self,
		joined: Option<std::result::Result<(tokio::task::Id, ()), tokio::task::JoinError>>,
	) -> ControlFlow<Result<()>, Option<Message>> {
		match joined {
			Some(Ok((task, ()))) => {
				self.pending.remove(&task);
				ControlFlow::Continue(None)
			}
			Some(Err(err)) => {
				let id = self.pending.remove(&err.id());
				match (id, gbs_worker::join_error_panic_message(err)) {
					(Some(id), Some(panic)) => {
						error!(%id, panic = %panic, "rpc.request.panicked");
						ControlFlow::Continue(Some(Message::Response(AnyResponse {
							id,
							result: None,
							error: Some(ResponseError::new(ErrorCode::INTERNAL_ERROR, panic)),
						})))
					}
					_ => ControlFlow::Continue(None),
				}
			}
			None => ControlFlow::Continue(None),
		}
	}
}

/// Reads messages until EOF or an unrecoverable framing error.
async fn read_loop(
	mut input: impl AsyncBufRead + Unpin + Send + 'static,
	tx: mpsc::Sender<Result<Message>>,
) {
	loop {
		let msg = Message::read(&mut input).await;
		let fatal = matches!(&msg, Err(e) if !matches!(e, Error::Deserialize(_)));
		if tx.send(msg).await.is_err() || fatal {
			break;
		}
	}
}

pin_project! {
	struct RequestFuture<Fut> {
		#[pin]
		fut: Fut,
		id: RequestId,
	}
}

impl<Fut> Future for RequestFuture<Fut>
where
	Fut: Future<Output = std::result::Result<JsonValue, ResponseError>>,
{
	type Output = AnyResponse;

	fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		let this = self.project();
		let (mut result, mut error) = (None, None);
		match ready!(this.fut.poll(cx)) {
			Ok(v) => result = Some(v),
			Err(err) => error = Some(err),
		}
		Poll::Ready(AnyResponse {
			id: this.id.clone(),
			result,
			error,
		})
	}
}

#[cfg(test)]
#[path = "mainloop_tests.rs"]
mod tests;
