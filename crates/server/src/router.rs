//! Method router: the root [`RpcService`] of the server.
//!
//! Requests are decoded and executed inside the [`Dispatcher`], so a slow or failing handler
//! never holds up the main loop. Notifications run inline, in arrival order.

use std::future::Future;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::FutureExt;
use futures::future::{self, BoxFuture};
use gbs_rpc::{
	AnyNotification, AnyRequest, CANCEL_REQUEST_METHOD, CancelParams, ErrorCode, JsonValue, Notification, Request,
	ResponseError, RpcService,
};
use gbs_worker::CancellationToken;
use rustc_hash::FxHashMap;
use tower_service::Service;
use tracing::{debug, warn};

use crate::{Dispatcher, ServiceError};

type ResponseFuture = BoxFuture<'static, Result<JsonValue, ResponseError>>;
type RequestHandler<St> = Box<dyn Fn(&St, &Dispatcher, AnyRequest) -> ResponseFuture + Send + Sync>;
type NotificationHandler<St> = Box<dyn Fn(&St, JsonValue) -> ControlFlow<gbs_rpc::Result<()>> + Send + Sync>;
type Gate<St> = Box<dyn Fn(&St, &str) -> Result<(), ServiceError> + Send + Sync>;

/// Routes requests and notifications by method name to handlers sharing a state `St`.
pub struct Router<St> {
	state: St,
	dispatcher: Dispatcher,
	requests: FxHashMap<&'static str, RequestHandler<St>>,
	notifications: FxHashMap<&'static str, NotificationHandler<St>>,
	gate: Option<Gate<St>>,
}

impl<St> std::fmt::Debug for Router<St> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Router")
			.field("dispatcher", &self.dispatcher)
			.field("requests", &self.requests.len())
			.field("notifications", &self.notifications.len())
			.finish_non_exhaustive()
	}
}

impl<St> Router<St>
where
	St: Clone + Send + Sync + 'static,
{
	/// Creates a router with no handlers.
	pub fn new(state: St) -> Self {
		Self {
			state,
			dispatcher: Dispatcher::new(),
			requests: FxHashMap::default(),
			notifications: FxHashMap::default(),
			gate: None,
		}
	}

	/// The dispatcher request bodies run on.
	pub fn dispatcher(&self) -> &Dispatcher {
		&self.dispatcher
	}

	/// Registers the handler of request `R`.
	///
	/// Parameters that do not decode fail the request with `InvalidParams`.
	pub fn request<R, H, Fut>(&mut self, handler: H) -> &mut Self
	where
		R: Request,
		H: Fn(St, R::Params, CancellationToken) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = Result<R::Result, ServiceError>> + Send + 'static,
	{
		let handler = Arc::new(handler);
		self.requests.insert(
			R::METHOD,
			Box::new(move |state, dispatcher, req| {
				let state = state.clone();
				let handler = handler.clone();
				let params = req.params;
				dispatcher.handle(req.id, R::METHOD, move |token| async move {
					let params: R::Params =
						serde_json::from_value(params).map_err(|e| ServiceError::InvalidParams(e.to_string()))?;
					let result = handler(state, params, token).await?;
					serde_json::to_value(result).map_err(|e| ServiceError::Internal(e.to_string()))
				})
			}),
		);
		self
	}

	/// Registers the handler of notification `N`.
	pub fn notification<N, H>(&mut self, handler: H) -> &mut Self
	where
		N: Notification,
		H: Fn(&St, N::Params) -> ControlFlow<gbs_rpc::Result<()>> + Send + Sync + 'static,
	{
		self.notifications.insert(
			N::METHOD,
			Box::new(move |state, params| match serde_json::from_value(params) {
				Ok(params) => handler(state, params),
				Err(error) => {
					warn!(method = N::METHOD, %error, "router.notification.undecodable");
					ControlFlow::Continue(())
				}
			}),
		);
		self
	}

	/// Installs a check every known request passes before it is dispatched.
	pub fn gate(&mut self, gate: impl Fn(&St, &str) -> Result<(), ServiceError> + Send + Sync + 'static) -> &mut Self {
		self.gate = Some(Box::new(gate));
		self
	}
}

impl<St> Service<AnyRequest> for Router<St>
where
	St: Clone + Send + Sync + 'static,
{
	type Response = JsonValue;
	type Error = ResponseError;
	type Future = ResponseFuture;

	fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
		Poll::Ready(Ok(()))
	}

	fn call(&mut self, req: AnyRequest) -> Self::Future {
		let Some(handler) = self.requests.get(req.method.as_str()) else {
			debug!(id = %req.id, method = %req.method, "router.request.unknown");
			let err = ResponseError::new(ErrorCode::METHOD_NOT_FOUND, format!("method not found: {}", req.method));
			return future::ready(Err(err)).boxed();
		};
		if let Some(gate) = &self.gate
			&& let Err(err) = gate(&self.state, &req.method)
		{
			debug!(id = %req.id, method = %req.method, error = %err, "router.request.rejected");
			return future::ready(Err(err.into())).boxed();
		}
		handler(&self.state, &self.dispatcher, req)
	}
}

impl<St> RpcService for Router<St>
where
	St: Clone + Send + Sync + 'static,
{
	fn notify(&mut self, notif: AnyNotification) -> ControlFlow<gbs_rpc::Result<()>> {
		if notif.method == CANCEL_REQUEST_METHOD {
			match serde_json::from_value::<CancelParams>(notif.params) {
				Ok(CancelParams { id }) => {
					self.dispatcher.cancel(&id);
				}
				Err(error) => warn!(%error, "router.cancel.undecodable"),
			}
			return ControlFlow::Continue(());
		}
		match self.notifications.get(notif.method.as_str()) {
			Some(handler) => handler(&self.state, notif.params),
			None => {
				// `$/` notifications are optional by protocol and dropped silently.
				if !notif.method.starts_with("$/") {
					debug!(method = %notif.method, "router.notification.unhandled");
				}
				ControlFlow::Continue(())
			}
		}
	}
}
