use gbs_rpc::{ErrorCode, ResponseError};
use thiserror::Error;

/// Failure of one request body.
#[derive(Debug, Error)]
pub enum ServiceError {
	/// A target id missing from the current snapshot.
	#[error("build target not found: {0}")]
	UnknownTarget(String),
	/// A collaborator (model provider, task runner) failed.
	#[error(transparent)]
	ToolInvocation(anyhow::Error),
	/// An error that is already shaped for the wire.
	#[error(transparent)]
	Protocol(ResponseError),
	/// Request parameters could not be used.
	#[error("invalid params: {0}")]
	InvalidParams(String),
	/// A request arrived before `build/initialize`.
	#[error("server not initialized")]
	NotInitialized,
	/// The request was cancelled.
	#[error("request cancelled")]
	Cancelled,
	/// Anything else, including panics caught at the dispatcher boundary.
	#[error("{0}")]
	Internal(String),
}

impl ServiceError {
	/// Message of the innermost error in the source chain.
	pub fn root_cause(&self) -> String {
		if let Self::ToolInvocation(err) = self {
			let root = err.root_cause().to_string();
			return if root.is_empty() { err.to_string() } else { root };
		}
		let mut current: &dyn std::error::Error = self;
		while let Some(next) = current.source() {
			current = next;
		}
		current.to_string()
	}

	/// Every message of the source chain, outermost first, joined with `: `.
	pub fn chain(&self) -> String {
		if let Self::ToolInvocation(err) = self {
			return format!("{err:#}");
		}
		let mut parts = vec![self.to_string()];
		let mut current: &dyn std::error::Error = self;
		while let Some(next) = current.source() {
			parts.push(next.to_string());
			current = next;
		}
		parts.join(": ")
	}
}

impl From<anyhow::Error> for ServiceError {
	fn from(err: anyhow::Error) -> Self {
		Self::ToolInvocation(err)
	}
}

impl From<ServiceError> for ResponseError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::Protocol(inner) => inner,
			ServiceError::InvalidParams(_) => Self::new(ErrorCode::INVALID_PARAMS, err),
			ServiceError::NotInitialized => Self::new(ErrorCode::SERVER_NOT_INITIALIZED, err),
			ServiceError::Cancelled => Self::new(ErrorCode::REQUEST_CANCELLED, err),
			ServiceError::UnknownTarget(_) | ServiceError::ToolInvocation(_) | ServiceError::Internal(_) => {
				Self::new(ErrorCode::INTERNAL_ERROR, err.root_cause())
			}
		}
	}
}
