use std::io;

use crate::ResponseError;

/// A convenient type alias for `Result` with `E` = [`enum@Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Transport and framing errors.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
	/// The main loop stopped and no longer accepts outgoing messages.
	#[error("service stopped")]
	ServiceStopped,
	/// A framed body could not be decoded as a JSON-RPC message.
	#[error("deserialization failed: {0}")]
	Deserialize(#[from] serde_json::Error),
	/// The peer replied with an error.
	#[error("{0}")]
	Response(#[from] ResponseError),
	/// The peer violated the framing or message rules.
	#[error("protocol error: {0}")]
	Protocol(String),
	/// Input/output errors from the underlying channels.
	#[error("{0}")]
	Io(#[from] io::Error),
	/// The underlying channel reached EOF.
	#[error("the underlying channel reached EOF")]
	Eof,
}
