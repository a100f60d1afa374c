//! `Content-Length` framed JSON-RPC messages.

use serde_json::Value as JsonValue;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::types::{AnyNotification, AnyRequest, AnyResponse};
use crate::{Error, Result};

const CONTENT_LENGTH: &str = "Content-Length: ";

/// A single JSON-RPC message.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
	/// A request expecting a response.
	Request(AnyRequest),
	/// A response to an earlier request.
	Response(AnyResponse),
	/// A one-way notification.
	Notification(AnyNotification),
}

impl Message {
	/// Reads one framed message.
	///
	/// # Errors
	///
	/// - [`Error::Eof`] when the input is closed before a header starts.
	/// - [`Error::Protocol`] on malformed headers; the stream is unusable afterwards.
	/// - [`Error::Deserialize`] when a well-framed body is not a JSON-RPC message; the body
	///   has been consumed so the caller may keep reading.
	pub async fn read(input: &mut (impl AsyncBufRead + Unpin)) -> Result<Self> {
		let mut content_length: Option<usize> = None;
		let mut saw_header = false;
		let mut line = String::new();
		loop {
			line.clear();
			if input.read_line(&mut line).await? == 0 {
				return Err(Error::Eof);
			}
			let header = line.trim();
			if header.is_empty() {
				if !saw_header {
					// Stray blank line between messages.
					continue;
				}
				break;
			}
			saw_header = true;
			if let Some(len) = header.strip_prefix(CONTENT_LENGTH) {
				let len = len
					.parse()
					.map_err(|_| Error::Protocol(format!("invalid Content-Length: {len}")))?;
				content_length = Some(len);
			}
		}

		let length = content_length.ok_or_else(|| Error::Protocol("missing Content-Length".into()))?;
		let mut body = vec![0u8; length];
		input.read_exact(&mut body).await?;

		let json: JsonValue = serde_json::from_slice(&body)?;
		Self::from_value(json)
	}

	/// Classifies a decoded JSON object.
	///
	/// # Errors
	///
	/// [`Error::Deserialize`] when the object is not a request, response or notification.
	pub fn from_value(json: JsonValue) -> Result<Self> {
		let has_id = json.get("id").is_some_and(|id| !id.is_null());
		let has_method = json.get("method").is_some();
		match (has_id, has_method) {
			(true, true) => Ok(Self::Request(serde_json::from_value(json)?)),
			(false, true) => Ok(Self::Notification(serde_json::from_value(json)?)),
			(true, false) => Ok(Self::Response(serde_json::from_value(json)?)),
			(false, false) => Err(Error::Deserialize(serde::de::Error::custom(
				"message has neither id nor method",
			))),
		}
	}

	/// Encodes the message as a JSON-RPC 2.0 object.
	pub fn to_value(&self) -> JsonValue {
		match self {
			Self::Request(req) => serde_json::json!({
				"jsonrpc": "2.0",
				"id": req.id,
				"method": req.method,
				"params": req.params,
			}),
			Self::Notification(notif) => serde_json::json!({
				"jsonrpc": "2.0",
				"method": notif.method,
				"params": notif.params,
			}),
			Self::Response(AnyResponse {
				id,
				error: Some(error),
				..
			}) => serde_json::json!({
				"jsonrpc": "2.0",
				"id": id,
				"error": error,
			}),
			Self::Response(AnyResponse { id, result, .. }) => serde_json::json!({
				"jsonrpc": "2.0",
				"id": id,
				"result": result.clone().unwrap_or(JsonValue::Null),
			}),
		}
	}

	/// Writes the framed message and flushes the output.
	///
	/// # Errors
	///
	/// [`Error::Io`] when the output fails.
	pub async fn write(&self, output: &mut (impl AsyncWrite + Unpin)) -> Result<()> {
		let json = serde_json::to_string(&self.to_value())?;
		let msg = format!("{CONTENT_LENGTH}{}\r\n\r\n{}", json.len(), json);
		output.write_all(msg.as_bytes()).await?;
		output.flush().await?;
		Ok(())
	}
}
