use serde::{Deserialize, Serialize};

use crate::task::TaskId;

int_enum! {
	/// Severity of a log or show message.
	pub enum MessageType {
		/// Error.
		Error = 1,
		/// Warning.
		Warning = 2,
		/// Information.
		Info = 3,
		/// Plain log line.
		Log = 4,
	}
}

/// Params of `build/logMessage`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogMessageParams {
	/// Severity.
	#[serde(rename = "type")]
	pub kind: MessageType,
	/// Task the message belongs to.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub task: Option<TaskId>,
	/// Origin id of the request the message belongs to.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub origin_id: Option<String>,
	/// Message text.
	pub message: String,
}

impl LogMessageParams {
	/// An error message without task or origin.
	pub fn error(message: impl Into<String>) -> Self {
		Self {
			kind: MessageType::Error,
			task: None,
			origin_id: None,
			message: message.into(),
		}
	}
}
