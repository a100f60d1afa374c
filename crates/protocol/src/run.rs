use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::target::BuildTargetIdentifier;
use crate::task::StatusCode;

/// `dataKind` of a [`ScalaMainClass`] run payload.
pub const SCALA_MAIN_CLASS: &str = "scala-main-class";

/// Params of `buildTarget/run`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunParams {
	/// Target whose classpath the program runs with.
	pub target: BuildTargetIdentifier,
	/// Client-chosen id echoed in notifications.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub origin_id: Option<String>,
	/// Program arguments; take precedence over the payload's.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub arguments: Option<Vec<String>>,
	/// Kind of `data`; only [`SCALA_MAIN_CLASS`] is supported.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data_kind: Option<String>,
	/// Main class payload.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data: Option<JsonValue>,
	/// Environment of the program.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub environment_variables: Option<BTreeMap<String, String>>,
}

/// Main class to run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScalaMainClass {
	/// Fully qualified class name.
	#[serde(rename = "class")]
	pub class_name: String,
	/// Program arguments.
	#[serde(default)]
	pub arguments: Vec<String>,
	/// JVM options.
	#[serde(default)]
	pub jvm_options: Vec<String>,
	/// `KEY=VALUE` environment entries.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub environment_variables: Option<Vec<String>>,
}

impl RunParams {
	/// Decodes the main class payload.
	///
	/// # Errors
	///
	/// Returns a message naming an unsupported kind, or the decoding error.
	pub fn main_class(&self) -> Result<ScalaMainClass, String> {
		match self.data_kind.as_deref() {
			Some(SCALA_MAIN_CLASS) => {
				serde_json::from_value(self.data.clone().unwrap_or(JsonValue::Null)).map_err(|e| e.to_string())
			}
			other => Err(format!("unsupported run data kind: {}", other.unwrap_or("none"))),
		}
	}
}

/// Result of `buildTarget/run`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
	/// Echoed origin id.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub origin_id: Option<String>,
	/// Outcome of the program's task.
	pub status_code: StatusCode,
}
