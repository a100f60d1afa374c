use serde::{Deserialize, Serialize};

use crate::target::BuildTargetIdentifier;
use crate::test::{TestFinish, TestReport, TestStart, TestTask};

int_enum! {
	/// Outcome of a task or request.
	pub enum StatusCode {
		/// Finished successfully.
		Ok = 1,
		/// Finished with an error.
		Error = 2,
		/// Stopped by cancellation.
		Cancelled = 3,
	}
}

/// Identifier of a reported task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId {
	/// Unique task id.
	pub id: String,
	/// Ids of enclosing tasks, innermost first.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub parents: Option<Vec<String>>,
}

impl TaskId {
	/// Creates a root task id.
	pub fn new(id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			parents: None,
		}
	}

	/// Creates a task id nested in `parent`.
	pub fn child_of(id: impl Into<String>, parent: &TaskId) -> Self {
		Self {
			id: id.into(),
			parents: Some(vec![parent.id.clone()]),
		}
	}
}

/// Params of `build/taskStart`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStartParams {
	/// Started task.
	pub task_id: TaskId,
	/// Origin id of the request that caused the task.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub origin_id: Option<String>,
	/// Milliseconds since the Unix epoch.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub event_time: Option<i64>,
	/// Message describing the task.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
	/// Typed payload.
	#[serde(flatten)]
	pub data: Option<TaskStartData>,
}

/// Payload of `build/taskStart`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "dataKind", content = "data")]
pub enum TaskStartData {
	/// A compile task started for a target.
	#[serde(rename = "compile-task")]
	CompileTask(CompileTask),
	/// A test task started for a target.
	#[serde(rename = "test-task")]
	TestTask(TestTask),
	/// A single test or container started.
	#[serde(rename = "test-start")]
	TestStart(TestStart),
}

/// Params of `build/taskProgress`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskProgressParams {
	/// Progressing task.
	pub task_id: TaskId,
	/// Origin id of the request that caused the task.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub origin_id: Option<String>,
	/// Milliseconds since the Unix epoch.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub event_time: Option<i64>,
	/// Progress message.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
	/// Total amount of work.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub total: Option<i64>,
	/// Work done so far.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub progress: Option<i64>,
	/// Unit of `total` and `progress`.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub unit: Option<String>,
}

/// Params of `build/taskFinish`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskFinishParams {
	/// Finished task.
	pub task_id: TaskId,
	/// Origin id of the request that caused the task.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub origin_id: Option<String>,
	/// Milliseconds since the Unix epoch.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub event_time: Option<i64>,
	/// Message describing the outcome.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
	/// Task outcome.
	pub status: StatusCode,
	/// Typed payload.
	#[serde(flatten)]
	pub data: Option<TaskFinishData>,
}

/// Payload of `build/taskFinish`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "dataKind", content = "data")]
pub enum TaskFinishData {
	/// A compile task finished for a target.
	#[serde(rename = "compile-report")]
	CompileReport(CompileReport),
	/// Summary of one test run.
	#[serde(rename = "test-report")]
	TestReport(TestReport),
	/// A single test or container finished.
	#[serde(rename = "test-finish")]
	TestFinish(TestFinish),
}

/// Start payload of a compile task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileTask {
	/// Compiled target.
	pub target: BuildTargetIdentifier,
}

/// Finish payload of a compile task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileReport {
	/// Compiled target.
	pub target: BuildTargetIdentifier,
	/// Origin id of the compile request.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub origin_id: Option<String>,
	/// Number of compile errors.
	pub errors: u32,
	/// Number of compile warnings.
	pub warnings: u32,
	/// Duration in milliseconds.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub time: Option<i64>,
	/// True when nothing was recompiled.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub no_op: Option<bool>,
}

/// Params of `buildTarget/compile`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileParams {
	/// Targets to compile.
	pub targets: Vec<BuildTargetIdentifier>,
	/// Client-chosen id echoed in notifications.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub origin_id: Option<String>,
	/// Extra arguments for the orchestrator.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub arguments: Option<Vec<String>>,
}

/// Result of `buildTarget/compile`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileResult {
	/// Echoed origin id.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub origin_id: Option<String>,
	/// Overall outcome.
	pub status_code: StatusCode,
}

/// Params of `buildTarget/cleanCache`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanCacheParams {
	/// Targets to clean.
	pub targets: Vec<BuildTargetIdentifier>,
}

/// Result of `buildTarget/cleanCache`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanCacheResult {
	/// Optional message.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
	/// True when every clean task succeeded.
	pub cleaned: bool,
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use rstest::rstest;
	use serde_json::json;

	use super::*;

	#[rstest]
	#[case(StatusCode::Ok, 1)]
	#[case(StatusCode::Error, 2)]
	#[case(StatusCode::Cancelled, 3)]
	fn status_code_wire_value(#[case] status: StatusCode, #[case] code: u8) {
		assert_eq!(serde_json::to_value(status).unwrap(), json!(code));
	}

	#[test]
	fn unknown_status_code_is_rejected() {
		assert!(serde_json::from_value::<StatusCode>(json!(9)).is_err());
	}

	#[test]
	fn compile_report_finish() {
		let params = TaskFinishParams {
			task_id: TaskId::new(":app:compileJava"),
			origin_id: None,
			event_time: Some(10),
			message: Some("Task :app:compileJava UP-TO-DATE".into()),
			status: StatusCode::Ok,
			data: Some(TaskFinishData::CompileReport(CompileReport {
				target: BuildTargetIdentifier::new("file:///app/?sourceset=main"),
				origin_id: Some("o1".into()),
				errors: 0,
				warnings: 0,
				time: Some(5),
				no_op: Some(true),
			})),
		};
		assert_eq!(
			serde_json::to_value(&params).unwrap(),
			json!({
				"taskId": {"id": ":app:compileJava"},
				"eventTime": 10,
				"message": "Task :app:compileJava UP-TO-DATE",
				"status": 1,
				"dataKind": "compile-report",
				"data": {
					"target": {"uri": "file:///app/?sourceset=main"},
					"originId": "o1",
					"errors": 0,
					"warnings": 0,
					"time": 5,
					"noOp": true,
				},
			})
		);
	}
}
