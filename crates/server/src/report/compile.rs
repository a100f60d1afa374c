use std::sync::Arc;

use gbs_protocol::{
	BuildTargetIdentifier, CompileReport, CompileTask, StatusCode, TaskFinishData, TaskFinishParams, TaskId,
	TaskProgressParams, TaskStartData, TaskStartParams,
};
use gbs_targets::Snapshot;
use rustc_hash::FxHashMap;

use super::now_ms;
use crate::BuildClient;
use crate::runner::TaskOutcome;

/// Fans task events out to every target the task acts on.
///
/// Targets come from the task index of the snapshot the run started with. Events for tasks
/// no target claims are dropped.
pub(crate) struct CompileReporter {
	client: Arc<dyn BuildClient>,
	snapshot: Arc<Snapshot>,
	origin_id: Option<String>,
	started: FxHashMap<String, i64>,
}

impl CompileReporter {
	pub(crate) fn new(client: Arc<dyn BuildClient>, snapshot: Arc<Snapshot>, origin_id: Option<String>) -> Self {
		Self {
			client,
			snapshot,
			origin_id,
			started: FxHashMap::default(),
		}
	}

	fn targets(&self, task: &str) -> &[BuildTargetIdentifier] {
		self.snapshot.targets_for_task(task)
	}

	pub(crate) fn task_started(&mut self, task: &str, message: Option<String>, time: Option<i64>) {
		if self.targets(task).is_empty() {
			return;
		}
		let time = time.unwrap_or_else(now_ms);
		self.started.insert(task.to_owned(), time);
		for target in self.targets(task) {
			self.client.on_task_start(TaskStartParams {
				task_id: TaskId::new(task),
				origin_id: self.origin_id.clone(),
				event_time: Some(time),
				message: message.clone(),
				data: Some(TaskStartData::CompileTask(CompileTask { target: target.clone() })),
			});
		}
	}

	pub(crate) fn task_progress(
		&self,
		task: &str,
		message: Option<String>,
		total: Option<i64>,
		progress: Option<i64>,
		unit: Option<String>,
		time: Option<i64>,
	) {
		let time = time.unwrap_or_else(now_ms);
		for _ in self.targets(task) {
			self.client.on_task_progress(TaskProgressParams {
				task_id: TaskId::new(task),
				origin_id: self.origin_id.clone(),
				event_time: Some(time),
				message: message.clone(),
				total,
				progress,
				unit: unit.clone(),
			});
		}
	}

	pub(crate) fn task_finished(&mut self, task: &str, outcome: TaskOutcome, message: Option<String>, time: Option<i64>) {
		if self.targets(task).is_empty() {
			return;
		}
		let time = time.unwrap_or_else(now_ms);
		let duration = self.started.remove(task).map(|start| time - start);
		let status = match outcome {
			TaskOutcome::Failed => StatusCode::Error,
			_ => StatusCode::Ok,
		};
		for target in self.targets(task) {
			self.client.on_task_finish(TaskFinishParams {
				task_id: TaskId::new(task),
				origin_id: self.origin_id.clone(),
				event_time: Some(time),
				message: message.clone(),
				status,
				data: Some(TaskFinishData::CompileReport(CompileReport {
					target: target.clone(),
					origin_id: self.origin_id.clone(),
					errors: 0,
					warnings: 0,
					time: duration,
					no_op: Some(outcome.is_no_op()),
				})),
			});
		}
	}
}
