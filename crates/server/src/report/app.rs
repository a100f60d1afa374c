use std::sync::Arc;

use gbs_protocol::{StatusCode, TaskFinishParams, TaskId, TaskProgressParams, TaskStartParams};

use super::now_ms;
use crate::BuildClient;
use crate::runner::{APP_RUN_TASK, TaskOutcome};

/// Reports the task that launches an application, without any target payload.
///
/// Compile tasks the launch depends on still go through the compile reporter.
pub(crate) struct AppReporter {
	client: Arc<dyn BuildClient>,
	origin_id: Option<String>,
}

impl AppReporter {
	pub(crate) fn new(client: Arc<dyn BuildClient>, origin_id: Option<String>) -> Self {
		Self { client, origin_id }
	}

	/// True for the launch task, in any project.
	pub(crate) fn claims(task: &str) -> bool {
		task.rsplit(':').next() == Some(APP_RUN_TASK)
	}

	pub(crate) fn task_started(&self, task: &str, message: Option<String>, time: Option<i64>) {
		self.client.on_task_start(TaskStartParams {
			task_id: TaskId::new(task),
			origin_id: self.origin_id.clone(),
			event_time: Some(time.unwrap_or_else(now_ms)),
			message,
			data: None,
		});
	}

	pub(crate) fn task_progress(&self, task: &str, message: Option<String>, time: Option<i64>) {
		self.client.on_task_progress(TaskProgressParams {
			task_id: TaskId::new(task),
			origin_id: self.origin_id.clone(),
			event_time: Some(time.unwrap_or_else(now_ms)),
			message,
			total: None,
			progress: None,
			unit: None,
		});
	}

	pub(crate) fn task_finished(&self, task: &str, outcome: TaskOutcome, message: Option<String>, time: Option<i64>) {
		self.client.on_task_finish(TaskFinishParams {
			task_id: TaskId::new(task),
			origin_id: self.origin_id.clone(),
			event_time: Some(time.unwrap_or_else(now_ms)),
			message,
			status: if outcome == TaskOutcome::Failed { StatusCode::Error } else { StatusCode::Ok },
			data: None,
		});
	}
}
