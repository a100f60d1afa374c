use std::sync::Arc;

use gbs_protocol::{
	BuildTargetIdentifier, StatusCode, TaskFinishData, TaskFinishParams, TaskId, TaskStartData, TaskStartParams,
	TestFinish, TestName, TestReport, TestStart, TestStatus, TestTask,
};
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use super::now_ms;
use crate::BuildClient;
use crate::runner::TestOutcome;

/// A started test or container. Lives only for one run.
struct TestNode {
	name: TestName,
	task_id: TaskId,
	parent: Option<String>,
	children: usize,
	finished: bool,
	failed_descendant: bool,
}

/// Mirrors the orchestrator's test tree as `test-start` / `test-finish` notifications and
/// reports one `test-report` summary for the run.
///
/// The summary counts leaves. A container only counts when it fails without any failed
/// descendant, which is how class-level setup failures show up.
pub(crate) struct TestReporter {
	client: Arc<dyn BuildClient>,
	target: BuildTargetIdentifier,
	origin_id: Option<String>,
	run_task: TaskId,
	nodes: FxHashMap<String, TestNode>,
	/// Node ids in start order.
	order: Vec<String>,
	report: TestReport,
	started: i64,
}

impl TestReporter {
	/// Creates the reporter and announces the run.
	pub(crate) fn start(client: Arc<dyn BuildClient>, target: BuildTargetIdentifier, origin_id: Option<String>) -> Self {
		let run_id = match &origin_id {
			Some(origin) => format!("{origin}:test:{}", target.uri),
			None => format!("test:{}", target.uri),
		};
		let started = now_ms();
		let this = Self {
			client,
			target: target.clone(),
			origin_id: origin_id.clone(),
			run_task: TaskId::new(run_id),
			nodes: FxHashMap::default(),
			order: Vec::new(),
			report: TestReport {
				origin_id,
				target,
				..TestReport::default()
			},
			started,
		};
		this.client.on_task_start(TaskStartParams {
			task_id: this.run_task.clone(),
			origin_id: this.origin_id.clone(),
			event_time: Some(started),
			message: Some(format!("Testing {}", this.target.uri)),
			data: Some(TaskStartData::TestTask(TestTask {
				target: this.target.clone(),
			})),
		});
		this
	}

	pub(crate) fn test_started(&mut self, id: String, parent: Option<String>, mut name: TestName, time: Option<i64>) {
		if self.nodes.contains_key(&id) {
			warn!(test = %id, "report.test.duplicate_start");
			return;
		}
		let parent = parent.filter(|p| {
			let known = self.nodes.contains_key(p);
			if !known {
				debug!(test = %id, parent = %p, "report.test.unknown_parent");
			}
			known
		});
		let parent_task = match parent.as_ref().and_then(|p| self.nodes.get_mut(p)) {
			Some(node) => {
				node.children += 1;
				name.parent = Some(Box::new(node.name.clone()));
				node.task_id.clone()
			}
			None => self.run_task.clone(),
		};
		let task_id = TaskId::child_of(format!("{}#{id}", self.run_task.id), &parent_task);

		self.client.on_task_start(TaskStartParams {
			task_id: task_id.clone(),
			origin_id: self.origin_id.clone(),
			event_time: Some(time.unwrap_or_else(now_ms)),
			message: Some(name.display_name.clone()),
			data: Some(TaskStartData::TestStart(TestStart {
				display_name: name.display_name.clone(),
				test_name: name.clone(),
			})),
		});
		self.order.push(id.clone());
		self.nodes.insert(
			id,
			TestNode {
				name,
				task_id,
				parent,
				children: 0,
				finished: false,
				failed_descendant: false,
			},
		);
	}

	pub(crate) fn test_finished(
		&mut self,
		id: &str,
		outcome: TestOutcome,
		message: Option<String>,
		stack_trace: Option<String>,
		time: Option<i64>,
	) {
		let Some(node) = self.nodes.get_mut(id) else {
			warn!(test = %id, "report.test.unknown_finish");
			return;
		};
		if node.finished {
			warn!(test = %id, "report.test.duplicate_finish");
			return;
		}
		node.finished = true;

		let status = TestStatus::from(outcome);
		let counted = node.children == 0 || (status == TestStatus::Failed && !node.failed_descendant);
		let params = TaskFinishParams {
			task_id: node.task_id.clone(),
			origin_id: self.origin_id.clone(),
			event_time: Some(time.unwrap_or_else(now_ms)),
			message: message.clone(),
			status: match status {
				TestStatus::Failed => StatusCode::Error,
				TestStatus::Cancelled => StatusCode::Cancelled,
				_ => StatusCode::Ok,
			},
			data: Some(TaskFinishData::TestFinish(TestFinish {
				display_name: node.name.display_name.clone(),
				message,
				status,
				test_name: node.name.clone(),
				stack_trace,
			})),
		};
		let mut ancestor = node.parent.clone();

		if counted {
			self.report.record(status);
		}
		if status == TestStatus::Failed {
			while let Some(parent) = ancestor.and_then(|p| self.nodes.get_mut(&p)) {
				parent.failed_descendant = true;
				ancestor = parent.parent.clone();
			}
		}
		self.client.on_task_finish(params);
	}

	/// Closes nodes the orchestrator never finished as cancelled, then sends the summary.
	pub(crate) fn finish(mut self, status: StatusCode) -> TestReport {
		let open: Vec<String> = self
			.order
			.iter()
			.rev()
			.filter(|id| self.nodes.get(*id).is_some_and(|n| !n.finished))
			.cloned()
			.collect();
		for id in open {
			self.test_finished(&id, TestOutcome::Cancelled, None, None, None);
		}

		let now = now_ms();
		self.report.time = Some(now - self.started);
		self.client.on_task_finish(TaskFinishParams {
			task_id: self.run_task.clone(),
			origin_id: self.origin_id.clone(),
			event_time: Some(now),
			message: None,
			status,
			data: Some(TaskFinishData::TestReport(self.report.clone())),
		});
		self.report
	}
}
