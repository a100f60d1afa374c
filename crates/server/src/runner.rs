//! Task runner contract and the progress events it reports.

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use gbs_protocol::{StatusCode, TestStatus};
use gbs_worker::CancellationToken;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// One orchestrator invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunRequest {
	/// Root project directory the tasks run in.
	pub root: PathBuf,
	/// Task paths, deduplicated.
	pub tasks: Vec<String>,
	/// Test filters; empty runs every test of the tasks.
	pub test_filters: Vec<TestFilter>,
	/// Extra orchestrator arguments.
	pub arguments: Vec<String>,
	/// Extra JVM arguments for the orchestrator process.
	pub jvm_arguments: Vec<String>,
	/// Application to launch through a generated [`APP_RUN_TASK`] task.
	pub launch: Option<AppLaunch>,
}

/// Name of the task the orchestrator generates to launch an application.
pub const APP_RUN_TASK: &str = "gbsRunApp";

/// A main class launched with a source set's runtime classpath.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppLaunch {
	/// Orchestrator project path, e.g. `:app`.
	pub project_path: String,
	/// Source set providing the classpath.
	pub source_set_name: String,
	/// Fully qualified main class.
	pub class_name: String,
	/// Program arguments.
	pub arguments: Vec<String>,
	/// JVM options of the launched program.
	pub jvm_options: Vec<String>,
	/// Environment of the launched program.
	pub environment: BTreeMap<String, String>,
}

/// Selects a test class, or one method of it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TestFilter {
	/// Fully qualified class name.
	pub class_name: String,
	/// Method name; `None` selects the whole class.
	pub method: Option<String>,
}

impl TestFilter {
	/// Filter pattern in `Class` or `Class.method` form.
	pub fn pattern(&self) -> String {
		match &self.method {
			Some(method) => format!("{}.{method}", self.class_name),
			None => self.class_name.clone(),
		}
	}
}

/// Executes orchestrator tasks.
///
/// Cancellation is cooperative. Once the orchestrator is past a point it cannot abandon,
/// for example while writing build outputs, firing the token only stops further progress
/// reporting; files already written stay written and the run may still report `OK`.
#[async_trait]
pub trait TaskRunner: Send + Sync {
	/// Runs `request`, reporting progress to `sink` in the orchestrator's emission order.
	///
	/// Returns `ERROR` for a failed build and `CANCELLED` when stopped through `token`;
	/// `Err` means the orchestrator could not be driven at all.
	async fn run(&self, request: RunRequest, token: CancellationToken, sink: ProgressSink) -> anyhow::Result<StatusCode>;
}

/// Outcome of one orchestrator task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskOutcome {
	/// Task did work and succeeded.
	Success,
	/// Outputs were current.
	UpToDate,
	/// Outputs came from the build cache.
	FromCache,
	/// Task did not run.
	Skipped,
	/// Task failed.
	Failed,
}

impl TaskOutcome {
	/// True when the task did no work.
	pub fn is_no_op(self) -> bool {
		matches!(self, Self::UpToDate | Self::FromCache | Self::Skipped)
	}
}

/// Outcome of one test or container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestOutcome {
	/// Passed.
	Passed,
	/// Failed.
	Failed,
	/// Skipped, e.g. by an assumption.
	Skipped,
	/// Disabled in source.
	Ignored,
	/// Stopped before completion.
	Cancelled,
}

impl From<TestOutcome> for TestStatus {
	fn from(outcome: TestOutcome) -> Self {
		match outcome {
			TestOutcome::Passed => Self::Passed,
			TestOutcome::Failed => Self::Failed,
			TestOutcome::Skipped => Self::Skipped,
			TestOutcome::Ignored => Self::Ignored,
			TestOutcome::Cancelled => Self::Cancelled,
		}
	}
}

/// Progress reported by a [`TaskRunner`].
///
/// `time` fields are milliseconds since the Unix epoch as seen by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ProgressEvent {
	/// A task started.
	TaskStarted {
		/// Task path, e.g. `:app:compileJava`.
		task: String,
		/// Orchestrator's description.
		#[serde(default)]
		message: Option<String>,
		/// Event time.
		#[serde(default)]
		time: Option<i64>,
	},
	/// A task reported intermediate progress.
	TaskProgress {
		/// Task path.
		task: String,
		/// Orchestrator's description.
		#[serde(default)]
		message: Option<String>,
		/// Total units of work.
		#[serde(default)]
		total: Option<i64>,
		/// Units completed.
		#[serde(default)]
		progress: Option<i64>,
		/// Unit name.
		#[serde(default)]
		unit: Option<String>,
		/// Event time.
		#[serde(default)]
		time: Option<i64>,
	},
	/// A task finished.
	TaskFinished {
		/// Task path.
		task: String,
		/// Result.
		outcome: TaskOutcome,
		/// Orchestrator's description.
		#[serde(default)]
		message: Option<String>,
		/// Event time.
		#[serde(default)]
		time: Option<i64>,
	},
	/// A test or test container started.
	TestStarted {
		/// Orchestrator id of the node, unique within the run.
		id: String,
		/// Orchestrator id of the enclosing node.
		#[serde(default)]
		parent: Option<String>,
		/// Display name.
		display_name: String,
		/// Enclosing suite.
		#[serde(default)]
		suite_name: Option<String>,
		/// Test class.
		#[serde(default)]
		class_name: Option<String>,
		/// Test method.
		#[serde(default)]
		method_name: Option<String>,
		/// Event time.
		#[serde(default)]
		time: Option<i64>,
	},
	/// A test or test container finished.
	TestFinished {
		/// Orchestrator id of the node.
		id: String,
		/// Result.
		outcome: TestOutcome,
		/// Failure message.
		#[serde(default)]
		message: Option<String>,
		/// Captured stack trace of a failure.
		#[serde(default)]
		stack_trace: Option<String>,
		/// Event time.
		#[serde(default)]
		time: Option<i64>,
	},
	/// Console output of the orchestrator.
	Output {
		/// Text, usually one line.
		text: String,
		/// True for standard error.
		#[serde(default)]
		stderr: bool,
	},
	/// The orchestrator reported a build failure.
	Failure {
		/// Failure summary and captured error output.
		message: String,
	},
}

impl ProgressEvent {
	/// Task path of a task event.
	pub fn task(&self) -> Option<&str> {
		match self {
			Self::TaskStarted { task, .. } | Self::TaskProgress { task, .. } | Self::TaskFinished { task, .. } => {
				Some(task)
			}
			_ => None,
		}
	}
}

/// Sending half of a run's progress channel.
#[derive(Debug, Clone)]
pub struct ProgressSink {
	tx: mpsc::UnboundedSender<ProgressEvent>,
}

impl ProgressSink {
	/// Creates a sink and the receiver the translator consumes.
	pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
		let (tx, rx) = mpsc::unbounded_channel();
		(Self { tx }, rx)
	}

	/// Reports one event. Events sent after the consumer is gone are dropped.
	pub fn send(&self, event: ProgressEvent) {
		let _ = self.tx.send(event);
	}
}
