//! In-test collaborators: a recording client, a scripted runner, and a settable provider.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use gbs_model::{JavaExtension, LanguageExtension, SourceSetDescriptor};
use gbs_protocol::{
	DidChangeBuildTarget, LogMessageParams, StatusCode, TaskFinishData, TaskFinishParams, TaskProgressParams,
	TaskStartData, TaskStartParams,
};
use gbs_worker::CancellationToken;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::runner::{ProgressEvent, ProgressSink, RunRequest, TaskRunner};
use crate::{BuildClient, ProjectModelProvider};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Sent {
	Start(TaskStartParams),
	Progress(TaskProgressParams),
	Finish(TaskFinishParams),
	Log(LogMessageParams),
	Changed(DidChangeBuildTarget),
}

impl Sent {
	/// Short label used to compare notification sequences.
	pub(crate) fn label(&self) -> &'static str {
		match self {
			Self::Start(p) => match p.data {
				Some(TaskStartData::CompileTask(_)) => "compile-task",
				Some(TaskStartData::TestTask(_)) => "test-task",
				Some(TaskStartData::TestStart(_)) => "test-start",
				None => "task-start",
			},
			Self::Progress(_) => "task-progress",
			Self::Finish(p) => match p.data {
				Some(TaskFinishData::CompileReport(_)) => "compile-report",
				Some(TaskFinishData::TestReport(_)) => "test-report",
				Some(TaskFinishData::TestFinish(_)) => "test-finish",
				None => "task-finish",
			},
			Self::Log(_) => "log",
			Self::Changed(_) => "did-change",
		}
	}
}

#[derive(Debug, Default)]
pub(crate) struct RecordingClient {
	sent: Mutex<Vec<Sent>>,
}

impl RecordingClient {
	pub(crate) fn take(&self) -> Vec<Sent> {
		std::mem::take(&mut *self.sent.lock())
	}

	pub(crate) fn labels(&self) -> Vec<&'static str> {
		self.sent.lock().iter().map(Sent::label).collect()
	}
}

impl BuildClient for RecordingClient {
	fn on_task_start(&self, params: TaskStartParams) {
		self.sent.lock().push(Sent::Start(params));
	}

	fn on_task_progress(&self, params: TaskProgressParams) {
		self.sent.lock().push(Sent::Progress(params));
	}

	fn on_task_finish(&self, params: TaskFinishParams) {
		self.sent.lock().push(Sent::Finish(params));
	}

	fn on_log_message(&self, params: LogMessageParams) {
		self.sent.lock().push(Sent::Log(params));
	}

	fn on_build_targets_changed(&self, params: DidChangeBuildTarget) {
		self.sent.lock().push(Sent::Changed(params));
	}
}

/// One scripted runner invocation.
#[derive(Debug, Clone)]
pub(crate) struct Script {
	pub events: Vec<ProgressEvent>,
	pub status: StatusCode,
	/// Waits for this before returning, after sending `events`.
	pub gate: Option<Arc<Notify>>,
}

impl Script {
	pub(crate) fn ok(events: Vec<ProgressEvent>) -> Self {
		Self {
			events,
			status: StatusCode::Ok,
			gate: None,
		}
	}
}

#[derive(Debug, Default)]
pub(crate) struct ScriptedRunner {
	scripts: Mutex<VecDeque<Script>>,
	pub requests: Mutex<Vec<RunRequest>>,
}

impl ScriptedRunner {
	pub(crate) fn push(&self, script: Script) {
		self.scripts.lock().push_back(script);
	}
}

#[async_trait]
impl TaskRunner for ScriptedRunner {
	async fn run(&self, request: RunRequest, token: CancellationToken, sink: ProgressSink) -> anyhow::Result<StatusCode> {
		self.requests.lock().push(request);
		let script = self.scripts.lock().pop_front();
		let Some(script) = script else {
			return Ok(StatusCode::Ok);
		};
		for event in script.events {
			sink.send(event);
		}
		if let Some(gate) = script.gate {
			tokio::select! {
				() = gate.notified() => {}
				() = token.cancelled() => return Ok(StatusCode::Cancelled),
			}
		}
		Ok(script.status)
	}
}

#[derive(Debug, Default)]
pub(crate) struct FixedProvider {
	pub descriptors: Mutex<Vec<SourceSetDescriptor>>,
	pub fail_with: Mutex<Option<String>>,
	pub calls: AtomicUsize,
	pub roots: Mutex<Vec<PathBuf>>,
}

impl FixedProvider {
	pub(crate) fn with(descriptors: Vec<SourceSetDescriptor>) -> Self {
		Self {
			descriptors: Mutex::new(descriptors),
			..Self::default()
		}
	}

	pub(crate) fn set(&self, descriptors: Vec<SourceSetDescriptor>) {
		*self.descriptors.lock() = descriptors;
	}

	pub(crate) fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl ProjectModelProvider for FixedProvider {
	async fn refresh(&self, root: &Path, _token: CancellationToken) -> anyhow::Result<Vec<SourceSetDescriptor>> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		self.roots.lock().push(root.to_path_buf());
		tokio::task::yield_now().await;
		if let Some(message) = self.fail_with.lock().clone() {
			anyhow::bail!(message);
		}
		Ok(self.descriptors.lock().clone())
	}
}

/// Java source set under `/ws/<project>` with conventional task names.
pub(crate) fn source_set(project: &str, name: &str) -> SourceSetDescriptor {
	let dir = PathBuf::from("/ws").join(project);
	let mut d = SourceSetDescriptor::new(&dir, name);
	d.project_name = project.to_owned();
	d.project_path = format!(":{project}");
	d.root_dir = "/ws".into();
	let (compile, classes) = if name == "main" {
		(format!(":{project}:compileJava"), format!(":{project}:classes"))
	} else {
		(
			format!(":{project}:compile{}Java", capitalize(name)),
			format!(":{project}:{name}Classes"),
		)
	};
	d.classes_task_name = classes;
	d.clean_task_name = format!(":{project}:clean");
	d.task_names.extend([compile, d.classes_task_name.clone(), d.clean_task_name.clone()]);
	d.source_dirs.insert(dir.join("src").join(name).join("java"));
	d.resource_dirs.insert(dir.join("src").join(name).join("resources"));
	d.source_output_dirs.insert(dir.join("build/classes/java").join(name));
	d.resource_output_dirs.insert(dir.join("build/resources").join(name));
	if name == "test" {
		d.has_tests = true;
		let test_task = format!(":{project}:test");
		d.test_tasks.insert(test_task.clone());
		d.task_names.insert(test_task);
	}
	d.extensions.push(LanguageExtension::Java(JavaExtension {
		java_version: Some("21".into()),
		..JavaExtension::default()
	}));
	d
}

fn capitalize(s: &str) -> String {
	let mut chars = s.chars();
	match chars.next() {
		Some(first) => first.to_uppercase().chain(chars).collect(),
		None => String::new(),
	}
}
