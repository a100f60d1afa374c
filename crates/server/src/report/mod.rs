//! Translation of runner progress into protocol notifications.

mod app;
mod compile;
mod test_run;

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use gbs_protocol::{BuildTargetIdentifier, LogMessageParams, MessageType, StatusCode, TestName, TestReport};
use gbs_targets::Snapshot;
use gbs_worker::CancellationToken;
use tracing::trace;

use self::app::AppReporter;
pub(crate) use self::compile::CompileReporter;
pub(crate) use self::test_run::TestReporter;
use crate::BuildClient;
use crate::runner::{ProgressEvent, ProgressSink, RunRequest, TaskRunner};

fn now_ms() -> i64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map_or(0, |d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
}

/// Routes the events of one run to the compile and test reporters.
pub(crate) struct EventTranslator {
	client: Arc<dyn BuildClient>,
	origin_id: Option<String>,
	compile: CompileReporter,
	test: Option<TestReporter>,
	app: Option<AppReporter>,
}

impl EventTranslator {
	/// Translator for a run that only reports task events.
	pub(crate) fn new(client: Arc<dyn BuildClient>, snapshot: Arc<Snapshot>, origin_id: Option<String>) -> Self {
		Self {
			compile: CompileReporter::new(client.clone(), snapshot, origin_id.clone()),
			client,
			origin_id,
			test: None,
			app: None,
		}
	}

	/// Translator for a test run of `target`; announces the run immediately.
	pub(crate) fn for_tests(
		client: Arc<dyn BuildClient>,
		snapshot: Arc<Snapshot>,
		origin_id: Option<String>,
		target: BuildTargetIdentifier,
	) -> Self {
		let mut this = Self::new(client.clone(), snapshot, origin_id.clone());
		this.test = Some(TestReporter::start(client, target, origin_id));
		this
	}

	/// Translator for an application launch; the launch task is reported on its own.
	pub(crate) fn for_app(client: Arc<dyn BuildClient>, snapshot: Arc<Snapshot>, origin_id: Option<String>) -> Self {
		let mut this = Self::new(client.clone(), snapshot, origin_id.clone());
		this.app = Some(AppReporter::new(client, origin_id));
		this
	}

	/// The launch reporter, when `task` is the launch task of an application run.
	fn app_task(&self, task: &str) -> Option<&AppReporter> {
		self.app.as_ref().filter(|_| AppReporter::claims(task))
	}

	pub(crate) fn handle(&mut self, event: ProgressEvent) {
		if let Some(app) = event.task().and_then(|task| self.app_task(task)) {
			match event {
				ProgressEvent::TaskStarted { task, message, time } => app.task_started(&task, message, time),
				ProgressEvent::TaskProgress { task, message, time, .. } => app.task_progress(&task, message, time),
				ProgressEvent::TaskFinished {
					task,
					outcome,
					message,
					time,
				} => app.task_finished(&task, outcome, message, time),
				_ => {}
			}
			return;
		}
		match event {
			ProgressEvent::TaskStarted { task, message, time } => self.compile.task_started(&task, message, time),
			ProgressEvent::TaskProgress {
				task,
				message,
				total,
				progress,
				unit,
				time,
			} => self.compile.task_progress(&task, message, total, progress, unit, time),
			ProgressEvent::TaskFinished {
				task,
				outcome,
				message,
				time,
			} => self.compile.task_finished(&task, outcome, message, time),
			ProgressEvent::TestStarted {
				id,
				parent,
				display_name,
				suite_name,
				class_name,
				method_name,
				time,
			} => match &mut self.test {
				Some(test) => {
					let name = TestName {
						display_name,
						suite_name,
						class_name,
						method_name,
						parent: None,
					};
					test.test_started(id, parent, name, time);
				}
				None => trace!(test = %id, "report.test.ignored"),
			},
			ProgressEvent::TestFinished {
				id,
				outcome,
				message,
				stack_trace,
				time,
			} => match &mut self.test {
				Some(test) => test.test_finished(&id, outcome, message, stack_trace, time),
				None => trace!(test = %id, "report.test.ignored"),
			},
			ProgressEvent::Output { text, stderr } => {
				self.log(if stderr { MessageType::Error } else { MessageType::Log }, text);
			}
			ProgressEvent::Failure { message } => self.log(MessageType::Error, message),
		}
	}

	fn log(&self, kind: MessageType, message: String) {
		self.client.on_log_message(LogMessageParams {
			kind,
			task: None,
			origin_id: self.origin_id.clone(),
			message,
		});
	}

	/// Ends the run. A test run sends its summary here, after every test finish.
	pub(crate) fn finish(self, status: StatusCode) -> Option<TestReport> {
		self.test.map(|test| test.finish(status))
	}
}

/// Runs `request` and translates its progress as it arrives.
///
/// Returns once the runner returned and every event it sent has been translated.
pub(crate) async fn drive(
	runner: &dyn TaskRunner,
	request: RunRequest,
	token: CancellationToken,
	translator: &mut EventTranslator,
) -> anyhow::Result<StatusCode> {
	let (sink, mut events) = ProgressSink::channel();
	let run = runner.run(request, token, sink);
	let consume = async {
		while let Some(event) = events.recv().await {
			translator.handle(event);
		}
	};
	let (status, ()) = tokio::join!(run, consume);
	status
}
