use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use gbs_protocol::{
	BuildTargetIdentifier, CleanCacheParams, CleanCacheResult, CompileParams, CompileResult, LogMessageParams,
	MessageType, RunParams, RunResult, ScalaMainClass, StatusCode, TestParams, TestResult, TestSelection,
};
use gbs_targets::{BuildTargetRecord, Snapshot};
use gbs_worker::CancellationToken;
use tracing::{debug, info, warn};

use super::{BuildServer, Session};
use crate::ServiceError;
use crate::report::{EventTranslator, drive};
use crate::runner::{APP_RUN_TASK, AppLaunch, RunRequest, TestFilter};

/// Known targets of `targets`, grouped by the root project directory their tasks run in.
fn group_by_root(
	snapshot: &Snapshot,
	targets: &[BuildTargetIdentifier],
	operation: &'static str,
) -> BTreeMap<PathBuf, Vec<Arc<BuildTargetRecord>>> {
	let mut groups: BTreeMap<PathBuf, Vec<Arc<BuildTargetRecord>>> = BTreeMap::new();
	for id in targets {
		match snapshot.get(id) {
			Some(record) => {
				let group = groups.entry(record.descriptor.root_dir().to_path_buf()).or_default();
				if !group.iter().any(|r| r.id() == id) {
					group.push(record.clone());
				}
			}
			None => {
				let err = ServiceError::UnknownTarget(id.uri.clone());
				warn!(operation, error = %err, "tasks.target.skipped");
			}
		}
	}
	groups
}

/// Task names of `group`, first occurrence kept.
fn task_names(
	group: &[Arc<BuildTargetRecord>],
	kind: &str,
	name: impl Fn(&BuildTargetRecord) -> &str,
) -> Result<Vec<String>, ServiceError> {
	let mut tasks: Vec<String> = Vec::with_capacity(group.len());
	for record in group {
		let task = name(record);
		if task.is_empty() {
			return Err(ServiceError::InvalidParams(format!("{} has no {kind} task", record.id().uri)));
		}
		if !tasks.iter().any(|t| t == task) {
			tasks.push(task.to_owned());
		}
	}
	Ok(tasks)
}

/// Test filters of one target, or `None` when the selection leaves the target out.
fn test_filters(selection: &TestSelection, target: &BuildTargetIdentifier) -> Option<Vec<TestFilter>> {
	match selection {
		TestSelection::All => Some(Vec::new()),
		TestSelection::Classes(params) => {
			let filters: Vec<TestFilter> = params
				.test_classes
				.iter()
				.filter(|item| &item.target == target)
				.flat_map(|item| &item.classes)
				.map(|class_name| TestFilter {
					class_name: class_name.clone(),
					method: None,
				})
				.collect();
			(!filters.is_empty()).then_some(filters)
		}
		TestSelection::Suites(suites) => Some(
			suites
				.suites
				.iter()
				.flat_map(|suite| {
					let class = |method: Option<String>| TestFilter {
						class_name: suite.class_name.clone(),
						method,
					};
					if suite.tests.is_empty() {
						vec![class(None)]
					} else {
						suite.tests.iter().map(|test| class(Some(test.clone()))).collect()
					}
				})
				.collect(),
		),
	}
}

/// Environment of a launched program: the payload's `KEY=VALUE` entries, overridden by the
/// request's map. Returns the first malformed entry as the error.
fn launch_environment(main_class: &ScalaMainClass, params: &RunParams) -> Result<BTreeMap<String, String>, String> {
	let mut environment = BTreeMap::new();
	for entry in main_class.environment_variables.iter().flatten() {
		let (key, value) = entry
			.split_once('=')
			.ok_or_else(|| format!("environment entry must have the form KEY=VALUE: {entry}"))?;
		environment.insert(key.to_owned(), value.to_owned());
	}
	environment.extend(params.environment_variables.iter().flatten().map(|(k, v)| (k.clone(), v.clone())));
	Ok(environment)
}

impl BuildServer {
	fn warn_client(&self, origin_id: Option<&String>, message: String) {
		self.client.on_log_message(LogMessageParams {
			kind: MessageType::Warning,
			task: None,
			origin_id: origin_id.cloned(),
			message,
		});
	}

	fn run_request(session: &Session, root: PathBuf, tasks: Vec<String>, arguments: Option<&Vec<String>>) -> RunRequest {
		let prefs = &session.preferences;
		let mut args = prefs.gradle_arguments.clone();
		args.extend(arguments.into_iter().flatten().cloned());
		RunRequest {
			root,
			tasks,
			test_filters: Vec::new(),
			arguments: args,
			jvm_arguments: prefs.gradle_jvm_arguments.clone(),
			launch: None,
		}
	}

	/// Runs one request, translating its events, and ends the translator.
	///
	/// A runner that could not be driven is reported to the client before the error is
	/// returned.
	async fn run(
		&self,
		request: RunRequest,
		token: &CancellationToken,
		mut translator: EventTranslator,
	) -> Result<StatusCode, ServiceError> {
		debug!(root = %request.root.display(), tasks = ?request.tasks, filters = request.test_filters.len(), "tasks.run");
		let outcome = drive(self.runner.as_ref(), request, token.clone(), &mut translator).await;
		let status = outcome.as_ref().map_or(StatusCode::Error, |status| *status);
		translator.finish(status);
		outcome.map_err(|err| {
			self.client.on_log_message(LogMessageParams::error(format!("{err:#}")));
			ServiceError::ToolInvocation(err)
		})
	}

	/// Runs the named task of every target, one runner call per root, stopping at the first
	/// failing root.
	async fn run_tasks(
		&self,
		targets: &[BuildTargetIdentifier],
		origin_id: Option<&String>,
		arguments: Option<&Vec<String>>,
		token: &CancellationToken,
		operation: &'static str,
		name: impl Fn(&BuildTargetRecord) -> &str,
	) -> Result<StatusCode, ServiceError> {
		let session = self.session()?;
		let snapshot = self.snapshot(token).await?;
		let mut status = StatusCode::Ok;
		for (root, group) in group_by_root(&snapshot, targets, operation) {
			if token.is_cancelled() {
				return Ok(StatusCode::Cancelled);
			}
			let tasks = task_names(&group, operation, &name)?;
			let request = Self::run_request(&session, root, tasks, arguments);
			let translator = EventTranslator::new(self.client.clone(), snapshot.clone(), origin_id.cloned());
			status = self.run(request, token, translator).await?;
			if status == StatusCode::Error {
				break;
			}
		}
		Ok(status)
	}

	/// `buildTarget/compile`. Every non-empty compile schedules a background reload, failed
	/// ones included, since code generators may have added source directories.
	pub async fn compile(self: &Arc<Self>, params: CompileParams, token: CancellationToken) -> Result<CompileResult, ServiceError> {
		if params.targets.is_empty() {
			return Ok(CompileResult {
				origin_id: params.origin_id,
				status_code: StatusCode::Ok,
			});
		}
		let status = self
			.run_tasks(
				&params.targets,
				params.origin_id.as_ref(),
				params.arguments.as_ref(),
				&token,
				"compile",
				|record| record.descriptor.classes_task_name.as_str(),
			)
			.await?;
		info!(targets = params.targets.len(), status = ?status, "tasks.compile.finished");
		if self.session()?.preferences.reload_after_compile() {
			self.schedule_reload();
		}
		Ok(CompileResult {
			origin_id: params.origin_id,
			status_code: status,
		})
	}

	/// `buildTarget/cleanCache`.
	pub async fn clean_cache(&self, params: CleanCacheParams, token: CancellationToken) -> Result<CleanCacheResult, ServiceError> {
		let status = self
			.run_tasks(&params.targets, None, None, &token, "clean", |record| {
				record.descriptor.clean_task_name.as_str()
			})
			.await?;
		Ok(CleanCacheResult {
			message: None,
			cleaned: status == StatusCode::Ok,
		})
	}

	/// `buildTarget/test`: one runner call per target, so every test report belongs to
	/// exactly one target.
	pub async fn test(&self, params: TestParams, token: CancellationToken) -> Result<TestResult, ServiceError> {
		let result = |status_code| TestResult {
			origin_id: params.origin_id.clone(),
			status_code,
		};
		let selection = match params.selection() {
			Ok(selection) => selection,
			Err(error) => {
				warn!(data_kind = ?params.data_kind, %error, "tasks.test.unsupported");
				self.warn_client(params.origin_id.as_ref(), error);
				return Ok(result(StatusCode::Error));
			}
		};
		if matches!(selection, TestSelection::Suites(_)) && params.targets.len() != 1 {
			warn!(targets = params.targets.len(), "tasks.test.suites_need_one_target");
			return Ok(result(StatusCode::Error));
		}

		let session = self.session()?;
		let snapshot = self.snapshot(&token).await?;
		let mut status = StatusCode::Ok;
		'roots: for (root, group) in group_by_root(&snapshot, &params.targets, "test") {
			for record in group {
				if token.is_cancelled() {
					status = StatusCode::Cancelled;
					break 'roots;
				}
				let Some(filters) = test_filters(&selection, record.id()) else {
					debug!(target = %record.id().uri, "tasks.test.not_selected");
					continue;
				};
				let tasks: Vec<String> = record.descriptor.test_tasks.iter().cloned().collect();
				if tasks.is_empty() {
					debug!(target = %record.id().uri, "tasks.test.no_test_task");
					continue;
				}
				let mut request = Self::run_request(&session, root.clone(), tasks, params.arguments.as_ref());
				request.test_filters = filters;
				let translator = EventTranslator::for_tests(
					self.client.clone(),
					snapshot.clone(),
					params.origin_id.clone(),
					record.id().clone(),
				);
				let code = self.run(request, &token, translator).await?;
				if code != StatusCode::Ok {
					status = code;
				}
				if code == StatusCode::Error {
					break 'roots;
				}
			}
		}
		Ok(result(status))
	}

	/// `buildTarget/run`: launches the payload's main class with the target's classpath.
	///
	/// Request arguments replace the payload's when non-empty. Compile tasks the launch
	/// triggers are reported like a compile.
	pub async fn run_main_class(&self, params: RunParams, token: CancellationToken) -> Result<RunResult, ServiceError> {
		let result = |status_code| RunResult {
			origin_id: params.origin_id.clone(),
			status_code,
		};
		let launch = params
			.main_class()
			.and_then(|main_class| Ok((launch_environment(&main_class, &params)?, main_class)));
		let (environment, main_class) = match launch {
			Ok(launch) => launch,
			Err(error) => {
				warn!(data_kind = ?params.data_kind, %error, "tasks.run.unsupported");
				self.warn_client(params.origin_id.as_ref(), error);
				return Ok(result(StatusCode::Error));
			}
		};

		let session = self.session()?;
		let snapshot = self.snapshot(&token).await?;
		let record = snapshot
			.get(&params.target)
			.ok_or_else(|| ServiceError::UnknownTarget(params.target.uri.clone()))?;
		if token.is_cancelled() {
			return Ok(result(StatusCode::Cancelled));
		}
		let d = &record.descriptor;
		let arguments = match &params.arguments {
			Some(arguments) if !arguments.is_empty() => arguments.clone(),
			_ => main_class.arguments,
		};
		let mut request = Self::run_request(&session, d.root_dir().to_path_buf(), vec![APP_RUN_TASK.to_owned()], None);
		request.launch = Some(AppLaunch {
			project_path: d.project_path.clone(),
			source_set_name: d.source_set_name.clone(),
			class_name: main_class.class_name,
			arguments,
			jvm_options: main_class.jvm_options,
			environment,
		});
		let translator = EventTranslator::for_app(self.client.clone(), snapshot.clone(), params.origin_id.clone());
		let status = self.run(request, &token, translator).await?;
		info!(target = %params.target.uri, status = ?status, "tasks.run.finished");
		Ok(result(status))
	}
}
