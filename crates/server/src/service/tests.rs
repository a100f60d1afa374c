use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use gbs_model::{
	Artifact, ExtensionCommon, JavaExtension, JvmTaskEnvironment, LanguageExtension, ModuleDependency,
	ScalaExtension, SourceSetDescriptor,
};
use gbs_protocol::{
	BuildClientCapabilities, BuildTargetEventData, BuildTargetEventKind, BuildTargetIdentifier, CleanCacheParams,
	CompileParams, InitializeBuildParams, InverseSourcesParams, JvmEnvironmentParams, JvmMainClass, MessageType,
	RunParams, SourceItem, SourceItemKind, StatusCode, TargetsParams, TestParams, TextDocumentIdentifier,
};
use gbs_rpc::{AnyNotification, AnyRequest, ErrorCode, RequestId, ResponseError, RpcService};
use gbs_targets::target_id;
use gbs_worker::CancellationToken;
use pretty_assertions::assert_eq;
use serde_json::{Value as JsonValue, json};
use tokio::sync::Notify;
use tower_service::Service;

use super::{BuildServer, LifecycleState};
use crate::ServiceError;
use crate::runner::{AppLaunch, ProgressEvent, ProgressSink, RunRequest, TaskOutcome, TaskRunner, TestFilter};
use crate::testing::{FixedProvider, RecordingClient, Script, ScriptedRunner, Sent, source_set};

struct Harness {
	server: Arc<BuildServer>,
	client: Arc<RecordingClient>,
	provider: Arc<FixedProvider>,
	runner: Arc<ScriptedRunner>,
}

impl Harness {
	fn new(descriptors: Vec<SourceSetDescriptor>) -> Self {
		let runner = Arc::new(ScriptedRunner::default());
		Self::build(descriptors, runner.clone(), runner)
	}

	fn with_runner(descriptors: Vec<SourceSetDescriptor>, runner: Arc<dyn TaskRunner>) -> Self {
		Self::build(descriptors, runner, Arc::new(ScriptedRunner::default()))
	}

	fn build(descriptors: Vec<SourceSetDescriptor>, runner: Arc<dyn TaskRunner>, scripted: Arc<ScriptedRunner>) -> Self {
		let client = Arc::new(RecordingClient::default());
		let provider = Arc::new(FixedProvider::with(descriptors));
		let server = Arc::new(BuildServer::new(client.clone(), provider.clone(), runner));
		Self {
			server,
			client,
			provider,
			runner: scripted,
		}
	}

	fn init(self, client: &str, data: Option<JsonValue>) -> Self {
		self.server.initialize(init_params(client, data)).unwrap();
		self.server.initialized();
		self
	}
}

fn app() -> Vec<SourceSetDescriptor> {
	vec![source_set("app", "main"), source_set("app", "test")]
}

fn init_params(client: &str, data: Option<JsonValue>) -> InitializeBuildParams {
	InitializeBuildParams {
		display_name: client.into(),
		version: "1.0".into(),
		bsp_version: "2.1.0".into(),
		root_uri: "file:///ws/".into(),
		capabilities: BuildClientCapabilities {
			language_ids: vec!["java".into()],
		},
		data_kind: None,
		data,
	}
}

fn id(name: &str) -> BuildTargetIdentifier {
	target_id(Path::new("/ws/app"), name).unwrap()
}

fn token() -> CancellationToken {
	CancellationToken::new()
}

fn targets(names: &[&str]) -> TargetsParams {
	TargetsParams {
		targets: names.iter().map(|n| id(n)).collect(),
	}
}

fn compile_params(names: &[&str]) -> CompileParams {
	CompileParams {
		targets: names.iter().map(|n| id(n)).collect(),
		origin_id: Some("c1".into()),
		arguments: None,
	}
}

fn test_params(targets: Vec<BuildTargetIdentifier>, data_kind: Option<&str>, data: Option<JsonValue>) -> TestParams {
	TestParams {
		targets,
		origin_id: Some("t1".into()),
		arguments: None,
		data_kind: data_kind.map(str::to_owned),
		data,
	}
}

fn failing() -> Script {
	Script {
		events: Vec::new(),
		status: StatusCode::Error,
		gate: None,
	}
}

#[tokio::test]
async fn requests_before_initialize_are_rejected() {
	let h = Harness::new(app());
	assert!(matches!(
		h.server.check_ready("workspace/buildTargets"),
		Err(ServiceError::NotInitialized)
	));
	assert!(h.server.check_ready("build/initialize").is_ok());
	assert!(matches!(
		h.server.workspace_build_targets(token()).await,
		Err(ServiceError::NotInitialized)
	));
	assert_eq!(h.provider.calls(), 0);
}

#[test]
fn initialize_reports_capabilities_and_effective_preferences() {
	let h = Harness::new(app());
	let result = h.server.initialize(init_params("IntelliJ-BSP", None)).unwrap();
	assert_eq!(result.display_name, "gbs");
	assert_eq!(result.data_kind.as_deref(), Some("BSP-Preferences"));
	let data = result.data.unwrap();
	assert_eq!(data["displayNaming"], json!("dot"));
	assert_eq!(data["useQualifiedOutputPaths"], json!(false));

	let caps = result.capabilities;
	assert_eq!(caps.can_reload, Some(true));
	assert_eq!(caps.build_target_changed_provider, Some(true));
	assert!(caps.compile_provider.unwrap().language_ids.contains(&"java".to_owned()));
	assert!(caps.run_provider.unwrap().language_ids.contains(&"scala".to_owned()));
	assert_eq!(caps.jvm_run_environment_provider, Some(true));
	assert_eq!(caps.jvm_test_environment_provider, Some(true));
	assert_eq!(caps.jvm_compile_classpath_provider, Some(true));
	assert_eq!(h.server.lifecycle(), LifecycleState::Initializing);

	let err = ResponseError::from(h.server.initialize(init_params("IntelliJ-BSP", None)).unwrap_err());
	assert_eq!(err.code, ErrorCode::INVALID_REQUEST);
}

#[test]
fn initialize_rejects_a_non_file_root() {
	let h = Harness::new(app());
	let mut params = init_params("vscode", None);
	params.root_uri = "https://example.com/ws".into();
	assert!(matches!(h.server.initialize(params), Err(ServiceError::InvalidParams(_))));
	assert_eq!(h.server.lifecycle(), LifecycleState::Uninitialized);
}

#[test]
fn exit_code_depends_on_shutdown() {
	let h = Harness::new(app()).init("vscode", None);
	assert_eq!(h.server.lifecycle(), LifecycleState::Initialized);
	assert_eq!(h.server.exit_code(), 1);
	h.server.shutdown();
	assert_eq!(h.server.exit_code(), 0);
}

#[tokio::test]
async fn first_load_is_shared_and_silent() {
	let h = Harness::new(app()).init("vscode", None);
	let (a, b) = tokio::join!(
		h.server.workspace_build_targets(token()),
		h.server.workspace_build_targets(token()),
	);
	assert_eq!(a.unwrap().targets.len(), 2);
	assert_eq!(b.unwrap().targets.len(), 2);
	assert_eq!(h.provider.calls(), 1);
	assert_eq!(h.provider.roots.lock()[0].as_path(), Path::new("/ws"));
	assert!(h.client.take().is_empty());
}

#[tokio::test]
async fn reload_before_first_load_does_nothing() {
	let h = Harness::new(app()).init("vscode", None);
	h.server.reload(token()).await.unwrap();
	assert_eq!(h.provider.calls(), 0);
	assert_eq!(h.server.cache().snapshot().generation(), 0);
}

#[tokio::test]
async fn reload_publishes_changes_to_the_client() {
	let h = Harness::new(app()).init("vscode", None);
	h.server.workspace_build_targets(token()).await.unwrap();

	let mut main = source_set("app", "main");
	main.compile_classpath.push("/repo/guava.jar".into());
	h.provider.set(vec![main]);
	h.server.reload(token()).await.unwrap();

	let sent = h.client.take();
	let [Sent::Changed(params)] = sent.as_slice() else {
		panic!("expected one didChange, got {sent:?}");
	};
	let kinds: Vec<_> = params.changes.iter().map(|c| (c.target.clone(), c.kind)).collect();
	assert_eq!(
		kinds,
		[
			(id("main"), Some(BuildTargetEventKind::Changed)),
			(id("test"), Some(BuildTargetEventKind::Deleted)),
		]
	);
	assert!(matches!(
		&params.changes[0].data,
		Some(BuildTargetEventData::SourceSetChange(diff)) if diff.starts_with("compileClasspath")
	));

	h.server.reload(token()).await.unwrap();
	assert!(h.client.take().is_empty());
}

#[tokio::test]
async fn failed_load_is_reported_and_retried() {
	let h = Harness::new(app()).init("vscode", None);
	*h.provider.fail_with.lock() = Some("daemon disappeared".into());
	let err = h.server.workspace_build_targets(token()).await.unwrap_err();
	assert_eq!(ResponseError::from(err).message, "daemon disappeared");
	let sent = h.client.take();
	assert!(matches!(
		sent.as_slice(),
		[Sent::Log(log)] if log.kind == MessageType::Error && log.message.contains("daemon disappeared")
	));

	*h.provider.fail_with.lock() = None;
	assert_eq!(h.server.workspace_build_targets(token()).await.unwrap().targets.len(), 2);
	assert_eq!(h.provider.calls(), 2);
}

#[tokio::test]
async fn base_directory_follows_client_preferences() {
	let h = Harness::new(app()).init("IntelliJ-BSP", None);
	let listing = h.server.workspace_build_targets(token()).await.unwrap();
	assert!(listing.targets.iter().all(|t| t.base_directory.is_none()));
	assert_eq!(listing.targets[0].display_name.as_deref(), Some("app.main"));

	let h = Harness::new(app()).init("vscode", None);
	let listing = h.server.workspace_build_targets(token()).await.unwrap();
	assert!(listing.targets.iter().all(|t| t.base_directory.as_deref() == Some("file:///ws/")));
	assert_eq!(listing.targets[0].display_name.as_deref(), Some("app [main]"));
}

#[tokio::test]
async fn per_target_queries_skip_unknown_targets() {
	let h = Harness::new(app()).init("vscode", None);
	let mut params = targets(&["test"]);
	params.targets.push(BuildTargetIdentifier::new("file:///elsewhere/?sourceset=main"));
	params.targets.push(id("main"));

	let sources = h.server.sources(params, token()).await.unwrap();
	let ids: Vec<_> = sources.items.iter().map(|i| i.target.clone()).collect();
	assert_eq!(ids, [id("test"), id("main")]);
	assert_eq!(
		sources.items[1].sources,
		[SourceItem {
			uri: "file:///ws/app/src/main/java/".into(),
			kind: SourceItemKind::Directory,
			generated: false,
		}]
	);

	let resources = h.server.resources(targets(&["main"]), token()).await.unwrap();
	assert_eq!(resources.items[0].resources, ["file:///ws/app/src/main/resources/"]);
}

/// `app` with compiler payloads, a run task on `main` and a test task environment on `test`.
fn jvm_app() -> Vec<SourceSetDescriptor> {
	let mut main = source_set("app", "main");
	main.compile_classpath = vec!["/repo/guava.jar".into(), "/ws/lib/build/classes/java/main".into()];
	let classes = |dir: &str| ExtensionCommon {
		classes_dir: Some(dir.into()),
		..ExtensionCommon::default()
	};
	main.extensions = vec![
		LanguageExtension::Java(JavaExtension {
			common: classes("/ws/app/build/classes/java/main"),
			compiler_args: vec!["-parameters".into()],
			..JavaExtension::default()
		}),
		LanguageExtension::Scala(ScalaExtension {
			common: classes("/ws/app/build/classes/scala/main"),
			scala_compiler_args: vec!["-deprecation".into()],
			..ScalaExtension::default()
		}),
	];
	main.run_tasks.insert(JvmTaskEnvironment {
		task_path: ":app:run".into(),
		classpath: vec!["/ws/app/build/classes/java/main".into()],
		working_directory: "/ws/app".into(),
		environment_variables: [("APP_MODE".to_owned(), "dev".to_owned())].into(),
		main_class: Some("app.Main".into()),
		arguments: vec!["--port".into(), "8080".into()],
		..JvmTaskEnvironment::default()
	});

	let mut test = source_set("app", "test");
	test.test_environments.insert(JvmTaskEnvironment {
		task_path: ":app:test".into(),
		classpath: vec!["/ws/app/build/classes/java/test".into()],
		jvm_options: vec!["-ea".into()],
		working_directory: "/ws/app".into(),
		test_classes: vec!["app.CalcTest".into()],
		..JvmTaskEnvironment::default()
	});
	vec![main, test]
}

fn env_params(names: &[&str]) -> JvmEnvironmentParams {
	JvmEnvironmentParams {
		targets: names.iter().map(|n| id(n)).collect(),
		origin_id: None,
	}
}

#[tokio::test]
async fn compiler_options_come_from_the_language_payloads() {
	let h = Harness::new(jvm_app()).init("vscode", None);
	let classpath = ["file:///repo/guava.jar", "file:///ws/lib/build/classes/java/main"];

	let javac = h.server.javac_options(targets(&["main", "test"]), token()).await.unwrap();
	assert_eq!(javac.items.len(), 2);
	assert_eq!(javac.items[0].options, ["-parameters"]);
	assert_eq!(javac.items[0].classpath, classpath);
	assert_eq!(javac.items[0].class_directory, "file:///ws/app/build/classes/java/main/");
	assert_eq!(javac.items[1].target, id("test"));
	assert_eq!(javac.items[1].class_directory, "");

	let scalac = h.server.scalac_options(targets(&["main", "test"]), token()).await.unwrap();
	let scala_targets: Vec<_> = scalac.items.iter().map(|i| i.target.clone()).collect();
	assert_eq!(scala_targets, [id("main")]);
	assert_eq!(scalac.items[0].options, ["-deprecation"]);
	assert_eq!(scalac.items[0].class_directory, "file:///ws/app/build/classes/scala/main/");

	let compile = h.server.jvm_compile_classpath(targets(&["main"]), token()).await.unwrap();
	assert_eq!(compile.items[0].classpath, classpath);
}

#[tokio::test]
async fn jvm_environments_list_run_and_test_tasks() {
	let h = Harness::new(jvm_app()).init("vscode", None);

	let run = h.server.jvm_run_environment(env_params(&["main", "test"]), token()).await.unwrap();
	assert_eq!(run.items.len(), 1);
	let item = &run.items[0];
	assert_eq!(item.target, id("main"));
	assert_eq!(item.working_directory, "file:///ws/app/");
	assert_eq!(item.environment_variables["APP_MODE"], "dev");
	assert_eq!(
		item.main_classes,
		Some(vec![JvmMainClass {
			class_name: "app.Main".into(),
			arguments: vec!["--port".into(), "8080".into()],
		}])
	);

	let test = h.server.jvm_test_environment(env_params(&["main", "test"]), token()).await.unwrap();
	assert_eq!(test.items.len(), 1);
	assert_eq!(test.items[0].target, id("test"));
	assert_eq!(test.items[0].jvm_options, ["-ea"]);
	assert_eq!(test.items[0].classpath, ["file:///ws/app/build/classes/java/test"]);
	assert_eq!(
		test.items[0].main_classes,
		Some(vec![JvmMainClass {
			class_name: "app.CalcTest".into(),
			arguments: Vec::new(),
		}])
	);
}

#[tokio::test]
async fn output_paths_are_qualified_unless_disabled() {
	let h = Harness::new(app()).init("vscode", None);
	let paths = h.server.output_paths(targets(&["main"]), token()).await.unwrap();
	let uris: Vec<_> = paths.items[0].output_paths.iter().map(|p| p.uri.as_str()).collect();
	assert_eq!(
		uris,
		[
			"file:///ws/app/build/classes/java/main/?kind=source",
			"file:///ws/app/build/resources/main/?kind=resource",
		]
	);

	let h = Harness::new(app()).init("IntelliJ-BSP", None);
	let paths = h.server.output_paths(targets(&["main"]), token()).await.unwrap();
	let uris: Vec<_> = paths.items[0].output_paths.iter().map(|p| p.uri.as_str()).collect();
	assert_eq!(
		uris,
		["file:///ws/app/build/classes/java/main/", "file:///ws/app/build/resources/main/"]
	);
}

#[tokio::test]
async fn dependency_queries_use_module_artifacts() {
	let mut main = source_set("app", "main");
	main.module_dependencies.insert(ModuleDependency {
		group: "com.google.guava".into(),
		module: "guava".into(),
		version: "33.0".into(),
		artifacts: vec![
			Artifact {
				uri: "file:///repo/guava.jar".into(),
				classifier: None,
			},
			Artifact {
				uri: "file:///repo/guava-sources.jar".into(),
				classifier: Some("sources".into()),
			},
		],
	});
	let h = Harness::new(vec![main]).init("vscode", None);

	let modules = h.server.dependency_modules(targets(&["main"]), token()).await.unwrap();
	let module = &modules.items[0].modules[0];
	assert_eq!(
		(module.name.as_str(), module.version.as_str(), module.data_kind.as_str()),
		("guava", "33.0", "maven")
	);
	assert_eq!(module.data.organization, "com.google.guava");
	assert_eq!(module.data.artifacts.len(), 2);

	let sources = h.server.dependency_sources(targets(&["main"]), token()).await.unwrap();
	assert_eq!(sources.items[0].sources, ["file:///repo/guava-sources.jar"]);
}

#[tokio::test]
async fn inverse_sources_finds_owning_targets() {
	let h = Harness::new(app()).init("vscode", None);
	let params = InverseSourcesParams {
		text_document: TextDocumentIdentifier {
			uri: "file:///ws/app/src/test/java/app/CalcTest.java".into(),
		},
	};
	assert_eq!(h.server.inverse_sources(params, token()).await.unwrap().targets, [id("test")]);

	let bad = InverseSourcesParams {
		text_document: TextDocumentIdentifier { uri: "untitled:1".into() },
	};
	assert!(matches!(
		h.server.inverse_sources(bad, token()).await,
		Err(ServiceError::InvalidParams(_))
	));
}

#[tokio::test]
async fn compile_groups_targets_by_root_and_dedupes() {
	let mut lib = source_set("lib", "main");
	lib.root_dir = "/other".into();
	let mut descriptors = app();
	descriptors.push(lib);
	let h = Harness::new(descriptors).init(
		"vscode",
		Some(json!({"reloadAfterCompile": false, "gradleArguments": ["--offline"]})),
	);

	let mut params = compile_params(&["main", "test", "main"]);
	params.targets.push(target_id(Path::new("/ws/lib"), "main").unwrap());
	let result = h.server.compile(params, token()).await.unwrap();
	assert_eq!(result.status_code, StatusCode::Ok);
	assert_eq!(result.origin_id.as_deref(), Some("c1"));

	let calls: Vec<_> = h
		.runner
		.requests
		.lock()
		.iter()
		.map(|r| (r.root.clone(), r.tasks.clone(), r.arguments.clone()))
		.collect();
	let offline = vec!["--offline".to_owned()];
	assert_eq!(
		calls,
		[
			(PathBuf::from("/other"), vec![":lib:classes".to_owned()], offline.clone()),
			(
				PathBuf::from("/ws"),
				vec![":app:classes".to_owned(), ":app:testClasses".to_owned()],
				offline,
			),
		]
	);
}

#[tokio::test]
async fn compile_stops_at_the_first_failing_root() {
	let mut lib = source_set("lib", "main");
	lib.root_dir = "/other".into();
	let h = Harness::new(vec![source_set("app", "main"), lib]).init("vscode", None);
	h.runner.push(failing());

	let mut params = compile_params(&["main"]);
	params.targets.push(target_id(Path::new("/ws/lib"), "main").unwrap());
	let result = h.server.compile(params, token()).await.unwrap();
	assert_eq!(result.status_code, StatusCode::Error);
	assert_eq!(h.runner.requests.lock().len(), 1);
}

#[tokio::test]
async fn empty_compile_succeeds_without_running() {
	let h = Harness::new(app()).init("vscode", None);
	let result = h.server.compile(compile_params(&[]), token()).await.unwrap();
	assert_eq!(result.status_code, StatusCode::Ok);
	assert!(h.runner.requests.lock().is_empty());
	assert_eq!(h.provider.calls(), 0);
}

#[tokio::test]
async fn missing_task_name_is_invalid_params() {
	let mut main = source_set("app", "main");
	main.classes_task_name.clear();
	let h = Harness::new(vec![main]).init("vscode", None);
	assert!(matches!(
		h.server.compile(compile_params(&["main"]), token()).await,
		Err(ServiceError::InvalidParams(message)) if message.ends_with("has no compile task")
	));
}

async fn await_reload(h: &Harness) {
	tokio::time::timeout(Duration::from_secs(5), async {
		while h.provider.calls() < 2 {
			tokio::time::sleep(Duration::from_millis(5)).await;
		}
	})
	.await
	.expect("background reload ran");
}

#[tokio::test]
async fn successful_compile_schedules_a_reload() {
	let h = Harness::new(app()).init("vscode", None);
	h.server.compile(compile_params(&["main"]), token()).await.unwrap();
	await_reload(&h).await;
}

#[tokio::test]
async fn failed_compile_still_schedules_a_reload() {
	let h = Harness::new(app()).init("vscode", None);
	h.runner.push(failing());
	let result = h.server.compile(compile_params(&["main"]), token()).await.unwrap();
	assert_eq!(result.status_code, StatusCode::Error);
	await_reload(&h).await;
}

#[tokio::test]
async fn compile_reload_can_be_disabled() {
	let h = Harness::new(app()).init("vscode", Some(json!({"reloadAfterCompile": false})));
	h.server.compile(compile_params(&["main"]), token()).await.unwrap();
	tokio::time::sleep(Duration::from_millis(50)).await;
	assert_eq!(h.provider.calls(), 1);
}

#[tokio::test]
async fn cancelled_token_stops_before_the_next_root() {
	let h = Harness::new(app()).init("vscode", None);
	h.server.workspace_build_targets(token()).await.unwrap();
	let cancelled = token();
	cancelled.cancel();
	let result = h.server.compile(compile_params(&["main"]), cancelled).await.unwrap();
	assert_eq!(result.status_code, StatusCode::Cancelled);
	assert!(h.runner.requests.lock().is_empty());
}

struct BrokenRunner;

#[async_trait]
impl TaskRunner for BrokenRunner {
	async fn run(&self, _request: RunRequest, _token: CancellationToken, _sink: ProgressSink) -> anyhow::Result<StatusCode> {
		Err(anyhow::anyhow!("gradle daemon crashed").context("running :app:classes"))
	}
}

#[tokio::test]
async fn runner_failure_is_reported_and_returned() {
	let h = Harness::with_runner(app(), Arc::new(BrokenRunner)).init("vscode", None);
	let err = h.server.compile(compile_params(&["main"]), token()).await.unwrap_err();
	assert!(matches!(err, ServiceError::ToolInvocation(_)));
	assert_eq!(err.root_cause(), "gradle daemon crashed");

	let sent = h.client.take();
	assert!(matches!(
		sent.as_slice(),
		[Sent::Log(log)] if log.message == "running :app:classes: gradle daemon crashed"
	));
}

#[tokio::test]
async fn clean_reports_whether_every_root_succeeded() {
	let h = Harness::new(app()).init("vscode", None);
	let params = CleanCacheParams {
		targets: vec![id("main"), id("test")],
	};
	assert!(h.server.clean_cache(params.clone(), token()).await.unwrap().cleaned);
	assert_eq!(h.runner.requests.lock()[0].tasks, [":app:clean"]);

	h.runner.push(failing());
	assert!(!h.server.clean_cache(params, token()).await.unwrap().cleaned);
}

#[tokio::test]
async fn test_runs_each_selected_target_with_its_filters() {
	let mut descriptors = app();
	descriptors.push(source_set("lib", "test"));
	let h = Harness::new(descriptors).init("vscode", None);
	let lib_test = target_id(Path::new("/ws/lib"), "test").unwrap();

	let params = test_params(
		vec![id("test"), lib_test],
		Some("scala-test"),
		Some(json!({"testClasses": [{"target": {"uri": id("test").uri}, "classes": ["app.CalcTest"]}]})),
	);
	let result = h.server.test(params, token()).await.unwrap();
	assert_eq!(result.status_code, StatusCode::Ok);
	assert_eq!(result.origin_id.as_deref(), Some("t1"));

	let requests = h.runner.requests.lock().clone();
	assert_eq!(requests.len(), 1);
	assert_eq!(requests[0].tasks, [":app:test"]);
	assert_eq!(
		requests[0].test_filters,
		[TestFilter {
			class_name: "app.CalcTest".into(),
			method: None,
		}]
	);
	assert_eq!(h.client.labels(), ["test-task", "test-report"]);
}

#[tokio::test]
async fn suite_selection_needs_exactly_one_target() {
	let h = Harness::new(app()).init("vscode", None);
	let suites = json!({"suites": [
		{"className": "app.CalcTest", "tests": ["adds", "subtracts"]},
		{"className": "app.OtherTest"},
	]});

	let params = test_params(
		vec![id("main"), id("test")],
		Some("scala-test-suites-selection"),
		Some(suites.clone()),
	);
	assert_eq!(h.server.test(params, token()).await.unwrap().status_code, StatusCode::Error);
	assert!(h.runner.requests.lock().is_empty());

	let params = test_params(vec![id("test")], Some("scala-test-suites-selection"), Some(suites));
	assert_eq!(h.server.test(params, token()).await.unwrap().status_code, StatusCode::Ok);
	let patterns: Vec<String> = h.runner.requests.lock()[0].test_filters.iter().map(TestFilter::pattern).collect();
	assert_eq!(patterns, ["app.CalcTest.adds", "app.CalcTest.subtracts", "app.OtherTest"]);
}

#[tokio::test]
async fn unsupported_test_data_kind_is_an_error_result() {
	let h = Harness::new(app()).init("vscode", None);
	let params = test_params(vec![id("test")], Some("junit"), Some(json!({})));
	assert_eq!(h.server.test(params, token()).await.unwrap().status_code, StatusCode::Error);
	assert!(h.runner.requests.lock().is_empty());
	assert!(matches!(
		h.client.take().as_slice(),
		[Sent::Log(log)] if log.kind == MessageType::Warning && log.origin_id.as_deref() == Some("t1")
	));
}

#[tokio::test]
async fn failing_test_target_stops_the_run() {
	let mut descriptors = app();
	descriptors.push(source_set("lib", "test"));
	let h = Harness::new(descriptors).init("vscode", None);
	h.runner.push(failing());

	let lib_test = target_id(Path::new("/ws/lib"), "test").unwrap();
	let params = test_params(vec![id("test"), lib_test, id("main")], None, None);
	assert_eq!(h.server.test(params, token()).await.unwrap().status_code, StatusCode::Error);
	assert_eq!(h.runner.requests.lock().len(), 1);
}

/// Waits for `release` after announcing entry, then reports its events.
struct GatedRunner {
	entered: Notify,
	release: Notify,
	events: Vec<ProgressEvent>,
}

#[async_trait]
impl TaskRunner for GatedRunner {
	async fn run(&self, _request: RunRequest, _token: CancellationToken, sink: ProgressSink) -> anyhow::Result<StatusCode> {
		self.entered.notify_one();
		self.release.notified().await;
		for event in self.events.clone() {
			sink.send(event);
		}
		Ok(StatusCode::Ok)
	}
}

#[tokio::test]
async fn in_flight_request_keeps_the_snapshot_it_started_with() {
	let runner = Arc::new(GatedRunner {
		entered: Notify::new(),
		release: Notify::new(),
		events: vec![
			ProgressEvent::TaskStarted {
				task: ":app:compileJava".into(),
				message: None,
				time: Some(1),
			},
			ProgressEvent::TaskFinished {
				task: ":app:compileJava".into(),
				outcome: TaskOutcome::Success,
				message: None,
				time: Some(5),
			},
		],
	});
	let h = Harness::with_runner(app(), runner.clone()).init("vscode", Some(json!({"reloadAfterCompile": false})));
	let compile = {
		let server = h.server.clone();
		tokio::spawn(async move { server.compile(compile_params(&["main"]), CancellationToken::new()).await })
	};
	runner.entered.notified().await;

	let mut renamed = source_set("app", "main");
	renamed.task_names.remove(":app:compileJava");
	h.provider.set(vec![renamed]);
	h.server.reload(token()).await.unwrap();
	assert!(h.server.cache().snapshot().targets_for_task(":app:compileJava").is_empty());
	assert_eq!(h.client.labels(), ["did-change"]);

	runner.release.notify_one();
	assert_eq!(compile.await.unwrap().unwrap().status_code, StatusCode::Ok);
	assert_eq!(h.client.labels(), ["did-change", "compile-task", "compile-report"]);
}

fn request(id: i64, method: &str, params: JsonValue) -> AnyRequest {
	AnyRequest {
		id: RequestId::Number(id),
		method: method.into(),
		params,
	}
}

fn notification(method: &str) -> AnyNotification {
	AnyNotification {
		method: method.into(),
		params: JsonValue::Null,
	}
}

#[tokio::test]
async fn router_serves_the_protocol_methods() {
	let h = Harness::new(app());
	let mut router = crate::router(h.server.clone());

	let err = router
		.call(request(1, "workspace/buildTargets", JsonValue::Null))
		.await
		.unwrap_err();
	assert_eq!(err.code, ErrorCode::SERVER_NOT_INITIALIZED);

	let init = serde_json::to_value(init_params("vscode", None)).unwrap();
	let result = router.call(request(2, "build/initialize", init)).await.unwrap();
	assert_eq!(result["displayName"], json!("gbs"));
	assert!(router.notify(notification("build/initialized")).is_continue());
	assert_eq!(h.server.lifecycle(), LifecycleState::Initialized);

	let listing = router
		.call(request(3, "workspace/buildTargets", JsonValue::Null))
		.await
		.unwrap();
	assert_eq!(listing["targets"].as_array().map(Vec::len), Some(2));

	let shutdown = router.call(request(4, "build/shutdown", JsonValue::Null)).await.unwrap();
	assert_eq!(shutdown, JsonValue::Null);
	assert!(router.notify(notification("build/exit")).is_break());
	assert_eq!(h.server.exit_code(), 0);
}

fn run_params(data_kind: Option<&str>, data: JsonValue) -> RunParams {
	RunParams {
		target: id("main"),
		origin_id: Some("r1".into()),
		arguments: None,
		data_kind: data_kind.map(str::to_owned),
		data: Some(data),
		environment_variables: None,
	}
}

#[tokio::test]
async fn run_launches_the_main_class_of_the_target() {
	let h = Harness::new(app()).init("vscode", Some(json!({"gradleArguments": ["--offline"]})));
	let task = |task: &str, started: bool| {
		if started {
			ProgressEvent::TaskStarted {
				task: task.into(),
				message: None,
				time: Some(1),
			}
		} else {
			ProgressEvent::TaskFinished {
				task: task.into(),
				outcome: TaskOutcome::Success,
				message: None,
				time: Some(2),
			}
		}
	};
	h.runner.push(Script::ok(vec![
		task(":app:compileJava", true),
		task(":app:compileJava", false),
		task(":app:gbsRunApp", true),
		ProgressEvent::Output {
			text: "listening on 8080".into(),
			stderr: false,
		},
		task(":app:gbsRunApp", false),
	]));
	let mut params = run_params(
		Some("scala-main-class"),
		json!({
			"class": "app.Main",
			"arguments": ["--port", "8080"],
			"jvmOptions": ["-Xmx256m"],
			"environmentVariables": ["APP_MODE=dev", "SHARED=payload"],
		}),
	);
	params.environment_variables = Some([("SHARED".to_owned(), "request".to_owned())].into());

	let result = h.server.run_main_class(params, token()).await.unwrap();
	assert_eq!(result.status_code, StatusCode::Ok);
	assert_eq!(result.origin_id.as_deref(), Some("r1"));

	let requests = h.runner.requests.lock().clone();
	assert_eq!(requests.len(), 1);
	assert_eq!(requests[0].root, PathBuf::from("/ws"));
	assert_eq!(requests[0].tasks, ["gbsRunApp"]);
	assert_eq!(requests[0].arguments, ["--offline"]);
	assert_eq!(
		requests[0].launch,
		Some(AppLaunch {
			project_path: ":app".into(),
			source_set_name: "main".into(),
			class_name: "app.Main".into(),
			arguments: vec!["--port".into(), "8080".into()],
			jvm_options: vec!["-Xmx256m".into()],
			environment: [
				("APP_MODE".to_owned(), "dev".to_owned()),
				("SHARED".to_owned(), "request".to_owned()),
			]
			.into(),
		})
	);
	assert_eq!(
		h.client.labels(),
		["compile-task", "compile-report", "task-start", "log", "task-finish"]
	);
}

#[tokio::test]
async fn run_arguments_from_the_request_replace_the_payload() {
	let h = Harness::new(app()).init("vscode", None);
	let mut params = run_params(Some("scala-main-class"), json!({"class": "app.Main", "arguments": ["a"]}));
	params.arguments = Some(vec!["b".into()]);
	h.server.run_main_class(params, token()).await.unwrap();
	let launch = h.runner.requests.lock()[0].launch.clone().unwrap();
	assert_eq!(launch.arguments, ["b"]);

	let mut params = run_params(Some("scala-main-class"), json!({"class": "app.Main", "arguments": ["a"]}));
	params.arguments = Some(Vec::new());
	h.server.run_main_class(params, token()).await.unwrap();
	let launch = h.runner.requests.lock()[1].launch.clone().unwrap();
	assert_eq!(launch.arguments, ["a"]);
}

#[tokio::test]
async fn run_rejects_unsupported_payloads() {
	let h = Harness::new(app()).init("vscode", None);
	let result = h.server.run_main_class(run_params(Some("jvm-main"), json!({})), token()).await.unwrap();
	assert_eq!(result.status_code, StatusCode::Error);

	let malformed = run_params(
		Some("scala-main-class"),
		json!({"class": "app.Main", "environmentVariables": ["NO_VALUE"]}),
	);
	let result = h.server.run_main_class(malformed, token()).await.unwrap();
	assert_eq!(result.status_code, StatusCode::Error);

	assert!(h.runner.requests.lock().is_empty());
	let sent = h.client.take();
	assert_eq!(sent.len(), 2);
	assert!(sent.iter().all(|s| matches!(s, Sent::Log(log) if log.kind == MessageType::Warning)));
}

#[tokio::test]
async fn run_of_an_unknown_target_fails() {
	let h = Harness::new(app()).init("vscode", None);
	let mut params = run_params(Some("scala-main-class"), json!({"class": "app.Main"}));
	params.target = BuildTargetIdentifier::new("file:///elsewhere/?sourceset=main");
	assert!(matches!(
		h.server.run_main_class(params, token()).await,
		Err(ServiceError::UnknownTarget(_))
	));
}
