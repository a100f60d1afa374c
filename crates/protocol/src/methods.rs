//! Method descriptors binding wire names to parameter and result types.

use gbs_rpc::{Notification, Request};
use serde_json::Value as JsonValue;

use crate::*;

macro_rules! request {
	($(#[$meta:meta])* $name:ident, $method:literal, $params:ty, $result:ty) => {
		$(#[$meta])*
		#[derive(Debug)]
		pub enum $name {}

		impl Request for $name {
			const METHOD: &'static str = $method;
			type Params = $params;
			type Result = $result;
		}
	};
}

macro_rules! notification {
	($(#[$meta:meta])* $name:ident, $method:literal, $params:ty) => {
		$(#[$meta])*
		#[derive(Debug)]
		pub enum $name {}

		impl Notification for $name {
			const METHOD: &'static str = $method;
			type Params = $params;
		}
	};
}

request!(
	/// Handshake; must precede every other request.
	Initialize, "build/initialize", InitializeBuildParams, InitializeBuildResult
);
request!(
	/// Asks the server to release its resources.
	Shutdown, "build/shutdown", Option<JsonValue>, Option<JsonValue>
);
request!(
	/// Lists every build target.
	WorkspaceBuildTargets, "workspace/buildTargets", Option<JsonValue>, WorkspaceBuildTargetsResult
);
request!(
	/// Refreshes the project model.
	WorkspaceReload, "workspace/reload", Option<JsonValue>, Option<JsonValue>
);
request!(
	/// Source directories of targets.
	BuildTargetSources, "buildTarget/sources", TargetsParams, SourcesResult
);
request!(
	/// Resource directories of targets.
	BuildTargetResources, "buildTarget/resources", TargetsParams, ResourcesResult
);
request!(
	/// Output directories of targets.
	BuildTargetOutputPaths, "buildTarget/outputPaths", TargetsParams, OutputPathsResult
);
request!(
	/// External modules of targets.
	BuildTargetDependencyModules, "buildTarget/dependencyModules", TargetsParams, DependencyModulesResult
);
request!(
	/// Source archives of targets' external modules.
	BuildTargetDependencySources, "buildTarget/dependencySources", TargetsParams, DependencySourcesResult
);
request!(
	/// Targets owning a document.
	BuildTargetInverseSources, "buildTarget/inverseSources", InverseSourcesParams, InverseSourcesResult
);
request!(
	/// `javac` options of targets.
	BuildTargetJavacOptions, "buildTarget/javacOptions", TargetsParams, JavacOptionsResult
);
request!(
	/// `scalac` options of targets.
	BuildTargetScalacOptions, "buildTarget/scalacOptions", TargetsParams, ScalacOptionsResult
);
request!(
	/// Compile classpaths of targets.
	BuildTargetJvmCompileClasspath, "buildTarget/jvmCompileClasspath", TargetsParams, JvmCompileClasspathResult
);
request!(
	/// Launch environments of targets' run tasks.
	BuildTargetJvmRunEnvironment, "buildTarget/jvmRunEnvironment", JvmEnvironmentParams, JvmRunEnvironmentResult
);
request!(
	/// Launch environments of targets' test tasks.
	BuildTargetJvmTestEnvironment, "buildTarget/jvmTestEnvironment", JvmEnvironmentParams, JvmTestEnvironmentResult
);
request!(
	/// Compiles targets.
	BuildTargetCompile, "buildTarget/compile", CompileParams, CompileResult
);
request!(
	/// Runs targets' tests.
	BuildTargetTest, "buildTarget/test", TestParams, TestResult
);
request!(
	/// Runs a main class of a target.
	BuildTargetRun, "buildTarget/run", RunParams, RunResult
);
request!(
	/// Deletes targets' outputs.
	BuildTargetCleanCache, "buildTarget/cleanCache", CleanCacheParams, CleanCacheResult
);

notification!(
	/// Client finished processing the initialize result.
	Initialized, "build/initialized", Option<JsonValue>
);
notification!(
	/// Client asks the process to exit.
	Exit, "build/exit", Option<JsonValue>
);
notification!(
	/// A task started.
	TaskStart, "build/taskStart", TaskStartParams
);
notification!(
	/// A task made progress.
	TaskProgress, "build/taskProgress", TaskProgressParams
);
notification!(
	/// A task finished.
	TaskFinish, "build/taskFinish", TaskFinishParams
);
notification!(
	/// Log output for the client.
	LogMessage, "build/logMessage", LogMessageParams
);
notification!(
	/// Targets were created, changed, or deleted.
	DidChangeBuildTarget, "buildTarget/didChange", crate::DidChangeBuildTarget
);
