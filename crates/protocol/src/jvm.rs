use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::target::BuildTargetIdentifier;

/// Compiler options of one target.
///
/// `buildTarget/javacOptions` and `buildTarget/scalacOptions` share this shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilerOptionsItem {
	/// Queried target.
	pub target: BuildTargetIdentifier,
	/// Compiler arguments.
	pub options: Vec<String>,
	/// Compile classpath URIs, in classpath order.
	pub classpath: Vec<String>,
	/// Class output directory URI; empty when unknown.
	pub class_directory: String,
}

/// Result of `buildTarget/javacOptions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JavacOptionsResult {
	/// One item per known target with Java sources.
	pub items: Vec<CompilerOptionsItem>,
}

/// Result of `buildTarget/scalacOptions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScalacOptionsResult {
	/// One item per known target with Scala sources.
	pub items: Vec<CompilerOptionsItem>,
}

/// Compile classpath of one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JvmCompileClasspathItem {
	/// Queried target.
	pub target: BuildTargetIdentifier,
	/// Classpath URIs, in classpath order.
	pub classpath: Vec<String>,
}

/// Result of `buildTarget/jvmCompileClasspath`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JvmCompileClasspathResult {
	/// One item per known target.
	pub items: Vec<JvmCompileClasspathItem>,
}

/// Params of `buildTarget/jvmRunEnvironment` and `buildTarget/jvmTestEnvironment`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JvmEnvironmentParams {
	/// Queried targets.
	pub targets: Vec<BuildTargetIdentifier>,
	/// Client-chosen id.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub origin_id: Option<String>,
}

/// A class with a `main` method, or a test class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JvmMainClass {
	/// Fully qualified class name.
	pub class_name: String,
	/// Program arguments.
	pub arguments: Vec<String>,
}

/// How to launch a JVM for one task of a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JvmEnvironmentItem {
	/// Queried target.
	pub target: BuildTargetIdentifier,
	/// Runtime classpath URIs.
	pub classpath: Vec<String>,
	/// JVM options.
	pub jvm_options: Vec<String>,
	/// Working directory URI.
	pub working_directory: String,
	/// Environment variables.
	pub environment_variables: BTreeMap<String, String>,
	/// Main or test classes.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub main_classes: Option<Vec<JvmMainClass>>,
}

/// Result of `buildTarget/jvmRunEnvironment`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JvmRunEnvironmentResult {
	/// One item per run task of every known target.
	pub items: Vec<JvmEnvironmentItem>,
}

/// Result of `buildTarget/jvmTestEnvironment`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JvmTestEnvironmentResult {
	/// One item per test task of every known target.
	pub items: Vec<JvmEnvironmentItem>,
}
