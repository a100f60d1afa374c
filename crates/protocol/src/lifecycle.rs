use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Languages the client can work with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildClientCapabilities {
	/// Language ids.
	#[serde(default)]
	pub language_ids: Vec<String>,
}

/// Params of `build/initialize`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeBuildParams {
	/// Client name, e.g. `IntelliJ-BSP`.
	pub display_name: String,
	/// Client version.
	pub version: String,
	/// Protocol version spoken by the client.
	pub bsp_version: String,
	/// Workspace root URI.
	pub root_uri: String,
	/// Client capabilities.
	#[serde(default)]
	pub capabilities: BuildClientCapabilities,
	/// Kind of `data`; unused by known clients.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data_kind: Option<String>,
	/// Server preferences.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data: Option<JsonValue>,
}

/// Languages supported by an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageProvider {
	/// Language ids.
	pub language_ids: Vec<String>,
}

/// Features the server supports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildServerCapabilities {
	/// `buildTarget/compile` support.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub compile_provider: Option<LanguageProvider>,
	/// `buildTarget/test` support.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub test_provider: Option<LanguageProvider>,
	/// `buildTarget/run` support.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub run_provider: Option<LanguageProvider>,
	/// `buildTarget/inverseSources` support.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub inverse_sources_provider: Option<bool>,
	/// `buildTarget/dependencySources` support.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub dependency_sources_provider: Option<bool>,
	/// `buildTarget/dependencyModules` support.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub dependency_modules_provider: Option<bool>,
	/// `buildTarget/resources` support.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub resources_provider: Option<bool>,
	/// `buildTarget/outputPaths` support.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub output_paths_provider: Option<bool>,
	/// `buildTarget/jvmRunEnvironment` support.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub jvm_run_environment_provider: Option<bool>,
	/// `buildTarget/jvmTestEnvironment` support.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub jvm_test_environment_provider: Option<bool>,
	/// `buildTarget/jvmCompileClasspath` support.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub jvm_compile_classpath_provider: Option<bool>,
	/// `buildTarget/didChange` notifications.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub build_target_changed_provider: Option<bool>,
	/// `workspace/reload` support.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub can_reload: Option<bool>,
}

/// `dataKind` of the preferences echoed by `build/initialize`.
pub const PREFERENCES_DATA_KIND: &str = "BSP-Preferences";

/// Result of `build/initialize`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeBuildResult {
	/// Server name.
	pub display_name: String,
	/// Server version.
	pub version: String,
	/// Protocol version spoken by the server.
	pub bsp_version: String,
	/// Server capabilities.
	pub capabilities: BuildServerCapabilities,
	/// Kind of `data`.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data_kind: Option<String>,
	/// Effective preferences.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data: Option<JsonValue>,
}
