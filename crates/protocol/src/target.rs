use serde::{Deserialize, Serialize};

/// Opaque identifier of a build target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BuildTargetIdentifier {
	/// Target URI.
	pub uri: String,
}

impl BuildTargetIdentifier {
	/// Wraps a URI.
	pub fn new(uri: impl Into<String>) -> Self {
		Self { uri: uri.into() }
	}
}

/// Well-known build target tags.
pub mod tags {
	/// Target contains tests.
	pub const TEST: &str = "test";
	/// Target is a library.
	pub const LIBRARY: &str = "library";
	/// Target is an application.
	pub const APPLICATION: &str = "application";
}

/// Operations a build target supports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildTargetCapabilities {
	/// Target can be compiled.
	#[serde(default)]
	pub can_compile: bool,
	/// Target can be tested.
	#[serde(default)]
	pub can_test: bool,
	/// Target can be run.
	#[serde(default)]
	pub can_run: bool,
	/// Target can be debugged.
	#[serde(default)]
	pub can_debug: bool,
}

/// A compilable unit as presented to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildTarget {
	/// Target identifier.
	pub id: BuildTargetIdentifier,
	/// Human-readable name.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub display_name: Option<String>,
	/// Directory the target's sources live under.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub base_directory: Option<String>,
	/// Free-form tags such as [`tags::TEST`].
	#[serde(default)]
	pub tags: Vec<String>,
	/// Languages of the target's sources.
	#[serde(default)]
	pub language_ids: Vec<String>,
	/// Targets this target depends on.
	#[serde(default)]
	pub dependencies: Vec<BuildTargetIdentifier>,
	/// Supported operations.
	#[serde(default)]
	pub capabilities: BuildTargetCapabilities,
	/// Language-specific metadata.
	#[serde(flatten)]
	pub data: Option<BuildTargetData>,
}

/// Language-specific build target metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "dataKind", content = "data")]
pub enum BuildTargetData {
	/// Plain JVM target.
	#[serde(rename = "jvm")]
	Jvm(JvmBuildTarget),
	/// Scala target.
	#[serde(rename = "scala")]
	Scala(ScalaBuildTarget),
	/// Kotlin target.
	#[serde(rename = "kotlin")]
	Kotlin(KotlinBuildTarget),
}

/// JVM metadata of a target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JvmBuildTarget {
	/// URI of the JDK home.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub java_home: Option<String>,
	/// JDK version.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub java_version: Option<String>,
	/// Version of the build orchestrator that produced the target.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub gradle_version: Option<String>,
	/// Source language level.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub source_compatibility: Option<String>,
	/// Bytecode target level.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub target_compatibility: Option<String>,
}

/// Scala platform code for the JVM.
pub const SCALA_PLATFORM_JVM: u8 = 1;

/// Scala metadata of a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScalaBuildTarget {
	/// Scala organization, usually `org.scala-lang`.
	pub scala_organization: String,
	/// Full Scala version.
	pub scala_version: String,
	/// Binary Scala version.
	pub scala_binary_version: String,
	/// Target platform, [`SCALA_PLATFORM_JVM`] for every target this server produces.
	pub platform: u8,
	/// URIs of the Scala compiler jars.
	#[serde(default)]
	pub jars: Vec<String>,
	/// Underlying JVM metadata.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub jvm_build_target: Option<JvmBuildTarget>,
}

/// Kotlin metadata of a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KotlinBuildTarget {
	/// Kotlin language version.
	pub language_version: String,
	/// Kotlin API version.
	pub api_version: String,
	/// Compiler options.
	#[serde(default)]
	pub kotlinc_options: Vec<String>,
	/// Targets whose internals are visible to this one.
	#[serde(default)]
	pub associates: Vec<BuildTargetIdentifier>,
	/// Underlying JVM metadata.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub jvm_build_target: Option<JvmBuildTarget>,
}

/// Result of `workspace/buildTargets`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceBuildTargetsResult {
	/// Every target of the workspace.
	pub targets: Vec<BuildTarget>,
}

int_enum! {
	/// Kind of a build target change.
	pub enum BuildTargetEventKind {
		/// Target appeared.
		Created = 1,
		/// Target metadata changed.
		Changed = 2,
		/// Target disappeared.
		Deleted = 3,
	}
}

/// One changed target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildTargetEvent {
	/// Affected target.
	pub target: BuildTargetIdentifier,
	/// Kind of change.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub kind: Option<BuildTargetEventKind>,
	/// Change detail.
	#[serde(flatten)]
	pub data: Option<BuildTargetEventData>,
}

/// Detail attached to a [`BuildTargetEvent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "dataKind", content = "data")]
pub enum BuildTargetEventData {
	/// Field-level summary of what changed in the underlying source set.
	#[serde(rename = "SourceSetChange")]
	SourceSetChange(String),
}

/// Params of `buildTarget/didChange`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DidChangeBuildTarget {
	/// Changed targets.
	pub changes: Vec<BuildTargetEvent>,
}
