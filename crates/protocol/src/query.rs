use serde::{Deserialize, Serialize};

use crate::target::BuildTargetIdentifier;

/// Params shared by every per-target query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetsParams {
	/// Queried targets.
	pub targets: Vec<BuildTargetIdentifier>,
}

int_enum! {
	/// Whether a source item is a file or a directory.
	pub enum SourceItemKind {
		/// A single file.
		File = 1,
		/// A directory.
		Directory = 2,
	}
}

/// One source location of a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceItem {
	/// File URI.
	pub uri: String,
	/// File or directory.
	pub kind: SourceItemKind,
	/// True when the sources are produced by the build.
	pub generated: bool,
}

/// Sources of one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcesItem {
	/// Queried target.
	pub target: BuildTargetIdentifier,
	/// Source locations.
	pub sources: Vec<SourceItem>,
}

/// Result of `buildTarget/sources`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcesResult {
	/// One item per known target.
	pub items: Vec<SourcesItem>,
}

/// Resources of one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcesItem {
	/// Queried target.
	pub target: BuildTargetIdentifier,
	/// Resource directory URIs.
	pub resources: Vec<String>,
}

/// Result of `buildTarget/resources`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcesResult {
	/// One item per known target.
	pub items: Vec<ResourcesItem>,
}

int_enum! {
	/// Whether an output path is a file or a directory.
	pub enum OutputPathItemKind {
		/// A single file.
		File = 1,
		/// A directory.
		Directory = 2,
	}
}

/// One output location of a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputPathItem {
	/// File URI, possibly with a `?kind=` qualifier.
	pub uri: String,
	/// File or directory.
	pub kind: OutputPathItemKind,
}

/// Output paths of one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputPathsItem {
	/// Queried target.
	pub target: BuildTargetIdentifier,
	/// Output locations.
	pub output_paths: Vec<OutputPathItem>,
}

/// Result of `buildTarget/outputPaths`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputPathsResult {
	/// One item per known target.
	pub items: Vec<OutputPathsItem>,
}

/// Dependency source archives of one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencySourcesItem {
	/// Queried target.
	pub target: BuildTargetIdentifier,
	/// Source archive URIs.
	pub sources: Vec<String>,
}

/// Result of `buildTarget/dependencySources`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencySourcesResult {
	/// One item per known target.
	pub items: Vec<DependencySourcesItem>,
}

/// `dataKind` of maven-shaped dependency modules.
pub const MAVEN_DATA_KIND: &str = "maven";

/// One artifact of a maven module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MavenDependencyModuleArtifact {
	/// Artifact URI.
	pub uri: String,
	/// Classifier such as `sources`.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub classifier: Option<String>,
}

/// Maven coordinates and artifacts of a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MavenDependencyModule {
	/// Group id.
	pub organization: String,
	/// Artifact id.
	pub name: String,
	/// Version.
	pub version: String,
	/// Resolved artifacts.
	pub artifacts: Vec<MavenDependencyModuleArtifact>,
}

/// One external dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyModule {
	/// Module name.
	pub name: String,
	/// Module version.
	pub version: String,
	/// Always [`MAVEN_DATA_KIND`].
	pub data_kind: String,
	/// Maven details.
	pub data: MavenDependencyModule,
}

/// Dependency modules of one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyModulesItem {
	/// Queried target.
	pub target: BuildTargetIdentifier,
	/// External modules.
	pub modules: Vec<DependencyModule>,
}

/// Result of `buildTarget/dependencyModules`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyModulesResult {
	/// One item per known target.
	pub items: Vec<DependencyModulesItem>,
}

/// A document reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextDocumentIdentifier {
	/// Document URI.
	pub uri: String,
}

/// Params of `buildTarget/inverseSources`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InverseSourcesParams {
	/// Document to look up.
	pub text_document: TextDocumentIdentifier,
}

/// Result of `buildTarget/inverseSources`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InverseSourcesResult {
	/// Targets whose sources contain the document.
	pub targets: Vec<BuildTargetIdentifier>,
}
