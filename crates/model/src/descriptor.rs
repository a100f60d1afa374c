use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::extension::{JavaExtension, KotlinExtension, LanguageExtension, ScalaExtension};

/// Durable reference to a source set: its project directory plus its name.
///
/// Used to correlate source sets within one refresh; never shown to clients.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StableDependencyKey {
	/// Absolute project directory.
	pub project_dir: PathBuf,
	/// Source set name.
	pub source_set_name: String,
}

impl StableDependencyKey {
	/// Creates a key.
	pub fn new(project_dir: impl Into<PathBuf>, source_set_name: impl Into<String>) -> Self {
		Self {
			project_dir: project_dir.into(),
			source_set_name: source_set_name.into(),
		}
	}
}

/// One resolved file of an external module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Artifact {
	/// File URI.
	pub uri: String,
	/// Classifier such as `sources` or `javadoc`.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub classifier: Option<String>,
}

/// An external module dependency.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleDependency {
	/// Group id.
	pub group: String,
	/// Module name.
	pub module: String,
	/// Version.
	pub version: String,
	/// Resolved files.
	#[serde(default)]
	pub artifacts: Vec<Artifact>,
}

/// How the orchestrator launches a JVM for one run or test task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JvmTaskEnvironment {
	/// Task path, e.g. `:app:run`.
	pub task_path: String,
	/// Runtime classpath, in classpath order.
	pub classpath: Vec<PathBuf>,
	/// JVM options.
	pub jvm_options: Vec<String>,
	/// Working directory of the launched JVM.
	pub working_directory: PathBuf,
	/// Environment of the launched JVM.
	pub environment_variables: BTreeMap<String, String>,
	/// Main class of a run task.
	pub main_class: Option<String>,
	/// Program arguments of a run task.
	pub arguments: Vec<String>,
	/// Test classes a test task executes.
	pub test_classes: Vec<String>,
}

/// One compilable and testable unit of a project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SourceSetDescriptor {
	/// Version of the orchestrator that produced the descriptor.
	pub gradle_version: Option<String>,
	/// Project name.
	pub project_name: String,
	/// Orchestrator project path, e.g. `:lib:core`.
	pub project_path: String,
	/// Absolute project directory.
	pub project_dir: PathBuf,
	/// Absolute directory of the root project.
	pub root_dir: PathBuf,
	/// Source set name, e.g. `main`.
	pub source_set_name: String,
	/// Task that compiles and processes resources.
	pub classes_task_name: String,
	/// Task that deletes outputs.
	pub clean_task_name: String,
	/// Every task that acts on this source set.
	pub task_names: BTreeSet<String>,
	/// Source directories.
	pub source_dirs: BTreeSet<PathBuf>,
	/// Directories of generated sources.
	pub generated_source_dirs: BTreeSet<PathBuf>,
	/// Compiled class output directories.
	pub source_output_dirs: BTreeSet<PathBuf>,
	/// Resource directories.
	pub resource_dirs: BTreeSet<PathBuf>,
	/// Processed resource output directories.
	pub resource_output_dirs: BTreeSet<PathBuf>,
	/// Compile classpath, in classpath order.
	pub compile_classpath: Vec<PathBuf>,
	/// External module dependencies.
	pub module_dependencies: BTreeSet<ModuleDependency>,
	/// Other source sets this one depends on.
	pub build_target_dependencies: BTreeSet<StableDependencyKey>,
	/// Test tasks of this source set.
	pub test_tasks: BTreeSet<String>,
	/// True when the source set contains tests.
	pub has_tests: bool,
	/// Launch environments of the application run tasks.
	pub run_tasks: BTreeSet<JvmTaskEnvironment>,
	/// Launch environments of the test tasks.
	pub test_environments: BTreeSet<JvmTaskEnvironment>,
	/// Per-language payloads.
	pub extensions: Vec<LanguageExtension>,
}

impl SourceSetDescriptor {
	/// Creates a descriptor with only its identifying attributes set.
	pub fn new(project_dir: impl Into<PathBuf>, source_set_name: impl Into<String>) -> Self {
		Self {
			project_dir: project_dir.into(),
			source_set_name: source_set_name.into(),
			..Self::default()
		}
	}

	/// The key other descriptors use to depend on this one.
	pub fn key(&self) -> StableDependencyKey {
		StableDependencyKey::new(self.project_dir.clone(), self.source_set_name.clone())
	}

	/// Directory tasks for this source set run in.
	pub fn root_dir(&self) -> &Path {
		if self.root_dir.as_os_str().is_empty() {
			&self.project_dir
		} else {
			&self.root_dir
		}
	}

	/// Language ids of every extension, in reporting order.
	pub fn language_ids(&self) -> Vec<String> {
		self.extensions.iter().map(|ext| ext.language_id().to_owned()).collect()
	}

	/// The Java payload, if any.
	pub fn java(&self) -> Option<&JavaExtension> {
		self.extensions.iter().find_map(|ext| match ext {
			LanguageExtension::Java(java) => Some(java),
			_ => None,
		})
	}

	/// The Scala payload, if any.
	pub fn scala(&self) -> Option<&ScalaExtension> {
		self.extensions.iter().find_map(|ext| match ext {
			LanguageExtension::Scala(scala) => Some(scala),
			_ => None,
		})
	}

	/// The Kotlin payload, if any.
	pub fn kotlin(&self) -> Option<&KotlinExtension> {
		self.extensions.iter().find_map(|ext| match ext {
			LanguageExtension::Kotlin(kotlin) => Some(kotlin),
			_ => None,
		})
	}
}
