use std::collections::BTreeSet;
use std::path::PathBuf;

use gbs_model::{ExtensionCommon, JvmTaskEnvironment, SourceSetDescriptor};
use gbs_protocol::{
	BuildTargetIdentifier, CompilerOptionsItem, DependencyModule, DependencyModulesItem, DependencyModulesResult,
	DependencySourcesItem, DependencySourcesResult, InverseSourcesParams, InverseSourcesResult, JavacOptionsResult,
	JvmCompileClasspathItem, JvmCompileClasspathResult, JvmEnvironmentItem, JvmEnvironmentParams, JvmMainClass,
	JvmRunEnvironmentResult, JvmTestEnvironmentResult, MAVEN_DATA_KIND, MavenDependencyModule,
	MavenDependencyModuleArtifact, OutputPathItem, OutputPathItemKind, OutputPathsItem, OutputPathsResult,
	ResourcesItem, ResourcesResult, ScalacOptionsResult, SourceItem, SourceItemKind, SourcesItem, SourcesResult,
	TargetsParams, WorkspaceBuildTargetsResult,
};
use gbs_targets::{BuildTargetRecord, Snapshot, dir_uri, file_uri, uri_to_path};
use gbs_worker::CancellationToken;
use tracing::{debug, warn};

use super::BuildServer;
use crate::ServiceError;

/// Artifact classifier of source archives.
const SOURCES_CLASSIFIER: &str = "sources";

/// Applies `item` to every known target of `targets`, in request order.
///
/// Unknown targets are skipped with a warning; the batch as a whole still succeeds.
fn per_target<T>(
	snapshot: &Snapshot,
	targets: &[BuildTargetIdentifier],
	token: &CancellationToken,
	operation: &'static str,
	mut item: impl FnMut(&BuildTargetRecord) -> T,
) -> Result<Vec<T>, ServiceError> {
	let mut items = Vec::with_capacity(targets.len());
	for id in targets {
		if token.is_cancelled() {
			return Err(ServiceError::Cancelled);
		}
		match snapshot.get(id) {
			Some(record) => items.push(item(record)),
			None => {
				let err = ServiceError::UnknownTarget(id.uri.clone());
				warn!(operation, error = %err, "targets.query.skipped");
			}
		}
	}
	Ok(items)
}

fn dir_uris<'a>(dirs: impl IntoIterator<Item = &'a PathBuf>) -> impl Iterator<Item = String> {
	dirs.into_iter().filter_map(|dir| dir_uri(dir).ok())
}

fn file_uris<'a>(files: impl IntoIterator<Item = &'a PathBuf>) -> Vec<String> {
	files.into_iter().filter_map(|file| file_uri(file).ok()).collect()
}

/// Options item of `record`, or `None` when it has no payload for the language.
fn compiler_options(
	record: &BuildTargetRecord,
	language: &'static str,
	payload: impl FnOnce(&SourceSetDescriptor) -> Option<(&ExtensionCommon, &Vec<String>)>,
) -> Option<CompilerOptionsItem> {
	let d = &record.descriptor;
	let Some((common, options)) = payload(d) else {
		debug!(target = %record.id().uri, language, "targets.options.no_extension");
		return None;
	};
	Some(CompilerOptionsItem {
		target: record.id().clone(),
		options: options.clone(),
		classpath: file_uris(&d.compile_classpath),
		class_directory: common
			.classes_dir
			.as_deref()
			.and_then(|dir| dir_uri(dir).ok())
			.unwrap_or_default(),
	})
}

/// One environment item per task of `record`.
fn environments<'a>(
	record: &'a BuildTargetRecord,
	tasks: &'a BTreeSet<JvmTaskEnvironment>,
	main_classes: impl Fn(&JvmTaskEnvironment) -> Vec<JvmMainClass> + 'a,
) -> impl Iterator<Item = JvmEnvironmentItem> + 'a {
	tasks.iter().map(move |task| JvmEnvironmentItem {
		target: record.id().clone(),
		classpath: file_uris(&task.classpath),
		jvm_options: task.jvm_options.clone(),
		working_directory: dir_uri(&task.working_directory).unwrap_or_default(),
		environment_variables: task.environment_variables.clone(),
		main_classes: Some(main_classes(task)),
	})
}

fn output_paths(dirs: impl IntoIterator<Item = String>, suffix: &str) -> impl Iterator<Item = OutputPathItem> {
	dirs.into_iter().map(move |uri| OutputPathItem {
		uri: format!("{uri}{suffix}"),
		kind: OutputPathItemKind::Directory,
	})
}

impl BuildServer {
	/// `workspace/buildTargets`.
	pub async fn workspace_build_targets(&self, token: CancellationToken) -> Result<WorkspaceBuildTargetsResult, ServiceError> {
		let include_base = self.session()?.preferences.base_directory();
		let snapshot = self.snapshot(&token).await?;
		let targets = snapshot
			.records()
			.map(|record| {
				let mut target = record.target.clone();
				if !include_base {
					target.base_directory = None;
				}
				target
			})
			.collect();
		Ok(WorkspaceBuildTargetsResult { targets })
	}

	/// `buildTarget/sources`.
	pub async fn sources(&self, params: TargetsParams, token: CancellationToken) -> Result<SourcesResult, ServiceError> {
		let snapshot = self.snapshot(&token).await?;
		let items = per_target(&snapshot, &params.targets, &token, "sources", |record| {
			let d = &record.descriptor;
			let sources = dir_uris(&d.source_dirs)
				.map(|uri| (uri, false))
				.chain(dir_uris(&d.generated_source_dirs).map(|uri| (uri, true)))
				.map(|(uri, generated)| SourceItem {
					uri,
					kind: SourceItemKind::Directory,
					generated,
				})
				.collect();
			SourcesItem {
				target: record.id().clone(),
				sources,
			}
		})?;
		Ok(SourcesResult { items })
	}

	/// `buildTarget/resources`.
	pub async fn resources(&self, params: TargetsParams, token: CancellationToken) -> Result<ResourcesResult, ServiceError> {
		let snapshot = self.snapshot(&token).await?;
		let items = per_target(&snapshot, &params.targets, &token, "resources", |record| ResourcesItem {
			target: record.id().clone(),
			resources: dir_uris(&record.descriptor.resource_dirs).collect(),
		})?;
		Ok(ResourcesResult { items })
	}

	/// `buildTarget/outputPaths`.
	pub async fn file_uris<'a>(files: impl IntoIterator<Item = &'a PathBuf>) -> Vec<String> {
	files.into_iter().filter_map(|file| file_uri(file).ok()).collect()
}

/// Options item of `record`, or `None` when it has no payload for the language.
fn compiler_options(
	record: &BuildTargetRecord,
	language: &'static str,
	payload: impl FnOnce(&SourceSetDescriptor) -> Option<(&ExtensionCommon, &Vec<String>)>,
) -> Option<CompilerOptionsItem> {
	let d = &record.descriptor;
	let Some((common, options)) = payload(d) else {
		debug!(target = %record.id().uri, language, "targets.options.no_extension");
		return None;
	};
	Some(CompilerOptionsItem {
		target: record.id().clone(),
		options: options.clone(),
		classpath: file_uris(&d.compile_classpath),
		class_directory: common
			.classes_dir
			.as_deref()
			.and_then(|dir| dir_uri(dir).ok())
			.unwrap_or_default(),
	})
}

/// One environment item per task of `record`.
fn environments<'a>(
	record: &'a BuildTargetRecord,
	tasks: &'a BTreeSet<JvmTaskEnvironment>,
	main_classes: impl Fn(&JvmTaskEnvironment) -> Vec<JvmMainClass> + 'a,
) -> impl Iterator<Item = JvmEnvironmentItem> + 'a {
	tasks.iter().map(move |task| JvmEnvironmentItem {
		target: record.id().clone(),
		classpath: file_uris(&task.classpath),
		jvm_options: task.jvm_options.clone(),
		working_directory: dir_uri(&task.working_directory).unwrap_or_default(),
		environment_variables: task.environment_variables.clone(),
		main_classes: Some(main_classes(task)),
	})
}

	pub async fn output_paths(
		&self,
		params: TargetsParams,
		token: CancellationToken,
	) -> Result<OutputPathsResult, ServiceError> {
		let qualified = self.session()?.preferences.qualified_output_paths();
		let (source_suffix, resource_suffix) = if qualified { ("?kind=source", "?kind=resource") } else { ("", "") };
		let snapshot = self.snapshot(&token).await?;
		let items = per_target(&snapshot, &params.targets, &token, "outputPaths", |record| {
			let d = &record.descriptor;
			OutputPathsItem {
				target: record.id().clone(),
				output_paths: output_paths(dir_uris(&d.source_output_dirs), source_suffix)
					.chain(output_paths(dir_uris(&d.resource_output_dirs), resource_suffix))
					.collect(),
			}
		})?;
		Ok(OutputPathsResult { items })
	}

	/// `buildTarget/dependencyModules`.
	pub async fn dependency_modules(
		&self,
		params: TargetsParams,
		token: CancellationToken,
	) -> Result<DependencyModulesResult, ServiceError> {
		let snapshot = self.snapshot(&token).await?;
		let items = per_target(&snapshot, &params.targets, &token, "dependencyModules", |record| {
			let modules = record
				.descriptor
				.module_dependencies
				.iter()
				.map(|dep| DependencyModule {
					name: dep.module.clone(),
					version: dep.version.clone(),
					data_kind: MAVEN_DATA_KIND.to_owned(),
					data: MavenDependencyModule {
						organization: dep.group.clone(),
						name: dep.module.clone(),
						version: dep.version.clone(),
						artifacts: dep
							.artifacts
							.iter()
							.map(|a| MavenDependencyModuleArtifact {
								uri: a.uri.clone(),
								classifier: a.classifier.clone(),
							})
							.collect(),
					},
				})
				.collect();
			DependencyModulesItem {
				target: record.id().clone(),
				modules,
			}
		})?;
		Ok(DependencyModulesResult { items })
	}

	/// `buildTarget/dependencySources`.
	pub async fn dependency_sources(
		&self,
		params: TargetsParams,
		token: CancellationToken,
	) -> Result<DependencySourcesResult, ServiceError> {
		let snapshot = self.snapshot(&token).await?;
		let items = per_target(&snapshot, &params.targets, &token, "dependencySources", |record| {
			DependencySourcesItem {
				target: record.id().clone(),
				sources: record
					.descriptor
					.module_dependencies
					.iter()
					.flat_map(|dep| &dep.artifacts)
					.filter(|a| a.classifier.as_deref() == Some(SOURCES_CLASSIFIER))
					.map(|a| a.uri.clone())
					.collect(),
			}
		})?;
		Ok(DependencySourcesResult { items })
	}

	/// `buildTarget/inverseSources`.
	pub async fn inverse_sources(
		&self,
		params: InverseSourcesParams,
		token: CancellationToken,
	) -> Result<InverseSourcesResult, ServiceError> {
		let path = uri_to_path(&params.text_document.uri).map_err(|e| ServiceError::InvalidParams(e.to_string()))?;
		let snapshot = self.snapshot(&token).await?;
		Ok(InverseSourcesResult {
			targets: snapshot.targets_containing(&path),
		})
	}

	/// `buildTarget/javacOptions`. Targets without Java sources are left out.
	pub async fn javac_options(&self, params: TargetsParams, token: CancellationToken) -> Result<JavacOptionsResult, ServiceError> {
		let snapshot = self.snapshot(&token).await?;
		let items = per_target(&snapshot, &params.targets, &token, "javacOptions", |record| {
			compiler_options(record, "java", |d| d.java().map(|java| (&java.common, &java.compiler_args)))
		})?;
		Ok(JavacOptionsResult {
			items: items.into_iter().flatten().collect(),
		})
	}

	/// `buildTarget/scalacOptions`. Targets without Scala sources are left out.
	pub async fn scalac_options(
		&self,
		params: TargetsParams,
		token: CancellationToken,
	) -> Result<ScalacOptionsResult, ServiceError> {
		let snapshot = self.snapshot(&token).await?;
		let items = per_target(&snapshot, &params.targets, &token, "scalacOptions", |record| {
			compiler_options(record, "scala", |d| {
				d.scala().map(|scala| (&scala.common, &scala.scala_compiler_args))
			})
		})?;
		Ok(ScalacOptionsResult {
			items: items.into_iter().flatten().collect(),
		})
	}

	/// `buildTarget/jvmCompileClasspath`.
	pub async fn jvm_compile_classpath(
		&self,
		params: TargetsParams,
		token: CancellationToken,
	) -> Result<JvmCompileClasspathResult, ServiceError> {
		let snapshot = self.snapshot(&token).await?;
		let items = per_target(&snapshot, &params.targets, &token, "jvmCompileClasspath", |record| {
			JvmCompileClasspathItem {
				target: record.id().clone(),
				classpath: file_uris(&record.descriptor.compile_classpath),
			}
		})?;
		Ok(JvmCompileClasspathResult { items })
	}

	/// `buildTarget/jvmRunEnvironment`: one item per run task, carrying its main class.
	pub async fn jvm_run_environment(
		&self,
		params: JvmEnvironmentParams,
		token: CancellationToken,
	) -> Result<JvmRunEnvironmentResult, ServiceError> {
		let snapshot = self.snapshot(&token).await?;
		let items = per_target(&snapshot, &params.targets, &token, "jvmRunEnvironment", |record| {
			environments(record, &record.descriptor.run_tasks, |task| {
				task.main_class
					.iter()
					.map(|class_name| JvmMainClass {
						class_name: class_name.clone(),
						arguments: task.arguments.clone(),
					})
					.collect()
			})
			.collect::<Vec<_>>()
		})?;
		Ok(JvmRunEnvironmentResult {
			items: items.into_iter().flatten().collect(),
		})
	}

	/// `buildTarget/jvmTestEnvironment`: one item per test task, listing its test classes.
	pub async fn jvm_test_environment(
		&self,
		params: JvmEnvironmentParams,
		token: CancellationToken,
	) -> Result<JvmTestEnvironmentResult, ServiceError> {
		let snapshot = self.snapshot(&token).await?;
		let items = per_target(&snapshot, &params.targets, &token, "jvmTestEnvironment", |record| {
			environments(record, &record.descriptor.test_environments, |task| {
				task.test_classes
					.iter()
					.map(|class_name| JvmMainClass {
						class_name: class_name.clone(),
						arguments: Vec::new(),
					})
					.collect()
			})
			.collect::<Vec<_>>()
		})?;
		Ok(JvmTestEnvironmentResult {
			items: items.into_iter().flatten().collect(),
		})
	}
}
