use std::sync::Arc;

use gbs_model::{JavaExtension, SourceSetDescriptor};
use gbs_protocol::{
	BuildTarget, BuildTargetCapabilities, BuildTargetData, BuildTargetIdentifier, JvmBuildTarget,
	KotlinBuildTarget, SCALA_PLATFORM_JVM, ScalaBuildTarget, tags,
};

use crate::identity::{dir_uri, file_uri};

/// One live build target: its protocol metadata plus the descriptor it was derived from.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildTargetRecord {
	/// Protocol-facing target.
	pub target: BuildTarget,
	/// Originating descriptor.
	pub descriptor: Arc<SourceSetDescriptor>,
}

impl BuildTargetRecord {
	/// The target's identity.
	pub fn id(&self) -> &BuildTargetIdentifier {
		&self.target.id
	}
}

/// Resolved references of one descriptor.
pub(crate) struct Resolved {
	pub dependencies: Vec<BuildTargetIdentifier>,
	pub associates: Vec<BuildTargetIdentifier>,
}

pub(crate) fn build_target(
	id: BuildTargetIdentifier,
	descriptor: &SourceSetDescriptor,
	display_name: String,
	resolved: Resolved,
) -> BuildTarget {
	let mut target_tags = Vec::new();
	if descriptor.has_tests {
		target_tags.push(tags::TEST.to_owned());
	}
	BuildTarget {
		id,
		display_name: Some(display_name),
		base_directory: dir_uri(descriptor.root_dir()).ok(),
		tags: target_tags,
		language_ids: descriptor.language_ids(),
		dependencies: resolved.dependencies,
		capabilities: BuildTargetCapabilities {
			can_compile: true,
			can_test: true,
			can_run: true,
			can_debug: false,
		},
		data: language_data(descriptor, resolved.associates),
	}
}

/// Picks the data block by precedence scala, kotlin, java.
fn language_data(descriptor: &SourceSetDescriptor, associates: Vec<BuildTargetIdentifier>) -> Option<BuildTargetData> {
	let jvm = descriptor.java().map(|java| jvm_target(descriptor, java));
	if let Some(scala) = descriptor.scala() {
		return Some(BuildTargetData::Scala(ScalaBuildTarget {
			scala_organization: scala.scala_organization.clone().unwrap_or_default(),
			scala_version: scala.scala_version.clone().unwrap_or_default(),
			scala_binary_version: scala.scala_binary_version.clone().unwrap_or_default(),
			platform: SCALA_PLATFORM_JVM,
			jars: scala.scala_jars.iter().filter_map(|jar| file_uri(jar).ok()).collect(),
			jvm_build_target: jvm,
		}));
	}
	if let Some(kotlin) = descriptor.kotlin() {
		return Some(BuildTargetData::Kotlin(KotlinBuildTarget {
			language_version: kotlin.kotlin_language_version.clone().unwrap_or_default(),
			api_version: kotlin.kotlin_api_version.clone().unwrap_or_default(),
			kotlinc_options: kotlin.kotlinc_options.clone(),
			associates,
			jvm_build_target: jvm,
		}));
	}
	jvm.map(BuildTargetData::Jvm)
}

fn jvm_target(descriptor: &SourceSetDescriptor, java: &JavaExtension) -> JvmBuildTarget {
	JvmBuildTarget {
		java_home: java.java_home.as_deref().and_then(|home| dir_uri(home).ok()),
		java_version: java.java_version.clone(),
		gradle_version: descriptor.gradle_version.clone(),
		source_compatibility: java.source_compatibility.clone(),
		target_compatibility: java.target_compatibility.clone(),
	}
}
