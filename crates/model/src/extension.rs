use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::StableDependencyKey;

/// Fields every language payload carries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtensionCommon {
	/// Source directories of this language.
	pub source_dirs: Vec<PathBuf>,
	/// Generated source directories of this language.
	pub generated_source_dirs: Vec<PathBuf>,
	/// Compile task for this language.
	pub compile_task_name: Option<String>,
	/// Class output directory.
	pub classes_dir: Option<PathBuf>,
}

/// Java payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JavaExtension {
	/// Shared fields.
	#[serde(flatten)]
	pub common: ExtensionCommon,
	/// JDK home directory.
	pub java_home: Option<PathBuf>,
	/// JDK version.
	pub java_version: Option<String>,
	/// Source language level.
	pub source_compatibility: Option<String>,
	/// Bytecode target level.
	pub target_compatibility: Option<String>,
	/// `javac` arguments.
	pub compiler_args: Vec<String>,
}

/// Scala payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScalaExtension {
	/// Shared fields.
	#[serde(flatten)]
	pub common: ExtensionCommon,
	/// `scalac` arguments.
	pub scala_compiler_args: Vec<String>,
	/// Scala organization.
	pub scala_organization: Option<String>,
	/// Full Scala version.
	pub scala_version: Option<String>,
	/// Binary Scala version.
	pub scala_binary_version: Option<String>,
	/// Scala compiler jars.
	pub scala_jars: Vec<PathBuf>,
}

/// Kotlin payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KotlinExtension {
	/// Shared fields.
	#[serde(flatten)]
	pub common: ExtensionCommon,
	/// Kotlin language version.
	pub kotlin_language_version: Option<String>,
	/// Kotlin API version.
	pub kotlin_api_version: Option<String>,
	/// `kotlinc` options.
	pub kotlinc_options: Vec<String>,
	/// Source sets whose internals are visible to this one.
	pub kotlin_associates: Vec<StableDependencyKey>,
}

/// Groovy payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroovyExtension {
	/// Shared fields.
	#[serde(flatten)]
	pub common: ExtensionCommon,
}

/// ANTLR payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AntlrExtension {
	/// Shared fields.
	#[serde(flatten)]
	pub common: ExtensionCommon,
}

/// Closed set of per-language payloads, tagged by language id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "language", rename_all = "lowercase")]
pub enum LanguageExtension {
	/// Java.
	Java(JavaExtension),
	/// Scala.
	Scala(ScalaExtension),
	/// Kotlin.
	Kotlin(KotlinExtension),
	/// Groovy.
	Groovy(GroovyExtension),
	/// ANTLR grammars.
	Antlr(AntlrExtension),
}

impl LanguageExtension {
	/// Protocol language id.
	pub const fn language_id(&self) -> &'static str {
		match self {
			Self::Java(_) => "java",
			Self::Scala(_) => "scala",
			Self::Kotlin(_) => "kotlin",
			Self::Groovy(_) => "groovy",
			Self::Antlr(_) => "antlr",
		}
	}

	/// Every language this server can report on.
	pub const ALL_IDS: [&'static str; 5] = ["java", "scala", "kotlin", "groovy", "antlr"];
}
