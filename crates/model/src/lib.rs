//! Project model as reported by the build orchestrator.
//!
//! A [`SourceSetDescriptor`] describes one compilable unit. Descriptors are plain values: two
//! descriptors are equal iff every reported attribute is equal, which is what change detection
//! relies on. Collections are ordered sets so equality never depends on reporting order.

#![warn(missing_docs)]

mod descriptor;
mod extension;

pub use descriptor::{Artifact, JvmTaskEnvironment, ModuleDependency, SourceSetDescriptor, StableDependencyKey};
pub use extension::{
	AntlrExtension, ExtensionCommon, GroovyExtension, JavaExtension, KotlinExtension,
	LanguageExtension, ScalaExtension,
};
