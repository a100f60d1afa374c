use std::path::PathBuf;

use gbs_model::{JavaExtension, LanguageExtension, SourceSetDescriptor, StableDependencyKey};

/// Java source set under `/ws/<project>` with its conventional tasks and source directory.
pub(crate) fn source_set(project: &str, source_set: &str) -> SourceSetDescriptor {
	let dir = PathBuf::from("/ws").join(project);
	let mut d = SourceSetDescriptor::new(&dir, source_set);
	d.project_name = project.to_owned();
	d.project_path = format!(":{project}");
	d.root_dir = "/ws".into();
	d.classes_task_name = format!(":{project}:{source_set}Classes");
	d.clean_task_name = format!(":{project}:clean");
	d.task_names.insert(d.classes_task_name.clone());
	d.source_dirs.insert(dir.join("src").join(source_set).join("java"));
	d.has_tests = source_set == "test";
	d.extensions.push(LanguageExtension::Java(JavaExtension::default()));
	d
}

pub(crate) fn depends_on(mut d: SourceSetDescriptor, project: &str, source_set: &str) -> SourceSetDescriptor {
	d.build_target_dependencies
		.insert(StableDependencyKey::new(PathBuf::from("/ws").join(project), source_set));
	d
}
