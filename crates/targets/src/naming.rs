//! Human-readable display names.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use gbs_model::SourceSetDescriptor;

/// How display names join the project and source set names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayNaming {
	/// `app [main]`.
	#[default]
	Bracket,
	/// `app.main`.
	Dot,
}

impl DisplayNaming {
	fn join(self, project: &str, source_set: &str) -> String {
		match self {
			Self::Bracket => format!("{project} [{source_set}]"),
			Self::Dot => format!("{project}.{source_set}"),
		}
	}

	fn project_path_label(self, project_path: &str) -> String {
		match self {
			Self::Bracket => project_path.to_owned(),
			Self::Dot => project_path.trim_start_matches(':').replace(':', "."),
		}
	}
}

/// Assigns a unique display name to every descriptor.
///
/// Names start as project name plus source set name. Names shared by several descriptors are
/// qualified with the project path, and names still shared after that with the project
/// directory. Groups are processed in (project path, project directory) order so the result
/// never depends on the order descriptors were reported in.
pub(crate) fn display_names(descriptors: &[&SourceSetDescriptor], naming: DisplayNaming) -> Vec<String> {
	let mut names: Vec<String> = descriptors
		.iter()
		.map(|d| naming.join(&d.project_name, &d.source_set_name))
		.collect();

	qualify_collisions(&mut names, descriptors, |d| {
		naming.join(&naming.project_path_label(&d.project_path), &d.source_set_name)
	});
	qualify_collisions(&mut names, descriptors, |d| {
		naming.join(&d.project_dir.display().to_string(), &d.source_set_name)
	});
	names
}

fn qualify_collisions(
	names: &mut [String],
	descriptors: &[&SourceSetDescriptor],
	qualify: impl Fn(&SourceSetDescriptor) -> String,
) {
	let mut groups: FxHashMap<&str, Vec<usize>> = FxHashMap::default();
	for (idx, name) in names.iter().enumerate() {
		groups.entry(name.as_str()).or_default().push(idx);
	}
	let mut colliding: Vec<usize> = groups.into_values().filter(|g| g.len() > 1).flatten().collect();
	colliding.sort_by(|&a, &b| {
		let (a, b) = (descriptors[a], descriptors[b]);
		(&a.project_path, &a.project_dir, &a.source_set_name).cmp(&(&b.project_path, &b.project_dir, &b.source_set_name))
	});
	for idx in colliding {
		names[idx] = qualify(descriptors[idx]);
	}
}
