use std::path::{Path, PathBuf};
use std::sync::Arc;

use gbs_protocol::BuildTargetIdentifier;
use rustc_hash::FxHashMap;

use crate::BuildTargetRecord;

/// Immutable view of every build target produced by one refresh.
///
/// The task-name and source-directory indexes are derived from the records when the snapshot
/// is built and are never patched afterwards.
#[derive(Debug, Default)]
pub struct Snapshot {
	generation: u64,
	targets: FxHashMap<BuildTargetIdentifier, Arc<BuildTargetRecord>>,
	/// Identities sorted by URI.
	order: Vec<BuildTargetIdentifier>,
	/// Task path to the targets it acts on, sorted.
	task_index: FxHashMap<String, Vec<BuildTargetIdentifier>>,
	/// Source directory to owning target, sorted by path.
	source_dirs: Vec<(PathBuf, BuildTargetIdentifier)>,
}

impl Snapshot {
	pub(crate) fn build(generation: u64, records: &[Arc<BuildTargetRecord>]) -> Self {
		let mut targets = FxHashMap::default();
		let mut task_index: FxHashMap<String, Vec<BuildTargetIdentifier>> = FxHashMap::default();
		let mut source_dirs = Vec::new();

		for record in records {
			let id = record.id();
			for task in &record.descriptor.task_names {
				task_index.entry(task.clone()).or_default().push(id.clone());
			}
			for dir in &record.descriptor.source_dirs {
				source_dirs.push((dir.clone(), id.clone()));
			}
			targets.insert(id.clone(), record.clone());
		}

		let mut order: Vec<_> = targets.keys().cloned().collect();
		order.sort();
		for ids in task_index.values_mut() {
			ids.sort();
			ids.dedup();
		}
		source_dirs.sort();

		Self {
			generation,
			targets,
			order,
			task_index,
			source_dirs,
		}
	}

	/// Refresh sequence number; 0 for the empty snapshot before the first refresh.
	pub fn generation(&self) -> u64 {
		self.generation
	}

	/// Number of targets.
	pub fn len(&self) -> usize {
		self.order.len()
	}

	/// Returns true when the snapshot has no targets.
	pub fn is_empty(&self) -> bool {
		self.order.is_empty()
	}

	/// Looks a target up by identity.
	pub fn get(&self, id: &BuildTargetIdentifier) -> Option<&Arc<BuildTargetRecord>> {
		self.targets.get(id)
	}

	/// Every record, ordered by identity.
	pub fn records(&self) -> impl Iterator<Item = &Arc<BuildTargetRecord>> {
		self.order.iter().filter_map(|id| self.targets.get(id))
	}

	/// Targets a task path acts on.
	pub fn targets_for_task(&self, task_path: &str) -> &[BuildTargetIdentifier] {
		self.task_index.get(task_path).map_or(&[], Vec::as_slice)
	}

	/// Targets with a source directory containing `path`.
	pub fn targets_containing(&self, path: &Path) -> Vec<BuildTargetIdentifier> {
		let mut ids: Vec<_> = self
			.source_dirs
			.iter()
			.filter(|(dir, _)| path.starts_with(dir))
			.map(|(_, id)| id.clone())
			.collect();
		ids.sort();
		ids.dedup();
		ids
	}
}
