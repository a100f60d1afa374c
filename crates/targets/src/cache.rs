use std::sync::Arc;

use arc_swap::ArcSwap;
use gbs_model::{SourceSetDescriptor, StableDependencyKey};
use gbs_protocol::BuildTargetIdentifier;
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::diff::diff;
use crate::naming::display_names;
use crate::record::{Resolved, build_target};
use crate::{BuildTargetRecord, ChangeRecord, DisplayNaming, Snapshot, target_id};

/// Holds the currently published [`Snapshot`].
///
/// Readers take a whole snapshot with [`TargetCache::snapshot`] and never observe a
/// half-applied refresh. Writers publish with a compare-and-swap loop, so concurrent
/// refreshes serialize and each one is diffed against the snapshot it replaced.
#[derive(Debug, Default)]
pub struct TargetCache {
	snap: ArcSwap<Snapshot>,
}

impl TargetCache {
	/// Creates an empty cache at generation 0.
	pub fn new() -> Self {
		Self::default()
	}

	/// Currently published snapshot.
	pub fn snapshot(&self) -> Arc<Snapshot> {
		self.snap.load_full()
	}

	/// Looks one target up in the current snapshot.
	pub fn lookup(&self, id: &BuildTargetIdentifier) -> Option<Arc<BuildTargetRecord>> {
		self.snap.load().get(id).cloned()
	}

	/// Every target of the current snapshot, ordered by identity.
	pub fn list_all(&self) -> Vec<Arc<BuildTargetRecord>> {
		self.snap.load().records().cloned().collect()
	}

	/// Replaces the snapshot with one built from `descriptors` and returns what changed.
	///
	/// The batch is the complete set for this refresh; anything absent is reported removed.
	pub fn store(&self, descriptors: Vec<SourceSetDescriptor>, naming: DisplayNaming) -> Vec<ChangeRecord> {
		let records = build_records(descriptors, naming);
		loop {
			let old = self.snap.load_full();
			let new_arc = Arc::new(Snapshot::build(old.generation() + 1, &records));
			let changes = diff(&old, &new_arc);

			let prev = self.snap.compare_and_swap(&old, new_arc.clone());
			if Arc::ptr_eq(&prev, &old) {
				debug!(
					generation = new_arc.generation(),
					targets = new_arc.len(),
					changes = changes.len(),
					"targets.snapshot.published"
				);
				return changes;
			}
			debug!(generation = old.generation(), "targets.snapshot.retry");
		}
	}
}

fn build_records(descriptors: Vec<SourceSetDescriptor>, naming: DisplayNaming) -> Vec<Arc<BuildTargetRecord>> {
	let mut by_id: FxHashMap<BuildTargetIdentifier, SourceSetDescriptor> = FxHashMap::default();
	for descriptor in descriptors {
		let id = match target_id(&descriptor.project_dir, &descriptor.source_set_name) {
			Ok(id) => id,
			Err(error) => {
				warn!(
					project = %descriptor.project_path,
					source_set = %descriptor.source_set_name,
					%error,
					"targets.descriptor.skipped"
				);
				continue;
			}
		};
		if by_id.insert(id.clone(), descriptor).is_some() {
			warn!(target = %id.uri, "targets.descriptor.duplicate");
		}
	}

	let mut entries: Vec<_> = by_id.into_iter().collect();
	entries.sort_by(|a, b| a.0.cmp(&b.0));

	let keys: FxHashMap<StableDependencyKey, BuildTargetIdentifier> =
		entries.iter().map(|(id, d)| (d.key(), id.clone())).collect();
	let names = {
		let refs: Vec<&SourceSetDescriptor> = entries.iter().map(|(_, d)| d).collect();
		display_names(&refs, naming)
	};

	entries
		.into_iter()
		.zip(names)
		.map(|((id, descriptor), name)| {
			let resolved = Resolved {
				dependencies: resolve(&id, descriptor.build_target_dependencies.iter(), &keys),
				associates: resolve(
					&id,
					descriptor.kotlin().into_iter().flat_map(|k| k.kotlin_associates.iter()),
					&keys,
				),
			};
			let target = build_target(id, &descriptor, name, resolved);
			Arc::new(BuildTargetRecord {
				target,
				descriptor: Arc::new(descriptor),
			})
		})
		.collect()
}

/// Maps keys to identities of the same batch, dropping unknown keys and duplicates.
fn resolve<'a>(
	owner: &BuildTargetIdentifier,
	refs: impl Iterator<Item = &'a StableDependencyKey>,
	keys: &FxHashMap<StableDependencyKey, BuildTargetIdentifier>,
) -> Vec<BuildTargetIdentifier> {
	let mut out: Vec<BuildTargetIdentifier> = Vec::new();
	for key in refs {
		match keys.get(key) {
			Some(id) if !out.contains(id) => out.push(id.clone()),
			Some(_) => {}
			None => warn!(
				target = %owner.uri,
				project_dir = %key.project_dir.display(),
				source_set = %key.source_set_name,
				"targets.dependency.unresolved"
			),
		}
	}
	out
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
