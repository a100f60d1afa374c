use std::collections::BTreeSet;
use std::sync::Arc;

use gbs_model::SourceSetDescriptor;
use gbs_protocol::{BuildTargetEvent, BuildTargetEventData, BuildTargetEventKind, BuildTargetIdentifier};
use serde_json::Value as JsonValue;

use crate::Snapshot;

/// Kind of a [`ChangeRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
	/// Only in the new snapshot.
	Added,
	/// In both snapshots with unequal descriptors.
	Changed,
	/// Only in the old snapshot.
	Removed,
}

/// One identity whose descriptor differs between two consecutive snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeRecord {
	/// Affected identity.
	pub id: BuildTargetIdentifier,
	/// Descriptor in the old snapshot.
	pub previous: Option<Arc<SourceSetDescriptor>>,
	/// Descriptor in the new snapshot.
	pub current: Option<Arc<SourceSetDescriptor>>,
}

impl ChangeRecord {
	/// Classifies the change.
	pub fn kind(&self) -> ChangeKind {
		match (&self.previous, &self.current) {
			(Some(_), Some(_)) => ChangeKind::Changed,
			(None, _) => ChangeKind::Added,
			(Some(_), None) => ChangeKind::Removed,
		}
	}

	/// Field-level summary (`field: old -> new`, comma separated) of a `Changed` record.
	pub fn difference(&self) -> Option<String> {
		let (Some(previous), Some(current)) = (&self.previous, &self.current) else {
			return None;
		};
		let old = serde_json::to_value(previous.as_ref()).ok()?;
		let new = serde_json::to_value(current.as_ref()).ok()?;
		let mut out = Vec::new();
		describe("", &old, &new, &mut out);
		Some(out.join(", "))
	}

	/// Protocol event for `buildTarget/didChange`.
	pub fn to_event(&self) -> BuildTargetEvent {
		let (kind, data) = match self.kind() {
			ChangeKind::Added => (BuildTargetEventKind::Created, None),
			ChangeKind::Removed => (BuildTargetEventKind::Deleted, None),
			ChangeKind::Changed => (
				BuildTargetEventKind::Changed,
				self.difference().map(BuildTargetEventData::SourceSetChange),
			),
		};
		BuildTargetEvent {
			target: self.id.clone(),
			kind: Some(kind),
			data,
		}
	}
}

/// Diffs two snapshots by identity: new-only is added, unequal descriptors are changed,
/// old-only is removed.
pub(crate) fn diff(old: &Snapshot, new: &Snapshot) -> Vec<ChangeRecord> {
	let mut changes = Vec::new();
	for record in new.records() {
		let previous = old.get(record.id()).map(|r| r.descriptor.clone());
		if previous.as_deref() == Some(record.descriptor.as_ref()) {
			continue;
		}
		changes.push(ChangeRecord {
			id: record.id().clone(),
			previous,
			current: Some(record.descriptor.clone()),
		});
	}
	for record in old.records() {
		if new.get(record.id()).is_none() {
			changes.push(ChangeRecord {
				id: record.id().clone(),
				previous: Some(record.descriptor.clone()),
				current: None,
			});
		}
	}
	changes
}

fn describe(path: &str, old: &JsonValue, new: &JsonValue, out: &mut Vec<String>) {
	if old == new {
		return;
	}
	match (old, new) {
		(JsonValue::Object(a), JsonValue::Object(b)) => {
			let keys: BTreeSet<&String> = a.keys().chain(b.keys()).collect();
			for key in keys {
				let field = if path.is_empty() {
					key.clone()
				} else {
					format!("{path}.{key}")
				};
				describe(
					&field,
					a.get(key).unwrap_or(&JsonValue::Null),
					b.get(key).unwrap_or(&JsonValue::Null),
					out,
				);
			}
		}
		(JsonValue::Array(a), JsonValue::Array(b)) if a.len() == b.len() => {
			for (idx, (x, y)) in a.iter().zip(b).enumerate() {
				describe(&format!("{path}[{idx}]"), x, y, out);
			}
		}
		_ => out.push(format!("{path}: {old} -> {new}")),
	}
}
