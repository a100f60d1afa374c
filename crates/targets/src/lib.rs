//! Identity and change-diff cache for build targets.
//!
//! # Role
//!
//! Turns the full descriptor batch of one refresh into an immutable [`Snapshot`] of
//! [`BuildTargetRecord`]s and reports what changed against the previously published snapshot.
//!
//! # Invariants
//!
//! - Identities are unique within a snapshot and depend only on (project dir, source set name).
//! - Published snapshots are never mutated; readers hold an `Arc` to one consistent snapshot.
//! - Dependency edges only point at identities of the same snapshot; unresolved keys are
//!   dropped with a warning.
//! - Refresh N is diffed against the snapshot refresh N-1 published.

#![warn(missing_docs)]

mod cache;
mod diff;
mod error;
mod identity;
mod naming;
mod record;
mod snapshot;

pub use cache::TargetCache;
pub use diff::{ChangeKind, ChangeRecord};
pub use error::IdentityError;
pub use identity::{dir_uri, file_uri, target_id, uri_to_path};
pub use naming::DisplayNaming;
pub use record::BuildTargetRecord;
pub use snapshot::Snapshot;

#[cfg(test)]
mod fixtures;
