//! Manifest comparison

use std::collections::BTreeSet;
use std::fmt;

use super::Manifest;
use crate::manifest::ManifestSlot;

/// Classification of the keys of two manifests `a` and `b`
///
/// Every key of `a ∪ b` lands in exactly one of `only_in_a`, `only_in_b`,
/// `unchanged`, `changed` or `type_conflicts`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestDiff {
	pub only_in_a: BTreeSet<String>,
	pub only_in_b: BTreeSet<String>,
	/// Same type and equal hashes (both null for directories)
	pub unchanged: BTreeSet<String>,
	/// Same type, different hashes
	pub changed: BTreeSet<String>,
	/// File on one side, directory on the other
	pub type_conflicts: BTreeSet<String>,
}

impl ManifestDiff {
	pub fn compute(a: &Manifest, b: &Manifest) -> Self {
		let mut diff = ManifestDiff::default();

		for (key, ra) in &a.files {
			match b.files.get(key) {
				None => {
					diff.only_in_a.insert(key.clone());
				}
				Some(rb) if ra.kind != rb.kind => {
					diff.type_conflicts.insert(key.clone());
				}
				Some(rb) if ra.hash == rb.hash => {
					diff.unchanged.insert(key.clone());
				}
				Some(_) => {
					diff.changed.insert(key.clone());
				}
			}
		}
		for key in b.files.keys() {
			if !a.files.contains_key(key) {
				diff.only_in_b.insert(key.clone());
			}
		}

		diff
	}

	/// Keys present in both manifests
	pub fn common(&self) -> BTreeSet<String> {
		self.unchanged
			.iter()
			.chain(self.changed.iter())
			.chain(self.type_conflicts.iter())
			.cloned()
			.collect()
	}

	/// True when both manifests describe the same tree
	pub fn is_clean(&self) -> bool {
		self.only_in_a.is_empty()
			&& self.only_in_b.is_empty()
			&& self.changed.is_empty()
			&& self.type_conflicts.is_empty()
	}
}

/// Outcome of a remote-vs-local comparison, as shown to the user
#[derive(Debug, Clone)]
pub struct SyncReport {
	/// Remote slot the local manifest was compared with
	pub remote_slot: ManifestSlot,
	/// `a` = remote, `b` = local
	pub diff: ManifestDiff,
}

impl SyncReport {
	/// Present remotely only: a transfer phase would download these
	pub fn only_in_remote(&self) -> &BTreeSet<String> {
		&self.diff.only_in_a
	}

	/// Present locally only
	pub fn only_in_local(&self) -> &BTreeSet<String> {
		&self.diff.only_in_b
	}

	pub fn changed(&self) -> &BTreeSet<String> {
		&self.diff.changed
	}

	pub fn type_conflicts(&self) -> &BTreeSet<String> {
		&self.diff.type_conflicts
	}
}

fn write_section(f: &mut fmt::Formatter<'_>, title: &str, keys: &BTreeSet<String>) -> fmt::Result {
	writeln!(f, "{} ({}):", title, keys.len())?;
	for key in keys {
		writeln!(f, "  {}", key)?;
	}
	Ok(())
}

impl fmt::Display for SyncReport {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.diff.is_clean() {
			return writeln!(
				f,
				"Local mirror matches {} ({} entries)",
				self.remote_slot,
				self.diff.unchanged.len()
			);
		}
		writeln!(f, "Compared against {}", self.remote_slot)?;
		write_section(f, "Only in remote", self.only_in_remote())?;
		write_section(f, "Only in local", self.only_in_local())?;
		write_section(f, "Changed", self.changed())?;
		if !self.diff.type_conflicts.is_empty() {
			write_section(f, "Type conflicts", self.type_conflicts())?;
		}
		Ok(())
	}
}


// vim: ts=4
