//! Tree walk producing a manifest

use std::collections::BTreeMap;

use super::{Manifest, ManifestRecord};
use crate::entry::Entry;
use crate::error::ManifestError;
use crate::logging::*;
use crate::normalize::PathNormalizer;
use crate::transport::Transport;
use crate::types::EntryKind;

/// Walks a tree through a transport and records every file and directory
///
/// The walk is strict: any symlink, device, socket or FIFO aborts it and no
/// partial manifest is returned.
#[derive(Debug, Clone)]
pub struct ManifestBuilder {
	normalizer: PathNormalizer,
	owner: Option<String>,
}

impl ManifestBuilder {
	pub fn new(normalizer: PathNormalizer) -> Self {
		ManifestBuilder { normalizer, owner: None }
	}

	/// Attribution stored as `user` in every record
	pub fn owner(mut self, owner: Option<String>) -> Self {
		self.owner = owner;
		self
	}

	pub fn normalizer(&self) -> &PathNormalizer {
		&self.normalizer
	}

	fn insert(
		files: &mut BTreeMap<String, ManifestRecord>,
		key: String,
		record: ManifestRecord,
	) -> Result<(), ManifestError> {
		if files.contains_key(&key) {
			return Err(ManifestError::DuplicateKey { key });
		}
		files.insert(key, record);
		Ok(())
	}

	/// Build the manifest of the tree rooted at `root`
	pub async fn build(
		&self,
		transport: &dyn Transport,
		root: &str,
	) -> Result<Manifest, ManifestError> {
		let owner = self.owner.as_deref();
		let mut files = BTreeMap::new();

		// `data/` and `data` must yield the same root key
		let trimmed = root.trim_end_matches('/');
		let root = if trimmed.is_empty() { "/" } else { trimmed };

		let mut root_entry = Entry::new(self.normalizer.normalize(root)?, Some(root.to_string()));
		if root_entry.resolve_kind(transport).await? != EntryKind::Directory {
			return Err(ManifestError::TypeMismatch {
				path: root.to_string(),
				expected: "dir",
				found: root_entry.kind().to_string(),
			});
		}
		let record = root_entry.to_record(transport, owner).await?;
		Self::insert(&mut files, root_entry.path().to_string(), record)?;

		// Depth-first: the last pushed directory is listed next
		let mut pending = vec![root.to_string()];
		while let Some(dir) = pending.pop() {
			debug!("Listing {}", dir);
			let mut children = transport.list_children(&dir).await?;
			children.sort_by(|a, b| a.name.cmp(&b.name));

			let mut subdirs = Vec::new();
			for child in children {
				let raw = transport.join(&dir, &child.name);
				let mut entry = Entry::new(self.normalizer.normalize(&raw)?, Some(raw.clone()));
				entry.set_node_kind(&child.kind)?;
				let record = entry.to_record(transport, owner).await?;
				Self::insert(&mut files, entry.path().to_string(), record)?;
				if entry.kind() == EntryKind::Directory {
					subdirs.push(raw);
				}
			}
			// Reverse so subdirectories are visited in name order
			pending.extend(subdirs.into_iter().rev());
		}

		info!("Manifest of {} built: {} entries", transport.location(), files.len());
		Ok(Manifest::new(files))
	}
}


// vim: ts=4
