//! Persisted manifest slots in the local aux directory

use std::fmt;
use std::path::{Path, PathBuf};
use tokio::fs as afs;

use super::Manifest;
use crate::config::MANIFEST_FILE_NAME;
use crate::error::ManifestError;
use crate::logging::*;
use crate::util;

/// The manifest documents kept between runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManifestSlot {
	/// Manifest of the local mirror
	Local,
	/// Remote manifest downloaded by the latest pull
	RemoteCurrent,
	/// Remote manifest of the pull before that
	RemotePrevious,
}

impl ManifestSlot {
	pub fn file_name(&self) -> String {
		match self {
			ManifestSlot::Local => MANIFEST_FILE_NAME.to_string(),
			ManifestSlot::RemoteCurrent => format!("{}.remote-new", MANIFEST_FILE_NAME),
			ManifestSlot::RemotePrevious => format!("{}.remote-old", MANIFEST_FILE_NAME),
		}
	}
}

impl fmt::Display for ManifestSlot {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ManifestSlot::Local => f.write_str("local manifest"),
			ManifestSlot::RemoteCurrent => f.write_str("current remote manifest"),
			ManifestSlot::RemotePrevious => f.write_str("previous remote manifest"),
		}
	}
}

/// Reads and replaces whole manifest documents; never patches one
#[derive(Debug, Clone)]
pub struct ManifestStore {
	aux_dir: PathBuf,
}

impl ManifestStore {
	pub fn new(aux_dir: impl Into<PathBuf>) -> Self {
		ManifestStore { aux_dir: aux_dir.into() }
	}

	pub fn aux_dir(&self) -> &Path {
		&self.aux_dir
	}

	pub fn slot_path(&self, slot: ManifestSlot) -> PathBuf {
		self.aux_dir.join(slot.file_name())
	}

	pub async fn exists(&self, slot: ManifestSlot) -> bool {
		afs::metadata(self.slot_path(slot)).await.is_ok()
	}

	/// Load a slot; `Ok(None)` when it was never written
	pub async fn load(&self, slot: ManifestSlot) -> Result<Option<Manifest>, ManifestError> {
		let path = self.slot_path(slot);
		match afs::read(&path).await {
			Ok(bytes) => {
				let manifest = Manifest::from_document(&bytes).map_err(|e| match e {
					ManifestError::Corrupted { message } => ManifestError::Corrupted {
						message: format!("{}: {}", path.display(), message),
					},
					other => other,
				})?;
				debug!("Loaded {} ({} entries)", slot, manifest.len());
				Ok(Some(manifest))
			}
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
			Err(e) => Err(e.into()),
		}
	}

	/// Replace a slot with `manifest`
	pub async fn save(&self, slot: ManifestSlot, manifest: &Manifest) -> Result<(), ManifestError> {
		self.save_document(slot, &manifest.to_document()?).await
	}

	/// Replace a slot with raw document bytes (e.g. a verified download)
	pub async fn save_document(&self, slot: ManifestSlot, doc: &[u8]) -> Result<(), ManifestError> {
		util::mkdir_p(&self.aux_dir).await?;
		let path = self.slot_path(slot);
		// Write beside the slot, then rename over it
		let tmp = self.aux_dir.join(format!("{}.tmp", slot.file_name()));
		afs::write(&tmp, doc).await?;
		afs::rename(&tmp, &path).await?;
		debug!("Wrote {} to {}", slot, path.display());
		Ok(())
	}

	/// Install `manifest` as the current remote one, keeping the old in the previous slot
	///
	/// The new document is fully written before anything is rotated, so a
	/// failed write leaves both remote slots as they were.
	pub async fn replace_remote(&self, manifest: &Manifest) -> Result<(), ManifestError> {
		let doc = manifest.to_document()?;
		util::mkdir_p(&self.aux_dir).await?;
		let slot = ManifestSlot::RemoteCurrent;
		let tmp = self.aux_dir.join(format!("{}.tmp", slot.file_name()));
		afs::write(&tmp, &doc).await?;
		if let Err(e) = self.rotate_remote().await {
			let _ = afs::remove_file(&tmp).await;
			return Err(e);
		}
		afs::rename(&tmp, self.slot_path(slot)).await?;
		debug!("Installed new {} ({} entries)", slot, manifest.len());
		Ok(())
	}

	/// Move the current remote manifest into the previous-remote slot
	pub async fn rotate_remote(&self) -> Result<(), ManifestError> {
		let current = self.slot_path(ManifestSlot::RemoteCurrent);
		match afs::rename(&current, self.slot_path(ManifestSlot::RemotePrevious)).await {
			Ok(()) => {
				debug!("Rotated {} into previous slot", current.display());
				Ok(())
			}
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
			Err(e) => Err(e.into()),
		}
	}
}


// vim: ts=4
