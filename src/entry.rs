//! A single file or directory, local or remote

use crate::error::{ManifestError, TransportError};
use crate::hash;
use crate::manifest::ManifestRecord;
use crate::transport::Transport;
use crate::types::{EntryKind, NodeKind};

/// One filesystem object with lazily resolved kind and content hash
///
/// `kind` is write-once: after it leaves `Unknown` it can only be set to the
/// same value again.
#[derive(Debug, Clone)]
pub struct Entry {
	path: String,
	raw_path: Option<String>,
	kind: EntryKind,
	content_hash: Option<String>,
	owner: Option<String>,
}

impl Entry {
	/// `path` is the normalized key, `raw_path` the backing absolute path
	pub fn new(path: impl Into<String>, raw_path: Option<String>) -> Self {
		Entry {
			path: path.into(),
			raw_path,
			kind: EntryKind::Unknown,
			content_hash: None,
			owner: None,
		}
	}

	pub fn path(&self) -> &str {
		&self.path
	}

	pub fn raw_path(&self) -> Option<&str> {
		self.raw_path.as_deref()
	}

	pub fn kind(&self) -> EntryKind {
		self.kind
	}

	pub fn owner(&self) -> Option<&str> {
		self.owner.as_deref()
	}

	/// Always absent; reserved for modification time tracking
	pub fn timestamp(&self) -> Option<u64> {
		None
	}

	/// Set the kind once; re-setting to the same value is a no-op
	pub fn set_kind(&mut self, kind: EntryKind) -> Result<(), ManifestError> {
		if self.kind == EntryKind::Unknown || self.kind == kind {
			self.kind = kind;
			Ok(())
		} else {
			Err(ManifestError::KindAlreadySet {
				path: self.path.clone(),
				current: self.kind.to_string(),
				requested: kind.to_string(),
			})
		}
	}

	/// Set the kind from a transport-reported node kind
	pub fn set_node_kind(&mut self, node: &NodeKind) -> Result<(), ManifestError> {
		match node.entry_kind() {
			Some(kind) => self.set_kind(kind),
			None => Err(ManifestError::UnsupportedEntryKind {
				path: self.raw_path.clone().unwrap_or_else(|| self.path.clone()),
				raw_kind: node.to_string(),
			}),
		}
	}

	/// Inspect the backing path if the kind is still unknown
	pub async fn resolve_kind(&mut self, transport: &dyn Transport) -> Result<EntryKind, ManifestError> {
		if self.kind != EntryKind::Unknown {
			return Ok(self.kind);
		}
		let raw = self
			.raw_path
			.clone()
			.ok_or_else(|| ManifestError::UnresolvableKind { path: self.path.clone() })?;
		let node = transport.stat(&raw).await?;
		self.set_node_kind(&node)?;
		Ok(self.kind)
	}

	/// SHA-256 of the file content; `None` for directories
	pub async fn compute_hash(
		&mut self,
		transport: &dyn Transport,
	) -> Result<Option<String>, ManifestError> {
		match self.kind {
			EntryKind::Directory => Ok(None),
			EntryKind::Unknown => Err(ManifestError::TypeMismatch {
				path: self.path.clone(),
				expected: "file",
				found: self.kind.to_string(),
			}),
			EntryKind::File => {
				if let Some(hash) = &self.content_hash {
					return Ok(Some(hash.clone()));
				}
				let raw = self
					.raw_path
					.as_deref()
					.ok_or_else(|| ManifestError::MissingPath { path: self.path.clone() })?;
				let mut reader = transport.open(raw).await?;
				let digest = hash::hash_reader(&mut reader)
					.await
					.map_err(|e| TransportError::from_io(raw, e))?;
				self.content_hash = Some(digest.clone());
				Ok(Some(digest))
			}
		}
	}

	/// Assemble the persisted record, recording `owner` as its attribution
	pub async fn to_record(
		&mut self,
		transport: &dyn Transport,
		owner: Option<&str>,
	) -> Result<ManifestRecord, ManifestError> {
		if self.raw_path.is_none() {
			return Err(ManifestError::MissingPath { path: self.path.clone() });
		}
		self.owner = owner.map(str::to_string);
		let kind = self.resolve_kind(transport).await?;
		let hash = self.compute_hash(transport).await?;
		Ok(ManifestRecord { hash, kind, tstamp: self.timestamp(), user: self.owner.clone() })
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::transport::LocalTransport;
	use std::fs;
	use tempfile::TempDir;

	const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

	async fn transport(tmp: &TempDir) -> LocalTransport {
		LocalTransport::open(tmp.path().to_str().unwrap()).await.unwrap()
	}

	#[test]
	fn test_kind_is_write_once() {
		let mut e = Entry::new("data/x", None);
		e.set_kind(EntryKind::File).unwrap();
		e.set_kind(EntryKind::File).unwrap();
		let err = e.set_kind(EntryKind::Directory).unwrap_err();
		assert!(matches!(err, ManifestError::KindAlreadySet { .. }));
		assert_eq!(e.kind(), EntryKind::File);
	}

	#[tokio::test]
	async fn test_resolve_kind_without_path_fails() {
		let tmp = TempDir::new().unwrap();
		let t = transport(&tmp).await;
		let mut e = Entry::new("data/x", None);
		let err = e.resolve_kind(&t).await.unwrap_err();
		assert!(matches!(err, ManifestError::UnresolvableKind { .. }));
	}

	#[tokio::test]
	async fn test_resolve_kind_is_idempotent() {
		let tmp = TempDir::new().unwrap();
		let t = transport(&tmp).await;
		let raw = tmp.path().to_str().unwrap().to_string();
		let mut e = Entry::new("data", Some(raw));
		assert_eq!(e.resolve_kind(&t).await.unwrap(), EntryKind::Directory);
		assert_eq!(e.resolve_kind(&t).await.unwrap(), EntryKind::Directory);
	}

	#[tokio::test]
	async fn test_compute_hash_file_and_dir() {
		let tmp = TempDir::new().unwrap();
		fs::write(tmp.path().join("abc.txt"), b"hello").unwrap();
		let t = transport(&tmp).await;

		let mut file = Entry::new("data/abc.txt", Some(t.join(&t.location(), "abc.txt")));
		file.resolve_kind(&t).await.unwrap();
		assert_eq!(file.compute_hash(&t).await.unwrap().as_deref(), Some(HELLO_SHA256));

		let mut dir = Entry::new("data", Some(t.location()));
		dir.resolve_kind(&t).await.unwrap();
		assert_eq!(dir.compute_hash(&t).await.unwrap(), None);
	}

	#[tokio::test]
	async fn test_compute_hash_is_cached() {
		let tmp = TempDir::new().unwrap();
		let file_path = tmp.path().join("abc.txt");
		fs::write(&file_path, b"hello").unwrap();
		let t = transport(&tmp).await;

		let mut e = Entry::new("data/abc.txt", Some(file_path.to_str().unwrap().to_string()));
		e.set_kind(EntryKind::File).unwrap();
		let first = e.compute_hash(&t).await.unwrap();
		fs::write(&file_path, b"changed").unwrap();
		assert_eq!(e.compute_hash(&t).await.unwrap(), first);
	}

	#[tokio::test]
	async fn test_compute_hash_unknown_kind_fails() {
		let tmp = TempDir::new().unwrap();
		let t = transport(&tmp).await;
		let mut e = Entry::new("data/x", Some(t.location()));
		assert!(matches!(e.compute_hash(&t).await, Err(ManifestError::TypeMismatch { .. })));
	}

	#[tokio::test]
	async fn test_to_record_requires_path() {
		let tmp = TempDir::new().unwrap();
		let t = transport(&tmp).await;
		let mut e = Entry::new("data/x", None);
		assert!(matches!(e.to_record(&t, None).await, Err(ManifestError::MissingPath { .. })));
	}

	#[tokio::test]
	async fn test_to_record() {
		let tmp = TempDir::new().unwrap();
		fs::write(tmp.path().join("abc.txt"), b"hello").unwrap();
		let t = transport(&tmp).await;
		let mut e = Entry::new("data/abc.txt", Some(t.join(&t.location(), "abc.txt")));

		let record = e.to_record(&t, Some("alice")).await.unwrap();
		assert_eq!(record.kind, EntryKind::File);
		assert_eq!(record.hash.as_deref(), Some(HELLO_SHA256));
		assert_eq!(record.tstamp, None);
		assert_eq!(record.user.as_deref(), Some("alice"));
		assert_eq!(e.owner(), Some("alice"));
	}

	#[cfg(unix)]
	#[tokio::test]
	async fn test_symlink_kind_is_unsupported() {
		let tmp = TempDir::new().unwrap();
		std::os::unix::fs::symlink("/etc/hostname", tmp.path().join("link")).unwrap();
		let t = transport(&tmp).await;
		let mut e = Entry::new("data/link", Some(t.join(&t.location(), "link")));
		let err = e.resolve_kind(&t).await.unwrap_err();
		assert!(matches!(err, ManifestError::UnsupportedEntryKind { .. }));
		assert_eq!(e.kind(), EntryKind::Unknown);
	}
}

// vim: ts=4
