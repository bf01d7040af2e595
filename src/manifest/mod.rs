//! Content-hash manifests of whole trees
//!
//! A manifest maps every normalized path of a tree to a [`ManifestRecord`].
//! The persisted document looks like:
//!
//! ```text
//! {
//!     "files": {
//!         "data": {
//!             "hash": null,
//!             "tstamp": null,
//!             "type": "dir",
//!             "user": null
//!         },
//!         ...
//!     },
//!     "meta_information": null
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ManifestError;
use crate::normalize::PathNormalizer;
use crate::types::EntryKind;

pub mod builder;
pub mod diff;
pub mod store;

pub use builder::ManifestBuilder;
pub use diff::{ManifestDiff, SyncReport};
pub use store::{ManifestSlot, ManifestStore};

/// Persisted per-path record (field order is the document's key order)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestRecord {
	/// Lowercase hex SHA-256, `None` for directories
	pub hash: Option<String>,
	/// Reserved for modification time, always `None`
	pub tstamp: Option<u64>,
	#[serde(rename = "type")]
	pub kind: EntryKind,
	/// Who produced the snapshot
	pub user: Option<String>,
}

/// Full snapshot of a tree; never updated in place
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
	pub files: BTreeMap<String, ManifestRecord>,
	/// Reserved extension slot, always null
	pub meta_information: Option<serde_json::Value>,
}

impl Manifest {
	pub fn new(files: BTreeMap<String, ManifestRecord>) -> Self {
		Manifest { files, meta_information: None }
	}

	pub fn len(&self) -> usize {
		self.files.len()
	}

	pub fn is_empty(&self) -> bool {
		self.files.is_empty()
	}

	pub fn get(&self, key: &str) -> Option<&ManifestRecord> {
		self.files.get(key)
	}

	pub fn keys(&self) -> impl Iterator<Item = &String> {
		self.files.keys()
	}

	/// Serialize with sorted keys and 4-space indentation
	pub fn to_document(&self) -> Result<Vec<u8>, ManifestError> {
		let mut buf = Vec::new();
		let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
		let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
		self.serialize(&mut ser)?;
		Ok(buf)
	}

	/// Parse a manifest document
	pub fn from_document(bytes: &[u8]) -> Result<Self, ManifestError> {
		let manifest: Manifest = serde_json::from_slice(bytes)?;
		for (key, record) in &manifest.files {
			match (record.kind, &record.hash) {
				(EntryKind::Unknown, _) => {
					return Err(ManifestError::Corrupted {
						message: format!("record '{}' has unresolved type", key),
					})
				}
				(EntryKind::Directory, Some(_)) => {
					return Err(ManifestError::Corrupted {
						message: format!("directory record '{}' carries a hash", key),
					})
				}
				_ => {}
			}
		}
		Ok(manifest)
	}

	/// Copy of the manifest without `key`
	pub fn without(&self, key: &str) -> Manifest {
		let mut files = self.files.clone();
		files.remove(key);
		Manifest { files, meta_information: self.meta_information.clone() }
	}

	/// Re-key every record through `normalizer`
	///
	/// Lets a document produced under another absolute root be compared with
	/// a local one; keys lacking the root segment fail the whole call.
	pub fn rekeyed(&self, normalizer: &PathNormalizer) -> Result<Manifest, ManifestError> {
		let mut files = BTreeMap::new();
		for (key, record) in &self.files {
			let new_key = normalizer.normalize(key)?.to_string();
			if files.insert(new_key.clone(), record.clone()).is_some() {
				return Err(ManifestError::DuplicateKey { key: new_key });
			}
		}
		Ok(Manifest { files, meta_information: self.meta_information.clone() })
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::normalize::MatchPolicy;

	fn dir() -> ManifestRecord {
		ManifestRecord { hash: None, tstamp: None, kind: EntryKind::Directory, user: None }
	}

	fn file(hash: &str) -> ManifestRecord {
		ManifestRecord {
			hash: Some(hash.to_string()),
			tstamp: None,
			kind: EntryKind::File,
			user: Some("alice".to_string()),
		}
	}

	#[test]
	fn test_document_layout() {
		let mut files = BTreeMap::new();
		files.insert("data/foo".to_string(), dir());
		files.insert("data".to_string(), dir());
		files.insert("data/foo/abc.txt".to_string(), file("ab12"));
		let doc = String::from_utf8(Manifest::new(files).to_document().unwrap()).unwrap();

		let expected = r#"{
    "files": {
        "data": {
            "hash": null,
            "tstamp": null,
            "type": "dir",
            "user": null
        },
        "data/foo": {
            "hash": null,
            "tstamp": null,
            "type": "dir",
            "user": null
        },
        "data/foo/abc.txt": {
            "hash": "ab12",
            "tstamp": null,
            "type": "file",
            "user": "alice"
        }
    },
    "meta_information": null
}"#;
		assert_eq!(doc, expected);
	}

	#[test]
	fn test_parse_document() {
		let doc = br#"{"meta_information": null, "files": {
			"data": {"hash": null, "type": "dir", "tstamp": null, "user": null},
			"data/a": {"hash": "ff", "type": "file", "tstamp": null, "user": "bob"}
		}}"#;
		let m = Manifest::from_document(doc).unwrap();
		assert_eq!(m.len(), 2);
		assert_eq!(m.get("data/a").unwrap().user.as_deref(), Some("bob"));
		assert!(m.meta_information.is_none());
	}

	#[test]
	fn test_parse_rejects_invalid_records() {
		let doc = br#"{"meta_information": null, "files": {
			"data": {"hash": "ff", "type": "dir", "tstamp": null, "user": null}
		}}"#;
		assert!(matches!(Manifest::from_document(doc), Err(ManifestError::Corrupted { .. })));

		let doc = br#"{"meta_information": null, "files": {
			"data": {"hash": null, "type": "unknown", "tstamp": null, "user": null}
		}}"#;
		assert!(matches!(Manifest::from_document(doc), Err(ManifestError::Corrupted { .. })));

		assert!(matches!(Manifest::from_document(b"{ invalid"), Err(ManifestError::Corrupted { .. })));
	}

	#[test]
	fn test_rekeyed() {
		let mut files = BTreeMap::new();
		files.insert("/srv/export/data".to_string(), dir());
		files.insert("/srv/export/data/a".to_string(), file("ff"));
		let m = Manifest::new(files);

		let n = PathNormalizer::new("/home/alice/data", MatchPolicy::FirstOccurrence).unwrap();
		let r = m.rekeyed(&n).unwrap();
		assert_eq!(r.keys().cloned().collect::<Vec<_>>(), vec!["data", "data/a"]);

		let other = PathNormalizer::new("/home/alice/mirror", MatchPolicy::FirstOccurrence).unwrap();
		assert!(matches!(m.rekeyed(&other), Err(ManifestError::Normalization { .. })));
	}
}

// vim: ts=4
