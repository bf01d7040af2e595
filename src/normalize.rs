//! Root-relative path normalization
//!
//! A normalized path starts at the last component of the tree's root
//! directory (the *root segment*), so manifests built under different
//! absolute locations can be compared key by key:
//!
//! ```text
//! root_dir   = /home/alice/mirror/data
//! raw path   = /home/alice/mirror/data/foo/abc.txt
//! normalized = data/foo/abc.txt
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ManifestError;

/// How the root segment is located inside an absolute path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum MatchPolicy {
	/// First substring occurrence wins, even inside a longer component
	/// (`/srv/metadata/data/x` normalizes to `data/data/x` for segment `data`).
	#[default]
	FirstOccurrence,
	/// First occurrence that is a whole path component
	SegmentBoundary,
}

#[derive(Debug, Clone)]
pub struct PathNormalizer {
	root_dir: String,
	segment: String,
	policy: MatchPolicy,
}

fn is_separator(c: char) -> bool {
	c == '/' || (cfg!(windows) && c == '\\')
}

impl PathNormalizer {
	/// Build a normalizer for the tree rooted at `root_dir`
	pub fn new(root_dir: &str, policy: MatchPolicy) -> Result<Self, ManifestError> {
		let trimmed = root_dir.trim_end_matches(is_separator);
		let segment = trimmed.rsplit(is_separator).next().unwrap_or("").to_string();
		if segment.is_empty() {
			return Err(ManifestError::Normalization {
				path: root_dir.to_string(),
				segment: String::new(),
			});
		}
		Ok(PathNormalizer { root_dir: trimmed.to_string(), segment, policy })
	}

	/// Last component of the root directory
	pub fn root_segment(&self) -> &str {
		&self.segment
	}

	pub fn root_dir(&self) -> &str {
		&self.root_dir
	}

	pub fn policy(&self) -> MatchPolicy {
		self.policy
	}

	fn find_segment(&self, path: &str) -> Option<usize> {
		match self.policy {
			MatchPolicy::FirstOccurrence => path.find(&self.segment),
			MatchPolicy::SegmentBoundary => path.match_indices(&self.segment).find_map(|(i, _)| {
				let before_ok = path[..i].chars().next_back().map_or(true, is_separator);
				let after_ok =
					path[i + self.segment.len()..].chars().next().map_or(true, is_separator);
				if before_ok && after_ok {
					Some(i)
				} else {
					None
				}
			}),
		}
	}

	/// Truncate `path` so it begins at the root segment
	pub fn normalize<'a>(&self, path: &'a str) -> Result<&'a str, ManifestError> {
		match self.find_segment(path) {
			Some(idx) => Ok(&path[idx..]),
			None => Err(ManifestError::Normalization {
				path: path.to_string(),
				segment: self.segment.clone(),
			}),
		}
	}

	/// Rebuild an absolute path from a normalized one
	pub fn denormalize(&self, normalized: &str) -> Result<String, ManifestError> {
		let rest = normalized
			.strip_prefix(self.segment.as_str())
			.filter(|rest| rest.chars().next().map_or(true, is_separator))
			.ok_or_else(|| ManifestError::Normalization {
				path: normalized.to_string(),
				segment: self.segment.clone(),
			})?;
		Ok(format!("{}{}", self.root_dir, rest))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn first(root: &str) -> PathNormalizer {
		PathNormalizer::new(root, MatchPolicy::FirstOccurrence).unwrap()
	}

	#[test]
	fn test_root_segment_is_last_component() {
		assert_eq!(first("/home/alice/data").root_segment(), "data");
		assert_eq!(first("/home/alice/data/").root_segment(), "data");
		assert_eq!(first("relative/tree").root_segment(), "tree");
	}

	#[test]
	fn test_empty_root_segment_rejected() {
		assert!(PathNormalizer::new("/", MatchPolicy::FirstOccurrence).is_err());
		assert!(PathNormalizer::new("", MatchPolicy::FirstOccurrence).is_err());
	}

	#[test]
	fn test_normalize_truncates_at_segment() {
		let n = first("/home/alice/data");
		assert_eq!(n.normalize("/home/alice/data/foo/abc.txt").unwrap(), "data/foo/abc.txt");
		assert_eq!(n.normalize("/home/alice/data").unwrap(), "data");
		// A different absolute location with the same root segment
		assert_eq!(n.normalize("/srv/export/data/foo").unwrap(), "data/foo");
	}

	#[test]
	fn test_normalize_missing_segment_fails() {
		let n = first("/home/alice/data");
		let err = n.normalize("/srv/other/tree").unwrap_err();
		assert!(matches!(err, ManifestError::Normalization { .. }));
	}

	#[test]
	fn test_normalize_is_deterministic() {
		let n = first("/home/alice/data");
		let p = "/home/alice/data/x/y/z.bin";
		assert_eq!(n.normalize(p).unwrap(), n.normalize(p).unwrap());
	}

	#[test]
	fn test_first_occurrence_matches_inside_component() {
		let n = first("/srv/metadata/data");
		assert_eq!(n.normalize("/srv/metadata/data/x").unwrap(), "data/data/x");
	}

	#[test]
	fn test_segment_boundary_skips_partial_matches() {
		let n = PathNormalizer::new("/srv/metadata/data", MatchPolicy::SegmentBoundary).unwrap();
		assert_eq!(n.normalize("/srv/metadata/data/x").unwrap(), "data/x");
		assert_eq!(n.normalize("/srv/metadata/data").unwrap(), "data");
		assert!(n.normalize("/srv/metadata/database").is_err());
	}

	#[test]
	fn test_denormalize() {
		let n = first("/home/alice/data");
		assert_eq!(n.denormalize("data/foo/abc.txt").unwrap(), "/home/alice/data/foo/abc.txt");
		assert_eq!(n.denormalize("data").unwrap(), "/home/alice/data");
		assert!(n.denormalize("other/foo").is_err());
		assert!(n.denormalize("database/foo").is_err());
	}

	#[test]
	fn test_round_trip() {
		let n = first("/home/alice/data");
		for p in ["data", "data/foo", "data/foo/abc.txt", "data/bar/blob/text1.txt"] {
			assert_eq!(n.normalize(&n.denormalize(p).unwrap()).unwrap(), p);
		}
		let raw = "/home/alice/data/foo/abc.txt";
		let once = n.normalize(raw).unwrap();
		assert_eq!(n.normalize(&n.denormalize(once).unwrap()).unwrap(), once);
	}
}

// vim: ts=4
