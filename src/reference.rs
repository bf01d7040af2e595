//! Reference data for trying out and testing a mirror setup

use std::io;
use std::path::Path;
use tokio::fs as afs;

use crate::logging::*;
use crate::util;

/// Files written by [`generate_reference_data`], relative to the base dir
pub const REFERENCE_FILES: [&str; 3] = ["foo/abc.txt", "bar/xyz.dat", "bar/blob/text1.txt"];

/// Content written to every reference file
pub fn reference_text(version: &str) -> String {
	format!("This is sample text\n\nversion {}\n", version)
}

/// Write the reference tree under `base_dir`, overwriting existing files
pub async fn generate_reference_data(base_dir: &Path, version: &str) -> io::Result<()> {
	let text = reference_text(version);
	for rel in REFERENCE_FILES.iter() {
		let path = rel.split('/').fold(base_dir.to_path_buf(), |p, part| p.join(part));
		if let Some(parent) = path.parent() {
			util::mkdir_p(parent).await?;
		}
		afs::write(&path, &text).await?;
	}
	info!("Reference data (version {}) created in {}", version, base_dir.display());
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	#[tokio::test]
	async fn test_generate_reference_data() {
		let tmp = TempDir::new().unwrap();
		let base = tmp.path().join("reference");
		generate_reference_data(&base, "01").await.unwrap();

		for rel in REFERENCE_FILES.iter() {
			let content = std::fs::read_to_string(base.join(rel)).unwrap();
			assert_eq!(content, "This is sample text\n\nversion 01\n");
		}

		// Regenerating with another version rewrites in place
		generate_reference_data(&base, "02").await.unwrap();
		let content = std::fs::read_to_string(base.join("foo/abc.txt")).unwrap();
		assert!(content.ends_with("version 02\n"));
	}
}

// vim: ts=4
