use std::io;
use std::path::Path;
use tokio::fs as afs;

use crate::logging::*;

/// Create a directory and its parents; an existing directory is not an error
pub async fn mkdir_p(path: &Path) -> io::Result<()> {
	match afs::create_dir_all(path).await {
		Ok(()) => Ok(()),
		Err(e) if e.kind() == io::ErrorKind::AlreadyExists && path.is_dir() => {
			debug!("{} already exists", path.display());
			Ok(())
		}
		Err(e) => Err(e),
	}
}

/// Remove a directory tree; an absent tree is not an error
pub async fn remove_tree_tolerant(path: &Path) -> io::Result<()> {
	match afs::remove_dir_all(path).await {
		Ok(()) => Ok(()),
		Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
		Err(e) => Err(e),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	#[tokio::test]
	async fn test_mkdir_p_is_idempotent() {
		let tmp = TempDir::new().unwrap();
		let dir = tmp.path().join("a/b/c");
		mkdir_p(&dir).await.unwrap();
		mkdir_p(&dir).await.unwrap();
		assert!(dir.is_dir());
	}

	#[tokio::test]
	async fn test_mkdir_p_over_file_fails() {
		let tmp = TempDir::new().unwrap();
		let file = tmp.path().join("f");
		std::fs::write(&file, b"x").unwrap();
		assert!(mkdir_p(&file).await.is_err());
	}

	#[tokio::test]
	async fn test_remove_tree_tolerant() {
		let tmp = TempDir::new().unwrap();
		let dir = tmp.path().join("tree");
		std::fs::create_dir_all(dir.join("sub")).unwrap();
		remove_tree_tolerant(&dir).await.unwrap();
		assert!(!dir.exists());
		remove_tree_tolerant(&dir).await.unwrap();
	}
}

// vim: ts=4
