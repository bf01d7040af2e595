//! Local filesystem transport

use async_trait::async_trait;
use std::fs::Metadata;
use std::io;
use std::path::Path;
use tokio::fs as afs;

use super::{FileReader, Transport, TransportResult};
use crate::error::TransportError;
use crate::logging::*;
use crate::types::{DirChild, NodeKind};

/// Transport over the local filesystem
///
/// Also serves remote trees reachable through a mount (`transport = "local"`).
#[derive(Debug)]
pub struct LocalTransport {
	root: String,
	closed: bool,
}

fn node_kind(meta: &Metadata) -> NodeKind {
	let ft = meta.file_type();
	if ft.is_file() {
		NodeKind::File
	} else if ft.is_dir() {
		NodeKind::Directory
	} else if ft.is_symlink() {
		NodeKind::SymLink
	} else {
		#[cfg(unix)]
		{
			use std::os::unix::fs::MetadataExt;
			NodeKind::from_mode(meta.mode())
		}
		#[cfg(not(unix))]
		{
			NodeKind::Other("special file".to_string())
		}
	}
}

impl LocalTransport {
	/// Open a transport rooted at `root`, which must be an existing directory
	pub async fn open(root: &str) -> TransportResult<Self> {
		let meta =
			afs::symlink_metadata(root).await.map_err(|e| TransportError::from_io(root, e))?;
		if !meta.is_dir() {
			return Err(TransportError::Io {
				path: root.to_string(),
				source: io::Error::new(io::ErrorKind::Other, "not a directory"),
			});
		}
		debug!("Opened local transport at {}", root);
		Ok(LocalTransport { root: root.to_string(), closed: false })
	}

	fn check_open(&self) -> TransportResult<()> {
		if self.closed {
			Err(TransportError::Closed)
		} else {
			Ok(())
		}
	}
}

#[async_trait]
impl Transport for LocalTransport {
	fn location(&self) -> String {
		self.root.clone()
	}

	async fn list_children(&self, path: &str) -> TransportResult<Vec<DirChild>> {
		self.check_open()?;
		let mut rd = afs::read_dir(path).await.map_err(|e| TransportError::from_io(path, e))?;
		let mut children = Vec::new();
		while let Some(entry) = rd.next_entry().await.map_err(|e| TransportError::from_io(path, e))? {
			let name = entry.file_name().into_string().map_err(|raw| TransportError::Io {
				path: path.to_string(),
				source: io::Error::new(
					io::ErrorKind::InvalidData,
					format!("non UTF-8 file name {:?}", raw),
				),
			})?;
			// DirEntry::metadata does not traverse symlinks
			let meta = entry.metadata().await.map_err(|e| TransportError::from_io(path, e))?;
			children.push(DirChild { name, kind: node_kind(&meta) });
		}
		Ok(children)
	}

	async fn stat(&self, path: &str) -> TransportResult<NodeKind> {
		self.check_open()?;
		let meta = afs::symlink_metadata(path).await.map_err(|e| TransportError::from_io(path, e))?;
		Ok(node_kind(&meta))
	}

	async fn open(&self, path: &str) -> TransportResult<FileReader> {
		self.check_open()?;
		let file = afs::File::open(path).await.map_err(|e| TransportError::from_io(path, e))?;
		Ok(Box::new(file))
	}

	fn join(&self, dir: &str, name: &str) -> String {
		Path::new(dir).join(name).to_string_lossy().into_owned()
	}

	async fn close(&mut self) -> TransportResult<()> {
		if !self.closed {
			debug!("Closing local transport at {}", self.root);
			self.closed = true;
		}
		Ok(())
	}
}


// vim: ts=4
