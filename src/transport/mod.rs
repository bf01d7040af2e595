//! Tree access for manifest building and manifest download
//!
//! A transport exposes just enough of a filesystem (local disk or a remote
//! SFTP server) to walk a tree and stream file content. Everything above
//! this module depends only on the [`Transport`] trait.

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::config::{Config, TransportKind};
use crate::error::TransportError;
use crate::types::{DirChild, NodeKind};

pub mod local;
#[cfg(feature = "sftp")]
pub mod sftp;

pub use local::LocalTransport;
#[cfg(feature = "sftp")]
pub use sftp::SftpTransport;

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// Streaming reader over a file's content
pub type FileReader = Box<dyn AsyncRead + Send + Unpin>;

#[async_trait]
pub trait Transport: Send + Sync {
	/// Human-readable location, used in log messages
	fn location(&self) -> String;

	/// List immediate children of a directory with their kinds
	async fn list_children(&self, path: &str) -> TransportResult<Vec<DirChild>>;

	/// Kind of the object at `path` without following symlinks
	async fn stat(&self, path: &str) -> TransportResult<NodeKind>;

	/// Open a file for streaming reads
	async fn open(&self, path: &str) -> TransportResult<FileReader>;

	/// Read a whole file into memory
	async fn read_file(&self, path: &str) -> TransportResult<Vec<u8>> {
		let mut reader = self.open(path).await?;
		let mut buf = Vec::new();
		reader
			.read_to_end(&mut buf)
			.await
			.map_err(|e| TransportError::from_io(path, e))?;
		Ok(buf)
	}

	/// Join a child name onto a directory path
	fn join(&self, dir: &str, name: &str) -> String {
		format!("{}/{}", dir.trim_end_matches('/'), name)
	}

	/// Release the underlying channel
	async fn close(&mut self) -> TransportResult<()>;
}

/// Opens transports for a sync session
#[async_trait]
pub trait Connector: Send + Sync {
	async fn connect(&self, config: &Config) -> TransportResult<Box<dyn Transport>>;
}

/// Chooses the transport named by `Config::transport`
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfiguredConnector;

#[async_trait]
impl Connector for ConfiguredConnector {
	async fn connect(&self, config: &Config) -> TransportResult<Box<dyn Transport>> {
		match config.transport {
			TransportKind::Local => {
				let transport = LocalTransport::open(&config.remote_base_dir()).await?;
				Ok(Box::new(transport))
			}
			#[cfg(feature = "sftp")]
			TransportKind::Sftp => {
				let transport = SftpTransport::connect(
					&config.host,
					config.port,
					&config.remote_user,
					&config.ssh_key_path,
				)
				.await?;
				Ok(Box::new(transport))
			}
			#[cfg(not(feature = "sftp"))]
			TransportKind::Sftp => Err(TransportError::Unsupported {
				what: "sftp (built without the `sftp` feature)".to_string(),
			}),
		}
	}
}

// vim: ts=4
