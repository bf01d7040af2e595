//! SFTP transport over an SSH session (public-key authentication)

use async_ssh2_lite::{AsyncSession, AsyncSftp};
use async_trait::async_trait;
use std::io;
use std::path::Path;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::compat::FuturesAsyncReadCompatExt;

use super::{FileReader, Transport, TransportResult};
use crate::error::TransportError;
use crate::logging::*;
use crate::types::{DirChild, NodeKind};

pub struct SftpTransport {
	host: String,
	port: u16,
	user: String,
	session: Mutex<Option<AsyncSession<TcpStream>>>,
	sftp: Mutex<Option<AsyncSftp<TcpStream>>>,
}

impl std::fmt::Debug for SftpTransport {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SftpTransport")
			.field("host", &self.host)
			.field("port", &self.port)
			.field("user", &self.user)
			.finish()
	}
}

fn sftp_error(path: &str, e: async_ssh2_lite::Error) -> TransportError {
	let io_err = match e {
		// ssh2 maps SFTP status codes (NO_SUCH_FILE etc.) onto io::ErrorKind
		async_ssh2_lite::Error::Ssh2(inner) => io::Error::from(inner),
		async_ssh2_lite::Error::Io(inner) => inner,
		other => {
			return TransportError::Sftp { path: path.to_string(), message: other.to_string() }
		}
	};
	match io_err.kind() {
		io::ErrorKind::NotFound => TransportError::NotFound { path: path.to_string() },
		_ => TransportError::Sftp { path: path.to_string(), message: io_err.to_string() },
	}
}

fn stat_kind(stat: &async_ssh2_lite::ssh2::FileStat) -> NodeKind {
	match stat.perm {
		Some(mode) => NodeKind::from_mode(mode),
		None => NodeKind::Other("unknown mode".to_string()),
	}
}

impl SftpTransport {
	/// Connect, authenticate with `key_path` and open the SFTP subsystem
	pub async fn connect(
		host: &str,
		port: u16,
		user: &str,
		key_path: &Path,
	) -> TransportResult<Self> {
		let addr = format!("{}:{}", host, port);
		info!("Connecting {}@{}", user, addr);

		let tcp = TcpStream::connect(&addr)
			.await
			.map_err(|e| TransportError::ConnectFailed { host: addr.clone(), source: Box::new(e) })?;
		let mut session = AsyncSession::new(tcp, None)
			.map_err(|e| TransportError::ConnectFailed { host: addr.clone(), source: Box::new(e) })?;
		session
			.handshake()
			.await
			.map_err(|e| TransportError::ConnectFailed { host: addr.clone(), source: Box::new(e) })?;

		session.userauth_pubkey_file(user, None, key_path, None).await.map_err(|e| {
			TransportError::AuthFailed { user: user.to_string(), message: e.to_string() }
		})?;
		if !session.authenticated() {
			return Err(TransportError::AuthFailed {
				user: user.to_string(),
				message: "server rejected key".to_string(),
			});
		}

		let sftp = session
			.sftp()
			.await
			.map_err(|e| TransportError::Sftp { path: String::new(), message: e.to_string() })?;

		debug!("SFTP subsystem open on {}", addr);
		Ok(SftpTransport {
			host: host.to_string(),
			port,
			user: user.to_string(),
			session: Mutex::new(Some(session)),
			sftp: Mutex::new(Some(sftp)),
		})
	}
}

#[async_trait]
impl Transport for SftpTransport {
	fn location(&self) -> String {
		format!("{}@{}:{}", self.user, self.host, self.port)
	}

	async fn list_children(&self, path: &str) -> TransportResult<Vec<DirChild>> {
		let guard = self.sftp.lock().await;
		let sftp = guard.as_ref().ok_or(TransportError::Closed)?;
		let listing = sftp.readdir(Path::new(path)).await.map_err(|e| sftp_error(path, e))?;
		let mut children = Vec::with_capacity(listing.len());
		for (child_path, stat) in listing {
			let name = match child_path.file_name().and_then(|n| n.to_str()) {
				Some(n) => n.to_string(),
				None => {
					return Err(TransportError::Sftp {
						path: path.to_string(),
						message: format!("unusable file name {:?}", child_path),
					})
				}
			};
			if name == "." || name == ".." {
				continue;
			}
			children.push(DirChild { name, kind: stat_kind(&stat) });
		}
		Ok(children)
	}

	async fn stat(&self, path: &str) -> TransportResult<NodeKind> {
		let guard = self.sftp.lock().await;
		let sftp = guard.as_ref().ok_or(TransportError::Closed)?;
		let stat = sftp.lstat(Path::new(path)).await.map_err(|e| sftp_error(path, e))?;
		Ok(stat_kind(&stat))
	}

	async fn open(&self, path: &str) -> TransportResult<FileReader> {
		let guard = self.sftp.lock().await;
		let sftp = guard.as_ref().ok_or(TransportError::Closed)?;
		let file = sftp.open(Path::new(path)).await.map_err(|e| sftp_error(path, e))?;
		Ok(Box::new(file.compat()))
	}

	async fn close(&mut self) -> TransportResult<()> {
		// Drop the SFTP channel before tearing down the session
		self.sftp.get_mut().take();
		if let Some(session) = self.session.get_mut().take() {
			debug!("Disconnecting {}", self.location());
			session.disconnect(None, "pdxsync session finished", None).await.map_err(|e| {
				TransportError::Sftp { path: String::new(), message: e.to_string() }
			})?;
		}
		Ok(())
	}
}

// vim: ts=4
