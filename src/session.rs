//! Sync session: fetch the remote manifest and compare it with the local one
//!
//! ```text
//! Idle -> ConnectingTransport -> FetchingRemoteManifest
//!      -> LoadingLocalManifest -> Diffing -> Reported
//!                (any state) -> Aborted
//! ```
//!
//! A session only reads and writes the manifest slots of its aux dir and
//! takes no lock on them: concurrent sessions sharing one `local_aux_dir`
//! must be serialized by the caller.

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use crate::config::{Config, MANIFEST_FILE_NAME};
use crate::error::{ManifestError, SessionError, TransportError};
use crate::logging::*;
use crate::manifest::{Manifest, ManifestBuilder, ManifestDiff, ManifestSlot, ManifestStore, SyncReport};
use crate::normalize::{MatchPolicy, PathNormalizer};
use crate::transport::{ConfiguredConnector, Connector, LocalTransport, Transport};
use crate::types::NodeKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
	Idle,
	ConnectingTransport,
	FetchingRemoteManifest,
	LoadingLocalManifest,
	Diffing,
	Reported,
	Aborted,
}

/// Which downloaded remote manifest to compare against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RemoteSlot {
	#[default]
	Current,
	Previous,
}

impl RemoteSlot {
	pub fn slot(&self) -> ManifestSlot {
		match self {
			RemoteSlot::Current => ManifestSlot::RemoteCurrent,
			RemoteSlot::Previous => ManifestSlot::RemotePrevious,
		}
	}
}

async fn with_deadline<F, T>(secs: Option<u64>, phase: &'static str, fut: F) -> Result<T, SessionError>
where
	F: Future<Output = Result<T, SessionError>>,
{
	match secs {
		Some(secs) => tokio::time::timeout(Duration::from_secs(secs), fut)
			.await
			.map_err(|_| SessionError::Timeout { phase, secs })?,
		None => fut.await,
	}
}

/// Absolute form of a local root, falling back to the path as given
async fn local_root(dir: &Path) -> String {
	match tokio::fs::canonicalize(dir).await {
		Ok(p) => p.to_string_lossy().into_owned(),
		Err(_) => dir.to_string_lossy().into_owned(),
	}
}

/// Build the manifest of a local directory tree
pub async fn scan_local(
	dir: &Path,
	policy: MatchPolicy,
	owner: Option<String>,
) -> Result<Manifest, SessionError> {
	let root = local_root(dir).await;
	let normalizer = PathNormalizer::new(&root, policy)?;
	let mut transport = LocalTransport::open(&root).await?;
	let built = ManifestBuilder::new(normalizer).owner(owner).build(&transport, &root).await;
	transport.close().await?;
	Ok(built?)
}

async fn fetch_remote_manifest(transport: &dyn Transport, path: &str) -> Result<Manifest, SessionError> {
	match transport.stat(path).await {
		Ok(NodeKind::File) => {}
		Ok(other) => {
			return Err(ManifestError::TypeMismatch {
				path: path.to_string(),
				expected: "file",
				found: other.to_string(),
			}
			.into())
		}
		Err(TransportError::NotFound { .. }) => {
			error!("Remote manifest not found at {}. Cannot proceed, please contact admin", path);
			return Err(SessionError::RemoteManifestNotFound { path: path.to_string() });
		}
		Err(e) => return Err(e.into()),
	}
	let bytes = transport.read_file(path).await?;
	let manifest = Manifest::from_document(&bytes)?;
	info!("Fetched remote manifest {} ({} entries)", path, manifest.len());
	Ok(manifest)
}

pub struct SyncSession<C: Connector = ConfiguredConnector> {
	config: Config,
	connector: C,
	store: ManifestStore,
	state: SessionState,
	rescan_local: bool,
}

impl SyncSession<ConfiguredConnector> {
	pub fn new(config: Config) -> Result<Self, SessionError> {
		Self::with_connector(config, ConfiguredConnector)
	}
}

impl<C: Connector> SyncSession<C> {
	pub fn with_connector(config: Config, connector: C) -> Result<Self, SessionError> {
		config.validate()?;
		let store = ManifestStore::new(config.local_aux_dir.clone());
		Ok(SyncSession { config, connector, store, state: SessionState::Idle, rescan_local: false })
	}

	/// Rebuild the local manifest from disk instead of loading the stored one
	pub fn rescan_local(mut self, rescan: bool) -> Self {
		self.rescan_local = rescan;
		self
	}

	pub fn state(&self) -> SessionState {
		self.state
	}

	pub fn store(&self) -> &ManifestStore {
		&self.store
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	fn transition(&mut self, next: SessionState) {
		debug!("Session state {:?} -> {:?}", self.state, next);
		self.state = next;
	}

	fn finish<T>(&mut self, result: Result<T, SessionError>) -> Result<T, SessionError> {
		if let Err(e) = &result {
			warn!("Session aborted in {:?}: {}", self.state, e);
			self.transition(SessionState::Aborted);
		}
		result
	}

	/// Download the remote manifest, then compare `remote` against local
	pub async fn pull(&mut self, remote: RemoteSlot) -> Result<SyncReport, SessionError> {
		let result = self.try_pull(remote).await;
		self.finish(result)
	}

	/// Compare stored slots without touching the remote
	pub async fn status(&mut self, remote: RemoteSlot) -> Result<SyncReport, SessionError> {
		let result = self.compare(remote).await;
		self.finish(result)
	}

	/// Walk the remote tree through the transport and build its manifest
	pub async fn scan_remote(&mut self) -> Result<Manifest, SessionError> {
		let result = self.try_scan_remote().await;
		self.finish(result)
	}

	async fn connect(&mut self) -> Result<Box<dyn Transport>, SessionError> {
		self.transition(SessionState::ConnectingTransport);
		let connector = &self.connector;
		let config = &self.config;
		let transport = with_deadline(config.transport_timeout_secs, "connecting", async move {
			connector.connect(config).await.map_err(SessionError::from)
		})
		.await?;
		info!("Connected to {}", transport.location());
		Ok(transport)
	}

	async fn release(transport: &mut dyn Transport) {
		if let Err(e) = transport.close().await {
			warn!("Failed to close transport {}: {}", transport.location(), e);
		}
	}

	async fn try_pull(&mut self, remote: RemoteSlot) -> Result<SyncReport, SessionError> {
		let mut transport = self.connect().await?;

		self.transition(SessionState::FetchingRemoteManifest);
		let path = self.config.remote_manifest_path();
		let fetched = with_deadline(
			self.config.transport_timeout_secs,
			"fetching the remote manifest",
			fetch_remote_manifest(transport.as_ref(), &path),
		)
		.await;
		Self::release(transport.as_mut()).await;
		let manifest = fetched?;

		self.store.replace_remote(&manifest).await?;

		self.compare(remote).await
	}

	async fn try_scan_remote(&mut self) -> Result<Manifest, SessionError> {
		let mut transport = self.connect().await?;
		let root = self.config.remote_base_dir();
		let built = match PathNormalizer::new(&root, self.config.normalize_policy) {
			Ok(normalizer) => {
				ManifestBuilder::new(normalizer)
					.owner(self.config.owner.clone())
					.build(transport.as_ref(), &root)
					.await
			}
			Err(e) => Err(e),
		};
		Self::release(transport.as_mut()).await;
		let manifest = built?;
		self.transition(SessionState::Reported);
		Ok(manifest)
	}

	async fn local_manifest(&mut self) -> Result<Manifest, SessionError> {
		if !self.rescan_local {
			if let Some(manifest) = self.store.load(ManifestSlot::Local).await? {
				return Ok(manifest);
			}
		}
		info!("Scanning local tree {}", self.config.local_data_dir.display());
		let manifest = scan_local(
			&self.config.local_data_dir,
			self.config.normalize_policy,
			self.config.owner.clone(),
		)
		.await?;
		self.store.save(ManifestSlot::Local, &manifest).await?;
		Ok(manifest)
	}

	async fn compare(&mut self, remote: RemoteSlot) -> Result<SyncReport, SessionError> {
		self.transition(SessionState::LoadingLocalManifest);
		let local = self.local_manifest().await?;
		let slot = remote.slot();
		let remote_manifest = self.store.load(slot).await?.ok_or_else(|| SessionError::SlotEmpty {
			path: self.store.slot_path(slot).display().to_string(),
		})?;

		self.transition(SessionState::Diffing);
		let root = local_root(&self.config.local_data_dir).await;
		let normalizer = PathNormalizer::new(&root, self.config.normalize_policy)?;
		// The published document lives inside the tree it describes
		let own_key = format!("{}/{}", normalizer.root_segment(), MANIFEST_FILE_NAME);
		let remote_manifest = remote_manifest.rekeyed(&normalizer)?.without(&own_key);
		let local = local.rekeyed(&normalizer)?.without(&own_key);
		let diff = ManifestDiff::compute(&remote_manifest, &local);
		info!(
			"Compared {} with local: {} only remote, {} only local, {} changed, {} type conflicts",
			slot,
			diff.only_in_a.len(),
			diff.only_in_b.len(),
			diff.changed.len(),
			diff.type_conflicts.len()
		);

		self.transition(SessionState::Reported);
		Ok(SyncReport { remote_slot: slot, diff })
	}
}

// vim: ts=4
