//! Configuration for pdxsync
//!
//! The configuration follows a priority chain:
//! 1. Built-in defaults (`Config::default()`)
//! 2. Config file (`config.toml`, or `.json`/`.json5`)
//! 3. Environment variables (`PDX_*` prefix)
//! 4. CLI flags (highest priority, applied by the binary)
//!
//! The loaded value is passed explicitly to sessions and builders.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::normalize::MatchPolicy;

/// Name of the manifest document, both on the remote root and in the aux dir
pub const MANIFEST_FILE_NAME: &str = "metadata.pdx";

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// How the remote tree is reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TransportKind {
	/// SSH/SFTP to `host:port`
	#[default]
	Sftp,
	/// `remote_base_dir` is reachable on the local filesystem (e.g. a mount)
	Local,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
	// ========================================================================
	// REMOTE
	// ========================================================================
	/// Remote host name or address
	pub host: String,

	/// Remote SSH port
	pub port: u16,

	/// Remote login
	pub remote_user: String,

	/// Private key used for public-key authentication
	pub ssh_key_path: PathBuf,

	/// Root of the remote tree; holds `metadata.pdx`
	pub remote_base_dir: String,

	/// Transport used to reach `remote_base_dir`
	pub transport: TransportKind,

	// ========================================================================
	// LOCAL
	// ========================================================================
	/// Directory for the manifest slots
	pub local_aux_dir: PathBuf,

	/// Root of the local mirror
	pub local_data_dir: PathBuf,

	// ========================================================================
	// MANIFESTS
	// ========================================================================
	/// Attribution recorded as `user` in locally built manifests
	pub owner: Option<String>,

	/// How the root segment is located during normalization
	pub normalize_policy: MatchPolicy,

	/// Deadline for connecting and fetching (seconds, unset = no deadline)
	pub transport_timeout_secs: Option<u64>,

	// ========================================================================
	// OUTPUT & LOGGING
	// ========================================================================
	/// Log level (trace, debug, info, warn, error)
	pub log_level: String,
}

impl Default for Config {
	fn default() -> Self {
		Config {
			host: String::new(),
			port: 22,
			remote_user: String::new(),
			ssh_key_path: PathBuf::new(),
			remote_base_dir: String::new(),
			transport: TransportKind::Sftp,
			local_aux_dir: PathBuf::from(".pdx"),
			local_data_dir: PathBuf::from("data"),
			owner: None,
			normalize_policy: MatchPolicy::FirstOccurrence,
			transport_timeout_secs: None,
			log_level: "info".to_string(),
		}
	}
}

impl Config {
	/// Load a config file; the extension selects TOML or JSON5
	pub fn load(path: &Path) -> Result<Config, ConfigError> {
		let display = path.display().to_string();
		let content = fs::read_to_string(path)
			.map_err(|e| ConfigError::Read { path: display.clone(), source: e })?;

		match path.extension().and_then(|e| e.to_str()) {
			Some("json") | Some("json5") => json5::from_str(&content)
				.map_err(|e| ConfigError::Parse { path: display, message: e.to_string() }),
			_ => toml::from_str(&content)
				.map_err(|e| ConfigError::Parse { path: display, message: e.to_string() }),
		}
	}

	/// Apply `PDX_*` environment overrides
	pub fn apply_env(&mut self) -> Result<(), ConfigError> {
		self.apply_env_from(|key| std::env::var(key).ok())
	}

	/// Apply overrides from an arbitrary variable source
	pub fn apply_env_from<F>(&mut self, var: F) -> Result<(), ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		if let Some(v) = var("PDX_HOST") {
			self.host = v;
		}
		if let Some(v) = var("PDX_PORT") {
			self.port = v.parse().map_err(|e| ConfigError::Invalid {
				message: format!("PDX_PORT '{}': {}", v, e),
			})?;
		}
		if let Some(v) = var("PDX_REMOTE_USER") {
			self.remote_user = v;
		}
		if let Some(v) = var("PDX_SSH_KEY_PATH") {
			self.ssh_key_path = PathBuf::from(v);
		}
		if let Some(v) = var("PDX_REMOTE_BASE_DIR") {
			self.remote_base_dir = v;
		}
		if let Some(v) = var("PDX_LOCAL_AUX_DIR") {
			self.local_aux_dir = PathBuf::from(v);
		}
		if let Some(v) = var("PDX_LOCAL_DATA_DIR") {
			self.local_data_dir = PathBuf::from(v);
		}
		if let Some(v) = var("PDX_OWNER") {
			self.owner = Some(v);
		}
		if let Some(v) = var("PDX_TRANSPORT") {
			self.transport = match v.as_str() {
				"sftp" => TransportKind::Sftp,
				"local" => TransportKind::Local,
				_ => {
					return Err(ConfigError::Invalid {
						message: format!("PDX_TRANSPORT '{}': expected sftp or local", v),
					})
				}
			};
		}
		if let Some(v) = var("PDX_NORMALIZE_POLICY") {
			self.normalize_policy = match v.as_str() {
				"first-occurrence" => MatchPolicy::FirstOccurrence,
				"segment-boundary" => MatchPolicy::SegmentBoundary,
				_ => {
					return Err(ConfigError::Invalid {
						message: format!(
							"PDX_NORMALIZE_POLICY '{}': expected first-occurrence or segment-boundary",
							v
						),
					})
				}
			};
		}
		if let Some(v) = var("PDX_TRANSPORT_TIMEOUT_SECS") {
			// Empty value clears the deadline
			self.transport_timeout_secs = if v.is_empty() {
				None
			} else {
				Some(v.parse().map_err(|e| ConfigError::Invalid {
					message: format!("PDX_TRANSPORT_TIMEOUT_SECS '{}': {}", v, e),
				})?)
			};
		}
		if let Some(v) = var("PDX_LOG_LEVEL") {
			self.log_level = v;
		}
		Ok(())
	}

	/// Check the options required by the selected transport
	pub fn validate(&self) -> Result<(), ConfigError> {
		let missing = |name: &str| ConfigError::Invalid { message: format!("{} is not set", name) };

		if self.remote_base_dir.is_empty() {
			return Err(missing("remote_base_dir"));
		}
		if self.local_aux_dir.as_os_str().is_empty() {
			return Err(missing("local_aux_dir"));
		}
		if self.local_data_dir.as_os_str().is_empty() {
			return Err(missing("local_data_dir"));
		}
		if self.transport == TransportKind::Sftp {
			if self.host.is_empty() {
				return Err(missing("host"));
			}
			if self.remote_user.is_empty() {
				return Err(missing("remote_user"));
			}
			if self.ssh_key_path.as_os_str().is_empty() {
				return Err(missing("ssh_key_path"));
			}
		}
		if self.transport_timeout_secs == Some(0) {
			return Err(ConfigError::Invalid {
				message: "transport_timeout_secs must be positive".to_string(),
			});
		}
		Ok(())
	}

	/// Remote base directory, absolute and without trailing `/` (except `/` itself)
	pub fn remote_base_dir(&self) -> String {
		let trimmed = self.remote_base_dir.trim_matches('/');
		format!("/{}", trimmed)
	}

	/// `<remote_base_dir>/metadata.pdx`
	pub fn remote_manifest_path(&self) -> String {
		format!("{}/{}", self.remote_base_dir().trim_end_matches('/'), MANIFEST_FILE_NAME)
	}
}


// vim: ts=4
