//! Error types for pdxsync operations

use std::error::Error;
use std::fmt;
use std::io;

/// Errors raised while building, loading or re-keying manifests
#[derive(Debug)]
pub enum ManifestError {
	/// The root segment does not occur in the path (or the root has none)
	Normalization { path: String, segment: String },

	/// Entry has no backing path to inspect
	UnresolvableKind { path: String },

	/// Backing object is neither a regular file nor a directory
	UnsupportedEntryKind { path: String, raw_kind: String },

	/// Operation requires a different (or resolved) entry kind
	TypeMismatch { path: String, expected: &'static str, found: String },

	/// Record requested for an entry without a backing path
	MissingPath { path: String },

	/// Entry kind is write-once
	KindAlreadySet { path: String, current: String, requested: String },

	/// Two backing paths normalized to the same key
	DuplicateKey { key: String },

	/// Manifest document could not be parsed or holds invalid records
	Corrupted { message: String },

	/// Transport failure while walking or hashing
	Transport(TransportError),

	/// Local I/O error
	Io(io::Error),
}

impl fmt::Display for ManifestError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ManifestError::Normalization { path, segment } => {
				write!(f, "Cannot normalize '{}': root segment '{}' not found", path, segment)
			}
			ManifestError::UnresolvableKind { path } => {
				write!(f, "Cannot resolve kind of '{}': no backing path", path)
			}
			ManifestError::UnsupportedEntryKind { path, raw_kind } => {
				write!(f, "Unsupported entry kind ({}) for '{}'", raw_kind, path)
			}
			ManifestError::TypeMismatch { path, expected, found } => {
				write!(f, "Type mismatch for '{}': expected {}, found {}", path, expected, found)
			}
			ManifestError::MissingPath { path } => {
				write!(f, "Entry '{}' has no backing path", path)
			}
			ManifestError::KindAlreadySet { path, current, requested } => {
				write!(f, "Kind of '{}' already set to {}, refusing {}", path, current, requested)
			}
			ManifestError::DuplicateKey { key } => {
				write!(f, "Duplicate manifest key '{}'", key)
			}
			ManifestError::Corrupted { message } => write!(f, "Manifest corrupted: {}", message),
			ManifestError::Transport(e) => write!(f, "Transport error: {}", e),
			ManifestError::Io(e) => write!(f, "I/O error: {}", e),
		}
	}
}

impl Error for ManifestError {}

impl From<io::Error> for ManifestError {
	fn from(e: io::Error) -> Self {
		ManifestError::Io(e)
	}
}

impl From<TransportError> for ManifestError {
	fn from(e: TransportError) -> Self {
		ManifestError::Transport(e)
	}
}

impl From<serde_json::Error> for ManifestError {
	fn from(e: serde_json::Error) -> Self {
		ManifestError::Corrupted { message: e.to_string() }
	}
}

/// Errors raised by a transport (local filesystem or SFTP)
#[derive(Debug)]
pub enum TransportError {
	/// TCP connection or SSH handshake failed
	ConnectFailed { host: String, source: Box<dyn Error + Send + Sync> },

	/// SSH authentication was rejected
	AuthFailed { user: String, message: String },

	/// Path does not exist on the transport
	NotFound { path: String },

	/// I/O error on the underlying channel or filesystem
	Io { path: String, source: io::Error },

	/// SFTP subsystem error
	Sftp { path: String, message: String },

	/// Transport kind not available in this build
	Unsupported { what: String },

	/// Channel already closed
	Closed,
}

impl fmt::Display for TransportError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			TransportError::ConnectFailed { host, source } => {
				write!(f, "Connection to {} failed: {}", host, source)
			}
			TransportError::AuthFailed { user, message } => {
				write!(f, "Authentication as {} failed: {}", user, message)
			}
			TransportError::NotFound { path } => write!(f, "No such file or directory: {}", path),
			TransportError::Io { path, source } => write!(f, "I/O error on {}: {}", path, source),
			TransportError::Sftp { path, message } => {
				write!(f, "SFTP error on {}: {}", path, message)
			}
			TransportError::Unsupported { what } => write!(f, "Unsupported transport: {}", what),
			TransportError::Closed => write!(f, "Transport already closed"),
		}
	}
}

impl Error for TransportError {}

impl TransportError {
	/// Wrap an I/O error, mapping `NotFound` to its own variant
	pub fn from_io(path: &str, e: io::Error) -> Self {
		if e.kind() == io::ErrorKind::NotFound {
			TransportError::NotFound { path: path.to_string() }
		} else {
			TransportError::Io { path: path.to_string(), source: e }
		}
	}
}

/// Configuration errors
#[derive(Debug)]
pub enum ConfigError {
	/// Config file could not be read
	Read { path: String, source: io::Error },

	/// Config file could not be parsed
	Parse { path: String, message: String },

	/// Required option missing or invalid
	Invalid { message: String },
}

impl fmt::Display for ConfigError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ConfigError::Read { path, source } => {
				write!(f, "Cannot read config file {}: {}", path, source)
			}
			ConfigError::Parse { path, message } => {
				write!(f, "Cannot parse config file {}: {}", path, message)
			}
			ConfigError::Invalid { message } => write!(f, "Invalid configuration: {}", message),
		}
	}
}

impl Error for ConfigError {}

/// Errors that abort a sync session
#[derive(Debug)]
pub enum SessionError {
	/// Transport could not be opened or failed mid-session
	Transport(TransportError),

	/// The remote root carries no manifest document
	RemoteManifestNotFound { path: String },

	/// A manifest slot needed for the comparison was never written
	SlotEmpty { path: String },

	/// Caller-supplied deadline expired
	Timeout { phase: &'static str, secs: u64 },

	/// Manifest build, load or normalization failed
	Manifest(ManifestError),

	/// Configuration rejected
	Config(ConfigError),
}

impl fmt::Display for SessionError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			SessionError::Transport(e) => write!(f, "Transport error: {}", e),
			SessionError::RemoteManifestNotFound { path } => write!(
				f,
				"Remote manifest not found at {}. Cannot proceed, please contact the repository admin",
				path
			),
			SessionError::SlotEmpty { path } => {
				write!(f, "No manifest stored at {} (run pull first)", path)
			}
			SessionError::Timeout { phase, secs } => {
				write!(f, "Timed out after {}s while {}", secs, phase)
			}
			SessionError::Manifest(e) => write!(f, "Manifest error: {}", e),
			SessionError::Config(e) => write!(f, "{}", e),
		}
	}
}

impl Error for SessionError {}

impl From<TransportError> for SessionError {
	fn from(e: TransportError) -> Self {
		SessionError::Transport(e)
	}
}

impl From<ManifestError> for SessionError {
	fn from(e: ManifestError) -> Self {
		match e {
			ManifestError::Transport(t) => SessionError::Transport(t),
			other => SessionError::Manifest(other),
		}
	}
}

impl From<ConfigError> for SessionError {
	fn from(e: ConfigError) -> Self {
		SessionError::Config(e)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_not_found_io_maps_to_variant() {
		let e = io::Error::new(io::ErrorKind::NotFound, "gone");
		assert!(matches!(
			TransportError::from_io("/x", e),
			TransportError::NotFound { ref path } if path == "/x"
		));

		let e = io::Error::new(io::ErrorKind::PermissionDenied, "nope");
		assert!(matches!(TransportError::from_io("/x", e), TransportError::Io { .. }));
	}

	#[test]
	fn test_manifest_transport_error_unwraps_into_session() {
		let err: SessionError = ManifestError::Transport(TransportError::Closed).into();
		assert!(matches!(err, SessionError::Transport(TransportError::Closed)));
	}

	#[test]
	fn test_remote_manifest_not_found_is_operator_facing() {
		let err = SessionError::RemoteManifestNotFound { path: "/srv/data/metadata.pdx".into() };
		let msg = err.to_string();
		assert!(msg.contains("/srv/data/metadata.pdx"));
		assert!(msg.contains("contact the repository admin"));
	}
}

// vim: ts=4
