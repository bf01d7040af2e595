//! # pdxsync - manifest-based change detection for mirrored trees
//!
//! pdxsync tells which files of a remote directory tree differ from a local
//! mirror without transferring content or trusting timestamps. Each side is
//! described by a manifest: a map from root-relative path to kind and
//! SHA-256 content hash. Two manifests are then diffed key by key.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pdxsync::{Config, RemoteSlot, SyncSession};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml".as_ref())?;
//!     let mut session = SyncSession::new(config)?;
//!     let report = session.pull(RemoteSlot::Current).await?;
//!     print!("{}", report);
//!     Ok(())
//! }
//! ```
//!
//! ## Building a manifest
//!
//! ```rust,ignore
//! use pdxsync::normalize::MatchPolicy;
//! use pdxsync::session::scan_local;
//!
//! let manifest = scan_local("./data".as_ref(), MatchPolicy::FirstOccurrence, None).await?;
//! std::fs::write("metadata.pdx", manifest.to_document()?)?;
//! ```

pub mod config;
pub mod entry;
pub mod error;
pub mod hash;
pub mod logging;
pub mod manifest;
pub mod normalize;
pub mod reference;
pub mod session;
pub mod transport;
pub mod types;
pub mod util;

// Re-export commonly used types and functions
pub use config::Config;
pub use entry::Entry;
pub use error::{ConfigError, ManifestError, SessionError, TransportError};
pub use manifest::{Manifest, ManifestBuilder, ManifestDiff, ManifestRecord, ManifestSlot, SyncReport};
pub use normalize::{MatchPolicy, PathNormalizer};
pub use session::{RemoteSlot, SessionState, SyncSession};
pub use types::{EntryKind, NodeKind};

// vim: ts=4
