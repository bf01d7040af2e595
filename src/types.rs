use serde::{Deserialize, Serialize};
use std::fmt;

/// Resolved kind of a manifest entry
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum EntryKind {
	#[serde(rename = "unknown")]
	Unknown,
	#[serde(rename = "file")]
	File,
	#[serde(rename = "dir")]
	Directory,
}

impl EntryKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			EntryKind::Unknown => "unknown",
			EntryKind::File => "file",
			EntryKind::Directory => "dir",
		}
	}
}

impl fmt::Display for EntryKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Kind of a filesystem object as reported by a transport
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum NodeKind {
	File,
	Directory,
	SymLink,
	/// Device, socket, FIFO or anything else; carries a description (mode bits)
	Other(String),
}

impl NodeKind {
	/// Map to an entry kind; `None` for kinds a manifest cannot hold
	pub fn entry_kind(&self) -> Option<EntryKind> {
		match self {
			NodeKind::File => Some(EntryKind::File),
			NodeKind::Directory => Some(EntryKind::Directory),
			NodeKind::SymLink | NodeKind::Other(_) => None,
		}
	}

	/// Classify POSIX `st_mode` bits
	pub fn from_mode(mode: u32) -> Self {
		const S_IFMT: u32 = 0o170000;
		match mode & S_IFMT {
			0o100000 => NodeKind::File,
			0o040000 => NodeKind::Directory,
			0o120000 => NodeKind::SymLink,
			_ => NodeKind::Other(format!("mode {:o}", mode)),
		}
	}
}

impl fmt::Display for NodeKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			NodeKind::File => f.write_str("file"),
			NodeKind::Directory => f.write_str("dir"),
			NodeKind::SymLink => f.write_str("symlink"),
			NodeKind::Other(desc) => f.write_str(desc),
		}
	}
}

/// One immediate child of a listed directory
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct DirChild {
	pub name: String,
	pub kind: NodeKind,
}

// vim: ts=4
