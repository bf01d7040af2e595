//! SHA-256 content hashing

use sha2::{Digest, Sha256};
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Read block size used when streaming file content into the digest
pub const BLOCK_SIZE: usize = 64 * 1024;

/// Hash an in-memory buffer, returning the lowercase hex digest
pub fn hash_bytes(buf: &[u8]) -> String {
	hex::encode(Sha256::digest(buf))
}

/// Stream a reader through SHA-256 in `BLOCK_SIZE` blocks
pub async fn hash_reader<R>(reader: &mut R) -> io::Result<String>
where
	R: AsyncRead + Unpin + ?Sized,
{
	let mut hasher = Sha256::new();
	let mut buf = vec![0u8; BLOCK_SIZE];
	loop {
		let n = reader.read(&mut buf).await?;
		if n == 0 {
			break;
		}
		hasher.update(&buf[..n]);
	}
	Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
	use super::*;

	const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

	#[test]
	fn test_hash_bytes_known_vector() {
		assert_eq!(hash_bytes(b"hello"), HELLO_SHA256);
	}

	#[test]
	fn test_single_byte_change_changes_digest() {
		assert_ne!(hash_bytes(b"hello"), hash_bytes(b"hellp"));
		assert_eq!(hash_bytes(b"hello"), hash_bytes(b"hello"));
	}

	#[tokio::test]
	async fn test_hash_reader_matches_hash_bytes_across_blocks() {
		// Spans several blocks with a ragged tail
		let data: Vec<u8> = (0..(BLOCK_SIZE * 3 + 17)).map(|i| (i % 251) as u8).collect();
		let mut reader = &data[..];
		let streamed = hash_reader(&mut reader).await.unwrap();
		assert_eq!(streamed, hash_bytes(&data));
	}

	#[tokio::test]
	async fn test_hash_reader_empty() {
		let mut reader: &[u8] = &[];
		let digest = hash_reader(&mut reader).await.unwrap();
		assert_eq!(digest, "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855");
	}
}

// vim: ts=4
