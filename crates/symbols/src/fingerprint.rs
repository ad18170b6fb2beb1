use serde::{Deserialize, Serialize};

/// XXH3-64 of a file's contents.
#[inline]
pub fn content_hash(text: &str) -> u64 {
	xxhash_rust::xxh3::xxh3_64(text.as_bytes())
}

/// Identity of one version of a file: modification time plus content hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint {
	/// Nanoseconds since the Unix epoch.
	pub modified: u64,
	pub hash: u64,
}

impl Fingerprint {
	pub fn new(modified: u64, text: &str) -> Self {
		Self {
			modified,
			hash: content_hash(text),
		}
	}
}
