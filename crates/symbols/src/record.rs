//! Persisted symbol cache: the side-car record written after each scan.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decl::{ExclusionLists, FileDecls};
use crate::fingerprint::Fingerprint;
use crate::fs::SourceFs;

/// Bumped whenever the record layout changes; older records are discarded.
pub const CACHE_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum CacheError {
	#[error("failed to access cache record: {0}")]
	Io(#[from] io::Error),
	#[error("failed to decode cache record: {0}")]
	Decode(#[from] serde_json::Error),
	#[error("cache record format {found} does not match {expected}")]
	Version { found: u32, expected: u32 },
	#[error("cache record belongs to unit {found}")]
	ForeignUnit { found: String },
}

/// Per-file entry of a [`CacheRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
	pub modified: u64,
	pub hash: u64,
	#[serde(default)]
	pub decls: FileDecls,
	/// Parse failure that caused this file's declarations to be omitted.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub skipped: Option<String>,
}

impl FileRecord {
	pub fn fingerprint(&self) -> Fingerprint {
		Fingerprint {
			modified: self.modified,
			hash: self.hash,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRecord {
	pub version: u32,
	pub unit: String,
	/// Seconds since the Unix epoch of the scan that produced this record.
	pub scanned_at: u64,
	pub exclusions: ExclusionLists,
	pub files: BTreeMap<PathBuf, FileRecord>,
}

#[derive(Deserialize)]
struct VersionHeader {
	version: u32,
}

impl CacheRecord {
	/// Reads the record at `path`. A missing file is `Ok(None)`; anything
	/// unreadable, from another format version or another unit is an error.
	pub fn load(fs: &dyn SourceFs, path: &Path, unit: &str) -> Result<Option<Self>, CacheError> {
		let text = match fs.read_to_string(path) {
			Ok(text) => text,
			Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
			Err(e) => return Err(e.into()),
		};
		Self::decode(&text, unit).map(Some)
	}

	pub fn decode(text: &str, unit: &str) -> Result<Self, CacheError> {
		let header: VersionHeader = serde_json::from_str(text)?;
		if header.version != CACHE_FORMAT_VERSION {
			return Err(CacheError::Version {
				found: header.version,
				expected: CACHE_FORMAT_VERSION,
			});
		}
		let record: CacheRecord = serde_json::from_str(text)?;
		if record.unit != unit {
			return Err(CacheError::ForeignUnit { found: record.unit });
		}
		Ok(record)
	}

	pub fn save(&self, fs: &dyn SourceFs, path: &Path) -> Result<(), CacheError> {
		let bytes = serde_json::to_vec_pretty(self)?;
		fs.write(path, &bytes)?;
		Ok(())
	}
}
