//! File-system abstraction consumed by the symbol cache and unit context.
//!
//! The core never watches directories; callers detect changes and report
//! them. [`DiskFs`] is the production implementation, [`MemoryFs`] backs
//! editor buffers and tests with a logical clock for modification times.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::UNIX_EPOCH;

use parking_lot::RwLock;

pub trait SourceFs: Send + Sync {
	/// Lists regular files directly inside `dir`, sorted by path.
	fn list(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;

	fn read_to_string(&self, path: &Path) -> io::Result<String>;

	/// Modification time in nanoseconds since the Unix epoch.
	fn modified(&self, path: &Path) -> io::Result<u64>;

	/// Replaces the file's contents.
	fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

	fn exists(&self, path: &Path) -> bool {
		self.modified(path).is_ok()
	}
}

/// Lists files in `dir` whose extension is one of `extensions`.
pub fn list_sources(fs: &dyn SourceFs, dir: &Path, extensions: &[&str]) -> io::Result<Vec<PathBuf>> {
	let mut files: Vec<PathBuf> = fs
		.list(dir)?
		.into_iter()
		.filter(|p| {
			p.extension()
				.and_then(|e| e.to_str())
				.is_some_and(|e| extensions.contains(&e))
		})
		.collect();
	files.sort();
	Ok(files)
}

/// The real file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskFs;

impl SourceFs for DiskFs {
	fn list(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
		let mut files = Vec::new();
		for entry in std::fs::read_dir(dir)? {
			let entry = entry?;
			if entry.file_type()?.is_file() {
				files.push(entry.path());
			}
		}
		files.sort();
		Ok(files)
	}

	fn read_to_string(&self, path: &Path) -> io::Result<String> {
		std::fs::read_to_string(path)
	}

	fn modified(&self, path: &Path) -> io::Result<u64> {
		let modified = std::fs::metadata(path)?.modified()?;
		let nanos = modified
			.duration_since(UNIX_EPOCH)
			.unwrap_or_default()
			.as_nanos();
		Ok(u64::try_from(nanos).unwrap_or(u64::MAX))
	}

	/// Writes through a sibling temp file and renames it into place, so
	/// readers never observe a half-written file.
	fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
		let mut tmp = path.as_os_str().to_owned();
		tmp.push(".tmp");
		let tmp = PathBuf::from(tmp);
		std::fs::write(&tmp, contents)?;
		std::fs::rename(&tmp, path)
	}
}

#[derive(Debug, Clone)]
struct MemFile {
	text: String,
	modified: u64,
}

/// In-memory file system with a monotonically increasing logical clock.
#[derive(Debug, Default)]
pub struct MemoryFs {
	files: RwLock<BTreeMap<PathBuf, MemFile>>,
	clock: AtomicU64,
}

impl MemoryFs {
	pub fn new() -> Self {
		Self::default()
	}

	fn tick(&self) -> u64 {
		self.clock.fetch_add(1, Ordering::Relaxed) + 1
	}

	/// Creates or replaces a file, advancing its modification time.
	pub fn insert(&self, path: impl Into<PathBuf>, text: impl Into<String>) {
		let modified = self.tick();
		self.files.write().insert(
			path.into(),
			MemFile {
				text: text.into(),
				modified,
			},
		);
	}

	/// Advances a file's modification time without changing its contents.
	pub fn touch(&self, path: &Path) -> bool {
		let modified = self.tick();
		match self.files.write().get_mut(path) {
			Some(file) => {
				file.modified = modified;
				true
			}
			None => false,
		}
	}

	pub fn remove(&self, path: &Path) -> bool {
		self.files.write().remove(path).is_some()
	}
}

fn not_found(path: &Path) -> io::Error {
	io::Error::new(io::ErrorKind::NotFound, format!("{}: no such file", path.display()))
}

impl SourceFs for MemoryFs {
	fn list(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
		Ok(self
			.files
			.read()
			.keys()
			.filter(|p| p.parent() == Some(dir))
			.cloned()
			.collect())
	}

	fn read_to_string(&self, path: &Path) -> io::Result<String> {
		self.files
			.read()
			.get(path)
			.map(|f| f.text.clone())
			.ok_or_else(|| not_found(path))
	}

	fn modified(&self, path: &Path) -> io::Result<u64> {
		self.files
			.read()
			.get(path)
			.map(|f| f.modified)
			.ok_or_else(|| not_found(path))
	}

	fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
		self.insert(path, String::from_utf8_lossy(contents).into_owned());
		Ok(())
	}
}
