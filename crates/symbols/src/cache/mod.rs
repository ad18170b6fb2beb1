//! The package-wide symbol cache.
//!
//! Reads go through an [`ArcSwap`] snapshot and never block. Every write
//! (warmup, rescan, single-file refresh) runs under the state mutex, builds a
//! complete [`ExclusionSet`] and swaps it in, so readers see either the old
//! set or the new one.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};

use crate::decl::{ExclusionSet, FileDecls};
use crate::diagnostic::Diagnostic;
use crate::fingerprint::{Fingerprint, content_hash};
use crate::fs::SourceFs;
use crate::parallel;
use crate::record::{CACHE_FORMAT_VERSION, CacheRecord, FileRecord};
use crate::scan::DeclParser;

#[cfg(test)]
mod tests;

#[derive(Debug, Clone)]
pub struct CacheOptions {
	/// Side-car record location; `None` keeps the cache in memory only.
	pub record_path: Option<PathBuf>,
	/// Ignore any persisted record and always rescan on open.
	pub force: bool,
	pub max_workers: usize,
}

impl Default for CacheOptions {
	fn default() -> Self {
		Self {
			record_path: None,
			force: false,
			max_workers: parallel::default_workers(),
		}
	}
}

/// Why a full rescan ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RescanReason {
	Forced,
	/// No persisted record, or persistence disabled.
	Missing,
	/// The record failed to decode, had another format version, or was
	/// internally inconsistent.
	Corrupt,
	/// A file was added to or removed from the unit.
	MembershipChanged,
	/// A file's package-scope declarations changed.
	DeclarationsChanged,
}

/// Outcome of [`SymbolCache::open`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Warmup {
	/// The persisted record matched every file fingerprint.
	CacheHit,
	/// The record was reused after re-extracting `updated` changed files whose
	/// declarations turned out to be unchanged.
	Revalidated { updated: usize },
	Rescanned { reason: RescanReason },
}

/// Outcome of [`SymbolCache::refresh_file`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
	/// The file's modification time did not change.
	Unchanged,
	/// Modification time changed, contents did not.
	Touched,
	/// Contents changed but the file declares the same names.
	Incremental,
	Rescanned { reason: RescanReason },
}

/// Counters since the cache was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
	pub full_rescans: u64,
	pub incremental_updates: u64,
	pub touched_files: u64,
	pub cache_hits: u64,
}

#[derive(Debug, Default)]
struct Counters {
	full_rescans: AtomicU64,
	incremental_updates: AtomicU64,
	touched_files: AtomicU64,
	cache_hits: AtomicU64,
}

impl Counters {
	fn bump(counter: &AtomicU64, by: u64) {
		counter.fetch_add(by, Ordering::Relaxed);
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FileState {
	fingerprint: Fingerprint,
	decls: FileDecls,
	/// Why this file contributes nothing, if it failed to read or parse.
	skipped: Option<String>,
}

impl FileState {
	/// Same contribution to the exclusion set.
	fn same_contribution(&self, other: &FileState) -> bool {
		self.decls == other.decls && self.skipped.is_some() == other.skipped.is_some()
	}

	fn diagnostic(&self, path: &Path) -> Option<Diagnostic> {
		self.skipped
			.as_ref()
			.map(|message| Diagnostic::parse_skip(path, message))
	}
}

#[derive(Debug, Default)]
struct CacheState {
	files: BTreeMap<PathBuf, FileState>,
	scanned_at: u64,
}

/// Result of re-inspecting one known file.
enum Change {
	Same,
	Touched(u64),
	Incremental(FileState),
	Changed,
}

/// Package-scope names of one compilation unit.
pub struct SymbolCache {
	unit: String,
	fs: Arc<dyn SourceFs>,
	parser: Arc<dyn DeclParser>,
	/// Parsers that replace `parser` for files with a given extension.
	parsers: FxHashMap<String, Arc<dyn DeclParser>>,
	options: CacheOptions,
	live: ArcSwap<ExclusionSet>,
	state: Mutex<CacheState>,
	counters: Counters,
}

impl std::fmt::Debug for SymbolCache {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SymbolCache")
			.field("unit", &self.unit)
			.field("options", &self.options)
			.field("names", &self.live.load().len())
			.finish_non_exhaustive()
	}
}

impl SymbolCache {
	/// Creates an empty cache. Call [`open`](Self::open) before querying.
	pub fn new(
		unit: impl Into<String>,
		fs: Arc<dyn SourceFs>,
		parser: Arc<dyn DeclParser>,
		options: CacheOptions,
	) -> Self {
		Self {
			unit: unit.into(),
			fs,
			parser,
			parsers: FxHashMap::default(),
			options,
			live: ArcSwap::from_pointee(ExclusionSet::default()),
			state: Mutex::new(CacheState::default()),
			counters: Counters::default(),
		}
	}

	/// Parses files ending in `.{extension}` with `parser` instead of the default.
	pub fn with_parser(mut self, extension: impl Into<String>, parser: Arc<dyn DeclParser>) -> Self {
		self.parsers.insert(extension.into(), parser);
		self
	}

	pub fn unit(&self) -> &str {
		&self.unit
	}

	/// Brings the cache up to date for exactly `files`, preferring the
	/// persisted record and falling back to a full rescan.
	pub fn open(&self, files: &[PathBuf]) -> (Warmup, Vec<Diagnostic>) {
		let mut state = self.state.lock();
		let mut diagnostics = Vec::new();

		let reason = if self.options.force {
			RescanReason::Forced
		} else {
			match self.load_record(&mut diagnostics) {
				Some(record) => match self.revalidate(&mut state, record, files, &mut diagnostics) {
					Ok(warmup) => return (warmup, diagnostics),
					Err(reason) => reason,
				},
				None if diagnostics.is_empty() => RescanReason::Missing,
				None => RescanReason::Corrupt,
			}
		};

		diagnostics.extend(self.full_rescan(&mut state, files.to_vec(), reason));
		(Warmup::Rescanned { reason }, diagnostics)
	}

	/// Forces a full rescan of the current members.
	pub fn rescan(&self, reason: RescanReason) -> Vec<Diagnostic> {
		let mut state = self.state.lock();
		let files: Vec<PathBuf> = state.files.keys().cloned().collect();
		self.full_rescan(&mut state, files, reason)
	}

	/// Re-examines one file after the caller observed a change to it.
	///
	/// Unknown paths that now exist join the unit, known paths that no longer
	/// exist leave it; both force a rescan.
	pub fn refresh_file(&self, path: &Path) -> (Refresh, Vec<Diagnostic>) {
		let mut state = self.state.lock();
		let exists = self.fs.exists(path);

		let Some(previous) = state.files.get(path).cloned() else {
			if !exists {
				return (Refresh::Unchanged, Vec::new());
			}
			let mut files: Vec<PathBuf> = state.files.keys().cloned().collect();
			files.push(path.to_path_buf());
			files.sort();
			return self.refresh_by_rescan(&mut state, files, RescanReason::MembershipChanged);
		};

		if !exists {
			let files: Vec<PathBuf> = state.files.keys().filter(|p| p.as_path() != path).cloned().collect();
			return self.refresh_by_rescan(&mut state, files, RescanReason::MembershipChanged);
		}

		match self.inspect(path, &previous) {
			Change::Same => (Refresh::Unchanged, Vec::new()),
			Change::Touched(modified) => {
				if let Some(file) = state.files.get_mut(path) {
					file.fingerprint.modified = modified;
				}
				Counters::bump(&self.counters.touched_files, 1);
				debug!(path = %path.display(), "file touched without content change");
				(Refresh::Touched, self.persist(&state).into_iter().collect())
			}
			Change::Incremental(next) => {
				let mut diagnostics: Vec<Diagnostic> = next.diagnostic(path).into_iter().collect();
				state.files.insert(path.to_path_buf(), next);
				// Same names as before, but rebuilt so the swap stays the only write path.
				self.publish(&state);
				Counters::bump(&self.counters.incremental_updates, 1);
				debug!(path = %path.display(), "incremental update, declarations unchanged");
				diagnostics.extend(self.persist(&state));
				(Refresh::Incremental, diagnostics)
			}
			Change::Changed => {
				let files: Vec<PathBuf> = state.files.keys().cloned().collect();
				self.refresh_by_rescan(&mut state, files, RescanReason::DeclarationsChanged)
			}
		}
	}

	/// True if `name` is declared at package scope anywhere in the unit.
	#[inline]
	pub fn is_local(&self, name: &str) -> bool {
		self.live.load().contains(name)
	}

	/// The current exclusion set. Stays valid (and unchanged) after later
	/// refreshes replace the live set.
	pub fn snapshot(&self) -> Arc<ExclusionSet> {
		self.live.load_full()
	}

	pub fn stats(&self) -> ScanStats {
		let c = &self.counters;
		ScanStats {
			full_rescans: c.full_rescans.load(Ordering::Relaxed),
			incremental_updates: c.incremental_updates.load(Ordering::Relaxed),
			touched_files: c.touched_files.load(Ordering::Relaxed),
			cache_hits: c.cache_hits.load(Ordering::Relaxed),
		}
	}

	/// Paths currently belonging to the unit, sorted.
	pub fn members(&self) -> Vec<PathBuf> {
		self.state.lock().files.keys().cloned().collect()
	}

	pub fn contains_file(&self, path: &Path) -> bool {
		self.state.lock().files.contains_key(path)
	}

	pub fn to_record(&self) -> CacheRecord {
		self.record_from(&self.state.lock())
	}

	fn load_record(&self, diagnostics: &mut Vec<Diagnostic>) -> Option<CacheRecord> {
		let path = self.options.record_path.as_deref()?;
		match CacheRecord::load(self.fs.as_ref(), path, &self.unit) {
			Ok(record) => record,
			Err(e) => {
				warn!(path = %path.display(), error = %e, "discarding symbol cache record");
				diagnostics.push(Diagnostic::cache_corrupt(path, &e));
				None
			}
		}
	}

	/// Adopts `record` if it still describes `files`, re-extracting any file
	/// whose modification time moved.
	fn revalidate(
		&self,
		state: &mut CacheState,
		record: CacheRecord,
		files: &[PathBuf],
		diagnostics: &mut Vec<Diagnostic>,
	) -> Result<Warmup, RescanReason> {
		if record.files.len() != files.len() || files.iter().any(|p| !record.files.contains_key(p)) {
			return Err(RescanReason::MembershipChanged);
		}

		let recorded: BTreeMap<PathBuf, FileState> = record
			.files
			.into_iter()
			.map(|(path, file)| {
				let file_state = FileState {
					fingerprint: file.fingerprint(),
					decls: file.decls,
					skipped: file.skipped,
				};
				(path, file_state)
			})
			.collect();

		let union = ExclusionSet::from_files(recorded.values().map(|f| &f.decls));
		if union != ExclusionSet::from_lists(&record.exclusions) {
			if let Some(path) = &self.options.record_path {
				warn!(path = %path.display(), "symbol cache record is inconsistent");
				diagnostics.push(Diagnostic::cache_corrupt(
					path,
					"exclusion lists disagree with per-file declarations",
				));
			}
			return Err(RescanReason::Corrupt);
		}

		let mut next = recorded;
		let (mut touched, mut incremental) = (0u64, 0u64);
		for path in files {
			let Some(previous) = next.get(path).cloned() else {
				continue;
			};
			if !self.fs.exists(path) {
				return Err(RescanReason::MembershipChanged);
			}
			match self.inspect(path, &previous) {
				Change::Same => {}
				Change::Touched(modified) => {
					if let Some(file) = next.get_mut(path) {
						file.fingerprint.modified = modified;
					}
					touched += 1;
				}
				Change::Incremental(file) => {
					next.insert(path.clone(), file);
					incremental += 1;
				}
				Change::Changed => return Err(RescanReason::DeclarationsChanged),
			}
		}

		diagnostics.extend(next.iter().filter_map(|(path, file)| file.diagnostic(path)));
		state.files = next;
		state.scanned_at = record.scanned_at;
		self.live.store(Arc::new(union));
		Counters::bump(&self.counters.cache_hits, 1);
		Counters::bump(&self.counters.touched_files, touched);
		Counters::bump(&self.counters.incremental_updates, incremental);

		let updated = (touched + incremental) as usize;
		if updated == 0 {
			debug!(unit = %self.unit, files = files.len(), "symbol cache hit");
			Ok(Warmup::CacheHit)
		} else {
			debug!(unit = %self.unit, updated, "symbol cache revalidated");
			diagnostics.extend(self.persist(state));
			Ok(Warmup::Revalidated { updated })
		}
	}

	/// Compares a known file against its recorded state.
	fn inspect(&self, path: &Path, previous: &FileState) -> Change {
		let Ok(modified) = self.fs.modified(path) else {
			return Change::Changed;
		};
		if modified == previous.fingerprint.modified {
			return Change::Same;
		}
		let Ok(text) = self.fs.read_to_string(path) else {
			return Change::Changed;
		};
		if content_hash(&text) == previous.fingerprint.hash {
			return Change::Touched(modified);
		}
		let next = self.extract(path, modified, &text);
		if next.same_contribution(previous) {
			Change::Incremental(next)
		} else {
			Change::Changed
		}
	}

	fn extract(&self, path: &Path, modified: u64, text: &str) -> FileState {
		let fingerprint = Fingerprint::new(modified, text);
		match self.parser_for(path).parse(text) {
			Ok(decls) => FileState {
				fingerprint,
				decls,
				skipped: None,
			},
			Err(e) => {
				warn!(path = %path.display(), error = %e, "skipping unparsable file");
				FileState {
					fingerprint,
					decls: FileDecls::default(),
					skipped: Some(e.to_string()),
				}
			}
		}
	}

	fn parser_for(&self, path: &Path) -> &dyn DeclParser {
		path.extension()
			.and_then(|e| e.to_str())
			.and_then(|e| self.parsers.get(e))
			.unwrap_or(&self.parser)
			.as_ref()
	}

	fn scan_file(&self, path: &Path) -> FileState {
		let read = self
			.fs
			.modified(path)
			.and_then(|modified| Ok((modified, self.fs.read_to_string(path)?)));
		match read {
			Ok((modified, text)) => self.extract(path, modified, &text),
			Err(e) => {
				warn!(path = %path.display(), error = %e, "skipping unreadable file");
				FileState {
					fingerprint: Fingerprint { modified: 0, hash: 0 },
					decls: FileDecls::default(),
					skipped: Some(e.to_string()),
				}
			}
		}
	}

	fn full_rescan(&self, state: &mut CacheState, files: Vec<PathBuf>, reason: RescanReason) -> Vec<Diagnostic> {
		let started = Instant::now();
		let scanned = parallel::map(&files, self.options.max_workers, |path| self.scan_file(path));

		state.files = files.into_iter().zip(scanned).collect();
		state.scanned_at = unix_seconds();
		self.publish(state);
		Counters::bump(&self.counters.full_rescans, 1);
		info!(
			unit = %self.unit,
			?reason,
			files = state.files.len(),
			names = self.live.load().len(),
			elapsed = ?started.elapsed(),
			"full symbol rescan"
		);
		let mut diagnostics: Vec<Diagnostic> = state
			.files
			.iter()
			.filter_map(|(path, file)| file.diagnostic(path))
			.collect();
		diagnostics.extend(self.persist(state));
		diagnostics
	}

	fn refresh_by_rescan(
		&self,
		state: &mut CacheState,
		files: Vec<PathBuf>,
		reason: RescanReason,
	) -> (Refresh, Vec<Diagnostic>) {
		let diagnostics = self.full_rescan(state, files, reason);
		(Refresh::Rescanned { reason }, diagnostics)
	}

	fn publish(&self, state: &CacheState) {
		let set = ExclusionSet::from_files(state.files.values().map(|f| &f.decls));
		self.live.store(Arc::new(set));
	}

	fn record_from(&self, state: &CacheState) -> CacheRecord {
		CacheRecord {
			version: CACHE_FORMAT_VERSION,
			unit: self.unit.clone(),
			scanned_at: state.scanned_at,
			exclusions: self.live.load().to_lists(),
			files: state
				.files
				.iter()
				.map(|(path, file)| {
					let record = FileRecord {
						modified: file.fingerprint.modified,
						hash: file.fingerprint.hash,
						decls: file.decls.clone(),
						skipped: file.skipped.clone(),
					};
					(path.clone(), record)
				})
				.collect(),
		}
	}

	/// Writes the side-car record. Failure only costs the next cold start.
	/// Writes the side-car record; a failure is returned, never raised.
	fn persist(&self, state: &CacheState) -> Option<Diagnostic> {
		let path = self.options.record_path.as_deref()?;
		let e = self.record_from(state).save(self.fs.as_ref(), path).err()?;
		warn!(path = %path.display(), error = %e, "failed to persist symbol cache");
		Some(Diagnostic::persist_failed(path, &e))
	}
}

fn unix_seconds() -> u64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map(|d| d.as_secs())
		.unwrap_or_default()
}
