use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::*;
use crate::diagnostic::DiagnosticKind;
use crate::fs::{DiskFs, MemoryFs, list_sources};
use crate::scan::DeclScanner;

const RECORD: &str = "/p/.tern-cache.json";
const A: &str = "/p/a.tn";
const B: &str = "/p/b.tn";

fn unit() -> Arc<MemoryFs> {
	let fs = Arc::new(MemoryFs::new());
	fs.insert(A, "package p\n\nfunc ReadFile(path string) []byte {\n\treturn nil\n}\n");
	fs.insert(B, "package p\n\nfunc main() {\n\tReadFile(\"x\")\n}\n");
	fs
}

fn cache_with(fs: &Arc<MemoryFs>, record: bool, force: bool) -> SymbolCache {
	let fs: Arc<dyn SourceFs> = fs.clone();
	let options = CacheOptions {
		record_path: record.then(|| PathBuf::from(RECORD)),
		force,
		max_workers: 2,
	};
	SymbolCache::new("/p", fs, Arc::new(DeclScanner), options)
}

fn cache(fs: &Arc<MemoryFs>) -> SymbolCache {
	cache_with(fs, true, false)
}

fn members(fs: &MemoryFs) -> Vec<PathBuf> {
	list_sources(fs, Path::new("/p"), &["tn", "go"]).unwrap()
}

#[test]
fn names_declared_in_any_file_are_local() {
	let fs = unit();
	let cache = cache_with(&fs, false, false);
	let (warmup, diagnostics) = cache.open(&members(&fs));

	assert_eq!(warmup, Warmup::Rescanned { reason: RescanReason::Missing });
	assert!(diagnostics.is_empty());
	assert!(cache.is_local("ReadFile"));
	assert!(cache.is_local("main"));
	assert!(!cache.is_local("Atoi"));
	assert_eq!(cache.members(), vec![PathBuf::from(A), PathBuf::from(B)]);
}

#[test]
fn unchanged_files_reuse_the_record() {
	let fs = unit();
	let first = cache(&fs);
	first.open(&members(&fs));
	assert!(fs.exists(Path::new(RECORD)));

	let second = cache(&fs);
	let (warmup, _) = second.open(&members(&fs));
	assert_eq!(warmup, Warmup::CacheHit);
	assert!(second.is_local("ReadFile"));
	assert_eq!(second.stats().full_rescans, 0);
	assert_eq!(second.stats().cache_hits, 1);

	let third = cache(&fs);
	assert_eq!(third.open(&members(&fs)).0, Warmup::CacheHit);
}

#[test]
fn body_edits_revalidate_without_rescanning() {
	let fs = unit();
	cache(&fs).open(&members(&fs));
	fs.insert(B, "package p\n\nfunc main() {\n\tReadFile(\"y\")\n\tReadFile(\"z\")\n}\n");
	fs.touch(Path::new(A));

	let cache = cache(&fs);
	let (warmup, _) = cache.open(&members(&fs));
	assert_eq!(warmup, Warmup::Revalidated { updated: 2 });
	assert_eq!(cache.stats().full_rescans, 0);
	assert_eq!(cache.stats().incremental_updates, 1);
	assert_eq!(cache.stats().touched_files, 1);
}

#[test]
fn corrupt_or_foreign_records_rescan_with_diagnostic() {
	let fs = unit();
	fs.insert(RECORD, "{not json");
	let cache = cache(&fs);
	let (warmup, diagnostics) = cache.open(&members(&fs));
	assert_eq!(warmup, Warmup::Rescanned { reason: RescanReason::Corrupt });
	assert_eq!(diagnostics.len(), 1);
	assert_eq!(diagnostics[0].kind, DiagnosticKind::CacheCorrupt);
	assert!(cache.is_local("ReadFile"));

	let mut record: serde_json::Value =
		serde_json::from_str(&fs.read_to_string(Path::new(RECORD)).unwrap()).unwrap();
	record["version"] = serde_json::json!(CACHE_FORMAT_VERSION + 1);
	fs.insert(RECORD, record.to_string());
	let (warmup, diagnostics) = cache_with(&fs, true, false).open(&members(&fs));
	assert_eq!(warmup, Warmup::Rescanned { reason: RescanReason::Corrupt });
	assert_eq!(diagnostics[0].kind, DiagnosticKind::CacheCorrupt);
}

#[test]
fn inconsistent_record_is_corrupt() {
	let fs = unit();
	cache(&fs).open(&members(&fs));
	let mut record: serde_json::Value =
		serde_json::from_str(&fs.read_to_string(Path::new(RECORD)).unwrap()).unwrap();
	record["exclusions"]["functions"] = serde_json::json!(["Invented"]);
	fs.insert(RECORD, record.to_string());

	let cache = cache(&fs);
	let (warmup, diagnostics) = cache.open(&members(&fs));
	assert_eq!(warmup, Warmup::Rescanned { reason: RescanReason::Corrupt });
	assert_eq!(diagnostics.len(), 1);
	assert!(!cache.is_local("Invented"));
}

#[test]
fn force_ignores_a_valid_record() {
	let fs = unit();
	cache(&fs).open(&members(&fs));
	let forced = cache_with(&fs, true, true);
	assert_eq!(
		forced.open(&members(&fs)).0,
		Warmup::Rescanned { reason: RescanReason::Forced }
	);
	assert_eq!(forced.stats().full_rescans, 1);
}

#[test]
fn membership_change_forces_rescan_on_open() {
	let fs = unit();
	cache(&fs).open(&members(&fs));
	fs.insert("/p/c.go", "package p\n\nconst Limit = 3\n");

	let cache = cache(&fs);
	assert_eq!(
		cache.open(&members(&fs)).0,
		Warmup::Rescanned { reason: RescanReason::MembershipChanged }
	);
	assert!(cache.is_local("Limit"));
}

#[test]
fn body_change_takes_incremental_path() {
	let fs = unit();
	let cache = cache(&fs);
	cache.open(&members(&fs));
	let rescans = cache.stats().full_rescans;

	fs.insert(B, "package p\n\nfunc main() {\n\tdata := ReadFile(\"other\")\n\t_ = data\n}\n");
	let (refresh, diagnostics) = cache.refresh_file(Path::new(B));

	assert_eq!(refresh, Refresh::Incremental);
	assert!(diagnostics.is_empty());
	assert!(cache.is_local("ReadFile"));
	assert_eq!(cache.stats().full_rescans, rescans);
	assert_eq!(cache.stats().incremental_updates, 1);
}

#[test]
fn touch_and_untouched_refresh() {
	let fs = unit();
	let cache = cache(&fs);
	cache.open(&members(&fs));

	assert_eq!(cache.refresh_file(Path::new(A)).0, Refresh::Unchanged);
	fs.touch(Path::new(A));
	assert_eq!(cache.refresh_file(Path::new(A)).0, Refresh::Touched);
	assert_eq!(cache.refresh_file(Path::new(A)).0, Refresh::Unchanged);
	assert_eq!(cache.stats().touched_files, 1);
}

#[test]
fn declaration_change_forces_rescan() {
	let fs = unit();
	let cache = cache(&fs);
	cache.open(&members(&fs));
	let before = cache.snapshot();

	fs.insert(B, "package p\n\nfunc main() {}\n\nfunc Open() {}\n");
	let (refresh, _) = cache.refresh_file(Path::new(B));

	assert_eq!(
		refresh,
		Refresh::Rescanned { reason: RescanReason::DeclarationsChanged }
	);
	assert!(cache.is_local("Open"));
	assert!(!before.contains("Open"), "earlier snapshots are immutable");
	assert_eq!(cache.stats().full_rescans, 2);
}

#[test]
fn added_and_removed_files_change_membership() {
	let fs = unit();
	let cache = cache(&fs);
	cache.open(&members(&fs));

	fs.insert("/p/c.tn", "package p\n\ntype Config struct{}\n");
	assert_eq!(
		cache.refresh_file(Path::new("/p/c.tn")).0,
		Refresh::Rescanned { reason: RescanReason::MembershipChanged }
	);
	assert!(cache.is_local("Config"));

	fs.remove(Path::new(A));
	assert_eq!(
		cache.refresh_file(Path::new(A)).0,
		Refresh::Rescanned { reason: RescanReason::MembershipChanged }
	);
	assert!(!cache.is_local("ReadFile"));
	assert!(!cache.contains_file(Path::new(A)));

	assert_eq!(cache.refresh_file(Path::new("/p/never.tn")).0, Refresh::Unchanged);
}

#[test]
fn unparsable_file_is_skipped_and_reported_again_on_cache_hit() {
	let fs = unit();
	fs.insert("/p/broken.tn", "package p\n\nfunc Broken() {\n");
	let cache = cache(&fs);
	let (_, diagnostics) = cache.open(&members(&fs));

	assert_eq!(diagnostics.len(), 1);
	assert_eq!(diagnostics[0].kind, DiagnosticKind::ParseSkip);
	assert_eq!(diagnostics[0].path, PathBuf::from("/p/broken.tn"));
	assert!(cache.is_local("ReadFile"));
	assert!(!cache.is_local("Broken"));

	let again = cache_with(&fs, true, false);
	let (warmup, diagnostics) = again.open(&members(&fs));
	assert_eq!(warmup, Warmup::CacheHit);
	assert_eq!(diagnostics.len(), 1);
	assert_eq!(diagnostics[0].kind, DiagnosticKind::ParseSkip);
}

#[test]
fn fixing_a_skipped_file_rescans() {
	let fs = unit();
	fs.insert("/p/broken.tn", "package p\n\nfunc Broken() {\n");
	let cache = cache(&fs);
	cache.open(&members(&fs));

	fs.insert("/p/broken.tn", "package p\n\nfunc Broken() {}\n");
	let (refresh, diagnostics) = cache.refresh_file(Path::new("/p/broken.tn"));
	assert_eq!(
		refresh,
		Refresh::Rescanned { reason: RescanReason::DeclarationsChanged }
	);
	assert!(diagnostics.is_empty());
	assert!(cache.is_local("Broken"));
}

#[test]
fn record_persists_on_disk() {
	let dir = tempfile::tempdir().unwrap();
	let source = dir.path().join("a.tn");
	std::fs::write(&source, "package p\n\nvar Version = \"1\"\n").unwrap();
	let record_path = dir.path().join(".tern-cache.json");
	let files = list_sources(&DiskFs, dir.path(), &["tn"]).unwrap();

	let open = || {
		let options = CacheOptions {
			record_path: Some(record_path.clone()),
			..CacheOptions::default()
		};
		let cache = SymbolCache::new("unit", Arc::new(DiskFs), Arc::new(DeclScanner), options);
		let warmup = cache.open(&files).0;
		(cache, warmup)
	};

	let (first, warmup) = open();
	assert_eq!(warmup, Warmup::Rescanned { reason: RescanReason::Missing });
	assert!(first.is_local("Version"));
	assert!(record_path.exists());

	let (second, warmup) = open();
	assert_eq!(warmup, Warmup::CacheHit);
	assert_eq!(second.to_record(), first.to_record());
}

#[test]
fn revalidation_abandoned_for_a_rescan_counts_only_the_rescan() {
	let fs = unit();
	fs.insert("/p/c.tn", "package p\n\nfunc Extra() {}\n");
	cache(&fs).open(&members(&fs));

	fs.touch(Path::new(A));
	fs.insert(B, "package p\n\nfunc main() {\n\tReadFile(\"y\")\n}\n");
	fs.insert("/p/c.tn", "package p\n\nfunc Extra() {}\n\nfunc More() {}\n");
	let cache = cache(&fs);
	let (warmup, _) = cache.open(&members(&fs));

	assert_eq!(
		warmup,
		Warmup::Rescanned { reason: RescanReason::DeclarationsChanged }
	);
	let stats = cache.stats();
	assert_eq!(stats.full_rescans, 1);
	assert_eq!(stats.cache_hits, 0);
	assert_eq!(stats.touched_files, 0);
	assert_eq!(stats.incremental_updates, 0);
	assert!(cache.is_local("More"));
}

/// Delegates to a [`MemoryFs`] but refuses every write.
struct ReadOnlyFs(Arc<MemoryFs>);

impl SourceFs for ReadOnlyFs {
	fn list(&self, dir: &Path) -> std::io::Result<Vec<PathBuf>> {
		self.0.list(dir)
	}

	fn read_to_string(&self, path: &Path) -> std::io::Result<String> {
		self.0.read_to_string(path)
	}

	fn modified(&self, path: &Path) -> std::io::Result<u64> {
		self.0.modified(path)
	}

	fn write(&self, _path: &Path, _contents: &[u8]) -> std::io::Result<()> {
		Err(std::io::ErrorKind::PermissionDenied.into())
	}
}

#[test]
fn unwritable_record_is_reported() {
	let memory = unit();
	let fs: Arc<dyn SourceFs> = Arc::new(ReadOnlyFs(Arc::clone(&memory)));
	let options = CacheOptions {
		record_path: Some(PathBuf::from(RECORD)),
		force: false,
		max_workers: 1,
	};
	let cache = SymbolCache::new("/p", fs, Arc::new(DeclScanner), options);
	let (warmup, diagnostics) = cache.open(&members(&memory));

	assert_eq!(warmup, Warmup::Rescanned { reason: RescanReason::Missing });
	assert_eq!(diagnostics.len(), 1);
	assert_eq!(diagnostics[0].kind, DiagnosticKind::PersistFailed);
	assert_eq!(diagnostics[0].path, PathBuf::from(RECORD));
	assert!(cache.is_local("ReadFile"));

	memory.insert(B, "package p\n\nfunc main() {}\n\nfunc Open() {}\n");
	let (refresh, diagnostics) = cache.refresh_file(Path::new(B));
	assert_eq!(
		refresh,
		Refresh::Rescanned { reason: RescanReason::DeclarationsChanged }
	);
	assert_eq!(diagnostics.len(), 1);
	assert_eq!(diagnostics[0].kind, DiagnosticKind::PersistFailed);
}
