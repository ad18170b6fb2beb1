//! Package-wide symbol resolution cache.
//!
//! Answers "is this bare name declared at package scope anywhere in the
//! compilation unit" through three tiers:
//!
//! 1. the live [`ExclusionSet`] held by [`SymbolCache`] (lock-free reads),
//! 2. a persisted [`CacheRecord`] side-car file, validated against file
//!    fingerprints before use,
//! 3. a full rescan of every file in the unit, parsed in parallel.
//!
//! Single-file changes take an incremental path when the file's package-scope
//! declarations did not change; anything else falls back to a full rescan.

pub mod cache;
pub mod decl;
pub mod diagnostic;
pub mod fingerprint;
pub mod fs;
pub mod parallel;
pub mod record;
pub mod scan;

pub use cache::{CacheOptions, Refresh, RescanReason, ScanStats, SymbolCache, Warmup};
pub use decl::{DeclKind, ExclusionLists, ExclusionSet, FileDecls};
pub use diagnostic::{Diagnostic, DiagnosticKind};
pub use fingerprint::{Fingerprint, content_hash};
pub use fs::{DiskFs, MemoryFs, SourceFs, list_sources};
pub use record::{CACHE_FORMAT_VERSION, CacheError, CacheRecord, FileRecord};
pub use scan::{DeclParser, DeclScanner, HostParser, ScanError};
