//! Compilation-unit context for the tern front end.
//!
//! A [`UnitContext`] owns everything one directory's build needs: its
//! configuration, the symbol cache over every file of the unit, and the
//! rewrite pipeline run per source file. Callers that watch the file system
//! report changes through [`UnitContext::invalidate`].

pub mod config;
mod context;

pub use config::{CONFIG_FILE, ConfigError, UnitConfig};
pub use context::{FileOutput, Invalidation, TranspileError, UnitBuild, UnitContext, UnitError};
pub use tern_pipeline::{Pipeline, PipelineError, PipelineResult};
pub use tern_primitives::{Position, SourceMap};
pub use tern_symbols::{DiskFs, Diagnostic, DiagnosticKind, MemoryFs, Refresh, RescanReason, ScanStats, SourceFs, Warmup};
