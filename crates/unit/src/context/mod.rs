//! One compilation unit: discovery, the symbol cache and per-file builds.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tern_pipeline::{Pipeline, PipelineError, PipelineResult, StageContext};
use tern_registry::ModuleRegistry;
use tern_symbols::{
	CacheOptions, DeclScanner, Diagnostic, ExclusionSet, HostParser, Refresh, ScanStats, SourceFs, SymbolCache,
	Warmup, list_sources, parallel,
};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{ConfigError, UnitConfig};


#[derive(Debug, Error)]
pub enum UnitError {
	#[error(transparent)]
	Config(#[from] ConfigError),
	#[error("failed to list {}: {source}", dir.display())]
	Discover {
		dir: PathBuf,
		#[source]
		source: io::Error,
	},
	#[error("{} is not a source file of this unit", .0.display())]
	NotMember(PathBuf),
}

/// Why one file produced no output.
#[derive(Debug, Error)]
pub enum TranspileError {
	#[error("failed to read {}: {source}", path.display())]
	Read {
		path: PathBuf,
		#[source]
		source: io::Error,
	},
	#[error(transparent)]
	Pipeline(#[from] PipelineError),
}

#[derive(Debug)]
pub struct FileOutput {
	pub path: PathBuf,
	/// Where the host-language output belongs.
	pub generated: PathBuf,
	pub result: Result<PipelineResult, TranspileError>,
}

impl FileOutput {
	pub fn is_ok(&self) -> bool {
		self.result.is_ok()
	}
}

/// Outputs of [`UnitContext::transpile_all`], one per source file in path order.
#[derive(Debug)]
pub struct UnitBuild {
	pub outputs: Vec<FileOutput>,
	/// Recovered failures accumulated by the context so far.
	pub diagnostics: Vec<Diagnostic>,
}

impl UnitBuild {
	pub fn failures(&self) -> impl Iterator<Item = &FileOutput> {
		self.outputs.iter().filter(|o| !o.is_ok())
	}
}

/// Outcome of [`UnitContext::invalidate`].
#[derive(Debug)]
pub struct Invalidation {
	pub refresh: Refresh,
	/// The re-transpiled file, if it is a source file that still exists.
	pub output: Option<FileOutput>,
}

/// A long-lived view of one directory's compilation unit.
///
/// Top-level operations ([`transpile_all`](Self::transpile_all),
/// [`transpile_file`](Self::transpile_file), [`invalidate`](Self::invalidate))
/// run one at a time; name queries never wait on them.
pub struct UnitContext {
	dir: PathBuf,
	config: UnitConfig,
	fs: Arc<dyn SourceFs>,
	cache: SymbolCache,
	pipeline: Pipeline,
	registry: &'static ModuleRegistry,
	op: Mutex<()>,
	diagnostics: Mutex<Vec<Diagnostic>>,
	warmup: Warmup,
}

impl std::fmt::Debug for UnitContext {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("UnitContext")
			.field("dir", &self.dir)
			.field("config", &self.config)
			.field("pipeline", &self.pipeline)
			.field("warmup", &self.warmup)
			.finish_non_exhaustive()
	}
}

impl UnitContext {
	/// Opens the unit in `dir`, reading `tern.toml` if present.
	pub fn open(dir: impl Into<PathBuf>, fs: Arc<dyn SourceFs>) -> Result<Self, UnitError> {
		let dir = dir.into();
		let config = UnitConfig::load(fs.as_ref(), &dir)?;
		Self::with_config(dir, config, fs)
	}

	/// Opens the unit in `dir` with an explicit configuration.
	///
	/// Discovers the unit's files, then warms the symbol cache from the
	/// side-car record or a full rescan.
	pub fn with_config(dir: impl Into<PathBuf>, config: UnitConfig, fs: Arc<dyn SourceFs>) -> Result<Self, UnitError> {
		let dir = dir.into();
		config.validate()?;
		let files = discover(fs.as_ref(), &dir, &config)?;

		let options = CacheOptions {
			record_path: Some(dir.join(&config.cache_file)),
			force: config.force,
			max_workers: config.max_workers,
		};
		let cache = config.host_extensions.iter().fold(
			SymbolCache::new(dir.display().to_string(), Arc::clone(&fs), Arc::new(DeclScanner), options),
			|cache, ext| cache.with_parser(ext.as_str(), Arc::new(HostParser)),
		);
		let (warmup, diagnostics) = cache.open(&files);
		info!(
			dir = %dir.display(),
			files = files.len(),
			?warmup,
			diagnostics = diagnostics.len(),
			"opened compilation unit"
		);

		Ok(Self {
			dir,
			config,
			fs,
			cache,
			pipeline: Pipeline::standard(),
			registry: ModuleRegistry::builtin(),
			op: Mutex::new(()),
			diagnostics: Mutex::new(diagnostics),
			warmup,
		})
	}

	/// Replaces the standard pipeline.
	pub fn with_pipeline(mut self, pipeline: Pipeline) -> Self {
		self.pipeline = pipeline;
		self
	}

	/// Transpiles every source file against one exclusion snapshot.
	///
	/// A failing file does not stop the others.
	pub fn transpile_all(&self) -> UnitBuild {
		let _op = self.op.lock();
		let sources = self.sources();
		let exclusions = self.cache.snapshot();
		let outputs = parallel::map(&sources, self.config.max_workers, |path| {
			self.transpile_with(path, &exclusions)
		});

		let failed = outputs.iter().filter(|o| !o.is_ok()).count();
		info!(dir = %self.dir.display(), files = outputs.len(), failed, "transpiled unit");
		UnitBuild {
			outputs,
			diagnostics: self.diagnostics(),
		}
	}

	pub fn transpile_file(&self, path: &Path) -> Result<FileOutput, UnitError> {
		let _op = self.op.lock();
		if !self.config.is_source(path) || !self.cache.contains_file(path) {
			return Err(UnitError::NotMember(path.to_path_buf()));
		}
		Ok(self.transpile_with(path, &self.cache.snapshot()))
	}

	/// Reports that `path` changed on disk (edited, touched, added or removed)
	/// and re-transpiles it when it is a source file that still exists.
	pub fn invalidate(&self, path: &Path) -> Result<Invalidation, UnitError> {
		let _op = self.op.lock();
		if !self.accepts(path) {
			return Err(UnitError::NotMember(path.to_path_buf()));
		}

		let (refresh, diagnostics) = self.cache.refresh_file(path);
		debug!(path = %path.display(), ?refresh, "invalidated file");
		self.diagnostics.lock().extend(diagnostics);

		let output = (self.config.is_source(path) && self.cache.contains_file(path))
			.then(|| self.transpile_with(path, &self.cache.snapshot()));
		Ok(Invalidation { refresh, output })
	}

	pub fn is_local(&self, name: &str) -> bool {
		self.cache.is_local(name)
	}

	pub fn exclusions(&self) -> Arc<ExclusionSet> {
		self.cache.snapshot()
	}

	pub fn stats(&self) -> ScanStats {
		self.cache.stats()
	}

	/// Recovered failures since the context opened or last drained.
	pub fn diagnostics(&self) -> Vec<Diagnostic> {
		self.diagnostics.lock().clone()
	}

	pub fn take_diagnostics(&self) -> Vec<Diagnostic> {
		std::mem::take(&mut *self.diagnostics.lock())
	}

	/// How the symbol cache was warmed when the context opened.
	pub fn warmup(&self) -> Warmup {
		self.warmup
	}

	/// Source files currently in the unit, sorted.
	pub fn sources(&self) -> Vec<PathBuf> {
		self.cache
			.members()
			.into_iter()
			.filter(|p| self.config.is_source(p))
			.collect()
	}

	/// Every file contributing declarations, sources and host files alike.
	pub fn members(&self) -> Vec<PathBuf> {
		self.cache.members()
	}

	pub fn dir(&self) -> &Path {
		&self.dir
	}

	pub fn config(&self) -> &UnitConfig {
		&self.config
	}

	/// Whether a change to `path` concerns this unit.
	fn accepts(&self, path: &Path) -> bool {
		if path.parent() != Some(self.dir.as_path()) {
			return false;
		}
		if self.config.is_source(path) {
			return true;
		}
		self.config.is_host(path) && !is_generated(self.fs.as_ref(), &self.config, path)
	}

	fn transpile_with(&self, path: &Path, exclusions: &ExclusionSet) -> FileOutput {
		let cx = StageContext {
			exclusions,
			registry: self.registry,
		};
		let result = self
			.fs
			.read_to_string(path)
			.map_err(|source| TranspileError::Read {
				path: path.to_path_buf(),
				source,
			})
			.and_then(|text| self.pipeline.run(&text, &cx).map_err(TranspileError::from));
		if let Err(e) = &result {
			debug!(path = %path.display(), error = %e, "transpilation failed");
		}
		FileOutput {
			path: path.to_path_buf(),
			generated: self.config.generated_path(path),
			result,
		}
	}
}

/// Lists the unit's files, leaving out host files generated from a source
/// file of the same stem.
fn discover(fs: &dyn SourceFs, dir: &Path, config: &UnitConfig) -> Result<Vec<PathBuf>, UnitError> {
	let files = list_sources(fs, dir, &config.extensions()).map_err(|source| UnitError::Discover {
		dir: dir.to_path_buf(),
		source,
	})?;
	Ok(files
		.iter()
		.filter(|p| !(config.is_host(p) && files.contains(&p.with_extension(&config.source_extension))))
		.cloned()
		.collect())
}

fn is_generated(fs: &dyn SourceFs, config: &UnitConfig, path: &Path) -> bool {
	fs.exists(&path.with_extension(&config.source_extension))
}
