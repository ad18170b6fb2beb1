//! Per-unit configuration, read from an optional `tern.toml`.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tern_symbols::SourceFs;
use tern_symbols::parallel::default_workers;
use thiserror::Error;

/// File name of the unit configuration, looked up in the unit directory.
pub const CONFIG_FILE: &str = "tern.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("failed to read {}: {source}", path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: io::Error,
	},
	#[error("invalid {}: {source}", path.display())]
	Parse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},
	#[error("invalid configuration: {0}")]
	Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UnitConfig {
	/// Extension of files run through the pipeline.
	pub source_extension: String,
	/// Extensions of host-language files, which only contribute declarations.
	pub host_extensions: Vec<String>,
	/// Name of the side-car cache record inside the unit directory.
	pub cache_file: String,
	pub max_workers: usize,
	/// Ignore the cache record and rescan on open.
	pub force: bool,
}

impl Default for UnitConfig {
	fn default() -> Self {
		Self {
			source_extension: "tn".into(),
			host_extensions: vec!["go".into()],
			cache_file: ".tern-cache.json".into(),
			max_workers: default_workers(),
			force: false,
		}
	}
}

impl UnitConfig {
	pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
		toml::from_str(text)
	}

	/// Reads `tern.toml` from `dir`; a missing file yields the defaults.
	pub fn load(fs: &dyn SourceFs, dir: &Path) -> Result<Self, ConfigError> {
		let path = dir.join(CONFIG_FILE);
		let text = match fs.read_to_string(&path) {
			Ok(text) => text,
			Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
			Err(source) => return Err(ConfigError::Io { path, source }),
		};
		let config = Self::from_toml(&text).map_err(|source| ConfigError::Parse { path, source })?;
		config.validate()?;
		Ok(config)
	}

	pub fn force(mut self, force: bool) -> Self {
		self.force = force;
		self
	}

	pub fn max_workers(mut self, max_workers: usize) -> Self {
		self.max_workers = max_workers;
		self
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		let invalid = |message: &str| Err(ConfigError::Invalid(message.to_owned()));
		if self.source_extension.is_empty() {
			return invalid("`source_extension` must not be empty");
		}
		if self.host_extensions.contains(&self.source_extension) {
			return invalid("`source_extension` cannot also be a host extension");
		}
		if self.cache_file.is_empty() || self.cache_file.contains(['/', '\\']) {
			return invalid("`cache_file` must be a plain file name");
		}
		if self.max_workers == 0 {
			return invalid("`max_workers` must be at least 1");
		}
		Ok(())
	}

	/// Every extension whose files belong to the unit.
	pub fn extensions(&self) -> Vec<&str> {
		std::iter::once(self.source_extension.as_str())
			.chain(self.host_extensions.iter().map(String::as_str))
			.collect()
	}

	pub fn is_source(&self, path: &Path) -> bool {
		extension(path) == Some(self.source_extension.as_str())
	}

	pub fn is_host(&self, path: &Path) -> bool {
		extension(path).is_some_and(|e| self.host_extensions.iter().any(|h| h == e))
	}

	/// Where the transpiled form of source file `path` goes.
	pub fn generated_path(&self, path: &Path) -> PathBuf {
		let ext = self.host_extensions.first().map_or("go", String::as_str);
		path.with_extension(ext)
	}
}

fn extension(path: &Path) -> Option<&str> {
	path.extension().and_then(|e| e.to_str())
}
