use std::fmt;
use std::path::PathBuf;

/// Failures that were recovered locally and did not abort the operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
	/// A file could not be read or parsed; its declarations were omitted from
	/// the exclusion set, which may cause a later false qualification.
	ParseSkip,
	/// The persisted cache record was unreadable or stale in format and was
	/// replaced by a full rescan.
	CacheCorrupt,
	/// The cache record could not be written; the next open rescans.
	PersistFailed,
}

/// A recovered failure, kept for the caller to inspect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
	pub kind: DiagnosticKind,
	pub path: PathBuf,
	pub message: String,
}

impl Diagnostic {
	pub fn parse_skip(path: impl Into<PathBuf>, message: impl fmt::Display) -> Self {
		Self {
			kind: DiagnosticKind::ParseSkip,
			path: path.into(),
			message: message.to_string(),
		}
	}

	pub fn persist_failed(path: impl Into<PathBuf>, message: impl fmt::Display) -> Self {
		Self {
			kind: DiagnosticKind::PersistFailed,
			path: path.into(),
			message: message.to_string(),
		}
	}

	pub fn cache_corrupt(path: impl Into<PathBuf>, message: impl fmt::Display) -> Self {
		Self {
			kind: DiagnosticKind::CacheCorrupt,
			path: path.into(),
			message: message.to_string(),
		}
	}
}

impl fmt::Display for Diagnostic {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let label = match self.kind {
			DiagnosticKind::ParseSkip => "skipped unparsable file",
			DiagnosticKind::CacheCorrupt => "discarded symbol cache",
			DiagnosticKind::PersistFailed => "could not write symbol cache",
		};
		write!(f, "{label} {}: {}", self.path.display(), self.message)
	}
}
