use tern_primitives::{Edit, EditDelta, EditError, EditSet, LexError, Position, SourceMap};
use tern_registry::ModuleRegistry;
use tern_symbols::ExclusionSet;
use thiserror::Error;

/// Read-only inputs shared by every stage of one pipeline run.
#[derive(Debug, Clone, Copy)]
pub struct StageContext<'a> {
	/// Package-scope names of the unit; never qualified.
	pub exclusions: &'a ExclusionSet,
	pub registry: &'a ModuleRegistry,
}

/// What one stage produced from its input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageOutput {
	pub text: String,
	/// Maps `text` back to the stage's input, not to the original source.
	pub map: SourceMap,
	pub deltas: Vec<EditDelta>,
	/// Import paths this stage made necessary.
	pub imports: Vec<String>,
}

impl StageOutput {
	/// Renders `edits` against `input`.
	pub fn from_edits(input: &str, edits: Vec<Edit>) -> Result<Self, RewriteError> {
		let rendered = EditSet::new(input, edits)?.render(input);
		Ok(Self {
			text: rendered.text,
			map: rendered.map,
			deltas: rendered.deltas,
			imports: Vec::new(),
		})
	}

	pub fn with_imports(mut self, imports: Vec<String>) -> Self {
		self.imports = imports;
		self
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewriteError {
	#[error(transparent)]
	Lex(#[from] LexError),
	#[error(transparent)]
	Edit(#[from] EditError),
	#[error("{position}: `{name}` is defined in several modules ({}); qualify it explicitly", modules.join(", "))]
	Ambiguous {
		name: String,
		modules: Vec<String>,
		position: Position,
	},
	#[error("{position}: {message}")]
	Propagation { position: Position, message: String },
	#[error("{position}: {message}")]
	Unsupported { position: Position, message: String },
}

/// One textual transformation.
///
/// Stages are pure: text in, text and local map out. The local map and deltas
/// must describe the stage's own input; composing them with earlier stages is
/// the pipeline's job.
pub trait RewriteStage: Send + Sync {
	fn name(&self) -> &'static str;

	fn rewrite(&self, input: &str, cx: &StageContext<'_>) -> Result<StageOutput, RewriteError>;
}
