use tern_primitives::{EditDelta, LineIndex, Position, SourceMap, SourceMapError, forward_position};
use thiserror::Error;
use tracing::{debug, trace};

use crate::stage::{RewriteError, RewriteStage, StageContext};
use crate::stages::{EnumDecls, ErrorPropagation, LetKeyword, Qualifier, TypeAnnotations};


#[derive(Debug, Error)]
pub enum PipelineError {
	#[error("stage `{stage}` failed: {source}")]
	Stage {
		stage: &'static str,
		#[source]
		source: RewriteError,
	},
	/// The stage's map was not monotonic, pointed outside its texts, or could
	/// not be composed with the earlier stages.
	#[error("stage `{stage}` produced an invalid source map: {source}")]
	Composition {
		stage: &'static str,
		#[source]
		source: SourceMapError,
	},
}

impl PipelineError {
	/// Name of the stage that failed.
	pub fn stage(&self) -> &'static str {
		match self {
			Self::Stage { stage, .. } | Self::Composition { stage, .. } => stage,
		}
	}
}

/// The edit deltas one stage reported, in that stage's input coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageDeltas {
	pub stage: &'static str,
	pub deltas: Vec<EditDelta>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineResult {
	pub text: String,
	/// Maps positions in `text` to positions in the original source.
	pub map: SourceMap,
	/// Import paths required by qualified calls, in first-use order.
	pub imports: Vec<String>,
	pub ledger: Vec<StageDeltas>,
}

impl PipelineResult {
	/// Maps an original position to the final text by replaying every stage's
	/// cumulative delta.
	pub fn forward(&self, original: Position) -> Position {
		self.ledger
			.iter()
			.fold(original, |pos, stage| forward_position(&stage.deltas, pos))
	}

	pub fn lookup(&self, generated: Position) -> Option<Position> {
		self.map.lookup(generated)
	}
}

/// An ordered list of rewrite stages run over one file.
pub struct Pipeline {
	stages: Vec<Box<dyn RewriteStage>>,
}

impl std::fmt::Debug for Pipeline {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_list().entries(self.stage_names()).finish()
	}
}

impl Default for Pipeline {
	fn default() -> Self {
		Self::standard()
	}
}

impl Pipeline {
	/// A pipeline with no stages; running it yields the input unchanged.
	pub fn empty() -> Self {
		Self { stages: Vec::new() }
	}

	/// `let`, annotations, enums, `?` propagation, then qualification.
	pub fn standard() -> Self {
		Self::empty()
			.with_stage(LetKeyword)
			.with_stage(TypeAnnotations)
			.with_stage(EnumDecls)
			.with_stage(ErrorPropagation)
			.with_stage(Qualifier)
	}

	pub fn with_stage(mut self, stage: impl RewriteStage + 'static) -> Self {
		self.stages.push(Box::new(stage));
		self
	}

	pub fn stage_names(&self) -> Vec<&'static str> {
		self.stages.iter().map(|s| s.name()).collect()
	}

	/// Runs every stage in order, folding each stage's local map into one map
	/// from the final text back to `source`.
	///
	/// A stage whose map is invalid aborts the run; continuing would hand the
	/// next stage coordinates that no longer describe its input.
	pub fn run(&self, source: &str, cx: &StageContext<'_>) -> Result<PipelineResult, PipelineError> {
		let mut text = source.to_owned();
		let mut map = SourceMap::identity(source);
		let mut imports: Vec<String> = Vec::new();
		let mut ledger = Vec::with_capacity(self.stages.len());

		for stage in &self.stages {
			let name = stage.name();
			let out = stage.rewrite(&text, cx).map_err(|source| {
				debug!(stage = name, error = %source, "rewrite stage failed");
				PipelineError::Stage { stage: name, source }
			})?;

			let invalid = |source: SourceMapError| {
				debug!(stage = name, error = %source, "rewrite stage produced an invalid map");
				PipelineError::Composition { stage: name, source }
			};
			out.map.validate().map_err(invalid)?;
			out.map
				.check_bounds(&LineIndex::new(&out.text), &LineIndex::new(&text))
				.map_err(invalid)?;
			map = out.map.compose(&map).map_err(invalid)?;

			trace!(stage = name, edits = out.deltas.len(), "rewrite stage applied");
			for module in out.imports {
				if !imports.contains(&module) {
					imports.push(module);
				}
			}
			ledger.push(StageDeltas {
				stage: name,
				deltas: out.deltas,
			});
			text = out.text;
		}

		Ok(PipelineResult {
			text,
			map,
			imports,
			ledger,
		})
	}
}
