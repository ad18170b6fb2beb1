//! Generated-to-original position mappings and their composition.
//!
//! A [`SourceMap`] is an ordered list of [`Mapping`]s keyed by generated
//! position. Looking up a generated position picks the nearest preceding
//! mapping; `Copy` mappings advance columns 1:1 on their line, `Synthetic`
//! mappings pin every position they cover to a single original position.
//!
//! Maps produced by one rewrite are only valid against that rewrite's input.
//! [`SourceMap::compose`] resolves every mapping through the map accumulated
//! so far, which is what keeps multi-stage rewrites pointing at the true
//! original text.

use thiserror::Error;

use crate::position::{LineIndex, Position};


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MappingKind {
	/// Text copied verbatim; columns advance in lockstep.
	Copy,
	/// Text introduced by a rewrite; maps to the edit's original position.
	Synthetic,
}

/// One entry of a [`SourceMap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Mapping {
	pub generated: Position,
	pub original: Position,
	pub kind: MappingKind,
}

impl Mapping {
	pub const fn new(generated: Position, original: Position, kind: MappingKind) -> Self {
		Self {
			generated,
			original,
			kind,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SourceMapError {
	/// A mapping would precede the last recorded generated position.
	#[error("generated position {next} regresses behind {previous}")]
	Regression { previous: Position, next: Position },
	/// A mapping points past the end of the text it was generated into.
	#[error("generated position {0} lies outside the output text")]
	GeneratedOutOfRange(Position),
	/// A mapping points past the end of the text it claims to come from.
	#[error("original position {0} lies outside the input text")]
	OriginalOutOfRange(Position),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceMap {
	mappings: Vec<Mapping>,
}

impl SourceMap {
	pub fn new() -> Self {
		Self::default()
	}

	/// The map of an untouched text: one `Copy` mapping per line start.
	pub fn identity(text: &str) -> Self {
		let index = LineIndex::new(text);
		let mappings = (1..=index.line_count() as u32)
			.map(|line| {
				let pos = Position::new(line, 1);
				Mapping::new(pos, pos, MappingKind::Copy)
			})
			.collect();
		Self { mappings }
	}

	pub fn mappings(&self) -> &[Mapping] {
		&self.mappings
	}

	pub fn len(&self) -> usize {
		self.mappings.len()
	}

	pub fn is_empty(&self) -> bool {
		self.mappings.is_empty()
	}

	/// Appends a mapping. A mapping at the same generated position as the last
	/// one replaces it; an earlier generated position is rejected.
	pub fn push(&mut self, mapping: Mapping) -> Result<(), SourceMapError> {
		match self.mappings.last_mut() {
			Some(last) if mapping.generated < last.generated => Err(SourceMapError::Regression {
				previous: last.generated,
				next: mapping.generated,
			}),
			Some(last) if mapping.generated == last.generated => {
				*last = mapping;
				Ok(())
			}
			_ => {
				self.mappings.push(mapping);
				Ok(())
			}
		}
	}

	/// Infallible append for builders that emit positions in order.
	pub(crate) fn record(&mut self, mapping: Mapping) {
		let pushed = self.push(mapping);
		debug_assert!(pushed.is_ok(), "builder emitted out-of-order mapping: {pushed:?}");
	}

	/// Checks that generated positions never regress.
	pub fn validate(&self) -> Result<(), SourceMapError> {
		for pair in self.mappings.windows(2) {
			if pair[1].generated < pair[0].generated {
				return Err(SourceMapError::Regression {
					previous: pair[0].generated,
					next: pair[1].generated,
				});
			}
		}
		Ok(())
	}

	/// Checks every mapping against the texts on both sides of the map.
	pub fn check_bounds(
		&self,
		generated: &LineIndex,
		original: &LineIndex,
	) -> Result<(), SourceMapError> {
		for m in &self.mappings {
			if generated.offset(m.generated).is_none() {
				return Err(SourceMapError::GeneratedOutOfRange(m.generated));
			}
			if original.offset(m.original).is_none() {
				return Err(SourceMapError::OriginalOutOfRange(m.original));
			}
		}
		Ok(())
	}

	/// The nearest mapping at or before `generated`.
	pub fn entry_for(&self, generated: Position) -> Option<&Mapping> {
		let idx = self.mappings.partition_point(|m| m.generated <= generated);
		idx.checked_sub(1).map(|i| &self.mappings[i])
	}

	/// Maps a generated position back to its original position.
	pub fn lookup(&self, generated: Position) -> Option<Position> {
		self.resolve(generated).map(|(pos, _)| pos)
	}

	/// Like [`lookup`](Self::lookup), also reporting whether the result is an
	/// exact character correspondence (`Copy`) or a pinned position (`Synthetic`).
	pub fn resolve(&self, generated: Position) -> Option<(Position, MappingKind)> {
		let entry = self.entry_for(generated)?;
		match entry.kind {
			MappingKind::Copy if entry.generated.line == generated.line => {
				let column = entry.original.column + (generated.column - entry.generated.column);
				Some((Position::new(entry.original.line, column), MappingKind::Copy))
			}
			_ => Some((entry.original, MappingKind::Synthetic)),
		}
	}

	/// Composes `self` (mapping stage output to stage input) with `base`
	/// (mapping stage input to the original text), yielding a map from stage
	/// output to the original text.
	///
	/// Every `Copy` span of `self` is split at each `base` mapping that falls
	/// inside it, so earlier rewrites inside copied text stay visible.
	pub fn compose(&self, base: &SourceMap) -> Result<SourceMap, SourceMapError> {
		let mut out = SourceMap::new();

		for (i, entry) in self.mappings.iter().enumerate() {
			let Some((original, base_kind)) = base.resolve(entry.original) else {
				continue;
			};
			let kind = match entry.kind {
				MappingKind::Copy => base_kind,
				MappingKind::Synthetic => MappingKind::Synthetic,
			};
			out.push(Mapping::new(entry.generated, original, kind))?;

			if entry.kind != MappingKind::Copy {
				continue;
			}

			// Width of this copied span on its generated line, if bounded.
			let width = self
				.mappings
				.get(i + 1)
				.filter(|next| next.generated.line == entry.generated.line)
				.map(|next| next.generated.column - entry.generated.column);
			let span_start = entry.original;
			let from = base.mappings.partition_point(|m| m.generated <= span_start);

			for inner in &base.mappings[from..] {
				if inner.generated.line != span_start.line {
					break;
				}
				let offset = inner.generated.column - span_start.column;
				if width.is_some_and(|w| offset >= w) {
					break;
				}
				let generated = Position::new(entry.generated.line, entry.generated.column + offset);
				out.push(Mapping::new(generated, inner.original, inner.kind))?;
			}
		}

		Ok(out)
	}
}
