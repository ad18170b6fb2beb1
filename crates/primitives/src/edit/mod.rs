//! Byte-range replacements over a single input text.
//!
//! An [`EditSet`] is the unit of work a rewrite produces: a sorted list of
//! non-overlapping [`Edit`]s against its input. Rendering it yields the output
//! text, a [`SourceMap`] from output back to input and one [`EditDelta`] per
//! edit describing how far positions after the edit moved.

use std::ops::Range;

use thiserror::Error;

use crate::position::{LineIndex, Position};
use crate::source_map::{Mapping, MappingKind, SourceMap};

#[cfg(test)]
mod tests;

/// Replace the input bytes `[start, end)` with `replacement`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
	pub start: usize,
	pub end: usize,
	pub replacement: String,
}

impl Edit {
	pub fn replace(range: Range<usize>, replacement: impl Into<String>) -> Self {
		Self {
			start: range.start,
			end: range.end,
			replacement: replacement.into(),
		}
	}

	pub fn insert(at: usize, text: impl Into<String>) -> Self {
		Self::replace(at..at, text)
	}

	pub fn delete(range: Range<usize>) -> Self {
		Self::replace(range, String::new())
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
	#[error("edit {start}..{end} exceeds input length {len}")]
	OutOfBounds { start: usize, end: usize, len: usize },
	#[error("edit {start}..{end} is not on a character boundary")]
	NotCharBoundary { start: usize, end: usize },
	#[error("edit at {start} overlaps previous edit ending at {previous_end}")]
	Overlapping { start: usize, previous_end: usize },
}

/// Net movement caused by one edit, in input coordinates.
///
/// Positions at or after `end` move by `lines`; positions on `end`'s line
/// additionally move by `columns`. Insertions are positive, deletions negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditDelta {
	/// Start of the replaced span in the input.
	pub start: Position,
	/// End of the replaced span in the input.
	pub end: Position,
	pub lines: i64,
	pub columns: i64,
}

impl EditDelta {
	/// Moves a position at or after `end` into output coordinates.
	pub fn shift(&self, pos: Position) -> Position {
		if pos.line == self.end.line {
			Position::new(offset(pos.line, self.lines), offset(pos.column, self.columns))
		} else {
			Position::new(offset(pos.line, self.lines), pos.column)
		}
	}
}

fn offset(base: u32, delta: i64) -> u32 {
	(i64::from(base) + delta).max(1) as u32
}

/// Maps an input position to output coordinates through one stage's deltas.
///
/// `deltas` must be sorted by `start`, as produced by [`EditSet::render`].
/// Positions inside a replaced span land on the start of its replacement.
pub fn forward_position(deltas: &[EditDelta], pos: Position) -> Position {
	let idx = deltas.partition_point(|d| d.start <= pos);
	let Some(delta) = idx.checked_sub(1).map(|i| &deltas[i]) else {
		return pos;
	};
	if pos < delta.end {
		return forward_position(&deltas[..idx - 1], delta.start);
	}
	delta.shift(pos)
}

/// Output of [`EditSet::render`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
	pub text: String,
	/// Maps output positions back to input positions.
	pub map: SourceMap,
	pub deltas: Vec<EditDelta>,
}

/// A validated, ordered set of edits against one input text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditSet {
	edits: Vec<Edit>,
	len: usize,
}

impl EditSet {
	/// Sorts and validates `edits` against `text`.
	///
	/// Several insertions at the same offset are kept in the order given.
	pub fn new(text: &str, mut edits: Vec<Edit>) -> Result<Self, EditError> {
		edits.sort_by_key(|e| (e.start, e.end));

		let mut previous_end = 0;
		for edit in &edits {
			if edit.start > edit.end || edit.end > text.len() {
				return Err(EditError::OutOfBounds {
					start: edit.start,
					end: edit.end,
					len: text.len(),
				});
			}
			if !text.is_char_boundary(edit.start) || !text.is_char_boundary(edit.end) {
				return Err(EditError::NotCharBoundary {
					start: edit.start,
					end: edit.end,
				});
			}
			if edit.start < previous_end {
				return Err(EditError::Overlapping {
					start: edit.start,
					previous_end,
				});
			}
			previous_end = edit.end;
		}

		Ok(Self {
			edits,
			len: text.len(),
		})
	}

	pub fn edits(&self) -> &[Edit] {
		&self.edits
	}

	pub fn is_empty(&self) -> bool {
		self.edits.is_empty()
	}

	/// Applies the edits, producing only the output text.
	pub fn apply(&self, text: &str) -> String {
		debug_assert_eq!(text.len(), self.len);
		let mut out = String::with_capacity(self.len_after());
		let mut cursor = 0;
		for edit in &self.edits {
			out.push_str(&text[cursor..edit.start]);
			out.push_str(&edit.replacement);
			cursor = edit.end;
		}
		out.push_str(&text[cursor..]);
		out
	}

	/// Length of the output text in bytes.
	pub fn len_after(&self) -> usize {
		self.edits
			.iter()
			.fold(self.len, |len, e| len - (e.end - e.start) + e.replacement.len())
	}

	/// Applies the edits and records how output positions relate to `text`.
	pub fn render(&self, text: &str) -> Rendered {
		debug_assert_eq!(text.len(), self.len);
		let index = LineIndex::new(text);
		let mut writer = Writer {
			text,
			index: &index,
			out: String::with_capacity(self.len_after()),
			pos: Position::START,
			map: SourceMap::new(),
		};
		let mut deltas = Vec::with_capacity(self.edits.len());
		let mut cursor = 0;

		for edit in &self.edits {
			writer.copy(cursor, edit.start);
			let start = index.position(edit.start);
			writer.synthesize(&edit.replacement, start);
			let end = index.position(edit.end);
			deltas.push(EditDelta {
				start,
				end,
				lines: i64::from(writer.pos.line) - i64::from(end.line),
				columns: i64::from(writer.pos.column) - i64::from(end.column),
			});
			cursor = edit.end;
		}
		writer.copy(cursor, text.len());

		Rendered {
			text: writer.out,
			map: writer.map,
			deltas,
		}
	}
}

struct Writer<'a> {
	text: &'a str,
	index: &'a LineIndex,
	out: String,
	pos: Position,
	map: SourceMap,
}

impl Writer<'_> {
	/// Copies `text[from..to]`, mapping its start and every line start.
	fn copy(&mut self, from: usize, to: usize) {
		let mut original = self.index.position(from);
		self.map
			.record(Mapping::new(self.pos, original, MappingKind::Copy));
		let segment = &self.text[from..to];
		for ch in segment.chars() {
			self.pos = self.pos.advance(ch);
			original = original.advance(ch);
			if ch == '\n' {
				self.map
					.record(Mapping::new(self.pos, original, MappingKind::Copy));
			}
		}
		self.out.push_str(segment);
	}

	/// Writes inserted text, pinning each of its lines to `original`.
	fn synthesize(&mut self, replacement: &str, original: Position) {
		if replacement.is_empty() {
			return;
		}
		self.map
			.record(Mapping::new(self.pos, original, MappingKind::Synthetic));
		let mut chars = replacement.chars().peekable();
		while let Some(ch) = chars.next() {
			self.pos = self.pos.advance(ch);
			if ch == '\n' && chars.peek().is_some() {
				self.map
					.record(Mapping::new(self.pos, original, MappingKind::Synthetic));
			}
		}
		self.out.push_str(replacement);
	}
}
