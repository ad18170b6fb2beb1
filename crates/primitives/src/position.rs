use std::fmt;

/// A 1-based line/column coordinate in some text.
///
/// Columns count bytes, matching the host toolchain's diagnostics. Ordering is
/// lexicographic: line first, then column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
	/// 1-based line number.
	pub line: u32,
	/// 1-based byte column.
	pub column: u32,
}

impl Position {
	/// The first position of any text.
	pub const START: Position = Position { line: 1, column: 1 };

	pub const fn new(line: u32, column: u32) -> Self {
		Self { line, column }
	}

	/// Returns the position immediately after `ch` when it is written at `self`.
	#[inline]
	pub fn advance(self, ch: char) -> Self {
		if ch == '\n' {
			Self::new(self.line + 1, 1)
		} else {
			Self::new(self.line, self.column + ch.len_utf8() as u32)
		}
	}

	/// Returns the position after writing all of `text` at `self`.
	pub fn advance_str(self, text: &str) -> Self {
		text.chars().fold(self, Self::advance)
	}
}

impl Default for Position {
	fn default() -> Self {
		Self::START
	}
}

impl fmt::Display for Position {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}", self.line, self.column)
	}
}

/// Precomputed line starts for converting between byte offsets and positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
	line_starts: Vec<usize>,
	len: usize,
}

impl LineIndex {
	pub fn new(text: &str) -> Self {
		let mut line_starts = vec![0];
		line_starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
		Self {
			line_starts,
			len: text.len(),
		}
	}

	/// Number of lines, counting the (possibly empty) line after a trailing newline.
	pub fn line_count(&self) -> usize {
		self.line_starts.len()
	}

	/// Length in bytes of the indexed text.
	pub fn len(&self) -> usize {
		self.len
	}

	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	/// Converts a byte offset to a position. Offsets past the end clamp to the end.
	pub fn position(&self, offset: usize) -> Position {
		let offset = offset.min(self.len);
		let line = self.line_starts.partition_point(|&start| start <= offset);
		let column = offset - self.line_starts[line - 1] + 1;
		Position::new(line as u32, column as u32)
	}

	/// Converts a position to a byte offset, if it lies within the text.
	pub fn offset(&self, pos: Position) -> Option<usize> {
		let start = self.line_start(pos.line)?;
		let end = self.line_end(pos.line)?;
		let offset = start + (pos.column as usize).checked_sub(1)?;
		(offset <= end).then_some(offset)
	}

	/// Byte offset of the first character of `line`.
	pub fn line_start(&self, line: u32) -> Option<usize> {
		let idx = (line as usize).checked_sub(1)?;
		self.line_starts.get(idx).copied()
	}

	/// Byte offset of the newline ending `line`, or the text length for the last line.
	pub fn line_end(&self, line: u32) -> Option<usize> {
		let idx = (line as usize).checked_sub(1)?;
		if idx >= self.line_starts.len() {
			return None;
		}
		Some(self.line_starts.get(idx + 1).map_or(self.len, |next| next - 1))
	}
}
