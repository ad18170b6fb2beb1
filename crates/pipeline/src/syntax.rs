//! Token view shared by the rewrite stages.
//!
//! Comments are dropped and newlines kept, so stages never touch text inside
//! comments or string literals and can still see statement boundaries.

use tern_primitives::{LexError, LineIndex, Position, Token, TokenKind, tokenize};

pub(crate) struct Source<'a> {
	pub text: &'a str,
	pub tokens: Vec<Token>,
	index: LineIndex,
	/// Index of the matching delimiter for every bracket token.
	partner: Vec<Option<usize>>,
}

impl<'a> Source<'a> {
	pub fn new(text: &'a str) -> Result<Self, LexError> {
		let tokens: Vec<Token> = tokenize(text)?
			.into_iter()
			.filter(|t| !matches!(t.kind, TokenKind::LineComment | TokenKind::BlockComment))
			.collect();

		let mut partner = vec![None; tokens.len()];
		let mut open: Vec<usize> = Vec::new();
		for (i, tok) in tokens.iter().enumerate() {
			if tok.kind != TokenKind::Punct {
				continue;
			}
			match tok.text(text) {
				"(" | "[" | "{" => open.push(i),
				")" | "]" | "}" => {
					if let Some(o) = open.pop() {
						partner[o] = Some(i);
						partner[i] = Some(o);
					}
				}
				_ => {}
			}
		}

		Ok(Self {
			text,
			index: LineIndex::new(text),
			tokens,
			partner,
		})
	}

	pub fn len(&self) -> usize {
		self.tokens.len()
	}

	/// Source text of token `i`, empty when out of range.
	pub fn text(&self, i: usize) -> &'a str {
		self.tokens.get(i).map_or("", |t| t.text(self.text))
	}

	/// True when token `i` is punctuation or an identifier spelled `s`.
	pub fn is(&self, i: usize, s: &str) -> bool {
		self.tokens
			.get(i)
			.is_some_and(|t| matches!(t.kind, TokenKind::Punct | TokenKind::Ident) && t.text(self.text) == s)
	}

	pub fn is_ident(&self, i: usize) -> bool {
		self.tokens.get(i).is_some_and(|t| t.kind == TokenKind::Ident)
	}

	pub fn is_newline(&self, i: usize) -> bool {
		self.tokens.get(i).is_some_and(|t| t.kind == TokenKind::Newline)
	}

	/// True at end of input or at a token that ends a statement.
	pub fn ends_statement(&self, i: usize) -> bool {
		i >= self.len() || self.is_newline(i) || self.is(i, ";") || self.is(i, "}")
	}

	pub fn partner(&self, i: usize) -> Option<usize> {
		self.partner.get(i).copied().flatten()
	}

	pub fn position(&self, offset: usize) -> Position {
		self.index.position(offset)
	}

	pub fn start(&self, i: usize) -> usize {
		self.tokens.get(i).map_or(self.text.len(), |t| t.start)
	}

	pub fn end(&self, i: usize) -> usize {
		self.tokens.get(i).map_or(self.text.len(), |t| t.end)
	}

	/// Leading whitespace of the line containing byte `offset`.
	pub fn indent_at(&self, offset: usize) -> &'a str {
		let line_start = self.text[..offset].rfind('\n').map_or(0, |n| n + 1);
		let line = &self.text[line_start..];
		let width = line.len() - line.trim_start_matches([' ', '\t']).len();
		&line[..width]
	}

	/// First token of the statement containing token `i`, skipping backwards
	/// over balanced groups.
	pub fn statement_start(&self, i: usize) -> usize {
		let mut j = i;
		while let Some(p) = j.checked_sub(1) {
			if self.is_newline(p) || self.is(p, ";") || self.is(p, "{") {
				break;
			}
			if matches!(self.text(p), ")" | "]" | "}")
				&& let Some(open) = self.partner(p)
			{
				j = open;
				continue;
			}
			j = p;
		}
		j
	}

	/// Splits tokens `from..to` at commas outside nested groups.
	pub fn split_commas(&self, from: usize, to: usize) -> Vec<(usize, usize)> {
		let mut parts = Vec::new();
		let mut start = from;
		let mut i = from;
		while i < to {
			if let Some(close) = self.partner(i).filter(|&c| c > i) {
				i = close + 1;
				continue;
			}
			if self.is(i, ",") {
				parts.push((start, i));
				start = i + 1;
			}
			i += 1;
		}
		parts.push((start, to));
		parts.retain(|&(a, b)| (a..b).any(|k| !self.is_newline(k)));
		parts
	}

	/// Source text spanning tokens `from..to`, trimmed.
	pub fn slice(&self, from: usize, to: usize) -> &'a str {
		if from >= to {
			return "";
		}
		self.text[self.start(from)..self.end(to - 1)].trim()
	}
}

/// Token indices of one function signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
	/// Opening `(` of the receiver list, for methods.
	pub receiver: Option<usize>,
	/// Opening `(` of the parameter list.
	pub params: usize,
	/// Token range of the results, without surrounding parentheses.
	pub results: (usize, usize),
	/// True when the results were parenthesized.
	pub grouped: bool,
	/// Opening `{` of the body; `None` for function types.
	pub body: Option<usize>,
}

impl Source<'_> {
	/// Parses the signature introduced by the `func` token at `i`: a function
	/// or method declaration, a function literal or a function type.
	pub fn signature(&self, i: usize) -> Option<Signature> {
		let after = |open: usize| self.partner(open).filter(|&c| c > open).map(|c| c + 1);
		let mut j = i + 1;
		let mut receiver = None;

		if self.is(j, "(") {
			let next = after(j)?;
			if self.is_ident(next) && (self.is(next + 1, "(") || self.is(next + 1, "[")) {
				receiver = Some(j);
				j = next + 1;
			}
		} else if self.is_ident(j) {
			j += 1;
		} else {
			return None;
		}

		if self.is(j, "[") {
			j = after(j)?;
		}
		if !self.is(j, "(") {
			return None;
		}
		let params = j;
		let mut k = after(params)?;

		let (results, grouped) = if self.is(k, "(") {
			let close = self.partner(k).filter(|&c| c > k)?;
			let range = (k + 1, close);
			k = close + 1;
			(range, true)
		} else {
			let from = k;
			while k < self.len() && !self.ends_statement(k) && !matches!(self.text(k), "," | ")" | "]" | "=") {
				if self.is(k, "{") && !matches!(self.text(k.wrapping_sub(1)), "struct" | "interface") {
					break;
				}
				match self.partner(k).filter(|&c| c > k) {
					Some(close) => k = close + 1,
					None => k += 1,
				}
			}
			((from, k), false)
		};

		let body = self.is(k, "{").then_some(k);
		Some(Signature {
			receiver,
			params,
			results,
			grouped,
			body,
		})
	}
}
