//! Package-scope declaration extraction.
//!
//! [`DeclParser`] is the seam where a parser plugs in. [`DeclScanner`] is a
//! token-level scan of the extended syntax (`let`, `enum`) that only looks at
//! depth zero, which is all package-scope extraction needs. [`HostParser`]
//! reads host-language files with the host grammar.

use tern_primitives::{LexError, Token, TokenKind, tokenize};
use thiserror::Error;

use crate::decl::{DeclKind, FileDecls};

mod host;
#[cfg(test)]
mod tests;

pub use host::HostParser;

/// Extracts package-scope declarations from one file's source.
///
/// Implementations must be read-only and must fail per file rather than
/// panic; the cache turns failures into parse-skip diagnostics.
pub trait DeclParser: Send + Sync {
	fn parse(&self, source: &str) -> Result<FileDecls, ScanError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
	#[error(transparent)]
	Lex(#[from] LexError),
	#[error("unexpected `{delim}` at byte {offset}")]
	Unbalanced { delim: char, offset: usize },
	#[error("`{delim}` opened at byte {offset} is never closed")]
	Unclosed { delim: char, offset: usize },
	#[error("syntax error at byte {offset}")]
	Syntax { offset: usize },
	#[error("host grammar unavailable: {0}")]
	Grammar(String),
}

/// Token-level declaration scanner.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclScanner;

impl DeclParser for DeclScanner {
	fn parse(&self, source: &str) -> Result<FileDecls, ScanError> {
		let tokens: Vec<Token> = tokenize(source)?
			.into_iter()
			.filter(|t| !t.is_trivia())
			.collect();
		Scan {
			src: source,
			tokens: &tokens,
			stack: Vec::new(),
			block: None,
			decls: FileDecls::default(),
		}
		.run()
	}
}

/// A grouped declaration or enum body whose items are collected at `depth`.
#[derive(Debug, Clone)]
enum Block {
	Group { kind: DeclKind, depth: usize },
	Enum { name: String, depth: usize },
}

impl Block {
	fn depth(&self) -> usize {
		match self {
			Block::Group { depth, .. } | Block::Enum { depth, .. } => *depth,
		}
	}
}

struct Scan<'a> {
	src: &'a str,
	tokens: &'a [Token],
	stack: Vec<(char, usize)>,
	block: Option<Block>,
	decls: FileDecls,
}

impl Scan<'_> {
	fn run(mut self) -> Result<FileDecls, ScanError> {
		let mut i = 0;
		while i < self.tokens.len() {
			let tok = self.tokens[i];
			if tok.kind == TokenKind::Ident && self.item_start(i) {
				if self.stack.is_empty() {
					self.top_level(i);
				} else if let Some(block) = self.block.clone()
					&& self.stack.len() == block.depth()
				{
					self.block_item(&block, i);
				}
			}
			self.track(tok)?;
			i += 1;
		}
		match self.stack.last() {
			Some(&(delim, offset)) => Err(ScanError::Unclosed { delim, offset }),
			None => Ok(self.decls),
		}
	}

	fn text(&self, i: usize) -> Option<&str> {
		self.tokens.get(i).map(|t| t.text(self.src))
	}

	fn ident(&self, i: usize) -> Option<&str> {
		self.tokens
			.get(i)
			.filter(|t| t.kind == TokenKind::Ident)
			.map(|t| t.text(self.src))
	}

	/// True when token `i` starts a declaration or block item.
	fn item_start(&self, i: usize) -> bool {
		let Some(prev) = i.checked_sub(1).map(|p| self.tokens[p]) else {
			return true;
		};
		if prev.kind == TokenKind::Newline {
			return self.ends_line(i - 1);
		}
		let prev = prev.text(self.src);
		match &self.block {
			Some(Block::Enum { .. }) => matches!(prev, "{" | "," | ";"),
			Some(Block::Group { .. }) => matches!(prev, "(" | ";"),
			None => prev == ";",
		}
	}

	/// Whether the newline at token `nl` terminates the line before it.
	///
	/// Follows the host's semicolon rule: a line ending in an operator, `,`,
	/// `=` or `.` continues on the next line. Inside an enum body `,` is the
	/// item separator instead.
	fn ends_line(&self, nl: usize) -> bool {
		let Some(last) = self.tokens[..nl].iter().rev().find(|t| t.kind != TokenKind::Newline) else {
			return true;
		};
		if last.kind != TokenKind::Punct {
			return true;
		}
		match last.text(self.src) {
			"++" | "--" | ")" | "]" | "}" | ";" | "(" | "{" => true,
			"," => matches!(self.block, Some(Block::Enum { .. })),
			_ => false,
		}
	}

	fn top_level(&mut self, i: usize) {
		let Some(keyword) = self.text(i) else {
			return;
		};
		match keyword {
			"func" => {
				// `func (recv T) Name` declares a method, not a package name.
				if let Some(name) = self.ident(i + 1).map(str::to_owned) {
					self.decls.insert(DeclKind::Function, &name);
				}
			}
			"type" => self.spec_or_group(i, DeclKind::Type),
			"const" => self.spec_or_group(i, DeclKind::Constant),
			"var" | "let" => self.spec_or_group(i, DeclKind::Variable),
			"enum" => {
				if let Some(name) = self.ident(i + 1).map(str::to_owned)
					&& self.text(i + 2) == Some("{")
				{
					self.decls.insert(DeclKind::Type, &name);
					self.block = Some(Block::Enum { name, depth: 1 });
				}
			}
			_ => {}
		}
	}

	fn spec_or_group(&mut self, i: usize, kind: DeclKind) {
		if self.text(i + 1) == Some("(") {
			self.block = Some(Block::Group { kind, depth: 1 });
		} else {
			self.spec(i + 1, kind);
		}
	}

	/// Records the name list starting at token `i`: `a` or `a, b, c`.
	fn spec(&mut self, mut i: usize, kind: DeclKind) {
		let single = kind == DeclKind::Type;
		while let Some(name) = self.ident(i).map(str::to_owned) {
			self.decls.insert(kind, &name);
			if single || self.text(i + 1) != Some(",") {
				break;
			}
			i += 2;
		}
	}

	fn block_item(&mut self, block: &Block, i: usize) {
		match block {
			Block::Group { kind, .. } => self.spec(i, *kind),
			Block::Enum { name, .. } => {
				if let Some(variant) = self.ident(i) {
					let constant = format!("{name}{variant}");
					self.decls.insert(DeclKind::Constant, &constant);
				}
			}
		}
	}

	fn track(&mut self, tok: Token) -> Result<(), ScanError> {
		if tok.kind != TokenKind::Punct {
			return Ok(());
		}
		let text = tok.text(self.src);
		match text {
			"(" | "[" | "{" => {
				let open = text.chars().next().unwrap_or('(');
				self.stack.push((open, tok.start));
			}
			")" | "]" | "}" => {
				let close = text.chars().next().unwrap_or(')');
				let expected = match close {
					')' => '(',
					']' => '[',
					_ => '{',
				};
				match self.stack.pop() {
					Some((open, _)) if open == expected => {}
					_ => {
						return Err(ScanError::Unbalanced {
							delim: close,
							offset: tok.start,
						});
					}
				}
				if self.block.as_ref().is_some_and(|b| self.stack.len() < b.depth()) {
					self.block = None;
				}
			}
			_ => {}
		}
		Ok(())
	}
}
