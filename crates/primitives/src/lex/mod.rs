//! Tokenizer for the extended surface syntax.
//!
//! The lexer is deliberately shallow: it only needs to tell identifiers,
//! punctuation and line breaks apart from strings and comments, so that
//! rewrites and declaration scans never touch literal text.

use memchr::memchr;
use thiserror::Error;


/// Operators longer than one byte, longest first.
const MULTI_PUNCT: &[&str] = &[
	"<<=", ">>=", "&^=", "...", ":=", "<-", "&&", "||", "==", "!=", "<=", ">=", "++", "--", "+=",
	"-=", "*=", "/=", "%=", "&=", "|=", "^=", "<<", ">>", "&^",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
	Ident,
	Number,
	/// Interpreted string literal (`"..."`).
	String,
	/// Raw string literal (`` `...` ``), may span lines.
	RawString,
	/// Rune literal (`'x'`).
	Char,
	LineComment,
	BlockComment,
	Punct,
	Newline,
}

/// A token with its byte span in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
	pub kind: TokenKind,
	pub start: usize,
	pub end: usize,
}

impl Token {
	#[inline]
	pub fn text<'a>(&self, src: &'a str) -> &'a str {
		&src[self.start..self.end]
	}

	/// Comments carry no syntax.
	#[inline]
	pub fn is_trivia(&self) -> bool {
		matches!(self.kind, TokenKind::LineComment | TokenKind::BlockComment)
	}

	#[inline]
	pub fn is_punct(&self, src: &str, punct: &str) -> bool {
		self.kind == TokenKind::Punct && self.text(src) == punct
	}

	#[inline]
	pub fn is_ident(&self, src: &str, ident: &str) -> bool {
		self.kind == TokenKind::Ident && self.text(src) == ident
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LexError {
	#[error("unterminated string literal at byte {0}")]
	UnterminatedString(usize),
	#[error("unterminated raw string literal at byte {0}")]
	UnterminatedRawString(usize),
	#[error("unterminated rune literal at byte {0}")]
	UnterminatedChar(usize),
	#[error("unterminated block comment at byte {0}")]
	UnterminatedComment(usize),
}

impl LexError {
	/// Byte offset where the offending literal or comment starts.
	pub fn offset(&self) -> usize {
		match *self {
			Self::UnterminatedString(at)
			| Self::UnterminatedRawString(at)
			| Self::UnterminatedChar(at)
			| Self::UnterminatedComment(at) => at,
		}
	}
}

/// Splits `src` into tokens. Spaces, tabs and carriage returns are dropped;
/// newlines are kept as [`TokenKind::Newline`] tokens.
pub fn tokenize(src: &str) -> Result<Vec<Token>, LexError> {
	let bytes = src.as_bytes();
	let mut tokens = Vec::new();
	let mut i = 0;

	while i < bytes.len() {
		let start = i;
		let b = bytes[i];
		let kind = match b {
			b' ' | b'\t' | b'\r' => {
				i += 1;
				continue;
			}
			b'\n' => {
				i += 1;
				TokenKind::Newline
			}
			b'/' if bytes.get(i + 1) == Some(&b'/') => {
				i = memchr(b'\n', &bytes[i..]).map_or(bytes.len(), |p| i + p);
				TokenKind::LineComment
			}
			b'/' if bytes.get(i + 1) == Some(&b'*') => {
				let close = src[i + 2..]
					.find("*/")
					.ok_or(LexError::UnterminatedComment(start))?;
				i += 2 + close + 2;
				TokenKind::BlockComment
			}
			b'"' => {
				i = scan_quoted(bytes, i, b'"').ok_or(LexError::UnterminatedString(start))?;
				TokenKind::String
			}
			b'\'' => {
				i = scan_quoted(bytes, i, b'\'').ok_or(LexError::UnterminatedChar(start))?;
				TokenKind::Char
			}
			b'`' => {
				let close = src[i + 1..]
					.find('`')
					.ok_or(LexError::UnterminatedRawString(start))?;
				i += 1 + close + 1;
				TokenKind::RawString
			}
			b'0'..=b'9' => {
				i = scan_while(src, i, |c| c.is_ascii_alphanumeric() || c == '.' || c == '_');
				TokenKind::Number
			}
			_ => {
				let ch = src[i..].chars().next().unwrap_or('\0');
				if ch == '_' || ch.is_alphabetic() {
					i = scan_while(src, i, |c| c == '_' || c.is_alphanumeric());
					TokenKind::Ident
				} else if let Some(op) = MULTI_PUNCT.iter().find(|op| src[i..].starts_with(**op)) {
					i += op.len();
					TokenKind::Punct
				} else {
					i += ch.len_utf8().max(1);
					TokenKind::Punct
				}
			}
		};
		tokens.push(Token { kind, start, end: i });
	}

	Ok(tokens)
}

/// Returns the offset just past the closing quote, or `None` if the literal
/// runs into a newline or the end of input.
fn scan_quoted(bytes: &[u8], open: usize, quote: u8) -> Option<usize> {
	let mut i = open + 1;
	while i < bytes.len() {
		match bytes[i] {
			b'\\' => i += 2,
			b'\n' => return None,
			b if b == quote => return Some(i + 1),
			_ => i += 1,
		}
	}
	None
}

fn scan_while(src: &str, from: usize, pred: impl Fn(char) -> bool) -> usize {
	src[from..]
		.char_indices()
		.find(|&(_, c)| !pred(c))
		.map_or(src.len(), |(off, _)| from + off)
}
