//! Core text primitives for the tern front end: positions, lexing, edit sets
//! and composable source maps.

/// Byte-range replacements over a single input text.
pub mod edit;
/// Tokenizer for the extended surface syntax.
pub mod lex;
/// Line/column coordinates and offset conversion.
pub mod position;
/// Generated-to-original position mappings.
pub mod source_map;

pub use edit::{Edit, EditDelta, EditError, EditSet, Rendered, forward_position};
pub use lex::{LexError, Token, TokenKind, tokenize};
pub use position::{LineIndex, Position};
pub use source_map::{Mapping, MappingKind, SourceMap, SourceMapError};
