//! Package-scope `enum` declarations.
//!
//! ```text
//! enum Color { Red, Green }
//! ```
//! becomes a named integer type with one `iota` constant per variant, each
//! prefixed with the type name. Variants carrying payloads belong to the
//! declarative expansion layer and are rejected here.

use std::fmt::Write as _;

use tern_primitives::Edit;

use crate::stage::{RewriteError, RewriteStage, StageContext, StageOutput};
use crate::syntax::Source;

#[derive(Debug, Clone, Copy, Default)]
pub struct EnumDecls;

impl RewriteStage for EnumDecls {
	fn name(&self) -> &'static str {
		"enums"
	}

	fn rewrite(&self, input: &str, _cx: &StageContext<'_>) -> Result<StageOutput, RewriteError> {
		let src = Source::new(input)?;
		let mut edits = Vec::new();
		let mut depth = 0usize;
		let mut i = 0;

		while i < src.len() {
			if src.is(i, "{") {
				depth += 1;
			} else if src.is(i, "}") {
				depth = depth.saturating_sub(1);
			} else if depth == 0
				&& src.is(i, "enum")
				&& src.is_ident(i + 1)
				&& src.is(i + 2, "{")
				&& src.statement_start(i) == i
			{
				let close = src.partner(i + 2).ok_or_else(|| RewriteError::Unsupported {
					position: src.position(src.start(i + 2)),
					message: "enum body is never closed".to_owned(),
				})?;
				let name = src.text(i + 1);
				let variants = variants(&src, i + 3, close)?;
				edits.push(Edit::replace(src.start(i)..src.end(close), expand(name, &variants)));
				i = close + 1;
				continue;
			}
			i += 1;
		}

		StageOutput::from_edits(input, edits)
	}
}

fn variants<'a>(src: &Source<'a>, from: usize, close: usize) -> Result<Vec<&'a str>, RewriteError> {
	let unsupported = |k: usize, message: String| RewriteError::Unsupported {
		position: src.position(src.start(k)),
		message,
	};

	let mut names = Vec::new();
	let mut k = from;
	while k < close {
		if src.is_newline(k) || src.is(k, ",") {
			k += 1;
			continue;
		}
		if !src.is_ident(k) {
			return Err(unsupported(k, format!("unexpected `{}` in enum body", src.text(k))));
		}
		let variant = src.text(k);
		if src.is(k + 1, "(") || src.is(k + 1, "{") {
			return Err(unsupported(
				k,
				format!("enum variant `{variant}` carries a payload; only plain variants are expanded"),
			));
		}
		if !(k + 1 == close || src.is_newline(k + 1) || src.is(k + 1, ",")) {
			return Err(unsupported(
				k + 1,
				format!("unexpected `{}` after enum variant `{variant}`", src.text(k + 1)),
			));
		}
		names.push(variant);
		k += 1;
	}
	Ok(names)
}

fn expand(name: &str, variants: &[&str]) -> String {
	let mut out = format!("type {name} int");
	let Some((first, rest)) = variants.split_first() else {
		return out;
	};
	let _ = write!(out, "\n\nconst (\n\t{name}{first} {name} = iota\n");
	for variant in rest {
		let _ = writeln!(out, "\t{name}{variant}");
	}
	out.push(')');
	out
}
