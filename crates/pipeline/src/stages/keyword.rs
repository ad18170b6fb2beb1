//! `let` bindings.
//!
//! * `let a = e` becomes `a := e` in a function body and `var a = e` at
//!   package scope.
//! * `let a: T = e` and `let a: T` become `var a T = e` and `var a T`.

use tern_primitives::Edit;

use crate::stage::{RewriteError, RewriteStage, StageContext, StageOutput};
use crate::syntax::Source;

#[derive(Debug, Clone, Copy, Default)]
pub struct LetKeyword;

impl RewriteStage for LetKeyword {
	fn name(&self) -> &'static str {
		"let"
	}

	fn rewrite(&self, input: &str, _cx: &StageContext<'_>) -> Result<StageOutput, RewriteError> {
		let src = Source::new(input)?;
		let mut edits = Vec::new();
		let mut depth = 0usize;

		for i in 0..src.len() {
			if src.is(i, "{") {
				depth += 1;
			} else if src.is(i, "}") {
				depth = depth.saturating_sub(1);
			} else if src.is(i, "let") && src.is_ident(i) && src.statement_start(i) == i {
				binding(&src, i, depth == 0, &mut edits)?;
			}
		}

		StageOutput::from_edits(input, edits)
	}
}

fn binding(src: &Source<'_>, i: usize, package_scope: bool, edits: &mut Vec<Edit>) -> Result<(), RewriteError> {
	let unsupported = |message: &str| RewriteError::Unsupported {
		position: src.position(src.start(i)),
		message: message.to_owned(),
	};

	let mut j = i + 1;
	loop {
		if !src.is_ident(j) {
			return Err(unsupported("expected a name after `let`"));
		}
		j += 1;
		if !src.is(j, ",") {
			break;
		}
		j += 1;
	}

	let keyword = src.start(i)..src.end(i);
	match src.text(j) {
		":" => {
			edits.push(Edit::replace(keyword, "var"));
			let spaced = src.text[src.end(j)..].starts_with([' ', '\t']);
			let colon = src.end(j - 1)..src.end(j);
			edits.push(Edit::replace(colon, if spaced { "" } else { " " }));
		}
		"=" if package_scope => edits.push(Edit::replace(keyword, "var")),
		"=" => {
			edits.push(Edit::delete(src.start(i)..src.start(i + 1)));
			edits.push(Edit::replace(src.start(j)..src.end(j), ":="));
		}
		_ => return Err(unsupported("`let` needs a type or an initializer")),
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;
	use crate::stages::tests::run;

	#[test]
	fn local_let_becomes_short_declaration() {
		let out = run(&LetKeyword, "func f() {\n\tlet a, b = 1, 2\n\tlet c: int = 3\n}\n").unwrap();
		assert_eq!(out.text, "func f() {\n\ta, b := 1, 2\n\tvar c int = 3\n}\n");
	}

	#[test]
	fn package_let_becomes_var() {
		let out = run(&LetKeyword, "let limit = 10\nlet name:string\n").unwrap();
		assert_eq!(out.text, "var limit = 10\nvar name string\n");
	}

	#[test]
	fn let_in_strings_and_expressions_is_left_alone() {
		let src = "x := \"let a = 1\"\ny := let\n";
		assert_eq!(run(&LetKeyword, src).unwrap().text, src);
	}

	#[test]
	fn bare_let_is_rejected() {
		let err = run(&LetKeyword, "func f() {\n\tlet a\n}\n").unwrap_err();
		assert!(matches!(err, RewriteError::Unsupported { .. }));
	}
}
