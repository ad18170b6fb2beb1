//! Qualification of bare standard-library calls.
//!
//! Detection is lexical: an identifier immediately followed by `(`. Names
//! declared anywhere in the unit are left alone, unknown names are left for
//! the host compiler to report, and ambiguous names are an error.

use tern_primitives::Edit;

use crate::stage::{RewriteError, RewriteStage, StageContext, StageOutput};
use crate::syntax::Source;

#[derive(Debug, Clone, Copy, Default)]
pub struct Qualifier;

impl RewriteStage for Qualifier {
	fn name(&self) -> &'static str {
		"qualify"
	}

	fn rewrite(&self, input: &str, cx: &StageContext<'_>) -> Result<StageOutput, RewriteError> {
		let src = Source::new(input)?;
		let mut edits = Vec::new();
		let mut imports: Vec<String> = Vec::new();
		// One flag per open brace: is it an interface body?
		let mut braces: Vec<bool> = Vec::new();

		for i in 0..src.len() {
			if src.is(i, "{") {
				braces.push(i > 0 && src.is(i - 1, "interface"));
				continue;
			}
			if src.is(i, "}") {
				braces.pop();
				continue;
			}
			if braces.last() == Some(&true) || !is_bare_call(&src, i) {
				continue;
			}

			let name = src.text(i);
			if cx.exclusions.contains(name) {
				continue;
			}
			let Some(def) = cx.registry.lookup(name) else {
				continue;
			};
			if def.ambiguous {
				return Err(RewriteError::Ambiguous {
					name: name.to_owned(),
					modules: def.conflicts.iter().map(|m| m.to_string()).collect(),
					position: src.position(src.start(i)),
				});
			}

			edits.push(Edit::insert(src.start(i), format!("{}.", def.qualifier())));
			if !imports.iter().any(|m| **m == *def.module) {
				imports.push(def.module.to_string());
			}
		}

		Ok(StageOutput::from_edits(input, edits)?.with_imports(imports))
	}
}

/// `Name(` that is neither a selector, a declaration nor a method name.
fn is_bare_call(src: &Source<'_>, i: usize) -> bool {
	if !src.is_ident(i) || !src.is(i + 1, "(") {
		return false;
	}
	if !src.text(i).starts_with(|c: char| c.is_uppercase()) {
		return false;
	}
	let Some(prev) = i.checked_sub(1) else {
		return true;
	};
	if src.is(prev, ".") || src.is(prev, "func") {
		return false;
	}
	// `func (r T) Name(`
	let method = src.is(prev, ")")
		&& src
			.partner(prev)
			.and_then(|open| open.checked_sub(1))
			.is_some_and(|before| src.is(before, "func"));
	!method
}
