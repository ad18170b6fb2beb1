//! `name: Type` annotations in function signatures become `name Type`.

use tern_primitives::Edit;

use crate::stage::{RewriteError, RewriteStage, StageContext, StageOutput};
use crate::syntax::Source;

#[derive(Debug, Clone, Copy, Default)]
pub struct TypeAnnotations;

impl RewriteStage for TypeAnnotations {
	fn name(&self) -> &'static str {
		"annotations"
	}

	fn rewrite(&self, input: &str, _cx: &StageContext<'_>) -> Result<StageOutput, RewriteError> {
		let src = Source::new(input)?;
		let mut edits = Vec::new();

		for i in 0..src.len() {
			if !(src.is(i, "func") && src.is_ident(i)) {
				continue;
			}
			let Some(sig) = src.signature(i) else {
				continue;
			};
			let results = sig.grouped.then(|| sig.results.0 - 1);
			for open in sig.receiver.into_iter().chain([sig.params]).chain(results) {
				annotate_group(&src, open, &mut edits);
			}
		}

		StageOutput::from_edits(input, edits)
	}
}

fn annotate_group(src: &Source<'_>, open: usize, edits: &mut Vec<Edit>) {
	let Some(close) = src.partner(open) else {
		return;
	};
	for (from, to) in src.split_commas(open + 1, close) {
		let mut k = from;
		while k < to && src.is_newline(k) {
			k += 1;
		}
		if src.is_ident(k) && src.is(k + 1, ":") {
			let spaced = src.text[src.end(k + 1)..].starts_with([' ', '\t']);
			edits.push(Edit::replace(
				src.start(k + 1)..src.end(k + 1),
				if spaced { "" } else { " " },
			));
		}
	}
}
