//! The `?` error-propagation operator.
//!
//! A statement ending in `call()?` is expanded into the call plus an
//! `if err != nil { return ... }` guard. The zero values returned alongside
//! the error come from the enclosing function's result list, whose last
//! result must be `error`.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use tern_primitives::Edit;

use crate::stage::{RewriteError, RewriteStage, StageContext, StageOutput};
use crate::syntax::Source;

/// Prefix of the temporaries introduced for assignment and return forms.
const TEMP_PREFIX: &str = "__tern";

#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorPropagation;

impl RewriteStage for ErrorPropagation {
	fn name(&self) -> &'static str {
		"propagate"
	}

	fn rewrite(&self, input: &str, _cx: &StageContext<'_>) -> Result<StageOutput, RewriteError> {
		let src = Source::new(input)?;
		let bodies = function_bodies(&src);
		let mut edits = Vec::new();
		let mut temps = 0usize;
		let mut open_braces: Vec<usize> = Vec::new();

		for i in 0..src.len() {
			if src.is(i, "{") {
				open_braces.push(i);
			} else if src.is(i, "}") {
				open_braces.pop();
			} else if src.is(i, "?") {
				let results = open_braces.iter().rev().find_map(|b| bodies.get(b));
				edits.push(expand(&src, i, results, &mut temps)?);
			}
		}

		StageOutput::from_edits(input, edits)
	}
}

/// Result types of every function body, keyed by the body's opening brace.
fn function_bodies(src: &Source<'_>) -> BTreeMap<usize, Vec<String>> {
	let mut bodies = BTreeMap::new();
	for i in 0..src.len() {
		if !(src.is(i, "func") && src.is_ident(i)) {
			continue;
		}
		if let Some(sig) = src.signature(i)
			&& let Some(body) = sig.body
		{
			let (from, to) = sig.results;
			bodies.insert(body, result_types(src, from, to, sig.grouped));
		}
	}
	bodies
}

fn result_types(src: &Source<'_>, from: usize, to: usize, grouped: bool) -> Vec<String> {
	if !grouped {
		let ty = src.slice(from, to);
		return if ty.is_empty() { Vec::new() } else { vec![ty.to_owned()] };
	}

	let parts: Vec<(usize, usize)> = src
		.split_commas(from, to)
		.into_iter()
		.map(|(mut a, b)| {
			while a < b && src.is_newline(a) {
				a += 1;
			}
			(a, b)
		})
		.collect();
	let named = |(a, b): (usize, usize)| {
		b - a >= 2
			&& src.is_ident(a)
			&& !src.is(a + 1, ".")
			&& !matches!(src.text(a), "map" | "chan" | "func" | "struct" | "interface")
	};

	if !parts.iter().copied().any(named) {
		return parts.iter().map(|&(a, b)| src.slice(a, b).to_owned()).collect();
	}

	// `(a, b int, err error)`: bare names take the type of the next named part.
	let mut types = vec![String::new(); parts.len()];
	let mut pending = String::new();
	for (n, &(a, b)) in parts.iter().enumerate().rev() {
		if named((a, b)) {
			pending = src.slice(a + 1, b).to_owned();
		}
		types[n] = pending.clone();
	}
	types
}

fn zero_value(ty: &str) -> String {
	match ty {
		"error" | "any" => "nil".into(),
		"bool" => "false".into(),
		"string" => "\"\"".into(),
		"int" | "int8" | "int16" | "int32" | "int64" | "uint" | "uint8" | "uint16" | "uint32" | "uint64"
		| "uintptr" | "byte" | "rune" | "float32" | "float64" | "complex64" | "complex128" => "0".into(),
		_ if ["*", "[]", "map[", "chan", "<-chan", "func", "interface"]
			.iter()
			.any(|p| ty.starts_with(p)) =>
		{
			"nil".into()
		}
		_ => format!("*new({ty})"),
	}
}

enum Form<'a> {
	Define(&'a str),
	Assign { lhs: &'a str, count: usize },
	Return,
	Bare,
}

fn expand(
	src: &Source<'_>,
	q: usize,
	results: Option<&Vec<String>>,
	temps: &mut usize,
) -> Result<Edit, RewriteError> {
	let position = src.position(src.start(q));
	let fail = |message: &str| RewriteError::Propagation {
		position,
		message: message.to_owned(),
	};

	if q == 0 || !src.is(q - 1, ")") {
		return Err(fail("`?` must follow a call"));
	}
	if !src.ends_statement(q + 1) {
		return Err(fail("`?` must end a statement"));
	}
	let results = results.ok_or_else(|| fail("`?` used outside a function body"))?;
	let Some((last, values)) = results.split_last() else {
		return Err(fail("`?` requires the enclosing function to return `error`"));
	};
	if last != "error" {
		return Err(fail("`?` requires the enclosing function to return `error` last"));
	}

	let stmt = src.statement_start(q);
	if header_keyword(src, stmt, q).is_some() {
		return Err(fail("`?` is not supported in a statement header"));
	}
	let (form, call_from) = if src.is(stmt, "return") {
		(Form::Return, stmt + 1)
	} else {
		match top_level_operator(src, stmt, q) {
			Some(op) if src.is(op, ":=") => (Form::Define(src.slice(stmt, op)), op + 1),
			Some(op) => {
				let count = src.split_commas(stmt, op).len();
				(
					Form::Assign {
						lhs: src.slice(stmt, op),
						count,
					},
					op + 1,
				)
			}
			None => (Form::Bare, stmt),
		}
	};
	let call = src.slice(call_from, q);
	if call.is_empty() {
		return Err(fail("`?` must follow a call"));
	}

	let indent = src.indent_at(src.start(stmt));
	let zeros: Vec<String> = values.iter().map(|t| zero_value(t)).collect();
	let ret = zeros
		.iter()
		.map(String::as_str)
		.chain(["err"])
		.collect::<Vec<_>>()
		.join(", ");
	let guard = |out: &mut String| {
		let _ = write!(out, "if err != nil {{\n{indent}\treturn {ret}\n{indent}}}");
	};
	let mut fresh = |n: usize| {
		(0..n)
			.map(|_| {
				*temps += 1;
				format!("{TEMP_PREFIX}{temps}")
			})
			.collect::<Vec<_>>()
			.join(", ")
	};

	let mut out = String::new();
	match form {
		Form::Define(lhs) => {
			let _ = write!(out, "{lhs}, err := {call}\n{indent}");
			guard(&mut out);
		}
		Form::Assign { lhs, count } => {
			let tmp = fresh(count);
			let _ = write!(out, "{tmp}, err := {call}\n{indent}");
			guard(&mut out);
			let _ = write!(out, "\n{indent}{lhs} = {tmp}");
		}
		Form::Return if values.is_empty() => {
			let _ = write!(
				out,
				"if err := {call}; err != nil {{\n{indent}\treturn err\n{indent}}}\n{indent}return nil"
			);
		}
		Form::Return => {
			let tmp = fresh(values.len());
			let _ = write!(out, "{tmp}, err := {call}\n{indent}");
			guard(&mut out);
			let _ = write!(out, "\n{indent}return {tmp}, nil");
		}
		Form::Bare => {
			let _ = write!(out, "if err := {call}; err != nil {{\n{indent}\treturn {ret}\n{indent}}}");
		}
	}

	Ok(Edit::replace(src.start(stmt)..src.end(q), out))
}

/// A control-flow keyword between `from` and `to` outside nested groups,
/// which puts the call in an `if`/`for`/`switch` header or a `go`/`defer`.
fn header_keyword(src: &Source<'_>, from: usize, to: usize) -> Option<usize> {
	let mut i = from;
	while i < to {
		if let Some(close) = src.partner(i).filter(|&c| c > i) {
			i = close + 1;
			continue;
		}
		if src.is_ident(i)
			&& matches!(
				src.text(i),
				"if" | "else" | "for" | "switch" | "select" | "case" | "go" | "defer"
			) {
			return Some(i);
		}
		i += 1;
	}
	None
}

/// First `:=` or `=` between `from` and `to` outside nested groups.
fn top_level_operator(src: &Source<'_>, from: usize, to: usize) -> Option<usize> {
	let mut i = from;
	while i < to {
		if let Some(close) = src.partner(i).filter(|&c| c > i) {
			i = close + 1;
			continue;
		}
		if src.is(i, ":=") || src.is(i, "=") {
			return Some(i);
		}
		i += 1;
	}
	None
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;
	use crate::stages::tests::run;

	#[test]
	fn define_form_returns_zero_values() {
		let out = run(
			&ErrorPropagation,
			"func load(p string) (Config, int, error) {\n\tdata := ReadFile(p)?\n\treturn parse(data)\n}\n",
		)
		.unwrap();
		assert_eq!(
			out.text,
			"func load(p string) (Config, int, error) {\n\tdata, err := ReadFile(p)\n\tif err != nil {\n\t\treturn *new(Config), 0, err\n\t}\n\treturn parse(data)\n}\n"
		);
	}

	#[test]
	fn assign_form_goes_through_temporaries() {
		let out = run(
			&ErrorPropagation,
			"func f() (n int, err error) {\n\tn = Atoi(\"5\")?\n\treturn\n}\n",
		)
		.unwrap();
		assert_eq!(
			out.text,
			"func f() (n int, err error) {\n\t__tern1, err := Atoi(\"5\")\n\tif err != nil {\n\t\treturn 0, err\n\t}\n\tn = __tern1\n\treturn\n}\n"
		);
	}

	#[test]
	fn return_and_bare_forms() {
		let out = run(
			&ErrorPropagation,
			"func g() error {\n\tclose()?\n\treturn flush()?\n}\n",
		)
		.unwrap();
		assert_eq!(
			out.text,
			"func g() error {\n\tif err := close(); err != nil {\n\t\treturn err\n\t}\n\tif err := flush(); err != nil {\n\t\treturn err\n\t}\n\treturn nil\n}\n"
		);

		let out = run(
			&ErrorPropagation,
			"func h() ([]byte, error) {\n\treturn read()?\n}\n",
		)
		.unwrap();
		assert_eq!(
			out.text,
			"func h() ([]byte, error) {\n\t__tern1, err := read()\n\tif err != nil {\n\t\treturn nil, err\n\t}\n\treturn __tern1, nil\n}\n"
		);
	}

	#[test]
	fn closures_use_their_own_results() {
		let out = run(
			&ErrorPropagation,
			"func outer() int {\n\tf := func() (bool, error) {\n\t\tok := check()?\n\t\treturn ok, nil\n\t}\n\t_ = f\n\treturn 0\n}\n",
		)
		.unwrap();
		assert!(out.text.contains("\t\tok, err := check()\n\t\tif err != nil {\n\t\t\treturn false, err\n\t\t}\n"));
	}

	#[test]
	fn misuse_is_reported() {
		let err = run(&ErrorPropagation, "func f() int {\n\tx := g()?\n\treturn x\n}\n").unwrap_err();
		assert!(matches!(err, RewriteError::Propagation { position, .. } if position.line == 2 && position.column == 10));

		let err = run(&ErrorPropagation, "var x = g()?\n").unwrap_err();
		assert!(matches!(err, RewriteError::Propagation { .. }));

		let err = run(&ErrorPropagation, "func f() error {\n\tx := g()? + 1\n}\n").unwrap_err();
		assert!(matches!(err, RewriteError::Propagation { .. }));
	}

	#[test]
	fn statement_headers_are_rejected() {
		for body in [
			"\tif x := g()?; x > 0 {\n\t\treturn nil\n\t}\n",
			"\tswitch v := g()?; v {\n\t}\n",
			"\tif ok {\n\t} else if x := g()?; x > 0 {\n\t}\n",
			"\tdefer close()?\n",
		] {
			let src = format!("func f() error {{\n{body}\treturn nil\n}}\n");
			match run(&ErrorPropagation, &src) {
				Err(RewriteError::Propagation { message, .. }) => {
					assert_eq!(message, "`?` is not supported in a statement header", "{body}")
				}
				other => panic!("{body}: expected a propagation error, got {other:?}"),
			}
		}

		// A closure body inside the call is not a header.
		let out = run(
			&ErrorPropagation,
			"func f() error {\n\tx := run(func() {\n\t\tif ok {\n\t\t}\n\t})?\n\t_ = x\n\treturn nil\n}\n",
		)
		.unwrap();
		assert!(out.text.contains("\tx, err := run(func() {"));
	}
}
