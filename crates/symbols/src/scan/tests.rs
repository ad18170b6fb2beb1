use pretty_assertions::assert_eq;

use super::*;

fn scan(src: &str) -> FileDecls {
	DeclScanner.parse(src).unwrap()
}

fn sorted(set: &std::collections::BTreeSet<String>) -> Vec<&str> {
	set.iter().map(String::as_str).collect()
}

#[test]
fn functions_skip_methods_and_nested_literals() {
	let decls = scan(
		"package p

func ReadFile(path string) []byte {
	inner := func() {}
	var local = 1
	return nil
}

func (s *Server) Serve() error { return nil }

func Map[T any](xs []T) []T { return xs }
",
	);
	assert_eq!(sorted(&decls.functions), vec!["Map", "ReadFile"]);
	assert!(decls.variables.is_empty());
}

#[test]
fn single_and_grouped_specs() {
	let decls = scan(
		"package p

type Config struct {
	Name string
}

type (
	ID int
	Handler func(ctx Context) error
)

const Max = 10

const (
	A = iota
	B
	c, d = 1, 2
)

var x, y int
var (
	Default = Config{Name: \"x\"}
	_ = 3
)
let total = 0
",
	);
	assert_eq!(sorted(&decls.types), vec!["Config", "Handler", "ID"]);
	assert_eq!(sorted(&decls.constants), vec!["A", "B", "Max", "c", "d"]);
	assert_eq!(sorted(&decls.variables), vec!["Default", "total", "x", "y"]);
}

#[test]
fn enums_declare_type_and_prefixed_variants() {
	let decls = scan(
		"package p

enum Color {
	Red,
	Green,
	Blue,
}

enum Shape { Circle(float64), Square(float64) }
",
	);
	assert_eq!(sorted(&decls.types), vec!["Color", "Shape"]);
	assert_eq!(
		sorted(&decls.constants),
		vec!["ColorBlue", "ColorGreen", "ColorRed", "ShapeCircle", "ShapeSquare"]
	);
}

#[test]
fn declarations_in_strings_and_comments_are_ignored() {
	let decls = scan(
		"package p
// func Hidden() {}
var s = `
func AlsoHidden() {}
`
/* type Nope int */
",
	);
	assert_eq!(sorted(&decls.variables), vec!["s"]);
	assert!(decls.functions.is_empty());
	assert!(decls.types.is_empty());
}

#[test]
fn unbalanced_and_unclosed_delimiters_fail() {
	assert_eq!(
		DeclScanner.parse("func f() {\n}\n}"),
		Err(ScanError::Unbalanced { delim: '}', offset: 13 })
	);
	assert_eq!(
		DeclScanner.parse("func f() {\n"),
		Err(ScanError::Unclosed { delim: '{', offset: 9 })
	);
	assert!(matches!(DeclScanner.parse("var s = \"open\n"), Err(ScanError::Lex(_))));
}

#[test]
fn continuation_lines_are_not_declarations() {
	let decls = scan(
		"package p

var (
	home = Getenv(\"HOME\") + \"/\" +
		Getenv(\"APP\")
	names = []string{\"a\",
		\"b\"}
	path = filepath.
		Join(home)
)

const Mask = 1 |
	Shift
",
	);
	assert_eq!(sorted(&decls.variables), vec!["home", "names", "path"]);
	assert_eq!(sorted(&decls.constants), vec!["Mask"]);
}
