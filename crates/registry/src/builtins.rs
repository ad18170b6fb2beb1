/// Curated host standard-library functions, keyed by import path.
///
/// Only exported functions that are commonly called unqualified belong here.
/// Names listed under several modules become ambiguous lookups.
pub const BUILTIN_MODULES: &[(&str, &[&str])] = &[
	(
		"bytes",
		&[
			"Compare", "Contains", "Count", "Equal", "EqualFold", "Fields", "HasPrefix", "HasSuffix",
			"Index", "Join", "Repeat", "Replace", "ReplaceAll", "Split", "Title", "ToLower",
			"ToUpper", "TrimSpace",
		],
	),
	("errors", &["As", "Is", "Join", "New", "Unwrap"]),
	(
		"fmt",
		&[
			"Errorf", "Fprint", "Fprintf", "Fprintln", "Print", "Printf", "Println", "Sprint",
			"Sprintf", "Sprintln", "Sscanf",
		],
	),
	("io", &["Copy", "CopyN", "ReadAll", "ReadFull", "WriteString"]),
	(
		"os",
		&[
			"Chdir", "Chmod", "Create", "Executable", "Exit", "Getenv", "Getwd", "Hostname",
			"LookupEnv", "Mkdir", "MkdirAll", "MkdirTemp", "Open", "OpenFile", "ReadDir", "ReadFile",
			"Remove", "RemoveAll", "Rename", "Setenv", "Stat", "TempDir", "Unsetenv", "WriteFile",
		],
	),
	("path", &["Base", "Clean", "Dir", "Ext", "IsAbs", "Join", "Match", "Split"]),
	(
		"path/filepath",
		&[
			"Abs", "Base", "Clean", "Dir", "Ext", "Glob", "IsAbs", "Join", "Match", "Rel", "Split",
			"Walk", "WalkDir",
		],
	),
	("sort", &["Ints", "Search", "SearchInts", "Slice", "SliceStable", "Sort", "Strings"]),
	(
		"strconv",
		&[
			"AppendInt", "Atoi", "FormatBool", "FormatFloat", "FormatInt", "FormatUint", "Itoa",
			"ParseBool", "ParseFloat", "ParseInt", "ParseUint", "Quote", "Unquote",
		],
	),
	(
		"strings",
		&[
			"Compare", "Contains", "ContainsAny", "ContainsRune", "Count", "Cut", "EqualFold",
			"Fields", "HasPrefix", "HasSuffix", "Index", "IndexByte", "Join", "LastIndex",
			"NewReader", "NewReplacer", "Repeat", "Replace", "ReplaceAll", "Split", "SplitN",
			"Title", "ToLower", "ToUpper", "Trim", "TrimLeft", "TrimPrefix", "TrimRight",
			"TrimSpace", "TrimSuffix",
		],
	),
	("time", &["After", "Date", "NewTicker", "NewTimer", "Now", "Parse", "ParseDuration", "Since", "Sleep", "Tick", "Unix", "Until"]),
	("unicode/utf8", &["DecodeRuneInString", "RuneCountInString", "RuneLen", "ValidString"]),
];
