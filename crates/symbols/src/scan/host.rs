//! Declarations of host-language files, read with the host grammar.

use tree_sitter::{Node, Parser};

use super::{DeclParser, ScanError};
use crate::decl::{DeclKind, FileDecls};

/// Tree-sitter backed parser for host (`.go`) files.
///
/// A parser is created per call; tree-sitter parsers are not `Sync`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostParser;

impl DeclParser for HostParser {
	fn parse(&self, source: &str) -> Result<FileDecls, ScanError> {
		let mut parser = Parser::new();
		parser
			.set_language(&tree_sitter_go::LANGUAGE.into())
			.map_err(|e| ScanError::Grammar(e.to_string()))?;
		let tree = parser
			.parse(source, None)
			.ok_or_else(|| ScanError::Grammar("parser produced no tree".into()))?;

		let root = tree.root_node();
		if root.has_error() {
			let offset = first_error(root).map_or(0, |n| n.start_byte());
			return Err(ScanError::Syntax { offset });
		}

		let mut decls = FileDecls::default();
		for node in named_children(root) {
			match node.kind() {
				"function_declaration" => record_names(&mut decls, DeclKind::Function, node, source),
				"type_declaration" => specs(&mut decls, DeclKind::Type, &["type_spec", "type_alias"], node, source),
				"var_declaration" => specs(&mut decls, DeclKind::Variable, &["var_spec"], node, source),
				"const_declaration" => specs(&mut decls, DeclKind::Constant, &["const_spec"], node, source),
				_ => {}
			}
		}
		Ok(decls)
	}
}

fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
	let mut cursor = node.walk();
	node.named_children(&mut cursor).collect()
}

/// Records the specs of a possibly grouped declaration, looking through any
/// list node the grammar wraps them in.
fn specs(decls: &mut FileDecls, kind: DeclKind, spec_kinds: &[&str], node: Node<'_>, source: &str) {
	for child in named_children(node) {
		if spec_kinds.contains(&child.kind()) {
			record_names(decls, kind, child, source);
		} else {
			specs(decls, kind, spec_kinds, child, source);
		}
	}
}

fn record_names(decls: &mut FileDecls, kind: DeclKind, node: Node<'_>, source: &str) {
	let mut cursor = node.walk();
	for name in node.children_by_field_name("name", &mut cursor) {
		decls.insert(kind, &source[name.byte_range()]);
	}
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
	if node.is_error() || node.is_missing() {
		return Some(node);
	}
	if !node.has_error() {
		return None;
	}
	let mut cursor = node.walk();
	let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
	children.into_iter().find_map(first_error)
}
