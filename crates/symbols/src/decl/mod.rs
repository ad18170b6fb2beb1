//! Package-scope declarations and the exclusion set built from them.

use std::collections::BTreeSet;

use rustc_hash::FxHashSet as HashSet;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeclKind {
	Function,
	Type,
	Constant,
	Variable,
}

/// Names one file declares at package scope.
///
/// Sets are ordered so that two extractions of the same declarations compare
/// equal regardless of declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDecls {
	#[serde(default)]
	pub functions: BTreeSet<String>,
	#[serde(default)]
	pub types: BTreeSet<String>,
	#[serde(default)]
	pub constants: BTreeSet<String>,
	#[serde(default)]
	pub variables: BTreeSet<String>,
}

impl FileDecls {
	/// Records a declaration. The blank identifier declares nothing.
	pub fn insert(&mut self, kind: DeclKind, name: &str) {
		if name == "_" {
			return;
		}
		let set = match kind {
			DeclKind::Function => &mut self.functions,
			DeclKind::Type => &mut self.types,
			DeclKind::Constant => &mut self.constants,
			DeclKind::Variable => &mut self.variables,
		};
		set.insert(name.to_owned());
	}

	pub fn names(&self) -> impl Iterator<Item = (DeclKind, &str)> {
		self.functions
			.iter()
			.map(|n| (DeclKind::Function, n.as_str()))
			.chain(self.types.iter().map(|n| (DeclKind::Type, n.as_str())))
			.chain(self.constants.iter().map(|n| (DeclKind::Constant, n.as_str())))
			.chain(self.variables.iter().map(|n| (DeclKind::Variable, n.as_str())))
	}

	pub fn len(&self) -> usize {
		self.functions.len() + self.types.len() + self.constants.len() + self.variables.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

/// The four category lists of an [`ExclusionSet`] in persisted, sorted form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionLists {
	#[serde(default)]
	pub functions: Vec<String>,
	#[serde(default)]
	pub types: Vec<String>,
	#[serde(default)]
	pub constants: Vec<String>,
	#[serde(default)]
	pub variables: Vec<String>,
}

/// Every name declared at package scope across a compilation unit.
///
/// Immutable once built; the symbol cache replaces it wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
	functions: HashSet<Box<str>>,
	types: HashSet<Box<str>>,
	constants: HashSet<Box<str>>,
	variables: HashSet<Box<str>>,
}

impl ExclusionSet {
	pub fn from_files<'a>(files: impl IntoIterator<Item = &'a FileDecls>) -> Self {
		let mut set = Self::default();
		for decls in files {
			for (kind, name) in decls.names() {
				set.category_mut(kind).insert(name.into());
			}
		}
		set
	}

	pub fn from_lists(lists: &ExclusionLists) -> Self {
		let collect = |names: &[String]| names.iter().map(|n| Box::from(n.as_str())).collect();
		Self {
			functions: collect(&lists.functions),
			types: collect(&lists.types),
			constants: collect(&lists.constants),
			variables: collect(&lists.variables),
		}
	}

	pub fn to_lists(&self) -> ExclusionLists {
		let sorted = |set: &HashSet<Box<str>>| {
			let mut names: Vec<String> = set.iter().map(|n| n.to_string()).collect();
			names.sort();
			names
		};
		ExclusionLists {
			functions: sorted(&self.functions),
			types: sorted(&self.types),
			constants: sorted(&self.constants),
			variables: sorted(&self.variables),
		}
	}

	fn category_mut(&mut self, kind: DeclKind) -> &mut HashSet<Box<str>> {
		match kind {
			DeclKind::Function => &mut self.functions,
			DeclKind::Type => &mut self.types,
			DeclKind::Constant => &mut self.constants,
			DeclKind::Variable => &mut self.variables,
		}
	}

	fn category(&self, kind: DeclKind) -> &HashSet<Box<str>> {
		match kind {
			DeclKind::Function => &self.functions,
			DeclKind::Type => &self.types,
			DeclKind::Constant => &self.constants,
			DeclKind::Variable => &self.variables,
		}
	}

	/// True if `name` is declared at package scope in any category.
	#[inline]
	pub fn contains(&self, name: &str) -> bool {
		self.kind_of(name).is_some()
	}

	pub fn kind_of(&self, name: &str) -> Option<DeclKind> {
		[
			DeclKind::Function,
			DeclKind::Type,
			DeclKind::Constant,
			DeclKind::Variable,
		]
		.into_iter()
		.find(|&kind| self.category(kind).contains(name))
	}

	pub fn names(&self, kind: DeclKind) -> impl Iterator<Item = &str> {
		self.category(kind).iter().map(|n| &**n)
	}

	pub fn len(&self) -> usize {
		self.functions.len() + self.types.len() + self.constants.len() + self.variables.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn decls(kind: DeclKind, names: &[&str]) -> FileDecls {
		let mut d = FileDecls::default();
		for n in names {
			d.insert(kind, n);
		}
		d
	}

	#[test]
	fn union_across_files() {
		let a = decls(DeclKind::Function, &["ReadFile", "helper"]);
		let b = decls(DeclKind::Type, &["Config"]);
		let set = ExclusionSet::from_files([&a, &b]);
		assert!(set.contains("ReadFile"));
		assert_eq!(set.kind_of("Config"), Some(DeclKind::Type));
		assert!(!set.contains("Atoi"));
		assert_eq!(set.len(), 3);
	}

	#[test]
	fn blank_identifier_is_ignored() {
		let d = decls(DeclKind::Variable, &["_", "x"]);
		assert_eq!(d.len(), 1);
	}

	#[test]
	fn lists_round_trip_sorted() {
		let d = decls(DeclKind::Constant, &["Z", "A", "M"]);
		let set = ExclusionSet::from_files([&d]);
		let lists = set.to_lists();
		assert_eq!(lists.constants, vec!["A", "M", "Z"]);
		assert_eq!(ExclusionSet::from_lists(&lists), set);
	}
}
