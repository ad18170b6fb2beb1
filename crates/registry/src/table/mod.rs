use std::sync::LazyLock;

use rustc_hash::FxHashMap as HashMap;

use crate::builtins::BUILTIN_MODULES;

#[cfg(test)]
mod tests;

static BUILTIN: LazyLock<ModuleRegistry> = LazyLock::new(|| {
	BUILTIN_MODULES
		.iter()
		.fold(ModuleRegistry::builder(), |b, (module, funcs)| b.module(module, funcs))
		.build()
});

/// A registry entry for one bare function name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncDef {
	pub name: Box<str>,
	/// Import path of the owning module. For ambiguous names this is the first
	/// conflicting module and must not be used for qualification.
	pub module: Box<str>,
	pub ambiguous: bool,
	/// Every module defining `name`, sorted, when ambiguous; empty otherwise.
	pub conflicts: Vec<Box<str>>,
}

impl FuncDef {
	/// The package name used in qualified references: the import path's last segment.
	pub fn qualifier(&self) -> &str {
		self.module.rsplit('/').next().unwrap_or(&self.module)
	}

	/// Returns the qualified call target, e.g. `strconv.Atoi`.
	pub fn qualified_name(&self) -> String {
		format!("{}.{}", self.qualifier(), self.name)
	}
}

/// Immutable name → module table with O(1) lookup.
#[derive(Debug, Clone, Default)]
pub struct ModuleRegistry {
	by_name: HashMap<Box<str>, FuncDef>,
	module_count: usize,
}

impl ModuleRegistry {
	/// The process-wide registry of curated standard-library functions.
	pub fn builtin() -> &'static ModuleRegistry {
		&BUILTIN
	}

	pub fn builder() -> RegistryBuilder {
		RegistryBuilder::default()
	}

	#[inline]
	pub fn lookup(&self, name: &str) -> Option<&FuncDef> {
		self.by_name.get(name)
	}

	pub fn len(&self) -> usize {
		self.by_name.len()
	}

	pub fn is_empty(&self) -> bool {
		self.by_name.is_empty()
	}

	pub fn module_count(&self) -> usize {
		self.module_count
	}

	/// All ambiguous entries, in no particular order.
	pub fn ambiguous(&self) -> impl Iterator<Item = &FuncDef> {
		self.by_name.values().filter(|def| def.ambiguous)
	}
}

/// Collects module tables and derives ambiguity on [`build`](Self::build).
#[derive(Debug, Default)]
pub struct RegistryBuilder {
	owners: HashMap<Box<str>, Vec<Box<str>>>,
	modules: Vec<Box<str>>,
}

impl RegistryBuilder {
	/// Registers `funcs` as exported by the module at import path `module`.
	pub fn module(mut self, module: &str, funcs: &[&str]) -> Self {
		if !self.modules.iter().any(|m| &**m == module) {
			self.modules.push(module.into());
		}
		for &name in funcs {
			let owners = self.owners.entry(name.into()).or_default();
			if !owners.iter().any(|m| &**m == module) {
				owners.push(module.into());
			}
		}
		self
	}

	pub fn build(self) -> ModuleRegistry {
		let by_name = self
			.owners
			.into_iter()
			.map(|(name, mut owners)| {
				let def = if owners.len() == 1 {
					FuncDef {
						name: name.clone(),
						module: owners.remove(0),
						ambiguous: false,
						conflicts: Vec::new(),
					}
				} else {
					owners.sort();
					FuncDef {
						name: name.clone(),
						module: owners[0].clone(),
						ambiguous: true,
						conflicts: owners,
					}
				};
				(name, def)
			})
			.collect();
		ModuleRegistry {
			by_name,
			module_count: self.modules.len(),
		}
	}
}
