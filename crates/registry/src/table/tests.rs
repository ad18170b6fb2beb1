use pretty_assertions::assert_eq;

use super::*;

#[test]
fn unambiguous_lookup_names_its_module() {
	let def = ModuleRegistry::builtin().lookup("Atoi").unwrap();
	assert_eq!(&*def.module, "strconv");
	assert!(!def.ambiguous);
	assert!(def.conflicts.is_empty());
	assert_eq!(def.qualified_name(), "strconv.Atoi");
}

#[test]
fn nested_import_paths_qualify_with_last_segment() {
	let def = ModuleRegistry::builtin().lookup("Glob").unwrap();
	assert_eq!(&*def.module, "path/filepath");
	assert_eq!(def.qualifier(), "filepath");
}

#[test]
fn shared_names_are_ambiguous_with_all_owners() {
	let def = ModuleRegistry::builtin().lookup("Join").unwrap();
	assert!(def.ambiguous);
	let conflicts: Vec<&str> = def.conflicts.iter().map(|m| &**m).collect();
	assert_eq!(conflicts, vec!["bytes", "errors", "path", "path/filepath", "strings"]);
}

#[test]
fn unknown_and_lowercase_names_are_absent() {
	let reg = ModuleRegistry::builtin();
	assert!(reg.lookup("ReadFileEverywhere").is_none());
	assert!(reg.lookup("len").is_none());
}

#[test]
fn builder_derives_ambiguity_and_dedups() {
	let reg = ModuleRegistry::builder()
		.module("os", &["Open", "ReadFile"])
		.module("archive/zip", &["Open"])
		.module("os", &["ReadFile"])
		.build();
	assert_eq!(reg.len(), 2);
	assert_eq!(reg.module_count(), 2);
	assert!(!reg.lookup("ReadFile").unwrap().ambiguous);

	let open = reg.lookup("Open").unwrap();
	assert!(open.ambiguous);
	assert_eq!(open.conflicts.len(), 2);
	assert_eq!(reg.ambiguous().count(), 1);
}

#[test]
fn builtin_registry_is_built_once() {
	let a = ModuleRegistry::builtin() as *const ModuleRegistry;
	let b = ModuleRegistry::builtin() as *const ModuleRegistry;
	assert_eq!(a, b);
	assert_eq!(ModuleRegistry::builtin().module_count(), BUILTIN_MODULES.len());
}
