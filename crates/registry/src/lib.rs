//! Module registry: which external module defines a bare function name.
//!
//! The registry is built once from a curated table of host standard-library
//! functions and is immutable afterwards. A name exported by more than one
//! module is recorded as ambiguous together with every module that defines it;
//! the registry never picks one of them.
//!
//! # Adding a module
//!
//! Append `(import path, &[functions])` to [`BUILTIN_MODULES`].
//! Ambiguity is derived, never declared by hand.

mod builtins;
mod table;

pub use builtins::BUILTIN_MODULES;
pub use table::{FuncDef, ModuleRegistry, RegistryBuilder};
