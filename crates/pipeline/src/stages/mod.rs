//! Built-in rewrite stages, in the order the standard pipeline runs them.

mod annotate;
mod enums;
mod keyword;
mod propagate;
mod qualify;

pub use annotate::TypeAnnotations;
pub use enums::EnumDecls;
pub use keyword::LetKeyword;
pub use propagate::ErrorPropagation;
pub use qualify::Qualifier;
