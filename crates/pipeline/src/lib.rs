//! Source rewriting for one file.
//!
//! A [`Pipeline`] folds an ordered list of [`RewriteStage`]s over a file's
//! text. Each stage reports a map relative to its own input; the pipeline
//! composes those maps into one map from the final text back to the original
//! and keeps every stage's edit deltas so original positions can be moved
//! forward as well.

mod pipeline;
mod stage;
pub mod stages;
mod syntax;

pub use pipeline::{Pipeline, PipelineError, PipelineResult, StageDeltas};
pub use stage::{RewriteError, RewriteStage, StageContext, StageOutput};
