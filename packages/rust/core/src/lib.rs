//! The outreach pipeline driver: worklist loading and the per-item
//! finite-state machine.

pub mod pipeline;
pub mod worklist;

pub use pipeline::{
    CancelToken, Pipeline, PipelineConfig, ProgressReporter, SilentProgress, Stage,
};
pub use worklist::{WorkEntry, load_worklist};
