//! flowseq: fused element-wise pipelines
//!
//! Lazily built chains of map / filter / flat_map / take / drop /
//! stateful_map over a finite sequence. Adjacent stages are fused as the chain
//! grows, and a run is a single pass over the input.

pub mod chain;
pub mod error;
pub mod pipeline;

pub use chain::{chain, Fusion, Pipeline};
pub use error::{FlowError, Result};
pub use pipeline::{
    execute, optimize, ExecutionResult, ExecutionStats, Executor, Signal, Stage, StageKind,
};
