//! Pipeline IR, fusion and execution
//!
//! This module provides the machinery behind the chain API:
//!
//! 1. **Signal**: the per-element outcome every stage reports
//! 2. **IR**: a tree of `Stage` nodes joined by `Combine`
//! 3. **Planner**: rewrites adjacent stages into fused stages
//! 4. **Kernel**: a stage tree compiled into one closure with fresh state
//! 5. **Executor**: drives a kernel over the input in a single pass
//!
//! ## Architecture
//!
//! ```text
//! chain().filter(p).map(f).filter(q).flat_map(g)
//!     ↓
//! Combine(Combine(Combine(Filter, Map), Filter), FlatMap)
//!     ↓  (optimized on every append)
//! FlatMap(x ⇒ p(x) && q(f(x)) ? g(f(x)) : [])
//!     ↓
//! Kernel: one closure call per input element
//! ```
//!
//! ## Limitations
//!
//! - Only the pairs listed in `planner` fuse
//! - Fusion depends on tree shape; it never reassociates `Combine` nodes
//! - Single-threaded execution; stage trees are `!Send`

pub mod executor;
pub mod ir;
pub mod kernel;
pub mod planner;
pub mod signal;

pub use executor::{execute, ExecutionResult, ExecutionStats, Executor};
pub use ir::{Composite, Same, Stage, StageKind};
pub use kernel::Kernel;
pub use planner::optimize;
pub use signal::Signal;
