//! Pipeline executor
//!
//! Runs a (possibly fused) stage tree over an input sequence in one pass.

use super::ir::Stage;
use super::kernel::Kernel;

/// Execution statistics for performance measurement
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExecutionStats {
    /// Number of executions (only the executor counts these)
    pub runs: usize,

    /// Number of input elements handed to the root stage
    pub elements_evaluated: usize,

    /// Number of elements appended to the output
    pub elements_emitted: usize,

    /// Number of root signals that expanded into many elements
    pub expansions: usize,

    /// Number of passes stopped early by an abort
    pub aborts: usize,
}

impl ExecutionStats {
    fn absorb(&mut self, other: &ExecutionStats) {
        self.runs += other.runs;
        self.elements_evaluated += other.elements_evaluated;
        self.elements_emitted += other.elements_emitted;
        self.expansions += other.expansions;
        self.aborts += other.aborts;
    }
}

/// Pipeline executor
///
/// Keeps running totals over every execution it performs.
#[derive(Debug, Default)]
pub struct Executor {
    stats: ExecutionStats,
}

impl Executor {
    /// Create a new executor
    pub fn new() -> Self {
        Executor {
            stats: ExecutionStats::default(),
        }
    }

    /// Execute a stage tree on an input sequence
    ///
    /// The tree is compiled fresh, so every call starts with reset counters
    /// and accumulators. Panics raised by user callables propagate out of this
    /// call; whatever was already produced is discarded with the output.
    pub fn execute<I: 'static, O: 'static>(
        &mut self,
        input: impl IntoIterator<Item = I>,
        stage: &Stage<I, O>,
    ) -> ExecutionResult<O> {
        let input = input.into_iter();
        let mut values = Vec::with_capacity(input.size_hint().0);
        let mut kernel = Kernel::compile(stage);

        let mut stats = kernel.drain_into(input, &mut values);
        stats.runs = 1;

        log::debug!(
            "executed {}: {} in, {} out, {} expansions{}",
            stage.debug_print(),
            stats.elements_evaluated,
            stats.elements_emitted,
            stats.expansions,
            if stats.aborts > 0 { ", aborted" } else { "" }
        );

        self.stats.absorb(&stats);
        ExecutionResult { values, stats }
    }

    /// Get execution statistics
    pub fn stats(&self) -> &ExecutionStats {
        &self.stats
    }
}

/// Run `stage` over `input` and collect the output.
pub fn execute<I: 'static, O: 'static>(
    input: impl IntoIterator<Item = I>,
    stage: &Stage<I, O>,
) -> Vec<O> {
    Executor::new().execute(input, stage).values
}

/// Result of pipeline execution
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionResult<O> {
    pub values: Vec<O>,
    pub stats: ExecutionStats,
}
