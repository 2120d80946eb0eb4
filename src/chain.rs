//! Chain API
//!
//! `Pipeline` is an immutable handle over a stage tree. Every chain call
//! returns a new handle; the receiver is never modified, so a partially built
//! chain can be branched freely.
//!
//! ```
//! use flowseq::chain;
//!
//! let op = chain::<i32>()
//!     .filter(|x| *x > 2)
//!     .map(|x| x + 1)
//!     .flat_map(|x| vec![x, x]);
//!
//! assert_eq!(op.run([1, 2, 3, 4]), vec![4, 4, 5, 5]);
//! assert_eq!(op.debug_print(), "FlatMap");
//! ```
//!
//! Handles hold `Rc` closures and are not `Send`. Each `run` compiles fresh
//! runtime state, so running the same handle twice gives the same output.

use std::cell::RefCell;
use std::convert::Infallible;
use std::fmt;
use std::rc::Rc;

use crate::error::FlowError;
use crate::pipeline::{ExecutionResult, Executor, Stage};

/// Whether chain calls rewrite the tree as it grows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Fusion {
    /// Optimize after every append (the normal mode).
    #[default]
    Enabled,

    /// Keep one `Combine` per chain call; useful as an unfused baseline.
    Disabled,
}

/// Start an empty chain over elements of type `T`.
pub fn chain<T: 'static>() -> Pipeline<T, T> {
    Pipeline::from_stage(Stage::identity())
}

/// Immutable pipeline handle from `I` elements to `O` elements.
pub struct Pipeline<I, O> {
    stage: Stage<I, O>,
    fusion: Fusion,
}

impl<I, O> Clone for Pipeline<I, O> {
    fn clone(&self) -> Self {
        Pipeline {
            stage: self.stage.clone(),
            fusion: self.fusion,
        }
    }
}

impl<T: 'static> Default for Pipeline<T, T> {
    fn default() -> Self {
        chain()
    }
}

impl<I: 'static, O: 'static> fmt::Debug for Pipeline<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("stage", &self.stage)
            .field("fusion", &self.fusion)
            .finish()
    }
}

impl<I: 'static, O: 'static> Pipeline<I, O> {
    pub fn from_stage(stage: Stage<I, O>) -> Self {
        Pipeline {
            stage,
            fusion: Fusion::Enabled,
        }
    }

    /// Same tree, different fusion mode for subsequent chain calls.
    pub fn with_fusion(mut self, fusion: Fusion) -> Self {
        self.fusion = fusion;
        self
    }

    pub fn fusion(&self) -> Fusion {
        self.fusion
    }

    pub fn stage(&self) -> &Stage<I, O> {
        &self.stage
    }

    pub fn into_stage(self) -> Stage<I, O> {
        self.stage
    }

    pub fn map<R: 'static>(&self, f: impl Fn(O) -> R + 'static) -> Pipeline<I, R> {
        self.then(Stage::map(f))
    }

    pub fn filter(&self, p: impl Fn(&O) -> bool + 'static) -> Pipeline<I, O> {
        self.then(Stage::filter(p))
    }

    pub fn filter_map<R: 'static>(&self, f: impl Fn(O) -> Option<R> + 'static) -> Pipeline<I, R> {
        self.then(Stage::filter_map(f))
    }

    pub fn flat_map<R: 'static>(&self, f: impl Fn(O) -> Vec<R> + 'static) -> Pipeline<I, R> {
        self.then(Stage::flat_map(f))
    }

    /// Keep the first `n` elements and stop the pass after them.
    pub fn take(&self, n: usize) -> Pipeline<I, O> {
        self.then(Stage::take(n))
    }

    /// Skip the first `n` elements.
    pub fn drop(&self, n: usize) -> Pipeline<I, O> {
        self.then(Stage::drop(n))
    }

    pub fn first(&self) -> Pipeline<I, O> {
        self.take(1)
    }

    /// Map with an accumulator; `init` runs once at the start of every run.
    pub fn stateful_map<S: 'static, R: 'static>(
        &self,
        init: impl Fn() -> S + 'static,
        step: impl Fn(&S, O) -> (S, R) + 'static,
    ) -> Pipeline<I, R> {
        self.then(Stage::stateful_map(init, step))
    }

    /// Append another handle's stages after this one's.
    pub fn merge<R: 'static>(&self, other: &Pipeline<O, R>) -> Pipeline<I, R> {
        self.then(other.stage.clone())
    }

    fn then<R: 'static>(&self, next: Stage<O, R>) -> Pipeline<I, R> {
        let stage = match self.fusion {
            Fusion::Enabled => Stage::combine(self.stage.clone(), next).optimize(),
            Fusion::Disabled => Stage::combine_unfused(self.stage.clone(), next),
        };
        Pipeline {
            stage,
            fusion: self.fusion,
        }
    }

    pub fn optimize(&self) -> Pipeline<I, O> {
        Pipeline {
            stage: self.stage.clone().optimize(),
            fusion: self.fusion,
        }
    }

    pub fn debug_print(&self) -> String {
        self.stage.debug_print()
    }

    pub fn run(&self, input: impl IntoIterator<Item = I>) -> Vec<O> {
        self.run_with_stats(input).values
    }

    pub fn run_with_stats(&self, input: impl IntoIterator<Item = I>) -> ExecutionResult<O> {
        Executor::new().execute(input, &self.stage)
    }

    /// Fold the pipeline output into a single value.
    ///
    /// A sink stage that absorbs every element is appended to a copy of the
    /// tree; this handle is left as it was.
    pub fn reduce<A: 'static>(
        &self,
        input: impl IntoIterator<Item = I>,
        init: A,
        f: impl Fn(A, O) -> A + 'static,
    ) -> A {
        let acc = Rc::new(RefCell::new(Some(init)));
        let sink_acc = Rc::clone(&acc);
        let sink = Stage::filter_map(move |element: O| {
            let mut slot = sink_acc.borrow_mut();
            if let Some(current) = slot.take() {
                *slot = Some(f(current, element));
            }
            None::<Infallible>
        });

        let drained = self.then(sink).run(input);
        debug_assert!(drained.is_empty());

        let result = acc.borrow_mut().take();
        result.unwrap_or_else(|| {
            FlowError::InvariantViolation {
                context: "reduce accumulator missing after run",
            }
            .raise()
        })
    }
}

impl<T: 'static> Pipeline<T, T> {
    pub fn new() -> Self {
        chain()
    }

    /// An empty chain that never fuses.
    pub fn unfused() -> Self {
        chain().with_fusion(Fusion::Disabled)
    }
}
