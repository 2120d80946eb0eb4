//! Compiled stage closures
//!
//! A `Kernel` is a `Stage` turned into a single `FnMut(I) -> Signal<O>`.
//! Compilation is where runtime state is born: every `Take`/`Drop` counter
//! and `StatefulMap` accumulator starts fresh, so a tree can be compiled any
//! number of times and each run behaves identically.

use std::rc::Rc;

use super::executor::ExecutionStats;
use super::ir::Stage;
use super::signal::Signal;

/// A stage compiled for one run.
pub struct Kernel<I, O> {
    eval: Box<dyn FnMut(I) -> Signal<O>>,
}

impl<I: 'static, O: 'static> Kernel<I, O> {
    pub fn from_fn(eval: impl FnMut(I) -> Signal<O> + 'static) -> Self {
        Kernel {
            eval: Box::new(eval),
        }
    }

    /// Compile a stage tree.
    pub fn compile(stage: &Stage<I, O>) -> Self {
        match stage {
            Stage::Identity(same) => {
                let same = *same;
                Self::from_fn(move |x| Signal::Keep(same.cast(x)))
            }

            Stage::Map(f) => {
                let f = Rc::clone(f);
                Self::from_fn(move |x| Signal::Keep(f(x)))
            }

            Stage::Filter(same, p) => {
                let (same, p) = (*same, Rc::clone(p));
                Self::from_fn(move |x| {
                    if p(&x) {
                        Signal::Keep(same.cast(x))
                    } else {
                        Signal::Drop
                    }
                })
            }

            Stage::FilterMap(f) => {
                let f = Rc::clone(f);
                Self::from_fn(move |x| Signal::from_option(f(x)))
            }

            Stage::FlatMap(f) => {
                let f = Rc::clone(f);
                Self::from_fn(move |x| Signal::from_vec(f(x)))
            }

            Stage::Take(same, n) => {
                let (same, limit) = (*same, *n);
                let mut taken = 0usize;
                Self::from_fn(move |x| {
                    if taken < limit {
                        taken += 1;
                        Signal::Keep(same.cast(x))
                    } else {
                        Signal::Abort
                    }
                })
            }

            Stage::Drop(same, n) => {
                let (same, limit) = (*same, *n);
                let mut dropped = 0usize;
                Self::from_fn(move |x| {
                    if dropped < limit {
                        dropped += 1;
                        Signal::Drop
                    } else {
                        Signal::Keep(same.cast(x))
                    }
                })
            }

            Stage::StatefulMap(start) => {
                let mut step = start();
                Self::from_fn(move |x| Signal::Keep(step(x)))
            }

            Stage::Combine(node) => node.compile(),
        }
    }

    /// Chain two kernels: `right` sees whatever `left` keeps or expands.
    ///
    /// `right` is shared by every expansion in the run, so its counters keep
    /// counting across elements. An abort raised by `right` inside an
    /// expansion truncates only that expansion.
    pub fn combine<X: 'static>(mut left: Kernel<I, X>, mut right: Kernel<X, O>) -> Self {
        Self::from_fn(move |x| match left.eval(x) {
            Signal::Keep(v) => right.eval(v),
            Signal::Many(vs) => {
                let mut out = Vec::with_capacity(vs.len());
                right.drain_into(vs, &mut out);
                Signal::from_vec(out)
            }
            Signal::Abort => Signal::Abort,
            Signal::Drop => Signal::Drop,
        })
    }

    #[inline]
    pub fn eval(&mut self, element: I) -> Signal<O> {
        (self.eval)(element)
    }

    /// Feed `input` through the kernel in order, appending to `out` until the
    /// input is exhausted or a signal aborts the pass.
    pub fn drain_into(
        &mut self,
        input: impl IntoIterator<Item = I>,
        out: &mut Vec<O>,
    ) -> ExecutionStats {
        let mut stats = ExecutionStats::default();
        let before = out.len();

        for element in input {
            stats.elements_evaluated += 1;
            let signal = self.eval(element);
            if signal.is_abort() {
                stats.aborts += 1;
                break;
            }
            if let Signal::Many(_) = signal {
                stats.expansions += 1;
            }
            signal.emit_into(out);
        }

        stats.elements_emitted = out.len() - before;
        stats
    }
}
