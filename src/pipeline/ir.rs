//! Intermediate Representation for element-wise pipelines
//!
//! A pipeline is a tree of `Stage` nodes. Leaves are single transforms
//! (map, filter, take, ...); `Combine` is sequential composition. The tree is
//! purely declarative: runtime counters and accumulators only exist once a
//! stage is compiled into a `Kernel` for a run.

use std::any::{type_name, Any};
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use super::kernel::Kernel;
use super::planner;
use crate::error::{FlowError, Result};

/// Proof that `A` and `B` are the same type.
///
/// Only `Same<T, T>` can be minted, so type-preserving stages (`Filter`,
/// `Take`, ...) can never be built with mismatched ends. Casting through a
/// witness is a no-op after monomorphization.
pub struct Same<A, B>(PhantomData<fn(A) -> B>);

impl<A, B> Clone for Same<A, B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A, B> Copy for Same<A, B> {}

impl<A, B> fmt::Debug for Same<A, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Same<{}, {}>", type_name::<A>(), type_name::<B>())
    }
}

impl<T> Same<T, T> {
    pub fn refl() -> Self {
        Same(PhantomData)
    }
}

impl<A: 'static, B: 'static> Same<A, B> {
    #[inline]
    pub fn cast(self, value: A) -> B {
        coerce(value)
    }

    #[inline]
    pub fn cast_ref(self, value: &A) -> &B {
        match (value as &dyn Any).downcast_ref::<B>() {
            Some(v) => v,
            None => mismatch::<A, B>().raise(),
        }
    }

    /// Transitivity: `A == B` and `B == C` give `A == C`.
    pub fn then<C: 'static>(self, _next: Same<B, C>) -> Same<A, C> {
        Same(PhantomData)
    }

    pub fn flip(self) -> Same<B, A> {
        Same(PhantomData)
    }

    /// Re-label the input type of a stage.
    pub(crate) fn rebase_input<O: 'static>(self, stage: Stage<A, O>) -> Stage<B, O> {
        coerce(stage)
    }

    /// Re-label the output type of a stage.
    pub(crate) fn rebase_output<I: 'static>(self, stage: Stage<I, A>) -> Stage<I, B> {
        coerce(stage)
    }

    pub(crate) fn rebase_predicate(self, predicate: Predicate<A>) -> Predicate<B> {
        coerce(predicate)
    }
}

fn mismatch<T, U>() -> FlowError {
    FlowError::WitnessMismatch {
        from: type_name::<T>(),
        to: type_name::<U>(),
    }
}

pub(crate) fn try_coerce<T: 'static, U: 'static>(value: T) -> Result<U> {
    let mut slot = Some(value);
    (&mut slot as &mut dyn Any)
        .downcast_mut::<Option<U>>()
        .and_then(Option::take)
        .ok_or_else(mismatch::<T, U>)
}

#[inline]
fn coerce<T: 'static, U: 'static>(value: T) -> U {
    try_coerce(value).unwrap_or_else(|e| e.raise())
}

pub type MapFn<I, O> = Rc<dyn Fn(I) -> O>;
pub type Predicate<T> = Rc<dyn Fn(&T) -> bool>;
pub type FilterMapFn<I, O> = Rc<dyn Fn(I) -> Option<O>>;
pub type FlatMapFn<I, O> = Rc<dyn Fn(I) -> Vec<O>>;

/// Produces a fresh stateful step function for each compilation.
pub type StatefulFn<I, O> = Rc<dyn Fn() -> Box<dyn FnMut(I) -> O>>;

/// Discriminant of a `Stage`, without payloads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StageKind {
    Identity,
    Map,
    Filter,
    FilterMap,
    FlatMap,
    Take,
    Drop,
    StatefulMap,
    Combine,
}

/// One node of the pipeline IR: evaluates an `I` into a `Signal<O>`.
pub enum Stage<I, O> {
    /// Keep every element unchanged
    Identity(Same<I, O>),

    /// Keep `f(x)`
    Map(MapFn<I, O>),

    /// Keep `x` if `p(x)`, otherwise drop
    Filter(Same<I, O>, Predicate<I>),

    /// Keep `f(x)` when it is `Some`, otherwise drop
    FilterMap(FilterMapFn<I, O>),

    /// Expand `x` into `f(x)`; an empty expansion drops
    FlatMap(FlatMapFn<I, O>),

    /// Keep the first `n` elements, then abort
    Take(Same<I, O>, usize),

    /// Drop the first `n` elements, then keep
    Drop(Same<I, O>, usize),

    /// Thread an accumulator through the elements
    StatefulMap(StatefulFn<I, O>),

    /// `left` then `right`, with the middle type erased
    Combine(Rc<dyn Composite<I, O>>),
}

/// Sequential composition with its middle type hidden.
///
/// Implemented only by the crate's `Combine` node; the optimizer's pattern
/// match runs behind this seam where the middle type is concrete.
pub trait Composite<I, O> {
    /// Optimize both children, then try to fuse them.
    fn optimize(&self) -> Stage<I, O>;

    /// Compile both children and chain them.
    fn compile(&self) -> Kernel<I, O>;

    /// `Combine(<left>, <right>)`
    fn describe(&self) -> String;

    /// Number of leaf stages below this node.
    fn leaves(&self) -> usize;
}

struct Combine<I, X, O> {
    left: Stage<I, X>,
    right: Stage<X, O>,
}

impl<I: 'static, X: 'static, O: 'static> Composite<I, O> for Combine<I, X, O> {
    fn optimize(&self) -> Stage<I, O> {
        let left = planner::optimize(self.left.clone());
        let right = planner::optimize(self.right.clone());
        planner::fuse(left, right)
    }

    fn compile(&self) -> Kernel<I, O> {
        Kernel::combine(self.left.compile(), self.right.compile())
    }

    fn describe(&self) -> String {
        format!(
            "Combine({}, {})",
            self.left.debug_print(),
            self.right.debug_print()
        )
    }

    fn leaves(&self) -> usize {
        self.left.leaves() + self.right.leaves()
    }
}

impl<I, O> Clone for Stage<I, O> {
    fn clone(&self) -> Self {
        match self {
            Stage::Identity(same) => Stage::Identity(*same),
            Stage::Map(f) => Stage::Map(Rc::clone(f)),
            Stage::Filter(same, p) => Stage::Filter(*same, Rc::clone(p)),
            Stage::FilterMap(f) => Stage::FilterMap(Rc::clone(f)),
            Stage::FlatMap(f) => Stage::FlatMap(Rc::clone(f)),
            Stage::Take(same, n) => Stage::Take(*same, *n),
            Stage::Drop(same, n) => Stage::Drop(*same, *n),
            Stage::StatefulMap(start) => Stage::StatefulMap(Rc::clone(start)),
            Stage::Combine(node) => Stage::Combine(Rc::clone(node)),
        }
    }
}

impl<T: 'static> Stage<T, T> {
    pub fn identity() -> Self {
        Stage::Identity(Same::refl())
    }

    pub fn filter(p: impl Fn(&T) -> bool + 'static) -> Self {
        Stage::Filter(Same::refl(), Rc::new(p))
    }

    pub fn take(n: usize) -> Self {
        Stage::Take(Same::refl(), n)
    }

    pub fn drop(n: usize) -> Self {
        Stage::Drop(Same::refl(), n)
    }
}

impl<I: 'static, O: 'static> Stage<I, O> {
    pub fn map(f: impl Fn(I) -> O + 'static) -> Self {
        Stage::Map(Rc::new(f))
    }

    pub fn filter_map(f: impl Fn(I) -> Option<O> + 'static) -> Self {
        Stage::FilterMap(Rc::new(f))
    }

    pub fn flat_map(f: impl Fn(I) -> Vec<O> + 'static) -> Self {
        Stage::FlatMap(Rc::new(f))
    }

    /// `init` seeds the accumulator each time the stage is compiled; `step`
    /// returns the next accumulator and the output element.
    pub fn stateful_map<S: 'static>(
        init: impl Fn() -> S + 'static,
        step: impl Fn(&S, I) -> (S, O) + 'static,
    ) -> Self {
        let step = Rc::new(step);
        Stage::StatefulMap(Rc::new(move || {
            let mut state = init();
            let step = Rc::clone(&step);
            Box::new(move |element: I| {
                let (next, out) = step(&state, element);
                state = next;
                out
            }) as Box<dyn FnMut(I) -> O>
        }))
    }

    /// Sequential composition; both children are optimized before they are
    /// stored, the new root itself is not fused.
    pub fn combine<X: 'static>(left: Stage<I, X>, right: Stage<X, O>) -> Self {
        Self::combine_unfused(planner::optimize(left), planner::optimize(right))
    }

    /// Sequential composition with no rewriting at all.
    pub fn combine_unfused<X: 'static>(left: Stage<I, X>, right: Stage<X, O>) -> Self {
        log::trace!(
            "combine {:?} + {:?}",
            left.kind(),
            right.kind()
        );
        Stage::Combine(Rc::new(Combine { left, right }))
    }

    pub fn optimize(self) -> Self {
        planner::optimize(self)
    }

    /// Compile into a runnable closure with fresh runtime state.
    pub fn compile(&self) -> Kernel<I, O> {
        Kernel::compile(self)
    }

    pub fn kind(&self) -> StageKind {
        match self {
            Stage::Identity(_) => StageKind::Identity,
            Stage::Map(_) => StageKind::Map,
            Stage::Filter(..) => StageKind::Filter,
            Stage::FilterMap(_) => StageKind::FilterMap,
            Stage::FlatMap(_) => StageKind::FlatMap,
            Stage::Take(..) => StageKind::Take,
            Stage::Drop(..) => StageKind::Drop,
            Stage::StatefulMap(_) => StageKind::StatefulMap,
            Stage::Combine(_) => StageKind::Combine,
        }
    }

    /// Number of leaf stages in the tree.
    pub fn leaves(&self) -> usize {
        match self {
            Stage::Combine(node) => node.leaves(),
            _ => 1,
        }
    }

    /// Structural name of the tree, e.g. `Combine(FilterMap, Take[2])`.
    pub fn debug_print(&self) -> String {
        match self {
            Stage::Identity(_) => "Identity".to_string(),
            Stage::Map(_) => "Map".to_string(),
            Stage::Filter(..) => "Filter".to_string(),
            Stage::FilterMap(_) => "FilterMap".to_string(),
            Stage::FlatMap(_) => "FlatMap".to_string(),
            Stage::Take(_, n) => format!("Take[{}]", n),
            Stage::Drop(_, n) => format!("Drop[{}]", n),
            Stage::StatefulMap(_) => "StatefulMap".to_string(),
            Stage::Combine(node) => node.describe(),
        }
    }
}

impl<I: 'static, O: 'static> fmt::Debug for Stage<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.debug_print())
    }
}
