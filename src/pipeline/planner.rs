//! Fusion optimizer
//!
//! Rewrites `Combine` nodes bottom-up. After both children are optimized,
//! exactly one rule from the table below is tried on the concrete pair:
//!
//! | left        | right       | fused     |
//! |-------------|-------------|-----------|
//! | Identity    | any         | right     |
//! | any         | Identity    | left      |
//! | Filter      | Filter      | Filter    |
//! | Map         | Map         | Map       |
//! | Map         | Filter      | FilterMap |
//! | Map         | FlatMap     | FlatMap   |
//! | Filter      | Map         | FilterMap |
//! | FilterMap   | Map         | FilterMap |
//! | FilterMap   | Filter      | FilterMap |
//! | Filter      | FilterMap   | FilterMap |
//! | FilterMap   | FlatMap     | FlatMap   |
//!
//! Anything else stays a `Combine`. `Take`, `Drop` and `StatefulMap` carry
//! per-run state whose position in the chain matters, so they are never
//! merged with a neighbour.

use std::rc::Rc;

use super::ir::Stage;

/// Return the most fused stage observably equivalent to `stage`.
pub fn optimize<I: 'static, O: 'static>(stage: Stage<I, O>) -> Stage<I, O> {
    match stage {
        Stage::Combine(node) => node.optimize(),
        leaf => leaf,
    }
}

/// Fuse two already optimized neighbours, or join them in a `Combine`.
pub(crate) fn fuse<I: 'static, X: 'static, O: 'static>(
    left: Stage<I, X>,
    right: Stage<X, O>,
) -> Stage<I, O> {
    let (left_kind, right_kind) = (left.kind(), right.kind());

    let fused = match (left, right) {
        (Stage::Identity(same), right) => same.flip().rebase_input(right),

        (left, Stage::Identity(same)) => same.rebase_output(left),

        (Stage::Filter(s1, p), Stage::Filter(s2, q)) => {
            let q = s1.flip().rebase_predicate(q);
            Stage::Filter(s1.then(s2), Rc::new(move |x: &I| p(x) && q(x)))
        }

        (Stage::Map(f), Stage::Map(g)) => Stage::Map(Rc::new(move |x: I| g(f(x)))),

        (Stage::Map(f), Stage::Filter(same, q)) => Stage::FilterMap(Rc::new(move |x: I| {
            let v = f(x);
            if q(&v) {
                Some(same.cast(v))
            } else {
                None
            }
        })),

        (Stage::Map(f), Stage::FlatMap(g)) => Stage::FlatMap(Rc::new(move |x: I| g(f(x)))),

        (Stage::Filter(same, p), Stage::Map(g)) => Stage::FilterMap(Rc::new(move |x: I| {
            if p(&x) {
                Some(g(same.cast(x)))
            } else {
                None
            }
        })),

        (Stage::FilterMap(f), Stage::Map(g)) => {
            Stage::FilterMap(Rc::new(move |x: I| f(x).map(|v| g(v))))
        }

        (Stage::FilterMap(f), Stage::Filter(same, q)) => {
            Stage::FilterMap(Rc::new(move |x: I| f(x).filter(|v| q(v)).map(|v| same.cast(v))))
        }

        (Stage::Filter(same, p), Stage::FilterMap(g)) => Stage::FilterMap(Rc::new(move |x: I| {
            if p(&x) {
                g(same.cast(x))
            } else {
                None
            }
        })),

        (Stage::FilterMap(f), Stage::FlatMap(g)) => {
            Stage::FlatMap(Rc::new(move |x: I| f(x).map(|v| g(v)).unwrap_or_default()))
        }

        (left, right) => return Stage::combine_unfused(left, right),
    };

    log::debug!(
        "fused {:?} + {:?} into {:?}",
        left_kind,
        right_kind,
        fused.kind()
    );
    fused
}
