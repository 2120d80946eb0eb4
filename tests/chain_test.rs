use flowseq::{chain, Fusion, Pipeline};
use std::cell::Cell;
use std::rc::Rc;

// Primitives

#[test]
fn test_map() {
    let op = chain::<i32>().map(|x| x + 1);
    assert_eq!(op.run([1, 2, 3, 4]), vec![2, 3, 4, 5]);
}

#[test]
fn test_take() {
    let op = chain::<i32>().take(2);
    assert_eq!(op.run([1, 2, 3, 4]), vec![1, 2]);
}

#[test]
fn test_take_more_than_input() {
    let op = chain::<i32>().take(10);
    assert_eq!(op.run([1, 2, 3]), vec![1, 2, 3]);
}

#[test]
fn test_drop() {
    let op = chain::<i32>().drop(2);
    assert_eq!(op.run([1, 2, 3, 4]), vec![3, 4]);
    assert!(op.run([1]).is_empty());
}

#[test]
fn test_flat_map() {
    let op = chain::<i32>().flat_map(|x| vec![x, x + 1]);
    assert_eq!(op.run([1, 2, 3, 4]), vec![1, 2, 2, 3, 3, 4, 4, 5]);
}

#[test]
fn test_filter() {
    let op = chain::<i32>().filter(|x| *x > 2);
    assert_eq!(op.run([1, 2, 3, 4]), vec![3, 4]);
}

#[test]
fn test_filter_map_changes_type() {
    let op = chain::<&str>().filter_map(|s| s.parse::<u32>().ok());
    assert_eq!(op.run(["1", "x", "30"]), vec![1, 30]);
}

#[test]
fn test_first() {
    let op = chain::<i32>().filter(|x| *x > 1).first();
    assert_eq!(op.run([1, 2, 3, 4]), vec![2]);
    assert!(op.run([0, 1]).is_empty());
}

#[test]
fn test_reduce() {
    assert_eq!(chain::<i32>().reduce([1, 2, 3], 0, |x, y| x + y), 1 + 2 + 3);
    assert_eq!(chain::<i32>().reduce([], 7, |x, y| x + y), 7);
}

// Chaining

#[test]
fn test_chaining() {
    let op = chain::<i32>()
        .filter(|x| *x > 2)
        .map(|x| x + 1)
        .flat_map(|x| vec![x, x]);
    assert_eq!(op.run([1, 2, 3, 4]), vec![4, 4, 5, 5]);
}

#[test]
fn test_final_reduction() {
    let op = chain::<i32>()
        .filter(|x| *x > 2)
        .map(|x| x + 1)
        .flat_map(|x| vec![x, x]);
    assert_eq!(op.reduce([1, 2, 3, 4], 0, |x, y| x + y), 4 + 4 + 5 + 5);
}

#[test]
fn test_reduce_stops_at_take() {
    let op = chain::<i32>().map(|x| x * 10).take(2);
    assert_eq!(op.reduce(1..=100, Vec::new(), |mut acc, x| {
        acc.push(x);
        acc
    }), vec![10, 20]);
}

#[test]
fn test_optimized_matches_unoptimized() {
    let op = chain::<i32>()
        .filter(|x| *x > 2)
        .map(|x| x + 1)
        .flat_map(|x| vec![x, x]);
    assert_eq!(op.optimize().run([1, 2, 3, 4]), op.run([1, 2, 3, 4]));
}

#[test]
fn test_branching_handles() {
    let base = chain::<i32>().map(|x| x * 2);
    let small = base.filter(|x| *x < 5);
    let head = base.take(1);

    assert_eq!(base.run([1, 2, 3]), vec![2, 4, 6]);
    assert_eq!(small.run([1, 2, 3]), vec![2, 4]);
    assert_eq!(head.run([1, 2, 3]), vec![2]);
}

#[test]
fn test_merge_handles() {
    let parse = chain::<String>().filter_map(|s| s.trim().parse::<i64>().ok());
    let positive = chain::<i64>().filter(|x| *x > 0).map(|x| x * 2);

    let op = parse.merge(&positive);
    let input = vec![" 3".to_string(), "-1".to_string(), "nope".to_string(), "4 ".to_string()];
    assert_eq!(op.run(input), vec![6, 8]);
}

// Runtime state

#[test]
fn test_stateful_map() {
    let op = chain::<i32>().stateful_map(|| 0i32, |acc, x| (acc + 1, x + acc));
    assert_eq!(op.run([1, 2, 3, 4]), vec![1, 3, 5, 7]);
}

#[test]
fn test_stateful_map_resets_per_run() {
    let inits = Rc::new(Cell::new(0));
    let counter = Rc::clone(&inits);
    let op = chain::<i32>().stateful_map(
        move || {
            counter.set(counter.get() + 1);
            0i32
        },
        |acc, x| (acc + 1, x + acc),
    );

    assert_eq!(op.run([1, 2, 3, 4]), vec![1, 3, 5, 7]);
    assert_eq!(op.run([1, 2, 3, 4]), vec![1, 3, 5, 7]);
    assert_eq!(inits.get(), 2);
}

#[test]
fn test_take_and_drop_reset_per_run() {
    let op = chain::<i32>().drop(1).take(2);
    assert_eq!(op.run([1, 2, 3, 4]), vec![2, 3]);
    assert_eq!(op.run([5, 6, 7, 8]), vec![6, 7]);
}

#[test]
fn test_take_counts_across_expansions() {
    let op = chain::<i32>().flat_map(|x| vec![x, x, x]).take(4);
    assert_eq!(op.run([1, 2, 3]), vec![1, 1, 1, 2]);
}

#[test]
fn test_stateful_map_after_expansion() {
    let op = chain::<char>()
        .flat_map(|c| vec![c, c.to_ascii_uppercase()])
        .stateful_map(|| 0usize, |i, c| (i + 1, format!("{}{}", i, c)));
    assert_eq!(op.run(['a', 'b']), vec!["0a", "1A", "2b", "3B"]);
}

#[test]
fn test_abort_stops_evaluating_input() {
    let seen = Rc::new(Cell::new(0));
    let probe = Rc::clone(&seen);
    let op = chain::<i32>()
        .map(move |x| {
            probe.set(probe.get() + 1);
            x
        })
        .take(2);

    let result = op.run_with_stats(1..=1000);

    assert_eq!(result.values, vec![1, 2]);
    assert_eq!(seen.get(), 3);
    assert_eq!(result.stats.elements_evaluated, 3);
    assert_eq!(result.stats.aborts, 1);
}

#[test]
fn test_left_evaluated_once_per_element() {
    let calls = Rc::new(Cell::new(0));
    let probe = Rc::clone(&calls);
    let op = chain::<i32>()
        .flat_map(move |x| {
            probe.set(probe.get() + 1);
            vec![x; 3]
        })
        .drop(1)
        .map(|x| x + 1);

    assert_eq!(op.run([1, 2]), vec![2, 2, 3, 3, 3]);
    assert_eq!(calls.get(), 2);
}

// Fusion mode

#[test]
fn test_fusion_mode_is_inherited() {
    let op = Pipeline::<i32, i32>::unfused()
        .map(|x| x + 1)
        .map(|x| x * 2);

    assert_eq!(op.fusion(), Fusion::Disabled);
    assert_eq!(op.debug_print(), "Combine(Combine(Identity, Map), Map)");
    assert_eq!(op.run([1, 2]), vec![4, 6]);

    let fused = op.with_fusion(Fusion::Enabled).map(|x| x - 1);
    assert_eq!(fused.debug_print(), "Map");
    assert_eq!(fused.run([1, 2]), vec![3, 5]);
}

// Errors from user callables

#[test]
#[should_panic(expected = "bad element")]
fn test_user_panic_propagates() {
    let op = chain::<i32>().map(|x| {
        if x == 3 {
            panic!("bad element");
        }
        x
    });
    op.run([1, 2, 3, 4]);
}
