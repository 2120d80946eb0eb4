//! Quick demonstration of stage fusion
//!
//! Run with `RUST_LOG=debug` to see each rewrite the planner performs.

use flowseq::{chain, Fusion};

fn main() {
    env_logger::init();

    println!("=== FUSION DEMO: flowseq ===\n");

    let input: Vec<i32> = (1..=8).collect();
    println!("Input: {:?}\n", input);

    for fusion in [Fusion::Disabled, Fusion::Enabled] {
        let op = chain::<i32>()
            .with_fusion(fusion)
            .filter(|x| *x > 2)
            .map(|x| x + 1)
            .filter(|x| *x > 4)
            .flat_map(|x| vec![x, x]);

        let result = op.run_with_stats(input.iter().copied());

        println!("{:?}:", fusion);
        println!("   Plan:   {}", op.debug_print());
        println!("   Stages: {}", op.stage().leaves());
        println!("   Output: {:?}", result.values);
        println!(
            "   Stats:  {} in, {} out, {} expansions\n",
            result.stats.elements_evaluated, result.stats.elements_emitted, result.stats.expansions
        );
    }

    // Stateful stages stay in place; fusion happens around them.
    let op = chain::<i32>()
        .map(|x| x * 10)
        .take(5)
        .filter(|x| *x != 30)
        .map(|x| x + 1)
        .stateful_map(|| 0, |n: &i32, x| (n + 1, (*n, x)));

    println!("Around Take:");
    println!("   Plan:   {}", op.debug_print());
    println!("   Output: {:?}", op.run(input.iter().copied()));

    let total = op.reduce(input, 0, |acc, (_, x)| acc + x);
    println!("   Sum:    {}", total);
}
