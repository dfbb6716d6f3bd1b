//! A panicking task only fails its own handle.

use drainpool::prelude::*;

fn parse(input: &'static str) -> i64 {
    input.parse().unwrap_or_else(|_| panic!("not a number: {:?}", input))
}

fn main() -> Result<()> {
    // LogAndContinue reports through `tracing`; print those events
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .init();

    let config = Config::builder()
        .num_threads(2)
        .panic_strategy(PanicStrategy::LogAndContinue)
        .build()?;
    let pool = WorkerPool::with_config(&config)?;

    let inputs = ["1", "22", "three", "4444"];
    let handles = inputs
        .iter()
        .map(|&s| pool.submit_with(parse, s))
        .collect::<Result<Vec<_>>>()?;

    for (input, handle) in inputs.iter().zip(handles) {
        match handle.wait() {
            Ok(n) => println!("{:>6} -> {}", input, n),
            Err(Error::TaskFailed(failure)) => println!("{:>6} -> failed: {}", input, failure),
            Err(e) => return Err(e),
        }
    }

    println!("panics captured: {}", pool.panic_count());
    Ok(())
}
