//! Fan work out over a small pool and collect the results.

use drainpool::prelude::*;
use std::thread;
use std::time::{Duration, Instant};

fn main() -> Result<()> {
    let config = Config::builder()
        .num_threads(2)
        .thread_name_prefix("demo")
        .build()?;
    let pool = WorkerPool::with_config(&config)?;

    let start = Instant::now();
    let handles = (0..5usize)
        .map(|i| {
            pool.submit(move || {
                thread::sleep(Duration::from_millis(10));
                (i, thread::current().name().map(str::to_owned))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    for handle in handles {
        let (i, worker) = handle.wait()?;
        println!("task {} ran on {}", i, worker.as_deref().unwrap_or("?"));
    }
    println!("5 tasks on 2 workers took {:?}", start.elapsed());

    let sum = pool.submit_with(|(a, b): (u64, u64)| (a..=b).sum::<u64>(), (1, 100))?;
    println!("sum 1..=100 = {}", sum.wait()?);

    pool.shutdown();
    match pool.submit(|| ()) {
        Err(Error::PoolStopped) => println!("submit after shutdown rejected"),
        other => println!("unexpected: {:?}", other.map(|_| ())),
    }

    Ok(())
}
