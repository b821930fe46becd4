// demos/async_await.rs

//! Same graph as `basic`, with async tasks on the caller's runtime.
//!
//! `cargo run --example async_await`

use std::time::Duration;

use dagrun::{executor_fn, init_logging, DependencyMap, Runner};
use tokio::time::{sleep, Instant};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging(None)?;

    let deps = DependencyMap::new().with("C", ["A", "B"]);
    let start = Instant::now();

    let runner = Runner::new(
        deps,
        executor_fn(move |name: &'static str| async move {
            let secs = match name {
                "A" => 2,
                "B" => 3,
                _ => 4,
            };
            println!("{:>5.1}s {name} started", start.elapsed().as_secs_f32());
            sleep(Duration::from_secs(secs)).await;
            println!("{:>5.1}s {name} finished", start.elapsed().as_secs_f32());
            true
        }),
    );

    runner.run_all(["A", "B", "C"]).await?;

    println!("all done after {:.1}s", start.elapsed().as_secs_f32());
    Ok(())
}
