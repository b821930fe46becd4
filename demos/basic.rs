// demos/basic.rs

//! Three blocking tasks: C waits for A and B, which run side by side.
//!
//! `cargo run --example basic`

use std::thread;
use std::time::{Duration, Instant};

use dagrun::{blocking_executor, init_logging, Runner};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Step {
    A,
    B,
    C,
}

impl Step {
    fn dependencies(self) -> &'static [Step] {
        match self {
            Step::A | Step::B => &[],
            Step::C => &[Step::A, Step::B],
        }
    }

    fn duration(self) -> Duration {
        match self {
            Step::A => Duration::from_secs(2),
            Step::B => Duration::from_secs(3),
            Step::C => Duration::from_secs(4),
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_logging(None)?;

    let start = Instant::now();
    let runner = Runner::new(
        |step: &Step| step.dependencies().to_vec(),
        blocking_executor(move |step: Step| {
            println!("{:>5.1}s {step:?} started", start.elapsed().as_secs_f32());
            thread::sleep(step.duration());
            println!("{:>5.1}s {step:?} finished", start.elapsed().as_secs_f32());
            true
        }),
    );

    runner.run_all_blocking([Step::A, Step::B, Step::C])?;

    println!("all done after {:.1}s", start.elapsed().as_secs_f32());
    Ok(())
}
