use anyhow::{ensure, Context};
use clap::Parser;
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

pub mod cli;

use bounded::{observe::Dump, run, Report, Trace, WorkerId};
use cli::Args;

const SENTINEL: i32 = 0;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    let config = args.config();
    info!(
        "{} producers, {} consumers, {} slots, {} items",
        config.producers,
        config.consumers,
        config.capacity,
        config.effective_quota()
    );

    let seed = args.seed;
    let source = move |worker: WorkerId| {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(worker.index as u64)),
            None => StdRng::from_entropy(),
        };
        move || rng.gen_range(1..=99)
    };

    let report = if args.quiet {
        run(&config, SENTINEL, source, ())
    } else {
        run(&config, SENTINEL, source, Trace)
    }
    .context("producer/consumer run failed")?;

    summarize(&report);
    ensure!(
        report.snapshot.slots.iter().all(|&v| v == SENTINEL),
        "buffer not empty after run: [{}]",
        Dump(&report.snapshot.slots)
    );

    Ok(())
}

fn summarize(report: &Report<i32>) {
    let snap = &report.snapshot;
    info!(
        "produced {} and consumed {} items in {:?}",
        snap.produced, snap.consumed, report.elapsed
    );
    info!("final buffer: [{}]", Dump(&snap.slots));

    for (i, count) in report.deposits.iter().enumerate() {
        info!("{}: {count} deposits", WorkerId::producer(i + 1));
    }
    for (i, count) in report.withdrawals.iter().enumerate() {
        info!("{}: {count} withdrawals", WorkerId::consumer(i + 1));
    }
}
