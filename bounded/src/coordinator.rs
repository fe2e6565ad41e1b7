use std::{
    thread::{self, Scope, ScopedJoinHandle},
    time::{Duration, Instant},
};

use tracing::{debug, warn};

use crate::{
    observe::Observer,
    worker::{consume, produce},
    Config, Error, Monitor, Snapshot, WorkerId,
};

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct Report<T> {
    /// Monitor state after every worker joined.
    pub snapshot: Snapshot<T>,
    /// Deposits per producer, `deposits[i]` belongs to `P{i + 1}`.
    pub deposits: Vec<usize>,
    /// Withdrawals per consumer, `withdrawals[i]` belongs to `C{i + 1}`.
    pub withdrawals: Vec<usize>,
    pub elapsed: Duration,
}

/// Runs `config.producers` producers against `config.consumers` consumers
/// and waits for all of them.
///
/// `source` is called once inside every producer thread to build that
/// producer's value generator. The monitor and its primitives are dropped
/// only after every started thread has been joined, also on error: a failed
/// spawn or a panicking worker aborts the monitor so the remaining workers
/// drain out instead of waiting on a peer that will never come.
pub fn run<T, G, S, O>(
    config: &Config,
    sentinel: T,
    source: S,
    observer: O,
) -> Result<Report<T>, Error>
where
    T: Copy + Send,
    S: Fn(WorkerId) -> G + Sync,
    G: FnMut() -> T,
    O: Observer<T>,
{
    config.validate()?;

    let monitor = Monitor::new(config.capacity, config.effective_quota(), sentinel, observer)?;
    let started = Instant::now();

    let (deposits, withdrawals) = thread::scope(|s| {
        let monitor = &monitor;
        let source = &source;
        let mut failure = None;

        let mut producers = Vec::with_capacity(config.producers);
        for i in 1..=config.producers {
            let worker = WorkerId::producer(i);
            let spawned = spawn(s, worker, move || {
                let _abort = AbortOnPanic(monitor);
                produce(monitor, worker, source(worker))
            });
            match spawned {
                Ok(handle) => producers.push((worker, handle)),
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }

        let mut consumers = Vec::with_capacity(config.consumers);
        if failure.is_none() {
            for i in 1..=config.consumers {
                let worker = WorkerId::consumer(i);
                let spawned = spawn(s, worker, move || {
                    let _abort = AbortOnPanic(monitor);
                    consume(monitor, worker)
                });
                match spawned {
                    Ok(handle) => consumers.push((worker, handle)),
                    Err(e) => {
                        failure = Some(e);
                        break;
                    }
                }
            }
        }

        if let Some(e) = &failure {
            warn!("startup failed, draining started workers: {e}");
            monitor.abort();
        }

        let deposits = join_all(producers, &mut failure);
        let withdrawals = join_all(consumers, &mut failure);

        match failure {
            Some(e) => Err(e),
            None => Ok((deposits, withdrawals)),
        }
    })?;

    let elapsed = started.elapsed();
    let snapshot = monitor.snapshot();
    debug!(
        "all {} workers joined after {elapsed:?}",
        deposits.len() + withdrawals.len()
    );

    Ok(Report {
        snapshot,
        deposits,
        withdrawals,
        elapsed,
    })
}

fn spawn<'scope, 'env, F>(
    s: &'scope Scope<'scope, 'env>,
    worker: WorkerId,
    f: F,
) -> Result<ScopedJoinHandle<'scope, usize>, Error>
where
    F: FnOnce() -> usize + Send + 'scope,
{
    debug!("spawning {worker}");
    thread::Builder::new()
        .name(worker.to_string())
        .spawn_scoped(s, f)
        .map_err(|source| Error::Spawn { worker, source })
}

/// Joins every handle, keeping the first failure.
fn join_all(
    handles: Vec<(WorkerId, ScopedJoinHandle<'_, usize>)>,
    failure: &mut Option<Error>,
) -> Vec<usize> {
    handles
        .into_iter()
        .map(|(worker, handle)| match handle.join() {
            Ok(count) => count,
            Err(_) => {
                warn!("{worker} panicked");
                failure.get_or_insert(Error::Join { worker });
                0
            }
        })
        .collect()
}

/// Aborts the monitor when a worker unwinds, so its peers cannot block on
/// it forever.
struct AbortOnPanic<'a, T: Copy + Send, O: Observer<T>>(&'a Monitor<T, O>);

impl<T: Copy + Send, O: Observer<T>> Drop for AbortOnPanic<'_, T, O> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0.abort();
        }
    }
}
