use tracing::debug;

use crate::{observe::Observer, Monitor, WorkerId};

/// Producer loop: deposits values from `next` until the production quota
/// closes. Returns how many deposits this worker committed.
pub fn produce<T, O>(monitor: &Monitor<T, O>, worker: WorkerId, mut next: impl FnMut() -> T) -> usize
where
    T: Copy + Send,
    O: Observer<T>,
{
    let mut committed = 0;
    while monitor.production_open() {
        let value = next();
        if !monitor.deposit(worker, value) {
            break;
        }
        committed += 1;
    }
    debug!("{worker} exiting after {committed} deposits");
    committed
}

/// Consumer loop: withdraws until the consumption quota closes. Returns how
/// many items this worker took.
pub fn consume<T, O>(monitor: &Monitor<T, O>, worker: WorkerId) -> usize
where
    T: Copy + Send,
    O: Observer<T>,
{
    let mut taken = 0;
    while monitor.consumption_open() {
        if monitor.withdraw(worker).is_none() {
            break;
        }
        taken += 1;
    }
    debug!("{worker} exiting after {taken} withdrawals");
    taken
}
