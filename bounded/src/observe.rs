use std::fmt;

use tracing::info;

use crate::WorkerId;

/// One committed store mutation, seen with the monitor's lock still held.
#[derive(Debug)]
pub struct Event<'a, T> {
    pub worker: WorkerId,
    pub slot: usize,
    pub value: T,
    pub occupancy: usize,
    pub slots: &'a [T],
}

/// Hook invoked on every successful deposit and withdraw.
///
/// Callbacks run inside the critical section; keep them short and never
/// call back into the monitor.
pub trait Observer<T>: Sync {
    fn deposited(&self, _event: &Event<'_, T>) {}
    fn withdrawn(&self, _event: &Event<'_, T>) {}
}

impl<T> Observer<T> for () {}

impl<T, O: Observer<T> + ?Sized> Observer<T> for &O {
    fn deposited(&self, event: &Event<'_, T>) {
        (**self).deposited(event);
    }

    fn withdrawn(&self, event: &Event<'_, T>) {
        (**self).withdrawn(event);
    }
}

/// Logs every operation together with a dump of the ring.
#[derive(Debug, Default, Clone, Copy)]
pub struct Trace;

impl<T: fmt::Display> Observer<T> for Trace {
    fn deposited(&self, e: &Event<'_, T>) {
        info!("{}: buffer[{}] = {}    [{}]", e.worker, e.slot, e.value, Dump(e.slots));
    }

    fn withdrawn(&self, e: &Event<'_, T>) {
        info!("{}: buffer[{}] = {}    [{}]", e.worker, e.slot, e.value, Dump(e.slots));
    }
}

/// Space separated rendering of a slot array.
pub struct Dump<'a, T>(pub &'a [T]);

impl<T: fmt::Display> fmt::Display for Dump<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{value}")?;
        }
        Ok(())
    }
}
