use tracing::{debug, warn};

use crate::{
    observe::{Event, Observer},
    store::RingStore,
    sync::{Condvar, Mutex},
    Error, WorkerId,
};

/// Everything the lock guards.
#[derive(Debug)]
struct State<T> {
    store: RingStore<T>,
    produced: usize,
    consumed: usize,
    aborted: bool,
}

impl<T> State<T> {
    fn production_open(&self, quota: usize) -> bool {
        !self.aborted && self.produced < quota
    }

    fn consumption_open(&self, quota: usize) -> bool {
        !self.aborted && self.consumed < quota
    }
}

/// Consistent copy of the monitor's state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot<T> {
    pub slots: Vec<T>,
    pub head: usize,
    pub tail: usize,
    pub occupancy: usize,
    pub produced: usize,
    pub consumed: usize,
}

/// Bounded buffer monitor.
///
/// Producers block in [`Monitor::deposit`] while the ring is full, consumers
/// block in [`Monitor::withdraw`] while it is empty. Both give up once the
/// shared quota for their side has been reached by anyone.
#[derive(Debug)]
pub struct Monitor<T, O = ()> {
    state: Mutex<State<T>>,
    not_full: Condvar,
    not_empty: Condvar,
    quota: usize,
    observer: O,
}

impl<T: Copy + Send, O: Observer<T>> Monitor<T, O> {
    pub fn new(capacity: usize, quota: usize, sentinel: T, observer: O) -> Result<Self, Error> {
        if capacity == 0 || quota == 0 {
            return Err(Error::Config(format!(
                "capacity ({capacity}) and quota ({quota}) must be positive"
            )));
        }

        Ok(Self {
            state: Mutex::new(State {
                store: RingStore::new(capacity, sentinel),
                produced: 0,
                consumed: 0,
                aborted: false,
            })?,
            not_full: Condvar::new()?,
            not_empty: Condvar::new()?,
            quota,
            observer,
        })
    }

    pub fn quota(&self) -> usize {
        self.quota
    }

    pub fn production_open(&self) -> bool {
        self.state.lock().production_open(self.quota)
    }

    pub fn consumption_open(&self) -> bool {
        self.state.lock().consumption_open(self.quota)
    }

    /// Puts `value` into the ring, waiting for a free slot.
    ///
    /// Returns `false` without touching the ring when the production quota
    /// was reached while this producer was on its way in.
    pub fn deposit(&self, worker: WorkerId, value: T) -> bool {
        let quota = self.quota;
        let mut state = self.not_full.wait_while(self.state.lock(), |s| {
            s.store.is_full() && s.production_open(quota)
        });

        if !state.production_open(quota) {
            debug!("{worker} lagged behind the production quota");
            return false;
        }

        let slot = state.store.push(value);
        state.produced += 1;

        self.observer.deposited(&Event {
            worker,
            slot,
            value,
            occupancy: state.store.occupancy(),
            slots: state.store.slots(),
        });

        self.not_empty.signal();
        if state.produced == quota {
            // Producers parked on a full ring would otherwise wait for
            // slots nobody needs to free.
            self.not_full.broadcast();
        }
        true
    }

    /// Takes the oldest value out of the ring, waiting for one to arrive.
    ///
    /// Returns `None` once the consumption quota has been reached.
    pub fn withdraw(&self, worker: WorkerId) -> Option<T> {
        let quota = self.quota;
        let mut state = self.not_empty.wait_while(self.state.lock(), |s| {
            s.store.is_empty() && s.consumption_open(quota)
        });

        if !state.consumption_open(quota) {
            debug!("{worker} lagged behind the consumption quota");
            return None;
        }

        let (slot, value) = state.store.pop();
        state.consumed += 1;

        self.observer.withdrawn(&Event {
            worker,
            slot,
            value,
            occupancy: state.store.occupancy(),
            slots: state.store.slots(),
        });

        self.not_full.signal();
        if state.consumed == quota {
            self.not_empty.broadcast();
        }
        Some(value)
    }

    /// Closes both sides and wakes every waiter.
    pub fn abort(&self) {
        let mut state = self.state.lock();
        if !state.aborted {
            warn!(
                "aborting with {} produced and {} consumed",
                state.produced, state.consumed
            );
        }
        state.aborted = true;
        self.not_full.broadcast();
        self.not_empty.broadcast();
    }

    pub fn snapshot(&self) -> Snapshot<T> {
        let state = self.state.lock();
        Snapshot {
            slots: state.store.slots().to_vec(),
            head: state.store.head(),
            tail: state.store.tail(),
            occupancy: state.store.occupancy(),
            produced: state.produced,
            consumed: state.consumed,
        }
    }
}
