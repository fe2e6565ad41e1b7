//! Bounded-buffer producer/consumer protocol over pthread primitives.
//!
//! Producers and consumers share one [`Monitor`]: a mutex-guarded
//! [`RingStore`] plus "not-full" and "not-empty" condition variables. A run
//! ends once a global quota of items has been produced and consumed, and
//! every slot is back to the sentinel.

use std::{fmt, io};

use libc::c_int;

pub mod coordinator;
pub mod monitor;
pub mod observe;
pub mod store;
pub mod sync;
pub mod worker;

pub use coordinator::{run, Report};
pub use monitor::{Monitor, Snapshot};
pub use observe::{Event, Observer, Trace};
pub use store::RingStore;

pub const DEFAULT_CAPACITY: usize = 10;
pub const DEFAULT_QUOTA: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("operation {op} failed: code {code}")]
    Primitive { op: &'static str, code: c_int },
    #[error("failed to spawn {worker}")]
    Spawn {
        worker: WorkerId,
        #[source]
        source: io::Error,
    },
    #[error("failed to join {worker}")]
    Join { worker: WorkerId },
}

pub(crate) trait CheckOk {
    fn r(self, op: &'static str) -> Result<(), Error>;
}

impl CheckOk for c_int {
    fn r(self, op: &'static str) -> Result<(), Error> {
        if self != 0 {
            return Err(Error::Primitive { op, code: self });
        }
        Ok(())
    }
}

/// Shape of one run.
///
/// The two quotas may differ; a run moves `min(produce_quota, consume_quota)`
/// items so that nothing is left in the ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub producers: usize,
    pub consumers: usize,
    pub capacity: usize,
    pub produce_quota: usize,
    pub consume_quota: usize,
}

impl Config {
    pub fn new(producers: usize, consumers: usize) -> Self {
        Self {
            producers,
            consumers,
            capacity: DEFAULT_CAPACITY,
            produce_quota: DEFAULT_QUOTA,
            consume_quota: DEFAULT_QUOTA,
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets both quotas.
    pub fn with_quota(mut self, quota: usize) -> Self {
        self.produce_quota = quota;
        self.consume_quota = quota;
        self
    }

    pub fn with_quotas(mut self, produce: usize, consume: usize) -> Self {
        self.produce_quota = produce;
        self.consume_quota = consume;
        self
    }

    /// Number of items a run actually moves through the ring.
    pub fn effective_quota(&self) -> usize {
        self.produce_quota.min(self.consume_quota)
    }

    pub fn validate(&self) -> Result<(), Error> {
        let fields = [
            ("producer count", self.producers),
            ("consumer count", self.consumers),
            ("capacity", self.capacity),
            ("production quota", self.produce_quota),
            ("consumption quota", self.consume_quota),
        ];
        for (name, value) in fields {
            if value == 0 {
                return Err(Error::Config(format!("{name} must be positive")));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Producer,
    Consumer,
}

/// Identity of a worker, 1-based within its role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkerId {
    pub role: Role,
    pub index: usize,
}

impl WorkerId {
    pub fn producer(index: usize) -> Self {
        Self {
            role: Role::Producer,
            index,
        }
    }

    pub fn consumer(index: usize) -> Self {
        Self {
            role: Role::Consumer,
            index,
        }
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.role {
            Role::Producer => 'P',
            Role::Consumer => 'C',
        };
        write!(f, "{tag}{}", self.index)
    }
}
