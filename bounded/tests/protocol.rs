use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Mutex,
    },
};

use bounded::{run, Config, Error, Event, Observer, Role, WorkerId};
use rand::Rng;

/// Checks every mutation it sees and keeps the values that went through.
#[derive(Default)]
struct Recorder {
    capacity: usize,
    max_occupancy: AtomicUsize,
    broken: AtomicBool,
    deposited: Mutex<Vec<u64>>,
    withdrawn: Mutex<Vec<u64>>,
}

impl Recorder {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            ..Default::default()
        }
    }

    fn check(&self, ok: bool) {
        if !ok {
            self.broken.store(true, Ordering::Relaxed);
        }
    }
}

impl Observer<u64> for Recorder {
    fn deposited(&self, e: &Event<'_, u64>) {
        // Occupancy is reported after the push, so a push into a full
        // ring would show up as capacity + 1.
        self.check((1..=self.capacity).contains(&e.occupancy));
        self.check(e.slots.len() == self.capacity && e.slots[e.slot] == e.value);
        self.check(e.worker.role == Role::Producer);
        self.max_occupancy.fetch_max(e.occupancy, Ordering::Relaxed);
        self.deposited.lock().unwrap().push(e.value);
    }

    fn withdrawn(&self, e: &Event<'_, u64>) {
        self.check(e.occupancy < self.capacity);
        self.check(e.slots[e.slot] == 0);
        self.check(e.worker.role == Role::Consumer);
        self.withdrawn.lock().unwrap().push(e.value);
    }
}

/// Every producer emits `index * 1_000_000 + n`, so values are unique.
fn unique_values(worker: WorkerId) -> impl FnMut() -> u64 {
    let base = worker.index as u64 * 1_000_000;
    let mut n = 0;
    move || {
        n += 1;
        base + n
    }
}

#[test]
#[ntest::timeout(60000)]
fn exact_accounting_across_shapes() {
    for (p, m) in [(1, 1), (5, 1), (1, 5), (7, 3), (8, 8)] {
        let config = Config::new(p, m);
        let report = run(&config, 0, unique_values, ()).unwrap();

        let snap = &report.snapshot;
        assert_eq!((snap.produced, snap.consumed), (100, 100), "P={p} M={m}");
        assert_eq!(report.deposits.len(), p);
        assert_eq!(report.withdrawals.len(), m);
        assert_eq!(report.deposits.iter().sum::<usize>(), 100);
        assert_eq!(report.withdrawals.iter().sum::<usize>(), 100);
        assert_eq!(snap.occupancy, 0);
        assert_eq!(snap.slots, vec![0; 10]);
    }
}

#[test]
#[ntest::timeout(60000)]
fn every_value_moves_exactly_once() {
    let config = Config::new(8, 8).with_capacity(4).with_quota(500);
    let recorder = Recorder::new(4);

    let report = run(&config, 0, unique_values, &recorder).unwrap();

    assert!(!recorder.broken.load(Ordering::Relaxed));
    assert!(recorder.max_occupancy.load(Ordering::Relaxed) <= 4);

    let mut deposited = recorder.deposited.into_inner().unwrap();
    let mut withdrawn = recorder.withdrawn.into_inner().unwrap();
    assert_eq!(deposited.len(), 500);
    deposited.sort_unstable();
    withdrawn.sort_unstable();
    assert_eq!(deposited, withdrawn);
    deposited.dedup();
    assert_eq!(deposited.len(), 500);

    assert_eq!(report.snapshot.slots, vec![0; 4]);
}

#[test]
#[ntest::timeout(60000)]
fn each_producer_stream_stays_in_order() {
    let config = Config::new(4, 4).with_capacity(3).with_quota(300);
    let recorder = Recorder::new(3);

    run(&config, 0, unique_values, &recorder).unwrap();

    // A ring is FIFO, so the values of one producer leave in the order
    // that producer deposited them.
    let mut last: HashMap<u64, u64> = HashMap::new();
    for value in recorder.withdrawn.into_inner().unwrap() {
        let prev = last.insert(value / 1_000_000, value);
        assert!(prev.map_or(true, |prev| prev < value), "{prev:?} then {value}");
    }
}

#[test]
#[ntest::timeout(10000)]
fn two_slot_scenario() {
    let config = Config::new(1, 1).with_capacity(2).with_quota(4);
    let recorder = Recorder::new(2);

    let report = run(&config, 0, unique_values, &recorder).unwrap();

    assert!(!recorder.broken.load(Ordering::Relaxed));
    assert!(recorder.max_occupancy.load(Ordering::Relaxed) <= 2);
    assert_eq!(
        recorder.withdrawn.into_inner().unwrap(),
        vec![1_000_001, 1_000_002, 1_000_003, 1_000_004]
    );

    let snap = report.snapshot;
    assert_eq!(snap.slots, vec![0, 0]);
    assert_eq!((snap.produced, snap.consumed), (4, 4));
    assert_eq!((snap.head, snap.tail), (0, 0));
    assert_eq!((report.deposits, report.withdrawals), (vec![4], vec![4]));
}

#[test]
#[ntest::timeout(60000)]
fn repeated_runs_agree_on_counts() {
    let config = Config::new(6, 2).with_capacity(5).with_quota(120);

    for _ in 0..5 {
        let report = run(&config, 0, unique_values, ()).unwrap();
        assert_eq!((report.snapshot.produced, report.snapshot.consumed), (120, 120));
        assert_eq!(report.snapshot.slots, vec![0; 5]);
    }
}

#[test]
#[ntest::timeout(30000)]
fn unequal_quotas_move_the_smaller() {
    for (produce, consume) in [(150, 60), (20, 90)] {
        let config = Config::new(3, 3).with_quotas(produce, consume);
        let report = run(&config, 0, unique_values, ()).unwrap();

        let expected = produce.min(consume);
        assert_eq!(report.snapshot.produced, expected);
        assert_eq!(report.snapshot.consumed, expected);
        assert_eq!(report.snapshot.occupancy, 0);
    }
}

#[test]
#[ntest::timeout(10000)]
fn more_workers_than_items() {
    let config = Config::new(8, 8).with_capacity(1).with_quota(3);
    let report = run(&config, 0, unique_values, ()).unwrap();

    assert_eq!(report.snapshot.produced, 3);
    assert_eq!(report.snapshot.consumed, 3);
    assert_eq!(report.snapshot.slots, vec![0]);
}

#[test]
fn bad_config_spawns_nothing() {
    let called = AtomicBool::new(false);
    let source = |_: WorkerId| {
        called.store(true, Ordering::Relaxed);
        || 1u64
    };

    for config in [Config::new(0, 2), Config::new(2, 0), Config::new(1, 1).with_capacity(0)] {
        assert!(matches!(run(&config, 0, source, ()), Err(Error::Config(_))));
    }
    assert!(!called.load(Ordering::Relaxed));
}

#[test]
#[ntest::timeout(120000)]
fn random_shapes_terminate() {
    let mut rng = rand::thread_rng();

    for _ in 0..40 {
        let config = Config::new(rng.gen_range(1..=8), rng.gen_range(1..=8))
            .with_capacity(rng.gen_range(1..=6))
            .with_quotas(rng.gen_range(1..=200), rng.gen_range(1..=200));

        let report = run(&config, 0, unique_values, ()).unwrap();

        let quota = config.effective_quota();
        assert_eq!(report.snapshot.produced, quota, "{config:?}");
        assert_eq!(report.snapshot.consumed, quota, "{config:?}");
        assert!(report.snapshot.slots.iter().all(|&v| v == 0));
    }
}

struct Explodes;

impl Observer<u64> for Explodes {
    fn deposited(&self, e: &Event<'_, u64>) {
        if e.value == 1_000_005 {
            panic!("observer failure");
        }
    }
}

#[test]
#[ntest::timeout(30000)]
fn panicking_worker_fails_the_join() {
    let config = Config::new(1, 3).with_capacity(2);

    match run(&config, 0, unique_values, Explodes) {
        Err(Error::Join { worker }) => assert_eq!(worker, WorkerId::producer(1)),
        other => panic!("unexpected outcome: {other:?}"),
    }
}
