/// Fixed-capacity ring of slots.
///
/// Consumed slots are overwritten with the sentinel, so `slots()` always
/// shows which positions currently hold data. The store does no locking of
/// its own; it is only reachable through [`crate::Monitor`].
#[derive(Debug, Clone)]
pub struct RingStore<T> {
    slots: Box<[T]>,
    sentinel: T,
    head: usize,
    tail: usize,
    occupancy: usize,
}

impl<T: Copy> RingStore<T> {
    pub fn new(capacity: usize, sentinel: T) -> Self {
        assert!(capacity > 0, "ring capacity must be positive");
        Self {
            slots: vec![sentinel; capacity].into_boxed_slice(),
            sentinel,
            head: 0,
            tail: 0,
            occupancy: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn occupancy(&self) -> usize {
        self.occupancy
    }

    /// Next write index.
    pub fn head(&self) -> usize {
        self.head
    }

    /// Next read index.
    pub fn tail(&self) -> usize {
        self.tail
    }

    pub fn sentinel(&self) -> T {
        self.sentinel
    }

    pub fn slots(&self) -> &[T] {
        &self.slots
    }

    pub fn is_full(&self) -> bool {
        self.occupancy == self.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.occupancy == 0
    }

    /// Writes `value` at the head and returns the slot index used.
    ///
    /// # Panics
    /// If the ring is full.
    pub fn push(&mut self, value: T) -> usize {
        assert!(!self.is_full(), "push into a full ring");

        let slot = self.head;
        self.slots[slot] = value;
        self.head = (self.head + 1) % self.capacity();
        self.occupancy += 1;
        slot
    }

    /// Takes the value at the tail, leaving the sentinel behind.
    ///
    /// # Panics
    /// If the ring is empty.
    pub fn pop(&mut self) -> (usize, T) {
        assert!(!self.is_empty(), "pop from an empty ring");

        let slot = self.tail;
        let value = std::mem::replace(&mut self.slots[slot], self.sentinel);
        self.tail = (self.tail + 1) % self.capacity();
        self.occupancy -= 1;
        (slot, value)
    }
}

#[cfg(test)]
mod test {
    use super::RingStore;

    #[test]
    fn basic() {
        let mut ring = RingStore::new(3, 0);
        assert!(ring.is_empty());

        assert_eq!(ring.push(7), 0);
        assert_eq!(ring.push(8), 1);
        assert_eq!(ring.slots(), &[7, 8, 0]);

        assert_eq!(ring.pop(), (0, 7));
        assert_eq!(ring.slots(), &[0, 8, 0]);
        assert_eq!(ring.occupancy(), 1);
    }

    #[test]
    fn wraps_around() {
        let mut ring = RingStore::new(2, 0);
        for value in 1..=5 {
            let slot = ring.push(value);
            assert_eq!(slot, (value as usize - 1) % 2);
            assert_eq!(ring.pop(), (slot, value));
        }
        assert_eq!(ring.head(), 1);
        assert_eq!(ring.tail(), 1);
        assert_eq!(ring.slots(), &[0, 0]);
    }

    #[test]
    fn full_with_equal_cursors() {
        let mut ring = RingStore::new(2, -1);
        ring.push(1);
        ring.push(2);
        assert_eq!(ring.head(), ring.tail());
        assert!(ring.is_full());
        assert!(!ring.is_empty());
    }

    #[test]
    #[should_panic(expected = "full ring")]
    fn push_when_full() {
        let mut ring = RingStore::new(1, 0);
        ring.push(1);
        ring.push(2);
    }

    #[test]
    #[should_panic(expected = "empty ring")]
    fn pop_when_empty() {
        let mut ring: RingStore<u8> = RingStore::new(4, 0);
        ring.pop();
    }
}
