//! Discrete event queue driving a zone's simulated time.

use std::{cmp::Reverse, collections::BinaryHeap};

use crate::Instant;

struct Entry<T> {
    key: Reverse<(Instant, u64)>,
    item: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key.cmp(&other.key)
    }
}

/// Min-queue of pending items keyed by due time and insertion order.
///
/// Items due on the same tick come out in the order they were scheduled.
pub struct Scheduler<T> {
    now: Instant,
    order: u64,
    heap: BinaryHeap<Entry<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Scheduler {
            now: Instant::default(),
            order: 0,
            heap: BinaryHeap::new(),
        }
    }
}

impl<T> Scheduler<T> {
    pub fn now(&self) -> Instant {
        self.now
    }

    /// Queue `item` to come due `delay` ticks from now.
    ///
    /// Panics on negative delay, the past can't be scheduled.
    pub fn schedule(&mut self, delay: i64, item: T) {
        assert!(delay >= 0, "negative schedule delay {delay}");
        self.order += 1;
        self.heap.push(Entry {
            key: Reverse((self.now + delay, self.order)),
            item,
        });
    }

    /// Take the next item due at or before `target`, moving the clock to
    /// its due time.
    pub fn pop_due(&mut self, target: Instant) -> Option<T> {
        let Reverse((at, _)) = self.heap.peek()?.key;
        if at > target {
            return None;
        }
        let entry = self.heap.pop()?;
        self.now = self.now.max(at);
        Some(entry.item)
    }

    /// Move the clock forward to `target` once its due items are drained.
    pub fn settle(&mut self, target: Instant) {
        debug_assert!(target >= self.now);
        self.now = target;
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Pending items in no particular order.
    pub fn pending(&self) -> impl Iterator<Item = &T> {
        self.heap.iter().map(|e| &e.item)
    }
}

#[cfg(test)]
mod test {
    use quickcheck_macros::quickcheck;

    use super::*;

    fn drain(s: &mut Scheduler<u32>, delta: i64) -> Vec<(u32, i64)> {
        let target = s.now() + delta;
        let mut ret = Vec::new();
        while let Some(x) = s.pop_due(target) {
            ret.push((x, s.now().ticks()));
        }
        s.settle(target);
        ret
    }

    #[test]
    fn same_tick_is_fifo() {
        let mut s = Scheduler::default();
        s.schedule(5, 1);
        s.schedule(3, 2);
        s.schedule(5, 3);
        s.schedule(5, 4);
        assert_eq!(drain(&mut s, 10), vec![(2, 3), (1, 5), (3, 5), (4, 5)]);
        assert_eq!(s.now().ticks(), 10);
    }

    #[test]
    fn rescheduling_during_drain() {
        let mut s = Scheduler::default();
        s.schedule(2, 0u32);
        let target = s.now() + 7;
        let mut seen = Vec::new();
        while let Some(x) = s.pop_due(target) {
            seen.push((x, s.now().ticks()));
            // Self-rescheduling relative to the popped event's own time.
            s.schedule(2, x + 1);
        }
        s.settle(target);
        assert_eq!(seen, vec![(0, 2), (1, 4), (2, 6)]);
        assert_eq!(s.len(), 1);
        assert_eq!(drain(&mut s, 1), vec![(3, 8)]);
    }

    #[test]
    #[should_panic]
    fn negative_delay_is_a_bug() {
        let mut s = Scheduler::default();
        s.schedule(-1, ());
    }

    #[quickcheck]
    fn clock_lands_on_target(delays: Vec<u8>, delta: u8) -> bool {
        let mut s = Scheduler::default();
        for (i, d) in delays.iter().enumerate() {
            s.schedule(*d as i64, i as u32);
        }
        let fired = drain(&mut s, delta as i64);
        s.now().ticks() == delta as i64
            && fired.len() == delays.iter().filter(|&&d| d <= delta).count()
            && fired.windows(2).all(|w| w[0].1 <= w[1].1)
    }
}
