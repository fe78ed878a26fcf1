//! World wide scheduled tick storage.

use std::collections::BinaryHeap;

use loam_utils::BlockPos;
use rustc_hash::FxHashMap;

use super::{ScheduledTick, TickKey};

/// Ordered, deduplicated set of future block updates.
///
/// Every key (position, block identity) has at most one pending tick: the
/// furthest one requested. Asking for a tick at or before the pending one is a
/// no-op, asking for a later one moves the pending tick out. Superseded heap
/// entries stay in the heap and are skipped when they surface.
pub struct ScheduledTickQueue {
    /// Ordered by trigger tick, then submission order. May contain stale entries.
    tick_queue: BinaryHeap<ScheduledTick>,
    /// The single live `(trigger_tick, sub_tick_order)` per key.
    furthest: FxHashMap<TickKey, (u64, u64)>,
    next_sub_tick_order: u64,
}

impl ScheduledTickQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tick_queue: BinaryHeap::new(),
            furthest: FxHashMap::default(),
            next_sub_tick_order: 0,
        }
    }

    /// Schedules an update for the block with identity `hash` at `pos`,
    /// `delay` ticks after `current_tick`. A delay of zero is treated as one.
    ///
    /// Returns `true` if the request became the pending tick for its key,
    /// `false` if an equal or later tick was already pending.
    pub fn schedule(&mut self, pos: BlockPos, hash: u64, current_tick: u64, delay: u64) -> bool {
        let trigger_tick = current_tick.saturating_add(delay.max(1));
        let key = TickKey { pos, hash };
        if let Some(&(existing, _)) = self.furthest.get(&key)
            && existing >= trigger_tick
        {
            return false;
        }

        let sub_tick_order = self.next_sub_tick_order;
        self.next_sub_tick_order += 1;
        self.furthest.insert(key, (trigger_tick, sub_tick_order));
        self.tick_queue
            .push(ScheduledTick::new(pos, hash, trigger_tick, sub_tick_order));
        true
    }

    /// The trigger tick of the pending update for a key, if any.
    #[must_use]
    pub fn pending(&self, pos: BlockPos, hash: u64) -> Option<u64> {
        self.furthest
            .get(&TickKey { pos, hash })
            .map(|&(trigger, _)| trigger)
    }

    /// Removes and returns every pending tick due at or before `current_tick`,
    /// in trigger then submission order. Superseded entries are purged on the way.
    pub fn drain_due(&mut self, current_tick: u64) -> Vec<ScheduledTick> {
        let mut due = Vec::new();
        while let Some(tick) = self.tick_queue.peek() {
            if tick.trigger_tick > current_tick {
                break;
            }
            let Some(tick) = self.tick_queue.pop() else {
                break;
            };
            let key = tick.key();
            if self.furthest.get(&key) == Some(&(tick.trigger_tick, tick.sub_tick_order)) {
                self.furthest.remove(&key);
                due.push(tick);
            }
        }
        due
    }

    /// Number of live pending ticks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.furthest.len()
    }

    /// Whether nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.furthest.is_empty()
    }
}

impl Default for ScheduledTickQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const P: BlockPos = BlockPos::new(1, 64, 1);

    #[test]
    fn test_later_request_wins() {
        let mut queue = ScheduledTickQueue::new();
        assert!(queue.schedule(P, 7, 100, 5));
        assert!(!queue.schedule(P, 7, 101, 1));
        assert_eq!(queue.pending(P, 7), Some(105));

        assert!(queue.drain_due(102).is_empty());
        let fired = queue.drain_due(105);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].trigger_tick, 105);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_earlier_tick_is_superseded() {
        let mut queue = ScheduledTickQueue::new();
        assert!(queue.schedule(P, 7, 100, 1));
        assert!(queue.schedule(P, 7, 100, 10));
        assert_eq!(queue.len(), 1);
        assert!(queue.drain_due(101).is_empty());
        assert_eq!(queue.drain_due(110).len(), 1);
    }

    #[test]
    fn test_zero_delay_is_one_tick() {
        let mut queue = ScheduledTickQueue::new();
        queue.schedule(P, 1, 20, 0);
        assert_eq!(queue.pending(P, 1), Some(21));
        assert!(queue.drain_due(20).is_empty());
        assert_eq!(queue.drain_due(21).len(), 1);
    }

    #[test]
    fn test_distinct_blocks_are_distinct_keys() {
        let mut queue = ScheduledTickQueue::new();
        assert!(queue.schedule(P, 1, 0, 3));
        assert!(queue.schedule(P, 2, 0, 3));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_same_tick_fires_in_submission_order() {
        let mut queue = ScheduledTickQueue::new();
        let positions = [P, P.offset(1, 0, 0), P.offset(2, 0, 0)];
        for pos in positions {
            queue.schedule(pos, 9, 0, 4);
        }
        let fired: Vec<_> = queue.drain_due(4).into_iter().map(|t| t.pos).collect();
        assert_eq!(fired, positions);
    }
}
