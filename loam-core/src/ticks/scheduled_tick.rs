//! Scheduled tick types.

use std::cmp::Ordering;

use loam_utils::BlockPos;

/// A pending update for the block at `pos`.
#[derive(Debug, Clone, Copy)]
pub struct ScheduledTick {
    /// The position of the block.
    pub pos: BlockPos,
    /// Identity hash of the block state that asked for the update.
    pub hash: u64,
    /// The absolute world tick when this should fire.
    pub trigger_tick: u64,
    /// Submission order, used to break ties between ticks firing on the same
    /// world tick. Lower values run first.
    pub sub_tick_order: u64,
}

impl ScheduledTick {
    /// Creates a new scheduled tick.
    #[must_use]
    pub const fn new(pos: BlockPos, hash: u64, trigger_tick: u64, sub_tick_order: u64) -> Self {
        Self {
            pos,
            hash,
            trigger_tick,
            sub_tick_order,
        }
    }

    /// The deduplication key of this tick.
    #[must_use]
    pub const fn key(&self) -> TickKey {
        TickKey {
            pos: self.pos,
            hash: self.hash,
        }
    }
}

impl PartialEq for ScheduledTick {
    fn eq(&self, other: &Self) -> bool {
        self.trigger_tick == other.trigger_tick && self.sub_tick_order == other.sub_tick_order
    }
}

impl Eq for ScheduledTick {}

impl PartialOrd for ScheduledTick {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledTick {
    /// `BinaryHeap` is a max-heap, so the comparison is reversed to pop the
    /// earliest tick first.
    fn cmp(&self, other: &Self) -> Ordering {
        match other.trigger_tick.cmp(&self.trigger_tick) {
            Ordering::Equal => other.sub_tick_order.cmp(&self.sub_tick_order),
            ord => ord,
        }
    }
}

/// Key for deduplication: a position and the block that asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickKey {
    /// The position of the block.
    pub pos: BlockPos,
    /// Identity hash of the block state.
    pub hash: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_ordering() {
        let pos = BlockPos::new(0, 0, 0);

        // Earlier trigger tick comes first.
        let tick1 = ScheduledTick::new(pos, 1, 100, 0);
        let tick2 = ScheduledTick::new(pos, 1, 200, 0);
        assert!(tick1 > tick2);

        // Same trigger tick, lower sub tick order comes first.
        let tick3 = ScheduledTick::new(pos, 1, 100, 5);
        let tick4 = ScheduledTick::new(pos, 1, 100, 10);
        assert!(tick3 > tick4);
    }
}
