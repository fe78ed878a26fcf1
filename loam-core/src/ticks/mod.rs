//! Scheduled block updates.
//!
//! Blocks ask for a future update at a position through
//! [`Tx::schedule_block_update`](crate::world::Tx::schedule_block_update). The
//! [`ScheduledTickQueue`] keeps those requests ordered by trigger tick and
//! submission order and hands the due ones back to the world ticker, which
//! checks that the block is still the one that asked before dispatching.

mod scheduled_tick;
mod tick_queue;

pub use scheduled_tick::{ScheduledTick, TickKey};
pub use tick_queue::ScheduledTickQueue;
