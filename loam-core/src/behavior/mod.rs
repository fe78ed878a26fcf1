//! Block behaviour.
//!
//! Per block logic is attached to runtime ids through [`BlockBehaviours`].
//! The engine only asks a behaviour which capabilities it has; what a block
//! does with them is up to the implementation.

mod block;
mod registry;

pub use block::{BlockBehaviour, NeighbourUpdateTicker, RandomTicker, ScheduledTicker};
pub use registry::BlockBehaviours;
