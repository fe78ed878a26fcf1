//! # Loam utils
//!
//! Shared coordinate types, small vector math and lock aliases used by every
//! other loam crate.

pub mod locks;
pub mod math;
mod types;

pub use types::{
    BlockPos, BlockStateId, ChunkPos, Face, Identifier, SUB_CHUNK_SIZE,
};
