//! Policies deciding which chunks a loader keeps loaded.

use std::sync::Arc;

use loam_utils::{ChunkPos, locks::SyncRwLock};
use rustc_hash::FxHashSet;

/// Decides which chunks a [`Loader`](super::Loader) loads around its reference position.
pub trait LoadStrategy: Send + Sync {
    /// Positions to load for `reference`, closest first.
    fn load(&self, reference: ChunkPos) -> Vec<ChunkPos>;

    /// Whether the loaded `pos` should be dropped now that the loader is at `reference`.
    fn unload(&self, pos: ChunkPos, reference: ChunkPos) -> bool;
}

fn closest_first(mut positions: Vec<ChunkPos>, reference: ChunkPos) -> Vec<ChunkPos> {
    positions.sort_by_key(|p| p.distance_squared(reference));
    positions
}

/// Every chunk within a euclidean distance, in chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadRadius {
    radius: i32,
}

impl LoadRadius {
    /// Creates a strategy loading chunks within `radius` chunks. Negative radii load nothing.
    #[must_use]
    pub const fn new(radius: i32) -> Self {
        Self { radius }
    }

    /// The radius in chunks.
    #[must_use]
    pub const fn radius(&self) -> i32 {
        self.radius
    }

    fn radius_squared(&self) -> i64 {
        i64::from(self.radius) * i64::from(self.radius)
    }
}

impl LoadStrategy for LoadRadius {
    fn load(&self, reference: ChunkPos) -> Vec<ChunkPos> {
        if self.radius < 0 {
            return Vec::new();
        }
        let r = self.radius;
        let mut positions = Vec::new();
        for dx in -r..=r {
            for dz in -r..=r {
                let pos = ChunkPos::new(reference.x() + dx, reference.z() + dz);
                if pos.distance_squared(reference) <= self.radius_squared() {
                    positions.push(pos);
                }
            }
        }
        closest_first(positions, reference)
    }

    fn unload(&self, pos: ChunkPos, reference: ChunkPos) -> bool {
        self.radius < 0 || pos.distance_squared(reference) > self.radius_squared()
    }
}

/// Every chunk in a rectangle centred on the reference position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadArea {
    half_width: i32,
    half_depth: i32,
}

impl LoadArea {
    /// Creates a strategy loading chunks at most `half_width` away on x and `half_depth` on z.
    #[must_use]
    pub const fn new(half_width: i32, half_depth: i32) -> Self {
        Self {
            half_width,
            half_depth,
        }
    }
}

impl LoadStrategy for LoadArea {
    fn load(&self, reference: ChunkPos) -> Vec<ChunkPos> {
        let mut positions = Vec::new();
        for dx in -self.half_width..=self.half_width {
            for dz in -self.half_depth..=self.half_depth {
                positions.push(ChunkPos::new(reference.x() + dx, reference.z() + dz));
            }
        }
        closest_first(positions, reference)
    }

    fn unload(&self, pos: ChunkPos, reference: ChunkPos) -> bool {
        (pos.x() - reference.x()).abs() > self.half_width
            || (pos.z() - reference.z()).abs() > self.half_depth
    }
}

/// A fixed rectangle of chunks, independent of where the loader is. Nothing
/// in it is ever unloaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadRegion {
    min: ChunkPos,
    max: ChunkPos,
}

impl LoadRegion {
    /// Creates a strategy loading every chunk between two corners, inclusive.
    #[must_use]
    pub fn new(a: ChunkPos, b: ChunkPos) -> Self {
        Self {
            min: ChunkPos::new(a.x().min(b.x()), a.z().min(b.z())),
            max: ChunkPos::new(a.x().max(b.x()), a.z().max(b.z())),
        }
    }
}

impl LoadStrategy for LoadRegion {
    fn load(&self, reference: ChunkPos) -> Vec<ChunkPos> {
        let mut positions = Vec::new();
        for x in self.min.x()..=self.max.x() {
            for z in self.min.z()..=self.max.z() {
                positions.push(ChunkPos::new(x, z));
            }
        }
        closest_first(positions, reference)
    }

    fn unload(&self, _pos: ChunkPos, _reference: ChunkPos) -> bool {
        false
    }
}

/// An explicit set of chunks, edited through any clone of the strategy.
///
/// Edits take effect on the loader's next [`refresh`](super::Loader::refresh).
#[derive(Debug, Clone, Default)]
pub struct LoadManual {
    positions: Arc<SyncRwLock<FxHashSet<ChunkPos>>>,
}

impl LoadManual {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a chunk. Returns false if it was already in the set.
    pub fn add(&self, pos: ChunkPos) -> bool {
        self.positions.write().insert(pos)
    }

    /// Removes a chunk. Returns false if it wasn't in the set.
    pub fn remove(&self, pos: ChunkPos) -> bool {
        self.positions.write().remove(&pos)
    }

    /// Whether a chunk is in the set.
    #[must_use]
    pub fn contains(&self, pos: ChunkPos) -> bool {
        self.positions.read().contains(&pos)
    }
}

impl LoadStrategy for LoadManual {
    fn load(&self, reference: ChunkPos) -> Vec<ChunkPos> {
        let positions = self.positions.read().iter().copied().collect();
        closest_first(positions, reference)
    }

    fn unload(&self, pos: ChunkPos, _reference: ChunkPos) -> bool {
        !self.contains(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_radius_closest_first_without_duplicates() {
        let positions = LoadRadius::new(2).load(ChunkPos::new(0, 0));
        assert_eq!(positions[0], ChunkPos::new(0, 0));
        let unique: FxHashSet<ChunkPos> = positions.iter().copied().collect();
        assert_eq!(unique.len(), positions.len());
        // 1 + 4 + 4 + 4 on and inside the circle of radius 2.
        assert_eq!(positions.len(), 13);
        let last = positions[positions.len() - 1];
        assert_eq!(last.distance_squared(ChunkPos::new(0, 0)), 4);
        let distances: Vec<i64> = positions
            .iter()
            .map(|p| p.distance_squared(ChunkPos::new(0, 0)))
            .collect();
        assert!(distances.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_radius_unload_is_euclidean() {
        let strategy = LoadRadius::new(2);
        let origin = ChunkPos::new(0, 0);
        assert!(!strategy.unload(ChunkPos::new(2, 0), origin));
        assert!(strategy.unload(ChunkPos::new(2, 1), origin));
        assert!(strategy.unload(ChunkPos::new(2, 2), origin));
        assert!(!strategy.unload(ChunkPos::new(-1, -1), origin));
    }

    #[test]
    fn test_area_unload_per_axis() {
        let strategy = LoadArea::new(2, 1);
        let reference = ChunkPos::new(10, 10);
        assert!(!strategy.unload(ChunkPos::new(12, 11), reference));
        assert!(strategy.unload(ChunkPos::new(13, 10), reference));
        assert!(strategy.unload(ChunkPos::new(10, 8), reference));
        assert_eq!(strategy.load(reference).len(), 5 * 3);
    }

    #[test]
    fn test_region_never_unloads() {
        let strategy = LoadRegion::new(ChunkPos::new(3, 3), ChunkPos::new(1, 2));
        let positions = strategy.load(ChunkPos::new(100, 100));
        assert_eq!(positions.len(), 3 * 2);
        assert_eq!(positions[0], ChunkPos::new(3, 3));
        assert!(!strategy.unload(ChunkPos::new(1, 2), ChunkPos::new(-100, 0)));
    }

    #[test]
    fn test_manual_set_shared_between_clones() {
        let strategy = LoadManual::new();
        let handle = strategy.clone();
        assert!(handle.add(ChunkPos::new(5, 5)));
        assert!(!handle.add(ChunkPos::new(5, 5)));
        assert_eq!(strategy.load(ChunkPos::new(0, 0)), vec![ChunkPos::new(5, 5)]);
        assert!(handle.remove(ChunkPos::new(5, 5)));
        assert!(strategy.unload(ChunkPos::new(5, 5), ChunkPos::new(0, 0)));
    }
}
