//! Lock aliases so the rest of the workspace does not name `parking_lot` directly.

/// A synchronous mutex. Never hold one across a transaction boundary.
pub type SyncMutex<T> = parking_lot::Mutex<T>;
/// Guard returned by [`SyncMutex::lock`].
pub type SyncMutexGuard<'a, T> = parking_lot::MutexGuard<'a, T>;
/// A synchronous reader-writer lock.
pub type SyncRwLock<T> = parking_lot::RwLock<T>;
