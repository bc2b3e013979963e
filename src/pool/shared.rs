//! Lock-guarded pool shared across tasks
//!
//! `ConnectionPool` has no internal locking. When more than one task needs
//! the same pool (the health server and the warm-up task in the binary, for
//! instance) it goes behind a `SharedPool`. Every call holds the lock for its
//! own duration; traversal works on a [`snapshot`](SharedPool::snapshot).

use crate::connection::Connection;
use crate::pool::registry::{ConnectionPool, LookupKey};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

/// Cloneable handle to a pool behind a read/write lock
pub struct SharedPool<C: ?Sized> {
    inner: Arc<RwLock<ConnectionPool<C>>>,
}

impl<C: ?Sized> Clone for SharedPool<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: ?Sized> Default for SharedPool<C> {
    fn default() -> Self {
        Self::from_pool(ConnectionPool::new())
    }
}

impl<C: ?Sized> SharedPool<C> {
    /// Create an empty shared pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing pool
    pub fn from_pool(pool: ConnectionPool<C>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(pool)),
        }
    }

    // A panic while holding the lock cannot leave the map half-updated,
    // so a poisoned lock is still usable.
    fn lock_read(&self) -> RwLockReadGuard<'_, ConnectionPool<C>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_write(&self) -> RwLockWriteGuard<'_, ConnectionPool<C>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` with shared access
    pub fn read<R>(&self, f: impl FnOnce(&ConnectionPool<C>) -> R) -> R {
        f(&self.lock_read())
    }

    /// Run `f` with exclusive access
    pub fn write<R>(&self, f: impl FnOnce(&mut ConnectionPool<C>) -> R) -> R {
        f(&mut self.lock_write())
    }

    pub fn add(&self, connection: Arc<C>) -> Option<usize> {
        self.lock_write().add(connection)
    }

    pub fn get(&self, key: usize) -> Option<Arc<C>> {
        self.lock_read().get(key).cloned()
    }

    pub fn remove(&self, key: usize) -> Option<Arc<C>> {
        self.lock_write().remove(key)
    }

    pub fn len(&self) -> usize {
        self.lock_read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_read().is_empty()
    }

    pub fn shuffle(&self) {
        self.lock_write().shuffle();
    }

    /// Connections in current order, detached from the lock
    pub fn snapshot(&self) -> Vec<Arc<C>> {
        self.lock_read().iter().map(|(_, c)| Arc::clone(c)).collect()
    }
}

impl<C: Connection + ?Sized> SharedPool<C> {
    pub fn has_connection(&self, connection: &C) -> bool {
        self.lock_read().has_connection(connection)
    }

    pub fn find<'k>(&self, key: impl Into<LookupKey<'k>>) -> Option<Arc<C>> {
        self.lock_read().find(key).cloned()
    }

    /// Register `connection` unless a connection to the same address exists
    ///
    /// Returns the registered handle and whether it was newly added. The
    /// check and the insert happen under one write lock. A handle the pool
    /// has no key left for is returned with `false`.
    pub fn add_unique(&self, connection: Arc<C>) -> (Arc<C>, bool) {
        let mut pool = self.lock_write();

        if let Some(existing) = pool.find(connection.address()) {
            debug!(address = connection.address(), "Connection already registered");
            return (Arc::clone(existing), false);
        }

        let added = pool.add(Arc::clone(&connection)).is_some();
        (connection, added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::testing::FakeConnection;
    use crate::pool::Slot;

    #[test]
    fn add_unique_deduplicates_by_address() {
        let shared = SharedPool::new();
        let first = FakeConnection::arc("a:4150");

        let (registered, added) = shared.add_unique(first.clone());
        assert!(added);
        assert!(Arc::ptr_eq(&registered, &first));

        let (registered, added) = shared.add_unique(FakeConnection::arc("a:4150"));
        assert!(!added);
        assert!(Arc::ptr_eq(&registered, &first));
        assert_eq!(shared.len(), 1);
    }

    #[test]
    fn snapshot_is_detached_from_later_mutation() {
        let shared = SharedPool::new();
        shared.add(FakeConnection::arc("a:1"));
        shared.add(FakeConnection::arc("b:2"));

        let snapshot = shared.snapshot();
        shared.remove(0);

        assert_eq!(snapshot.len(), 2);
        assert_eq!(shared.len(), 1);
    }

    #[test]
    fn clones_share_one_pool() {
        let shared: SharedPool<FakeConnection> = SharedPool::new();
        let other = shared.clone();
        let handle = FakeConnection::arc("a:1");

        other.add(handle.clone());
        assert!(shared.has_connection(&handle));
        assert!(shared.find("a:1").is_some());
        assert!(Arc::ptr_eq(&shared.get(0).unwrap(), &handle));
    }

    #[test]
    fn write_runs_compound_updates_under_one_lock() {
        let shared = SharedPool::new();
        for address in ["a:1", "b:2", "a:1", "c:3", "b:2"] {
            shared.add(FakeConnection::arc(address));
        }

        let removed = shared.write(|pool| {
            let mut seen = std::collections::HashSet::new();
            let duplicates: Vec<usize> = pool
                .iter()
                .filter(|(_, c)| !seen.insert(c.address().to_string()))
                .map(|(k, _)| k)
                .collect();
            for key in &duplicates {
                pool.remove(*key);
            }
            duplicates
        });

        assert_eq!(removed, vec![2, 4]);
        let addresses: Vec<String> = shared
            .snapshot()
            .iter()
            .map(|c| c.address().to_string())
            .collect();
        assert_eq!(addresses, vec!["a:1", "b:2", "c:3"]);
    }

    #[test]
    fn add_unique_reports_full_key_space() {
        let shared: SharedPool<FakeConnection> = SharedPool::new();
        shared.write(|pool| pool.set(Slot::At(usize::MAX), FakeConnection::arc("top:1")));

        let (_, added) = shared.add_unique(FakeConnection::arc("b:2"));
        assert!(!added);
        assert_eq!(shared.len(), 1);
    }

    #[test]
    fn concurrent_adds_are_all_kept() {
        let shared: SharedPool<FakeConnection> = SharedPool::new();

        let threads: Vec<_> = (0..8)
            .map(|t| {
                let shared = shared.clone();
                std::thread::spawn(move || {
                    for i in 0..50 {
                        shared.add(FakeConnection::arc(&format!("h{t}-{i}:4150")));
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }

        assert_eq!(shared.len(), 400);
        let keys: Vec<usize> = shared.read(|p| p.iter().map(|(k, _)| k).collect());
        assert_eq!(keys, (0..400).collect::<Vec<_>>());
    }

    #[test]
    fn shuffle_under_lock_keeps_members() {
        let shared = SharedPool::new();
        for i in 0..10 {
            shared.add(FakeConnection::arc(&format!("h{i}:4150")));
        }
        let before = shared.snapshot();

        shared.shuffle();

        assert_eq!(shared.len(), 10);
        for handle in &before {
            assert!(shared.has_connection(handle));
        }
        assert!(!shared.is_empty());
    }
}
