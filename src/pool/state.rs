//! Connection state tracking
//!
//! Tracks health and connect attempts of the pooled connections, keyed by
//! socket identity so entries survive shuffles and reindexing.

use crate::connection::SocketId;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Health status for a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionHealth {
    /// Registered, socket not opened yet
    Pending,
    /// Connect in progress
    Connecting,
    /// Socket open
    Connected,
    /// Last connect attempt failed
    Failed,
}

impl ConnectionHealth {
    /// Returns true if the connection can carry traffic
    pub fn is_ready(&self) -> bool {
        matches!(self, ConnectionHealth::Connected)
    }
}

/// State for a single connection
#[derive(Debug)]
pub struct ConnectionStateEntry {
    pub address: String,
    pub health: ConnectionHealth,
    pub failures: AtomicU64,
    pub connected_at: Option<Instant>,
    pub last_failure: Option<Instant>,
}

impl ConnectionStateEntry {
    fn new(address: String) -> Self {
        Self {
            address,
            health: ConnectionHealth::Pending,
            failures: AtomicU64::new(0),
            connected_at: None,
            last_failure: None,
        }
    }
}

/// Shared state across all connections in a pool
#[derive(Debug, Clone, Default)]
pub struct PoolState {
    inner: Arc<DashMap<SocketId, ConnectionStateEntry>>,
}

impl PoolState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a connection; existing entries are left untouched
    pub fn track(&self, id: SocketId, address: &str) {
        self.inner
            .entry(id)
            .or_insert_with(|| ConnectionStateEntry::new(address.to_string()));
    }

    /// Stop tracking a connection
    pub fn untrack(&self, id: SocketId) {
        self.inner.remove(&id);
    }

    /// Update connection health
    pub fn set_health(&self, id: SocketId, health: ConnectionHealth) {
        if let Some(mut entry) = self.inner.get_mut(&id) {
            entry.health = health;
            if health == ConnectionHealth::Connected && entry.connected_at.is_none() {
                entry.connected_at = Some(Instant::now());
            }
        }
    }

    /// Mark a failed connect attempt
    pub fn record_failure(&self, id: SocketId) {
        if let Some(mut entry) = self.inner.get_mut(&id) {
            entry.failures.fetch_add(1, Ordering::Relaxed);
            entry.health = ConnectionHealth::Failed;
            entry.last_failure = Some(Instant::now());
        }
    }

    pub fn get_health(&self, id: SocketId) -> Option<ConnectionHealth> {
        self.inner.get(&id).map(|e| e.health)
    }

    pub fn failures(&self, id: SocketId) -> u64 {
        self.inner
            .get(&id)
            .map_or(0, |e| e.failures.load(Ordering::Relaxed))
    }

    /// Get count of connected connections
    pub fn connected_count(&self) -> usize {
        self.inner.iter().filter(|e| e.health.is_ready()).count()
    }

    /// Get count of connections whose last attempt failed
    pub fn failed_count(&self) -> usize {
        self.inner
            .iter()
            .filter(|e| e.health == ConnectionHealth::Failed)
            .count()
    }

    pub fn tracked_count(&self) -> usize {
        self.inner.len()
    }

    /// At least one connection is usable
    pub fn is_ready(&self) -> bool {
        self.connected_count() > 0
    }

    /// No connection is in the failed state
    pub fn is_healthy(&self) -> bool {
        self.failed_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracked_connection_starts_pending() {
        let state = PoolState::new();
        let id = SocketId::new();
        state.track(id, "a:4150");

        assert_eq!(state.get_health(id), Some(ConnectionHealth::Pending));
        assert_eq!(state.tracked_count(), 1);
        assert!(!state.is_ready());
        assert!(state.is_healthy());
    }

    #[test]
    fn health_transitions_update_counts() {
        let state = PoolState::new();
        let a = SocketId::new();
        let b = SocketId::new();
        state.track(a, "a:4150");
        state.track(b, "b:4150");

        state.set_health(a, ConnectionHealth::Connected);
        state.record_failure(b);
        state.record_failure(b);

        assert_eq!(state.connected_count(), 1);
        assert_eq!(state.failed_count(), 1);
        assert_eq!(state.failures(b), 2);
        assert!(state.is_ready());
        assert!(!state.is_healthy());
    }

    #[test]
    fn retracking_keeps_existing_entry() {
        let state = PoolState::new();
        let id = SocketId::new();
        state.track(id, "a:4150");
        state.set_health(id, ConnectionHealth::Connected);
        state.track(id, "a:4150");

        assert_eq!(state.get_health(id), Some(ConnectionHealth::Connected));
    }

    #[test]
    fn untracked_ids_are_ignored() {
        let state = PoolState::new();
        let id = SocketId::new();
        state.set_health(id, ConnectionHealth::Connected);
        state.record_failure(id);

        assert_eq!(state.get_health(id), None);
        assert_eq!(state.failures(id), 0);

        state.track(id, "a:4150");
        state.untrack(id);
        assert_eq!(state.tracked_count(), 0);
    }
}
