//! Connection registry
//!
//! An ordered, sparsely keyed collection of connection handles with
//! membership lookup, indexed access, cursor traversal and shuffling.

use crate::connection::{Connection, SocketId};
use crate::pool::cursor::{Cursor, Iter};
use indexmap::IndexMap;
use rand::seq::SliceRandom;
use rand::Rng;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// What [`ConnectionPool::find`] matches on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKey<'a> {
    /// Exact match on [`Connection::address`]
    Host(&'a str),
    /// Identity match on [`Connection::socket_id`]
    Socket(SocketId),
}

impl<'a> From<&'a str> for LookupKey<'a> {
    fn from(host: &'a str) -> Self {
        LookupKey::Host(host)
    }
}

impl<'a> From<&'a String> for LookupKey<'a> {
    fn from(host: &'a String) -> Self {
        LookupKey::Host(host.as_str())
    }
}

impl From<SocketId> for LookupKey<'_> {
    fn from(id: SocketId) -> Self {
        LookupKey::Socket(id)
    }
}

/// Target slot for [`ConnectionPool::set`]
///
/// Keys are plain `usize` positions; string keys are not supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Next sequential key, same as [`ConnectionPool::add`]
    Next,
    /// Explicit key; overwrites whatever is there, keeping its position
    At(usize),
}

impl From<usize> for Slot {
    fn from(key: usize) -> Self {
        Slot::At(key)
    }
}

impl From<Option<usize>> for Slot {
    fn from(key: Option<usize>) -> Self {
        key.map_or(Slot::Next, Slot::At)
    }
}

/// Pool of connections to one or more NSQD servers
///
/// Entries are kept in insertion order. Keys are handed out sequentially by
/// [`add`](Self::add); explicit keys from [`set`](Self::set) and gaps left
/// by [`remove`](Self::remove) make the key space sparse, but never change
/// the order: a new key goes to the end, an overwritten key stays where it
/// was. [`shuffle`](Self::shuffle) reorders storage and reindexes from zero.
///
/// Duplicate addresses are allowed. Callers that want one handle per server
/// check [`find`](Self::find) before adding.
///
/// The pool shares handles through `Arc` and never opens or closes sockets.
pub struct ConnectionPool<C: ?Sized> {
    connections: IndexMap<usize, Arc<C>>,
    /// One past the largest key assigned since the last reindex; `None`
    /// once `usize::MAX` has been used
    next_key: Option<usize>,
}

impl<C: ?Sized> ConnectionPool<C> {
    /// Create an empty pool
    pub fn new() -> Self {
        Self {
            connections: IndexMap::new(),
            next_key: Some(0),
        }
    }

    /// Append a connection at the next sequential key and return that key
    ///
    /// Returns `None`, storing nothing, when the key space is exhausted.
    pub fn add(&mut self, connection: Arc<C>) -> Option<usize> {
        self.set(Slot::Next, connection)
    }

    /// Number of stored connections (entries, not highest key + 1)
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Fresh cursor positioned on the first connection
    pub fn cursor(&self) -> Cursor<'_, C> {
        Cursor::new(&self.connections)
    }

    /// Iterate `(key, connection)` pairs in current order
    pub fn iter(&self) -> Iter<'_, C> {
        Iter::new(self.connections.iter())
    }

    /// Store a connection at `slot` and return the key written
    ///
    /// `Slot::At` always succeeds. `Slot::Next` fails like
    /// [`add`](Self::add) once no key is left to append at.
    pub fn set(&mut self, slot: impl Into<Slot>, connection: Arc<C>) -> Option<usize> {
        let key = match slot.into() {
            Slot::At(key) => key,
            Slot::Next => match self.next_key {
                Some(key) => key,
                None => {
                    warn!(len = self.connections.len(), "No key left to append connection at");
                    return None;
                }
            },
        };

        self.connections.insert(key, connection);
        self.next_key = match (self.next_key, key.checked_add(1)) {
            (Some(next), Some(after)) => Some(next.max(after)),
            _ => None,
        };
        Some(key)
    }

    /// Connection at `key`, if any
    pub fn get(&self, key: usize) -> Option<&Arc<C>> {
        self.connections.get(&key)
    }

    pub fn contains_key(&self, key: usize) -> bool {
        self.connections.contains_key(&key)
    }

    /// Remove the connection at `key`, leaving a gap
    ///
    /// Missing keys are ignored. Remaining keys are not renumbered and keep
    /// their order.
    pub fn remove(&mut self, key: usize) -> Option<Arc<C>> {
        let removed = self.connections.shift_remove(&key);
        if removed.is_some() {
            debug!(key, remaining = self.connections.len(), "Connection removed from pool");
        }
        removed
    }

    /// Randomly reorder the stored connections
    ///
    /// Every ordering is equally likely. Keys are reassigned as `0..len`.
    pub fn shuffle(&mut self) {
        self.shuffle_with(&mut rand::rng());
    }

    /// [`shuffle`](Self::shuffle) with a caller-provided RNG
    pub fn shuffle_with<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let mut entries: Vec<Arc<C>> = std::mem::take(&mut self.connections)
            .into_values()
            .collect();
        entries.shuffle(rng);

        self.next_key = Some(entries.len());
        self.connections = entries.into_iter().enumerate().collect();

        debug!(connections = self.connections.len(), "Connection pool shuffled");
    }
}

impl<C: Connection + ?Sized> ConnectionPool<C> {
    /// True if a connection with the same identity is stored
    ///
    /// Compares [`SocketId`]s only, so an unconnected handle stays
    /// unconnected.
    pub fn has_connection(&self, connection: &C) -> bool {
        self.find(connection.socket_id()).is_some()
    }

    /// First connection in current order matching `key`
    pub fn find<'k>(&self, key: impl Into<LookupKey<'k>>) -> Option<&Arc<C>> {
        match key.into() {
            LookupKey::Host(host) => self.connections.values().find(|c| c.address() == host),
            LookupKey::Socket(id) => self.connections.values().find(|c| c.socket_id() == id),
        }
    }
}

impl<C: ?Sized> Default for ConnectionPool<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ?Sized> Clone for ConnectionPool<C> {
    fn clone(&self) -> Self {
        Self {
            connections: self.connections.clone(),
            next_key: self.next_key,
        }
    }
}

impl<C: Connection + ?Sized> fmt::Debug for ConnectionPool<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.connections.iter().map(|(k, c)| (k, c.address())))
            .finish()
    }
}

impl<C: ?Sized> FromIterator<Arc<C>> for ConnectionPool<C> {
    fn from_iter<I: IntoIterator<Item = Arc<C>>>(iter: I) -> Self {
        let mut pool = Self::new();
        pool.extend(iter);
        pool
    }
}

impl<C: ?Sized> Extend<Arc<C>> for ConnectionPool<C> {
    fn extend<I: IntoIterator<Item = Arc<C>>>(&mut self, iter: I) {
        for connection in iter {
            if self.add(connection).is_none() {
                break;
            }
        }
    }
}

impl<'a, C: ?Sized> IntoIterator for &'a ConnectionPool<C> {
    type Item = (usize, &'a Arc<C>);
    type IntoIter = Iter<'a, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
