//! Connection identity
//!
//! A handle's identity is fixed when it is built, before any socket exists,
//! so registry lookups can compare identities without connecting.

use std::fmt;
use uuid::Uuid;

/// Opaque identity token of one connection handle
///
/// Two handles are the same connection iff their `SocketId`s are equal.
/// Clones of an `Arc`-shared handle report the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SocketId(Uuid);

impl SocketId {
    /// Mint a fresh, process-unique identity
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SocketId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SocketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A logical connection to one queue server, as seen by the pool
pub trait Connection {
    /// Stable identity token; must not open a socket
    fn socket_id(&self) -> SocketId;

    /// Host identifier, e.g. `"nsqd-1:4150"`
    fn address(&self) -> &str;
}
