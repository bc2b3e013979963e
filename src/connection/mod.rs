//! Connection handles
//!
//! The pool only ever references connections through the [`Connection`]
//! trait. [`NsqdConnection`] is the TCP handle used by the binary; it opens
//! its socket lazily, on first use, never because the pool looked at it.

mod handle;
mod nsqd;

pub use handle::{Connection, SocketId};
pub use nsqd::{NsqdConnection, DEFAULT_CONNECT_TIMEOUT, MAGIC_V2};
