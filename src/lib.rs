//! nsq-pool - connection registry for NSQ clients
//!
//! - `pool`: ordered registry of NSQD connection handles with identity and
//!   host lookup, indexed access, cursors and shuffling
//! - `connection`: the handle contract and a lazily connecting TCP handle
//! - `health`, `metrics`, `config`: the service shell used by the binary

pub mod config;
pub mod connection;
pub mod error;
pub mod health;
pub mod metrics;
pub mod pool;

pub use config::PoolConfig;
pub use connection::{Connection, NsqdConnection, SocketId};
pub use error::NsqError;
pub use pool::{ConnectionPool, Cursor, LookupKey, SharedPool, Slot};
