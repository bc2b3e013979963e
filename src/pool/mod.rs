//! Connection pool module
//!
//! This module provides:
//! - `ConnectionPool`: single-owner registry with lookup, indexed access,
//!   cursor traversal and shuffling
//! - `SharedPool`: lock-guarded pool for use across tasks
//! - `PoolState`: per-connection health tracking

mod cursor;
mod registry;
mod shared;
mod state;

pub use cursor::{Cursor, Iter};
pub use registry::{ConnectionPool, LookupKey, Slot};
pub use shared::SharedPool;
pub use state::{ConnectionHealth, ConnectionStateEntry, PoolState};
