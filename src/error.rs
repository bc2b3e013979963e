//! Domain error types for the NSQ connection pool
//!
//! Pool operations themselves never fail: a missing connection is `None`.
//! These errors cover the fallible edges around the pool: address parsing,
//! lazy socket materialization and configuration.
//!
//! main.rs is the ONLY module allowed to use anyhow::Result (process boundary).
//! All library code returns Result<T, NsqError>.

use thiserror::Error;

/// NSQ pool domain errors
///
/// Every variant carries the address or value it failed on, so a log line
/// identifies the server without a second lookup.
///
/// Example log output:
/// ```text
/// NsqError::ConnectTimeout { address: "nsqd-2:4150", timeout_ms: 1000 }
/// → "connection to nsqd-2:4150 timed out after 1000ms"
/// ```
#[derive(Error, Debug)]
pub enum NsqError {
    /// Address string is not a valid `host:port` pair
    #[error("invalid NSQD address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    /// TCP connect or handshake failed
    #[error("connection to {address} failed")]
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// TCP connect did not complete in time
    #[error("connection to {address} timed out after {timeout_ms}ms")]
    ConnectTimeout { address: String, timeout_ms: u64 },

    /// Configuration error (environment variable missing or invalid)
    #[error("configuration error: {0}")]
    Config(String),
}

impl NsqError {
    /// Returns a static label string suitable for Prometheus metrics.
    ///
    /// Used as the `error_type` label on `nsq_pool_connect_errors_total`.
    pub fn error_type_label(&self) -> &'static str {
        match self {
            Self::InvalidAddress { .. } => "invalid_address",
            Self::Connect { .. } => "connect",
            Self::ConnectTimeout { .. } => "connect_timeout",
            Self::Config(_) => "config",
        }
    }
}
