//! Lazily connecting NSQD handle

use crate::connection::{Connection, SocketId};
use crate::error::NsqError;
use std::fmt;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, warn};

/// Protocol magic sent by a client right after the TCP connect
pub const MAGIC_V2: &[u8; 4] = b"  V2";

/// Connect timeout used when none is configured
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(1);

/// Handle to one NSQD server
///
/// Construction is free: the TCP socket is opened by the first call to
/// [`NsqdConnection::socket`] and reused afterwards.
pub struct NsqdConnection {
    id: SocketId,
    address: String,
    connect_timeout: Duration,
    socket: OnceCell<Mutex<TcpStream>>,
}

impl NsqdConnection {
    /// Create a handle for `host:port` without connecting
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            id: SocketId::new(),
            address: format!("{host}:{port}"),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            socket: OnceCell::new(),
        }
    }

    /// Parse a `host:port` string into a handle
    pub fn parse(address: &str) -> Result<Self, NsqError> {
        let invalid = |reason: &str| NsqError::InvalidAddress {
            address: address.to_string(),
            reason: reason.to_string(),
        };

        let (host, port) = address
            .trim()
            .rsplit_once(':')
            .ok_or_else(|| invalid("missing port"))?;

        if host.is_empty() {
            return Err(invalid("empty host"));
        }

        let port: u16 = port
            .parse()
            .map_err(|e| invalid(&format!("bad port: {e}")))?;

        Ok(Self::new(host, port))
    }

    /// Override the connect timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// True once the socket has been opened
    pub fn is_connected(&self) -> bool {
        self.socket.initialized()
    }

    /// Get the socket, connecting on first use
    ///
    /// Concurrent first callers share one connect attempt. A failed attempt
    /// leaves the handle unconnected, so the next call tries again.
    pub async fn socket(&self) -> Result<&Mutex<TcpStream>, NsqError> {
        self.socket
            .get_or_try_init(|| async {
                let stream = self.open().await?;
                Ok(Mutex::new(stream))
            })
            .await
    }

    async fn open(&self) -> Result<TcpStream, NsqError> {
        debug!(address = %self.address, socket_id = %self.id, "Opening NSQD socket");

        let connect = TcpStream::connect(self.address.as_str());
        let mut stream = match tokio::time::timeout(self.connect_timeout, connect).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => {
                warn!(address = %self.address, error = %source, "NSQD connect failed");
                return Err(NsqError::Connect {
                    address: self.address.clone(),
                    source,
                });
            }
            Err(_) => {
                warn!(address = %self.address, "NSQD connect timed out");
                return Err(NsqError::ConnectTimeout {
                    address: self.address.clone(),
                    timeout_ms: self.connect_timeout.as_millis() as u64,
                });
            }
        };

        stream
            .write_all(MAGIC_V2)
            .await
            .map_err(|source| NsqError::Connect {
                address: self.address.clone(),
                source,
            })?;

        info!(address = %self.address, socket_id = %self.id, "NSQD socket open");
        Ok(stream)
    }
}

impl Connection for NsqdConnection {
    fn socket_id(&self) -> SocketId {
        self.id
    }

    fn address(&self) -> &str {
        &self.address
    }
}

impl fmt::Display for NsqdConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address)
    }
}

impl fmt::Debug for NsqdConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NsqdConnection")
            .field("id", &self.id)
            .field("address", &self.address)
            .field("connected", &self.is_connected())
            .finish()
    }
}
