//! Pool configuration module
//!
//! Handles loading configuration from environment variables.

use crate::connection::{NsqdConnection, DEFAULT_CONNECT_TIMEOUT};
use crate::error::NsqError;
use std::env;
use std::time::Duration;

/// Pool configuration
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// NSQD addresses as `host:port`, in configured order
    pub nsqd_hosts: Vec<String>,

    /// Randomize connection order after registration
    pub shuffle_on_start: bool,

    /// TCP connect timeout per NSQD
    pub connect_timeout: Duration,

    /// Health/metrics HTTP port
    pub http_port: u16,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl PoolConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, NsqError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, NsqError> {
        let nsqd_hosts = parse_hosts(
            &lookup("NSQD_HOSTS").unwrap_or_else(|| "127.0.0.1:4150".to_string()),
        )?;

        let shuffle_on_start = match lookup("SHUFFLE_ON_START") {
            Some(value) => parse_bool(&value).ok_or_else(|| {
                NsqError::Config(format!("SHUFFLE_ON_START must be true or false, got '{value}'"))
            })?,
            None => true,
        };

        let connect_timeout = match lookup("CONNECT_TIMEOUT_MS") {
            Some(value) => value
                .parse()
                .map(Duration::from_millis)
                .map_err(|e| {
                    NsqError::Config(format!("CONNECT_TIMEOUT_MS must be a valid number: {e}"))
                })?,
            None => DEFAULT_CONNECT_TIMEOUT,
        };

        let http_port = lookup("HTTP_PORT")
            .or_else(|| lookup("METRICS_PORT"))
            .unwrap_or_else(|| "9090".to_string())
            .parse()
            .map_err(|e| NsqError::Config(format!("HTTP_PORT must be a valid port number: {e}")))?;

        let log_level = lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        Ok(Self {
            nsqd_hosts,
            shuffle_on_start,
            connect_timeout,
            http_port,
            log_level,
        })
    }

    /// Build one unconnected handle per configured host
    pub fn connections(&self) -> Result<Vec<NsqdConnection>, NsqError> {
        self.nsqd_hosts
            .iter()
            .map(|host| {
                NsqdConnection::parse(host).map(|c| c.with_connect_timeout(self.connect_timeout))
            })
            .collect()
    }
}

/// Split a comma-separated host list, validating each entry
fn parse_hosts(raw: &str) -> Result<Vec<String>, NsqError> {
    let hosts: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(str::to_string)
        .collect();

    if hosts.is_empty() {
        return Err(NsqError::Config("NSQD_HOSTS must list at least one host".to_string()));
    }

    for host in &hosts {
        NsqdConnection::parse(host)
            .map_err(|e| NsqError::Config(format!("NSQD_HOSTS entry rejected: {e}")))?;
    }

    Ok(hosts)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
