//! nsq-pool - NSQD connection registry service
//!
//! This binary:
//! - Registers the configured NSQD servers in a connection pool (one handle
//!   per address)
//! - Randomizes the pool order to spread load across servers
//! - Opens each socket in the background and tracks its health
//! - Exposes health/ready endpoints and Prometheus metrics

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::signal;
use tracing::{error, info, warn};

use nsq_pool::config::PoolConfig;
use nsq_pool::connection::{Connection, NsqdConnection};
use nsq_pool::health::{self, AppState};
use nsq_pool::metrics::PoolMetrics;
use nsq_pool::pool::{ConnectionHealth, PoolState, SharedPool};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first to get log level
    let pool_config = PoolConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("nsq_pool={}", pool_config.log_level).parse()?),
        )
        .json()
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        hosts = pool_config.nsqd_hosts.len(),
        "Starting NSQ connection pool"
    );

    let metrics = match PoolMetrics::install() {
        Ok(metrics) => {
            info!("Prometheus metrics initialized");
            Some(metrics)
        }
        Err(e) => {
            warn!(error = %e, "Failed to install Prometheus recorder - metrics disabled");
            None
        }
    };

    let pool: SharedPool<NsqdConnection> = SharedPool::new();
    let pool_state = PoolState::new();

    for connection in pool_config.connections()? {
        let (registered, added) = pool.add_unique(Arc::new(connection));
        if let Some(ref metrics) = metrics {
            metrics.record_lookup(!added);
        }

        if added {
            pool_state.track(registered.socket_id(), registered.address());
        } else {
            warn!(address = registered.address(), "Duplicate NSQD host ignored");
        }
    }

    if pool_config.shuffle_on_start {
        pool.shuffle();
        if let Some(ref metrics) = metrics {
            metrics.record_shuffle();
        }
    }

    let order: Vec<String> = pool
        .snapshot()
        .iter()
        .map(|c| c.address().to_string())
        .collect();
    info!(?order, "Connection pool ready");

    tokio::spawn(warm_up(pool.snapshot(), pool_state.clone(), metrics.clone()));

    let app_state = AppState {
        pool: pool.clone(),
        pool_state: pool_state.clone(),
        metrics,
    };

    let addr: SocketAddr = ([0, 0, 0, 0], pool_config.http_port).into();
    info!(port = pool_config.http_port, "Starting HTTP server");

    let http_server = axum::serve(
        tokio::net::TcpListener::bind(addr).await?,
        health::router(app_state),
    );

    tokio::select! {
        result = http_server => {
            if let Err(e) = result {
                error!(error = %e, "HTTP server error");
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    info!(
        connections = pool.len(),
        connected = pool_state.connected_count(),
        "Connection pool shutdown complete"
    );
    Ok(())
}

/// Open every socket concurrently, recording the outcome
async fn warm_up(
    connections: Vec<Arc<NsqdConnection>>,
    state: PoolState,
    metrics: Option<PoolMetrics>,
) {
    let mut handles = Vec::with_capacity(connections.len());

    for connection in connections {
        let state = state.clone();
        let metrics = metrics.clone();

        handles.push(tokio::spawn(async move {
            let id = connection.socket_id();
            state.set_health(id, ConnectionHealth::Connecting);

            let start = Instant::now();
            match connection.socket().await {
                Ok(_) => {
                    state.set_health(id, ConnectionHealth::Connected);
                    if let Some(ref metrics) = metrics {
                        metrics.record_connect(connection.address(), start.elapsed());
                    }
                }
                Err(e) => {
                    state.record_failure(id);
                    if let Some(ref metrics) = metrics {
                        metrics.record_connect_error(connection.address(), &e);
                    }
                    error!(address = connection.address(), error = %e, "NSQD unreachable");
                }
            }
        }));
    }

    for handle in handles {
        let _ = handle.await;
    }

    info!(
        connected = state.connected_count(),
        failed = state.failed_count(),
        "Connection warm-up finished"
    );
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
