//! Server configuration and lifecycle.
//!
//! The composition root (building the provider and the gateway service) lives
//! in the binary; this module only needs the finished `GatewayPort`.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use cigate_core::GatewayPort;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::auth::ApiKeys;
use crate::routes::create_router;

/// CORS configuration for the web server.
#[derive(Debug, Clone, Default)]
pub enum CorsConfig {
    /// Allow all origins.
    #[default]
    AllowAll,
    /// Allow specific origins.
    AllowOrigins(Vec<String>),
}

/// Server configuration for the Axum adapter.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port for the HTTP server.
    pub port: u16,
    /// How long in-flight requests may run after a shutdown signal.
    pub shutdown_timeout: Duration,
    /// CORS configuration.
    pub cors: CorsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8081,
            shutdown_timeout: Duration::from_secs(30),
            cors: CorsConfig::default(),
        }
    }
}

impl ServerConfig {
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub const fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Set CORS to allow specific origins.
    #[must_use]
    pub fn with_allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.cors = CorsConfig::AllowOrigins(origins);
        self
    }
}

/// Everything the handlers need.
pub struct AxumContext {
    pub gateway: Arc<dyn GatewayPort>,
    pub api_keys: ApiKeys,
}

impl AxumContext {
    pub fn new(gateway: Arc<dyn GatewayPort>, api_keys: ApiKeys) -> Self {
        Self { gateway, api_keys }
    }
}

/// Bind `0.0.0.0:<port>` and serve until Ctrl-C or SIGTERM.
pub async fn start_server(ctx: AxumContext, config: ServerConfig) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(
        addr = %addr,
        api_keys = ctx.api_keys.len(),
        "cigate API server listening"
    );
    if ctx.api_keys.is_empty() {
        warn!("No API keys configured; every /v1 request will be rejected");
    }

    let app = create_router(ctx, &config.cors);
    serve(listener, app, shutdown_signal(), config.shutdown_timeout).await
}

/// Serve `app` on `listener` until `shutdown` resolves, then give in-flight
/// requests up to `grace` to finish.
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F, grace: Duration) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (signalled_tx, signalled_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown.await;
        info!("Shutdown signal received, draining connections");
        let _ = signalled_tx.send(());
    });

    let mut server = std::pin::pin!(server.into_future());
    tokio::select! {
        biased;
        result = &mut server => return result.context("server error"),
        _ = signalled_rx => {}
    }

    match tokio::time::timeout(grace, server).await {
        Ok(result) => {
            info!("Server stopped");
            result.context("server error")
        }
        Err(_) => {
            warn!(grace_secs = grace.as_secs(), "Shutdown grace period elapsed, dropping connections");
            Ok(())
        }
    }
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
