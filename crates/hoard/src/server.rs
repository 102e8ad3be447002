//! `HoardServer` builder and server loop.
//!
//! Ties the layers together: the WebSocket transport feeds connection
//! handlers, handlers feed the hub, and an optional axum listener serves the
//! inspection endpoints off the same hub.

use std::future::Future;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use hoard_hub::{HubConfig, HubHandle, spawn_hub};
use hoard_transport::{Transport, WebSocketTransport};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use crate::handler::{HandlerSettings, handle_connection};
use crate::{HoardError, http};

/// Sent to every Active participant when the server stops.
pub const SHUTDOWN_MESSAGE: &str = "Server is shutting down";

/// Builder for configuring and starting a Hoard server.
///
/// # Example
///
/// ```rust,ignore
/// let server = HoardServer::builder()
///     .bind("0.0.0.0:3000")
///     .hub_config(HubConfig::default())
///     .build()
///     .await?;
/// server.run_until(shutdown_signal()).await
/// ```
pub struct HoardServerBuilder {
    bind_addr: String,
    http_addr: Option<String>,
    hub_config: HubConfig,
    shutdown_grace: Duration,
    handshake_timeout: Duration,
}

impl HoardServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            http_addr: None,
            hub_config: HubConfig::default(),
            shutdown_grace: Duration::from_secs(1),
            handshake_timeout: Duration::from_secs(10),
        }
    }

    /// Sets the WebSocket listen address.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Serves the HTTP inspection endpoints on `addr`. Off by default.
    pub fn http_bind(mut self, addr: &str) -> Self {
        self.http_addr = Some(addr.to_string());
        self
    }

    /// Sets world, session and housekeeping settings.
    pub fn hub_config(mut self, config: HubConfig) -> Self {
        self.hub_config = config;
        self
    }

    /// How long to let `server-shutdown` frames flush before returning.
    pub fn shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    /// How long a new socket gets to finish the WebSocket upgrade.
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Binds the listeners and starts the hub.
    pub async fn build(self) -> Result<HoardServer, HoardError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;
        let http = match &self.http_addr {
            Some(addr) => {
                let listener = TcpListener::bind(addr).await?;
                tracing::info!(addr, "HTTP inspection listening");
                Some(listener)
            }
            None => None,
        };

        // A channel that never joins is held no longer than an idle one.
        let handler = HandlerSettings {
            started: Instant::now(),
            join_timeout: self.hub_config.session.idle_timeout,
            outbox_capacity: self.hub_config.outbox_capacity,
        };

        Ok(HoardServer {
            transport,
            http,
            hub: spawn_hub(self.hub_config),
            handler,
            handshake_timeout: self.handshake_timeout,
            shutdown_grace: self.shutdown_grace,
        })
    }
}

impl Default for HoardServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Hoard server.
///
/// Call [`run_until`](Self::run_until) to start accepting connections.
pub struct HoardServer {
    transport: WebSocketTransport,
    http: Option<TcpListener>,
    hub: HubHandle,
    handler: HandlerSettings,
    handshake_timeout: Duration,
    shutdown_grace: Duration,
}

impl HoardServer {
    /// Creates a new builder.
    pub fn builder() -> HoardServerBuilder {
        HoardServerBuilder::new()
    }

    /// Returns the WebSocket listen address.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// Returns the HTTP listen address, if HTTP is enabled.
    pub fn http_addr(&self) -> Option<SocketAddr> {
        self.http.as_ref().and_then(|l| l.local_addr().ok())
    }

    /// A handle to the running hub.
    pub fn hub(&self) -> HubHandle {
        self.hub.clone()
    }

    /// Accepts connections until `shutdown` resolves, then broadcasts
    /// `server-shutdown`, waits the grace period and returns.
    pub async fn run_until(mut self, shutdown: impl Future<Output = ()>) -> Result<(), HoardError> {
        tracing::info!("Hoard server running");

        let (stop_http, http_stopped) = oneshot::channel::<()>();
        let http_task = self.http.take().map(|listener| {
            let app = http::router(self.hub.clone());
            tokio::spawn(async move {
                axum::serve(listener, app)
                    .with_graceful_shutdown(async move {
                        let _ = http_stopped.await;
                    })
                    .await
            })
        });

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                accepted = self.transport.accept() => match accepted {
                    Ok(pending) => {
                        let hub = self.hub.clone();
                        let settings = self.handler;
                        let handshake_timeout = self.handshake_timeout;
                        tokio::spawn(async move {
                            let peer = pending.peer_addr();
                            let upgraded =
                                tokio::time::timeout(handshake_timeout, WebSocketTransport::upgrade(pending)).await;
                            let conn = match upgraded {
                                Ok(Ok(conn)) => conn,
                                Ok(Err(e)) => {
                                    tracing::debug!(%peer, error = %e, "handshake failed");
                                    return;
                                }
                                Err(_) => {
                                    tracing::debug!(%peer, "handshake timed out");
                                    return;
                                }
                            };
                            if let Err(e) = handle_connection(conn, hub, settings).await {
                                tracing::debug!(error = %e, "connection ended with error");
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },
            }
        }

        tracing::info!(grace_ms = self.shutdown_grace.as_millis() as u64, "shutting down");
        if let Err(e) = self.hub.shutdown(SHUTDOWN_MESSAGE).await {
            tracing::warn!(error = %e, "hub already gone at shutdown");
        }
        tokio::time::sleep(self.shutdown_grace).await;

        let _ = stop_http.send(());
        if let Some(task) = http_task {
            match task.await {
                Ok(result) => result?,
                Err(e) => tracing::error!(error = %e, "HTTP task failed"),
            }
        }

        tracing::info!("Hoard server stopped");
        Ok(())
    }
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C, initiating graceful shutdown"),
        _ = terminate => tracing::info!("received SIGTERM, initiating graceful shutdown"),
    }
}
