//! Query engine server.
//!
//! One connection is served at a time; inside it, queries are answered in
//! order until the peer disconnects. A transport failure drops only the
//! current connection.

use std::future::Future;
use std::net::SocketAddr;

use serde::Serialize;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use crate::error::{JobdexError, Result};
use crate::query::QueryEngine;
use crate::transport::{GREETING, read_frame, write_frame};

/// Counters reported when the server stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ServeSummary {
    pub connections: u64,
    pub queries: u64,
    pub transport_errors: u64,
}

pub struct Server {
    engine: QueryEngine,
    listener: TcpListener,
    max_query_bytes: usize,
}

impl Server {
    pub async fn bind(engine: QueryEngine, addr: &str, max_query_bytes: usize) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|err| JobdexError::Transport(format!("bind {addr}: {err}")))?;
        Ok(Self {
            engine,
            listener,
            max_query_bytes,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until SIGINT or SIGTERM.
    pub async fn serve(self) -> Result<ServeSummary> {
        self.serve_until(shutdown_signal()).await
    }

    /// Serve until `shutdown` completes. An in-flight connection is dropped.
    pub async fn serve_until(self, shutdown: impl Future<Output = ()>) -> Result<ServeSummary> {
        let addr = self.local_addr()?;
        info!(%addr, skills = self.engine.index().len(), "engine listening");

        tokio::pin!(shutdown);
        let mut summary = ServeSummary::default();
        loop {
            let (stream, peer) = tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok(accepted) => accepted,
                    Err(err) => {
                        warn!(error = %err, "accept failed");
                        continue;
                    }
                },
                () = &mut shutdown => break,
            };

            summary.connections += 1;
            info!(%peer, "client connected");
            tokio::select! {
                result = self.handle_connection(stream, &mut summary.queries) => match result {
                    Ok(()) => info!(%peer, "client disconnected"),
                    Err(err) => {
                        summary.transport_errors += 1;
                        warn!(%peer, error = %err, "connection dropped");
                    }
                },
                () = &mut shutdown => break,
            }
        }

        info!(
            connections = summary.connections,
            queries = summary.queries,
            "engine stopped"
        );
        Ok(summary)
    }

    async fn handle_connection(
        &self,
        mut stream: TcpStream,
        queries: &mut u64,
    ) -> Result<()> {
        write_frame(&mut stream, GREETING.as_bytes()).await?;
        while let Some(frame) = read_frame(&mut stream, self.max_query_bytes).await? {
            *queries += 1;
            // Decoded the same way as store records, so non-UTF-8 skills
            // stay queryable.
            let query = String::from_utf8_lossy(&frame);
            let response = self.engine.respond(&query);
            debug!(
                query = %query,
                bytes = response.as_wire().len(),
                truncated = response.is_truncated(),
                "query answered"
            );
            write_frame(&mut stream, response.as_wire().as_bytes()).await?;
        }
        Ok(())
    }
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received Ctrl-C, shutting down"),
        () = terminate => info!("received SIGTERM, shutting down"),
    }
}
