//! Web front end: upload form, result page and the re-analysis endpoint.
//!
//! One [`Analyzer`] is shared by every request through [`AppState`]. The
//! listener starts on the configured port and walks forward to the next
//! free one when it is taken, so two copies can run side by side in
//! development.

mod handlers;
mod routes;
mod templates;

pub use handlers::{ReanalyzeRequest, ReanalyzeResponse, UPLOAD_FIELD};
pub use routes::create_router;

use crate::analyze::Analyzer;
use crate::config::ServerConfig;
use crate::error::InfoBaitError;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<Analyzer>,
    /// Request body cap applied to every route.
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(analyzer: Analyzer, config: &ServerConfig) -> Self {
        Self {
            analyzer: Arc::new(analyzer),
            max_upload_bytes: config.max_upload_bytes,
        }
    }
}

/// Bind the first free port among [`ServerConfig::candidate_ports`].
///
/// Only "address in use" moves on to the next port; any other bind error
/// (bad host, permission denied) is returned immediately.
pub async fn bind_first_free(config: &ServerConfig) -> Result<TcpListener, InfoBaitError> {
    let mut last_err = None;
    for port in config.candidate_ports() {
        match TcpListener::bind((config.host.as_str(), port)).await {
            Ok(listener) => {
                if port != config.port {
                    warn!("Port {} is busy, using {} instead", config.port, port);
                }
                return Ok(listener);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
                debug!("Port {} in use", port);
                last_err = Some(e);
            }
            Err(e) => return Err(e.into()),
        }
    }
    Err(last_err
        .map(InfoBaitError::from)
        .unwrap_or_else(|| InfoBaitError::InvalidConfig("no port to try".to_string())))
}

/// Start the web server and run until Ctrl-C.
pub async fn serve(analyzer: Analyzer, config: &ServerConfig) -> Result<(), InfoBaitError> {
    let listener = bind_first_free(config).await?;
    let addr = listener.local_addr()?;
    let app = create_router(AppState::new(analyzer, config));

    info!("Starting server at http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Could not listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn busy_port_moves_to_next() {
        let held = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let busy = held.local_addr().unwrap().port();
        if busy > 65_000 {
            return;
        }
        let config = ServerConfig {
            host: "127.0.0.1".into(),
            port: busy,
            port_search: 10,
            ..ServerConfig::default()
        };
        let listener = bind_first_free(&config).await.unwrap();
        let got = listener.local_addr().unwrap().port();
        assert!(got > busy && got < busy + 10);
    }

    #[tokio::test]
    async fn single_busy_port_is_an_error() {
        let held = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let config = ServerConfig {
            host: "127.0.0.1".into(),
            port: held.local_addr().unwrap().port(),
            port_search: 1,
            ..ServerConfig::default()
        };
        assert!(matches!(
            bind_first_free(&config).await,
            Err(InfoBaitError::Io(_))
        ));
    }
}
