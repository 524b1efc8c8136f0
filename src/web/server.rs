//! Web server for noticeboard.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use chrono::Utc;
use tokio::net::TcpListener;

use crate::config::Config;
use crate::db::SessionRepository;
use crate::{BoardError, Database, Result};

use super::handlers::AppState;
use super::middleware::RateLimitState;
use super::router::create_router;

/// Expired-session purge interval.
const SESSION_PURGE_INTERVAL_SECS: u64 = 3600;

/// Web server for the board.
pub struct WebServer {
    /// Server address.
    addr: SocketAddr,
    /// Application state.
    app_state: Arc<AppState>,
    /// Rate limiter state.
    rate_limit_state: Arc<RateLimitState>,
}

impl WebServer {
    /// Create a new web server.
    pub fn new(config: &Config, db: Database) -> Result<Self> {
        let addr = format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .map_err(|e| BoardError::Config(format!("invalid server address: {e}")))?;

        Ok(Self {
            addr,
            app_state: Arc::new(AppState::from_config(db, config)?),
            rate_limit_state: Arc::new(RateLimitState::from_config(&config.rate_limit)),
        })
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Start the expired-session purge task.
    fn start_session_purge_task(db: Database) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(SESSION_PURGE_INTERVAL_SECS));

            // Skip the first immediate tick
            interval.tick().await;

            loop {
                interval.tick().await;

                let repo = SessionRepository::new(db.pool());
                match repo.purge_expired(Utc::now().timestamp()).await {
                    Ok(0) => tracing::debug!("No expired sessions to purge"),
                    Ok(count) => tracing::info!(deleted_count = count, "Purged expired sessions"),
                    Err(e) => tracing::warn!(error = %e, "Failed to purge expired sessions"),
                }
            }
        });
    }

    /// Bind the listener, start background tasks and build the router.
    async fn prepare(self) -> std::io::Result<(TcpListener, Router)> {
        let listener = TcpListener::bind(self.addr).await?;

        Self::start_session_purge_task(self.app_state.db.clone());
        self.rate_limit_state.clone().start_cleanup_task();

        let router = create_router(self.app_state, self.rate_limit_state);
        tracing::info!("Web server listening on http://{}", listener.local_addr()?);
        Ok((listener, router))
    }

    /// Run the web server.
    pub async fn run(self) -> std::io::Result<()> {
        let (listener, router) = self.prepare().await?;
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
    }

    /// Run the server and return the actual bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> std::io::Result<SocketAddr> {
        let (listener, router) = self.prepare().await?;
        let local_addr = listener.local_addr()?;

        tokio::spawn(async move {
            let service = router.into_make_service_with_connect_info::<SocketAddr>();
            if let Err(e) = axum::serve(listener, service).await {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}
