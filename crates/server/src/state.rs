//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ServerConfig;
use crate::middleware::audit::{SecurityLog, SecurityLogError};
use crate::middleware::metrics::RequestMetrics;
use crate::services::email::EmailService;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; holds the database pool, configuration, and
/// the security observability stores.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: PgPool,
    email: EmailService,
    security_log: SecurityLog,
    metrics: RequestMetrics,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the security log file cannot be opened or the
    /// SMTP relay cannot be configured.
    pub fn new(config: ServerConfig, pool: PgPool) -> Result<Self, StateInitError> {
        let security_log = SecurityLog::open(&config.security_log_path)?;
        let email = EmailService::new(config.email.as_ref())?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                email,
                security_log,
                metrics: RequestMetrics::new(),
            }),
        })
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the email service.
    #[must_use]
    pub fn email(&self) -> &EmailService {
        &self.inner.email
    }

    /// Get a reference to the security audit log.
    #[must_use]
    pub fn security_log(&self) -> &SecurityLog {
        &self.inner.security_log
    }

    /// Get a reference to the in-memory request metrics.
    #[must_use]
    pub fn metrics(&self) -> &RequestMetrics {
        &self.inner.metrics
    }
}

/// Error creating the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateInitError {
    #[error("security log: {0}")]
    SecurityLog(#[from] SecurityLogError),
    #[error("smtp: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}
