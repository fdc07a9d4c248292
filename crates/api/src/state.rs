//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ApiConfig;
use crate::throttle::RequestThrottle;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    pool: PgPool,
    throttle: Arc<RequestThrottle>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// The request throttle is sized from `config.rate_limit_per_minute`.
    /// Its reaper is not started here; see [`RequestThrottle::spawn_reaper`].
    #[must_use]
    pub fn new(config: ApiConfig, pool: PgPool) -> Self {
        let throttle = Arc::new(RequestThrottle::new(config.rate_limit_per_minute));

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                throttle,
            }),
        }
    }

    /// Get a reference to the service configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get the shared request throttle.
    #[must_use]
    pub fn throttle(&self) -> &Arc<RequestThrottle> {
        &self.inner.throttle
    }
}
