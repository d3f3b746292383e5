//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the database pool and the session settings every auth handler
//! needs when issuing or clearing cookies.

use sqlx::PgPool;

use crate::config::{DEFAULT_SESSION_TTL_DAYS, ServerConfig};

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; the pool is internally reference-counted.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    /// Lifetime of a login session, in days.
    pub session_ttl_days: i32,
    /// Whether session cookies carry the `Secure` attribute.
    pub cookie_secure: bool,
}

impl AppState {
    #[must_use]
    pub fn new(pool: PgPool, config: &ServerConfig) -> Self {
        Self { pool, session_ttl_days: config.session_ttl_days, cookie_secure: config.cookie_secure }
    }

    /// State with default session settings.
    #[must_use]
    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool, session_ttl_days: DEFAULT_SESSION_TTL_DAYS, cookie_secure: false }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
