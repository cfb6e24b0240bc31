use std::fmt;
use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::filter::FilterError;

/// Errors from the database access layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    #[error("Query construction failed: {0}")]
    Query(#[from] FilterError),

    #[error("Query timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Opens the shared connection pool.
///
/// The pool is created lazily: no connection is made until the first
/// checkout, so the server can start while the database is still coming up.
pub fn connect(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections())
        .acquire_timeout(config.acquire_timeout())
        .max_lifetime(config.max_lifetime())
        .idle_timeout(config.idle_timeout())
        .test_before_acquire(config.pre_ping)
        .connect_lazy(&config.url)?;

    info!(
        "Created database pool for {} (max {} connections)",
        config.redacted_url(),
        config.max_connections()
    );
    Ok(pool)
}

/// Pings the pool to ensure connectivity
pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Name of a per-symbol history table, `stock_<lowercased symbol>`.
///
/// Only ASCII letters and digits are accepted, so the resulting identifier
/// never needs escaping; it is still quoted when rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockTable(String);

impl StockTable {
    pub const PREFIX: &'static str = "stock_";
    /// PostgreSQL truncates identifiers beyond 63 bytes
    pub const MAX_SYMBOL_LEN: usize = 63 - Self::PREFIX.len();

    pub fn for_symbol(symbol: &str) -> Result<Self, DatabaseError> {
        if symbol.is_empty() {
            return Err(DatabaseError::InvalidSymbol("symbol cannot be empty".to_string()));
        }
        if symbol.len() > Self::MAX_SYMBOL_LEN {
            return Err(DatabaseError::InvalidSymbol(format!(
                "symbol must be at most {} characters",
                Self::MAX_SYMBOL_LEN
            )));
        }
        if !symbol.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(DatabaseError::InvalidSymbol(
                "symbol may only contain ASCII letters and digits".to_string(),
            ));
        }
        Ok(Self(format!("{}{}", Self::PREFIX, symbol.to_ascii_lowercase())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StockTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
