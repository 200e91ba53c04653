use eventor_core::StoreError;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::time::Duration;
use tracing::info;

use crate::app_config::DatabaseConfig;

#[derive(Clone)]
pub struct DbClient {
    pub pool: Pool<Postgres>,
}

impl DbClient {
    /// Builds the pool without touching the network. An unreachable database
    /// shows up as a failed request instead of a failed boot.
    pub fn connect_lazy(config: &DatabaseConfig, connection_string: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .connect_lazy(connection_string)?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("../migrations")
            .run(&self.pool)
            .await?;
        info!("Migrations completed successfully.");
        Ok(())
    }
}

/// Maps a driver error onto the store taxonomy. Connectivity problems become
/// `Unavailable`, unique violations `Conflict`, everything else `Internal`.
pub(crate) fn db_err(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Configuration(_) => StoreError::Unavailable(err.to_string()),
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Conflict(db.message().to_string())
        }
        _ => StoreError::Internal(err.to_string()),
    }
}

/// Decodes a text column that holds an enum.
pub(crate) fn parse_column<T>(column: &str, raw: &str) -> Result<T, StoreError>
where
    T: std::str::FromStr,
{
    raw.parse::<T>()
        .map_err(|_| StoreError::Internal(format!("unexpected {} value '{}'", column, raw)))
}
