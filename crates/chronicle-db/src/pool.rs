//! SQLite connection pool construction

use crate::error::Result;
use chronicle_conf::DatabaseSettings;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

/// Open a pool for the configured database, creating the file if missing
pub async fn connect(settings: &DatabaseSettings) -> Result<SqlitePool> {
	let options = SqliteConnectOptions::from_str(&settings.url)?
		.create_if_missing(true)
		.foreign_keys(true);
	let pool = SqlitePoolOptions::new()
		.max_connections(settings.max_connections)
		.connect_with(options)
		.await?;
	tracing::info!(url = %settings.url, "connected to database");
	Ok(pool)
}

/// Single-connection in-memory database
///
/// Every SQLite connection to `:memory:` owns a separate database, so the
/// pool is pinned to one connection that is never recycled.
pub async fn connect_in_memory() -> Result<SqlitePool> {
	let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
	let pool = SqlitePoolOptions::new()
		.max_connections(1)
		.min_connections(1)
		.idle_timeout(None)
		.max_lifetime(None)
		.connect_with(options)
		.await?;
	Ok(pool)
}
