/// TaskHub Web - Database connection pool setup.
///
/// diesel-async with deadpool: connections are checked out asynchronously so
/// no store call ever blocks the runtime.
use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::deadpool::{Object, Pool};
use secrecy::ExposeSecret;

use crate::config::DatabaseConfig;
use crate::error::{AppError, AppResult};

/// Database connection pool type.
pub type DbPool = Pool<AsyncPgConnection>;

/// Pooled async connection.
pub type DbConnection = Object<AsyncPgConnection>;

/// Create a new database connection pool.
pub fn create_pool(config: &DatabaseConfig) -> AppResult<DbPool> {
    let manager =
        AsyncDieselConnectionManager::<AsyncPgConnection>::new(config.url.expose_secret());

    let pool = Pool::builder(manager)
        .max_size(config.max_connections)
        .build()
        .map_err(|e| AppError::Config(format!("Failed to create database pool: {}", e)))?;

    tracing::info!(
        max_connections = config.max_connections,
        "Database pool created"
    );

    Ok(pool)
}

/// Check a connection out of the pool.
pub async fn get_connection(pool: &DbPool) -> AppResult<DbConnection> {
    pool.get()
        .await
        .map_err(|e| AppError::Pool(e.to_string()))
}
