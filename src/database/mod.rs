//! Database connection provider
//!
//! [`Db`] owns a MySQL connection pool built from a [`DbConfig`]. By default
//! every operation acquires its own pooled connection and releases it on
//! completion; callers needing multi-statement atomicity take a transaction
//! from [`Db::begin`] and pass it through the `*_on` operation variants.
//!
//! Connecting performs exactly one recovery attempt: when the server reports
//! an unknown database, the target database is created and the connection is
//! retried once. No other failure is retried anywhere in the crate.

use crate::config::DbConfig;
use crate::error::{OrmError, Result};
use crate::query::Repo;
use crate::schema::{quote_ident, ModelDescriptor};
use sqlx::mysql::{MySql, MySqlConnection, MySqlDatabaseError, MySqlPool, MySqlPoolOptions};
use sqlx::pool::PoolConnection;
use sqlx::{Connection, Transaction};
use tracing::info;

/// MySQL error 1049, ER_BAD_DB_ERROR
const ER_BAD_DB_ERROR: u16 = 1049;

/// Connection provider: a configured MySQL pool
#[derive(Debug)]
pub struct Db {
    pool: MySqlPool,
    config: DbConfig,
}

impl Db {
    /// Connect to the configured database.
    ///
    /// When the target database does not exist it is created once and the
    /// connection retried; any other failure surfaces as
    /// [`OrmError::Connection`].
    pub async fn connect(config: DbConfig) -> Result<Self> {
        config.validate()?;

        let pool = match Self::try_pool(&config).await {
            Ok(pool) => pool,
            Err(err) if is_unknown_database(&err) => {
                info!(database = %config.database, "database not found, creating it");
                Self::create_database(&config).await?;
                Self::try_pool(&config).await.map_err(|source| {
                    OrmError::Connection {
                        context: format!("reconnecting to {} after creation", config.database),
                        source,
                    }
                })?
            }
            Err(source) => {
                return Err(OrmError::Connection {
                    context: format!("connecting to {}:{}", config.host, config.port),
                    source,
                })
            }
        };

        Ok(Self { pool, config })
    }

    async fn try_pool(config: &DbConfig) -> std::result::Result<MySqlPool, sqlx::Error> {
        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url())
            .await?;
        // Probe so a lazily established pool fails here, not mid-operation
        sqlx::query("SELECT 1").fetch_one(&pool).await?;
        Ok(pool)
    }

    async fn create_database(config: &DbConfig) -> Result<()> {
        let mut conn = MySqlConnection::connect(&config.server_url())
            .await
            .map_err(|source| OrmError::Connection {
                context: format!("connecting to server {}:{}", config.host, config.port),
                source,
            })?;

        let sql = format!(
            "CREATE DATABASE IF NOT EXISTS {}",
            quote_ident(&config.database)
        );
        sqlx::query(&sql)
            .execute(&mut conn)
            .await
            .map_err(|source| OrmError::Connection {
                context: format!("creating database {}", config.database),
                source,
            })?;

        conn.close().await.ok();
        Ok(())
    }

    /// The configuration this provider was built from.
    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    /// The underlying pool.
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    /// Acquire one pooled connection. Dropping it returns it to the pool.
    pub async fn acquire(&self) -> Result<PoolConnection<MySql>> {
        Ok(self.pool.acquire().await?)
    }

    /// Begin a transaction on a dedicated connection.
    ///
    /// The transaction commits only through an explicit
    /// [`commit`](sqlx::Transaction::commit); dropping it without committing
    /// rolls back and releases the connection. Pass `&mut tx` to the `*_on`
    /// operation variants to run statements inside it.
    pub async fn begin(&self) -> Result<Transaction<'static, MySql>> {
        Ok(self.pool.begin().await?)
    }

    /// CRUD operations for one model on this provider.
    pub fn repo<'a>(&'a self, model: &'a ModelDescriptor) -> Repo<'a> {
        Repo::new(self, model)
    }

    /// Execute one statement on the pool, returning affected rows.
    pub async fn execute(&self, sql: &str) -> Result<u64> {
        let result = sqlx::query(sql).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    /// Whether the server currently answers a trivial probe.
    pub async fn is_connected(&self) -> bool {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await.is_ok()
    }

    /// Close the pool and all its connections.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Whether an error is the server's "unknown database" condition.
fn is_unknown_database(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.try_downcast_ref::<MySqlDatabaseError>())
        .map(|mysql| mysql.number() == ER_BAD_DB_ERROR)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_rejects_invalid_config() {
        // Validation fails before any network activity
        let config = DbConfig::new("", "root", "", "test");
        let err = Db::connect(config).await.unwrap_err();
        assert!(matches!(err, OrmError::Config(_)));
    }

    #[test]
    fn test_non_database_errors_are_not_unknown_database() {
        assert!(!is_unknown_database(&sqlx::Error::RowNotFound));
        assert!(!is_unknown_database(&sqlx::Error::PoolClosed));
    }
}
