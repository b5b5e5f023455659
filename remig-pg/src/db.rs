//! Database Connection Pool Module
//!
//! PostgreSQL connection pooling using deadpool-postgres, exposed to the
//! repair stage as a [`ConnectionGate`]. Each acquired handle is a pooled
//! connection that returns to the pool when dropped.

use crate::error::{pool_error, query_error, PgError, PgResult};
use async_trait::async_trait;
use deadpool_postgres::{Config, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime};
use remig_core::{
    CatalogQuery, ColumnDescriptor, ConnectionGate, QueryHandle, RepairConfig, RepairStatement,
    StoreError,
};
use std::time::Duration;
use tokio_postgres::NoTls;

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database connection pool configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// PostgreSQL host
    pub host: String,
    /// PostgreSQL port
    pub port: u16,
    /// Database name
    pub dbname: String,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Maximum pool size
    pub max_size: usize,
    /// Connection checkout timeout
    pub timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "postgres".to_string(),
            user: "postgres".to_string(),
            password: "".to_string(),
            max_size: 16,
            timeout: Duration::from_secs(30),
        }
    }
}

impl DbConfig {
    /// Create a new database configuration from environment variables.
    ///
    /// The database name falls back to the repair target's database.
    pub fn from_env(repair: &RepairConfig) -> Self {
        Self {
            host: std::env::var("REMIG_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("REMIG_DB_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5432),
            dbname: std::env::var("REMIG_DB_NAME")
                .unwrap_or_else(|_| repair.target_database.clone()),
            user: std::env::var("REMIG_DB_USER").unwrap_or_else(|_| "postgres".to_string()),
            password: std::env::var("REMIG_DB_PASSWORD").unwrap_or_default(),
            max_size: std::env::var("REMIG_DB_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(16),
            timeout: Duration::from_secs(
                std::env::var("REMIG_DB_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
        }
    }

    /// Create a connection pool from this configuration.
    pub fn create_pool(&self) -> PgResult<Pool> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });
        let mut pool = PoolConfig::new(self.max_size);
        pool.timeouts.wait = Some(self.timeout);
        pool.timeouts.create = Some(self.timeout);
        pool.timeouts.recycle = Some(self.timeout);
        cfg.pool = Some(pool);

        cfg.create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| PgError::Pool(e.to_string()))
    }
}

// ============================================================================
// CONNECTION GATE
// ============================================================================

/// Connection gate over a deadpool-postgres pool.
#[derive(Clone)]
pub struct PgGate {
    pool: Pool,
}

impl PgGate {
    /// Create a new gate with the given pool.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create a new gate from configuration.
    pub fn from_config(config: &DbConfig) -> PgResult<Self> {
        let pool = config.create_pool()?;
        Ok(Self::new(pool))
    }

    /// Get the current pool size for observability.
    pub fn pool_size(&self) -> usize {
        self.pool.status().size
    }
}

#[async_trait]
impl ConnectionGate for PgGate {
    async fn acquire(&self) -> Result<Box<dyn QueryHandle>, StoreError> {
        let conn = self.pool.get().await.map_err(pool_error)?;
        Ok(Box::new(PgHandle { conn }))
    }
}

/// A pooled connection; dropping it returns the connection to the pool.
struct PgHandle {
    conn: deadpool_postgres::Object,
}

#[async_trait]
impl QueryHandle for PgHandle {
    async fn query_catalog(
        &mut self,
        query: &CatalogQuery,
    ) -> Result<Vec<ColumnDescriptor>, StoreError> {
        let rows = self
            .conn
            .query(
                query.sql(),
                &[&query.database, &query.schema, &query.data_type],
            )
            .await
            .map_err(query_error)?;

        rows.iter()
            .map(|row| {
                let table: String = row.try_get(0).map_err(query_error)?;
                let column: String = row.try_get(1).map_err(query_error)?;
                Ok(ColumnDescriptor::new(table, column))
            })
            .collect()
    }

    async fn execute(&mut self, statement: &RepairStatement) -> Result<u64, StoreError> {
        self.conn
            .execute(statement.sql(), &[])
            .await
            .map_err(query_error)
    }
}
