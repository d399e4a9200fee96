//! # SQLite Connection Pool
//!
//! Opening the shop database and keeping a small pool of connections to it.
//!
//! ```text
//! DbConfig ──► connect_options()        file: WAL, NORMAL sync, FKs, busy wait
//!    │                                  memory: one shared connection, FKs
//!    ▼
//! Database::new ──► SqlitePool ──► embedded migrations ──► ready
//!    │
//!    └── one handle serves Catalog/Client/Vehicle/Order repositories
//! ```
//!
//! Several counter terminals may point at the same file. WAL lets catalog
//! reads proceed while an order is being written, and the busy timeout makes
//! a second writer wait instead of failing at once.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;

const IN_MEMORY_PATH: &str = ":memory:";
const CONNECTION_MAX_LIFETIME: Duration = Duration::from_secs(30 * 60);
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// How to open the shop database.
///
/// ```rust,ignore
/// let config = DbConfig::new("/var/lib/torque/torque.db").max_connections(4);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_path: PathBuf,

    /// A single shop rarely needs more than a handful.
    pub max_connections: u32,
    pub min_connections: u32,

    /// How long to wait for a free connection.
    pub connect_timeout: Duration,

    /// `None` keeps idle connections forever. An in-memory database must,
    /// or its data vanishes with the last connection.
    pub idle_timeout: Option<Duration>,

    /// Apply pending migrations while connecting.
    pub run_migrations: bool,
}

impl DbConfig {
    /// File-backed database at `path`, created on first use.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(10 * 60)),
            run_migrations: true,
        }
    }

    /// Private throwaway database, used by tests.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(IN_MEMORY_PATH),
            // A second connection would open a second, empty database
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: None,
            run_migrations: true,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == IN_MEMORY_PATH
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let invalid = |e: sqlx::Error| DbError::ConnectionFailed(e.to_string());

        if self.is_in_memory() {
            let options = SqliteConnectOptions::from_str("sqlite::memory:").map_err(invalid)?;
            return Ok(options.foreign_keys(true));
        }

        let url = format!("sqlite://{}", self.database_path.display());
        Ok(SqliteConnectOptions::from_str(&url)
            .map_err(invalid)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT))
    }

    fn pool_options(&self) -> SqlitePoolOptions {
        let max_lifetime = (!self.is_in_memory()).then_some(CONNECTION_MAX_LIFETIME);

        SqlitePoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(self.connect_timeout)
            .idle_timeout(self.idle_timeout)
            .max_lifetime(max_lifetime)
    }
}

/// The SQLite store.
///
/// Every repository trait is implemented on this type, in the
/// [`repository`](crate::repository) submodules. Clones share one pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the database and, unless disabled, brings the schema up to date.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(path = %config.database_path.display(), "Opening shop database");

        let pool = config
            .pool_options()
            .connect_with(config.connect_options()?)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;
        debug!(
            max_connections = config.max_connections,
            in_memory = config.is_in_memory(),
            "Pool ready"
        );

        let db = Database { pool };
        if config.run_migrations {
            db.run_migrations().await?;
        }
        Ok(db)
    }

    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Every later repository call fails `Unavailable`.
    pub async fn close(&self) {
        info!("Closing shop database");
        self.pool.close().await;
    }

    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database_is_migrated() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.health_check().await);

        let (embedded, applied) = migrations::migration_status(db.pool()).await.unwrap();
        assert!(embedded >= 1);
        assert_eq!(embedded, applied);
    }

    #[tokio::test]
    async fn test_closed_pool_is_unhealthy() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.close().await;
        assert!(!db.health_check().await);
    }

    #[tokio::test]
    async fn test_file_database_created_on_first_use() {
        let path = std::env::temp_dir().join(format!("torque-{}.db", uuid::Uuid::new_v4()));
        let db = Database::new(DbConfig::new(&path).max_connections(2))
            .await
            .unwrap();
        assert!(db.health_check().await);
        db.close().await;

        assert!(path.exists());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_config_builder() {
        let config = DbConfig::new("/tmp/shop.db")
            .max_connections(3)
            .min_connections(2)
            .idle_timeout(None)
            .run_migrations(false);

        assert_eq!(config.max_connections, 3);
        assert_eq!(config.min_connections, 2);
        assert!(config.idle_timeout.is_none());
        assert!(!config.run_migrations);
        assert!(!config.is_in_memory());
        assert!(DbConfig::in_memory().is_in_memory());
    }
}
