//! # Database Pool Management
//!
//! Connection pool creation and the `Database` facade.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Database Connection Pool                           │
//! │                                                                         │
//! │  storefront startup                                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbConfig::new(host, port, db, user, pw) ← or DbConfig::from_url(url)  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new(config).await ← Create pool + run migrations            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────┐                           │
//! │  │              PgPool                      │                           │
//! │  │  ┌─────┐ ┌─────┐ ┌─────┐ ┌─────┐       │                           │
//! │  │  │Conn1│ │Conn2│ │Conn3│ │Conn4│ ...   │  (max_connections)        │
//! │  │  └─────┘ └─────┘ └─────┘ └─────┘       │                           │
//! │  └─────────────────────────────────────────┘                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  db.books() / db.carts() / db.orders() ... ← cheap handles, share pool │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use serde::Serialize;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::author::AuthorRepository;
use crate::repository::book::BookRepository;
use crate::repository::cart::CartRepository;
use crate::repository::comment::CommentRepository;
use crate::repository::customer::CustomerRepository;
use crate::repository::order::OrderRepository;

// =============================================================================
// Configuration
// =============================================================================

/// Database configuration.
///
/// ## Example
/// ```rust
/// use bookstore_db::DbConfig;
///
/// let config = DbConfig::new("localhost", 5432, "bookstore", "postgres", "")
///     .max_connections(5)
///     .min_connections(1);
/// assert_eq!(config.display_target(), "postgres@localhost:5432/bookstore");
/// ```
#[derive(Clone)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    password: String,

    /// Full connection URL. Takes precedence over the discrete fields.
    url: Option<String>,

    /// Maximum number of connections in the pool.
    /// Default: 5 (one CLI process rarely needs more)
    pub max_connections: u32,

    /// Minimum number of connections to keep alive.
    /// Default: 0
    pub min_connections: u32,

    /// Connection timeout duration.
    /// Default: 10 seconds
    pub connect_timeout: Duration,

    /// Idle timeout before closing a connection.
    /// Default: 10 minutes
    pub idle_timeout: Duration,

    /// Whether to run migrations on connect.
    /// Default: true
    pub run_migrations: bool,
}

impl std::fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbConfig")
            .field("target", &self.display_target())
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .field("connect_timeout", &self.connect_timeout)
            .field("run_migrations", &self.run_migrations)
            .finish_non_exhaustive()
    }
}

impl DbConfig {
    /// Creates a configuration from discrete connection parameters.
    pub fn new(
        host: impl Into<String>,
        port: u16,
        database: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        DbConfig {
            host: host.into(),
            port,
            database: database.into(),
            user: user.into(),
            password: password.into(),
            url: None,
            max_connections: 5,
            min_connections: 0,
            connect_timeout: Duration::from_secs(10),
            idle_timeout: Duration::from_secs(600),
            run_migrations: true,
        }
    }

    /// Creates a configuration from a `postgres://` URL.
    ///
    /// ## Errors
    /// `DbError::ConnectionFailed` when the URL cannot be parsed.
    pub fn from_url(url: &str) -> DbResult<Self> {
        let options = PgConnectOptions::from_str(url)
            .map_err(|e| DbError::ConnectionFailed(format!("invalid database URL: {}", e)))?;

        let mut config = DbConfig::new(
            options.get_host(),
            options.get_port(),
            options.get_database().unwrap_or_default(),
            options.get_username(),
            "",
        );
        config.url = Some(url.to_string());
        Ok(config)
    }

    /// Sets the maximum number of connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the minimum number of connections.
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Sets the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the idle timeout.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Sets whether to run migrations on connect.
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// `user@host:port/database`, never the password.
    pub fn display_target(&self) -> String {
        format!("{}@{}:{}/{}", self.user, self.host, self.port, self.database)
    }

    fn connect_options(&self) -> DbResult<PgConnectOptions> {
        if let Some(url) = &self.url {
            return PgConnectOptions::from_str(url)
                .map_err(|e| DbError::ConnectionFailed(e.to_string()));
        }

        let mut options = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.database)
            .username(&self.user)
            .application_name("bookstore-storefront");
        if !self.password.is_empty() {
            options = options.password(&self.password);
        }
        Ok(options)
    }
}

// =============================================================================
// Table Counts
// =============================================================================

/// Row counts per storefront table, for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCounts {
    pub customers: i64,
    pub publishers: i64,
    pub authors: i64,
    pub books: i64,
    pub orders: i64,
    pub order_items: i64,
    pub order_statuses: i64,
    pub comments: i64,
    pub cart_items: i64,
}

impl TableCounts {
    /// `(table, count)` pairs in schema order.
    pub fn rows(&self) -> [(&'static str, i64); 9] {
        [
            ("customer", self.customers),
            ("publisher", self.publishers),
            ("author", self.authors),
            ("book", self.books),
            ("order", self.orders),
            ("order_item", self.order_items),
            ("order_status", self.order_statuses),
            ("comment", self.comments),
            ("cart_item", self.cart_items),
        ]
    }
}

// =============================================================================
// Database
// =============================================================================

/// Main database handle providing repository access.
///
/// Cloning is cheap: the pool is reference counted and every repository
/// handle holds its own clone.
///
/// ## Usage
/// ```rust,ignore
/// let db = Database::new(config).await?;
/// let books = db.books().list_for_display(20, 0).await?;
/// let placed = db.orders().create_order(7, &lines, "Kyiv", None).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connects to PostgreSQL.
    ///
    /// ## What This Does
    /// 1. Builds `PgConnectOptions` from the config
    /// 2. Creates the connection pool and opens the first connection
    /// 3. Runs migrations (if enabled)
    ///
    /// ## Returns
    /// * `Ok(Database)` - Ready-to-use database handle
    /// * `Err(DbError)` - Connection or migration failed
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(database = %config.display_target(), "Initializing database connection");

        let connect_options = config.connect_options()?;
        debug!("Connection options configured");

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            "Database pool created"
        );

        let db = Database { pool };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Wraps an existing pool (tests, tools).
    pub fn from_pool(pool: PgPool) -> Self {
        Database { pool }
    }

    /// Runs database migrations.
    ///
    /// Idempotent: applied migrations are tracked in `_sqlx_migrations`.
    pub async fn run_migrations(&self) -> DbResult<()> {
        info!("Running database migrations");
        migrations::run_migrations(&self.pool).await?;
        info!("Migrations complete");
        Ok(())
    }

    /// Drops and recreates every storefront table in one transaction.
    ///
    /// All data is lost. On failure nothing changes.
    pub async fn reset_schema(&self) -> DbResult<()> {
        migrations::reset_schema(&self.pool).await
    }

    /// `(total, applied)` migration counts.
    pub async fn migration_status(&self) -> DbResult<(usize, usize)> {
        migrations::migration_status(&self.pool).await
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn books(&self) -> BookRepository {
        BookRepository::new(self.pool.clone())
    }

    pub fn authors(&self) -> AuthorRepository {
        AuthorRepository::new(self.pool.clone())
    }

    pub fn customers(&self) -> CustomerRepository {
        CustomerRepository::new(self.pool.clone())
    }

    pub fn carts(&self) -> CartRepository {
        CartRepository::new(self.pool.clone())
    }

    pub fn orders(&self) -> OrderRepository {
        OrderRepository::new(self.pool.clone())
    }

    pub fn comments(&self) -> CommentRepository {
        CommentRepository::new(self.pool.clone())
    }

    /// Row counts of every storefront table.
    pub async fn table_counts(&self) -> DbResult<TableCounts> {
        let mut counts = TableCounts::default();

        for (table, slot) in [
            ("customer", &mut counts.customers),
            ("publisher", &mut counts.publishers),
            ("author", &mut counts.authors),
            ("book", &mut counts.books),
            ("\"order\"", &mut counts.orders),
            ("order_item", &mut counts.order_items),
            ("order_status", &mut counts.order_statuses),
            ("comment", &mut counts.comments),
            ("cart_item", &mut counts.cart_items),
        ] {
            // Table names come from the fixed list above
            let sql = format!("SELECT COUNT(*) FROM {}", table);
            *slot = sqlx::query_scalar::<_, i64>(&sql)
                .fetch_one(&self.pool)
                .await?;
        }

        debug!(?counts, "Counted table rows");
        Ok(counts)
    }

    /// Closes the connection pool. Repository calls fail afterwards.
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }

    /// Checks if the database is healthy (can execute queries).
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_db;

    #[test]
    fn test_config_builder() {
        let config = DbConfig::new("db.internal", 5433, "shop", "reader", "secret")
            .max_connections(10)
            .min_connections(2)
            .run_migrations(false);

        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 2);
        assert!(!config.run_migrations);
        assert_eq!(config.display_target(), "reader@db.internal:5433/shop");
    }

    #[test]
    fn test_debug_hides_password() {
        let config = DbConfig::new("localhost", 5432, "bookstore", "postgres", "hunter2");
        assert!(!format!("{:?}", config).contains("hunter2"));
    }

    #[test]
    fn test_from_url() {
        let config = DbConfig::from_url("postgres://alice:pw@example.org:6543/books").unwrap();
        assert_eq!(config.display_target(), "alice@example.org:6543/books");

        assert!(DbConfig::from_url("not a url").is_err());
    }

    #[test]
    fn test_table_counts_rows() {
        let counts = TableCounts {
            books: 20,
            ..Default::default()
        };
        assert_eq!(counts.rows()[3], ("book", 20));
    }

    #[tokio::test]
    async fn test_health_check_and_counts() {
        let Some(db) = test_db().await else { return };

        assert!(db.health_check().await);
        let counts = db.table_counts().await.unwrap();
        assert!(counts.books >= 0);

        let (total, applied) = db.migration_status().await.unwrap();
        assert!(total >= 1);
        assert_eq!(total, applied);
    }
}
