//! # Database Migrations
//!
//! Embedded SQL migrations and the destructive schema reset.
//!
//! ## How Migrations Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Migration Process                                  │
//! │                                                                         │
//! │  Database::new(config)                                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Check _sqlx_migrations table (created if missing)                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Compare embedded migrations vs applied                                │
//! │       │                                                                 │
//! │       └── 0001_initial_schema.sql  ✓ / ⬜                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Run pending migrations in order, record checksums                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Schema Reset
//! ```text
//! BEGIN
//!   DROP FUNCTION calculate_average_book_rating
//!   DROP TABLE order_status, order_item, comment, book_author,
//!              "order", cart_item, book, author, publisher, customer
//!   re-run every embedded migration script
//! COMMIT   (any error → ROLLBACK, the old schema stays)
//! ```
//!
//! ## Adding New Migrations
//!
//! 1. Create a new file in `migrations/postgres/` with the next sequence number
//! 2. Name format: `NNNN_description.sql`
//! 3. Write idempotent SQL (`IF NOT EXISTS`, `CREATE OR REPLACE`)
//! 4. **NEVER** modify existing migrations - always add new ones
//! 5. Add any new table to `STOREFRONT_TABLES` so reset drops it

use sqlx::PgPool;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};

/// Embedded migrations from the `migrations/postgres` directory.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/postgres");

const UNDEFINED_TABLE: &str = "42P01";

/// Tables in drop order (dependents first).
const STOREFRONT_TABLES: [&str; 10] = [
    "order_status",
    "order_item",
    "comment",
    "book_author",
    "\"order\"",
    "cart_item",
    "book",
    "author",
    "publisher",
    "customer",
];

/// Runs all pending database migrations.
///
/// ## Safety
/// - Idempotent: safe to run multiple times
/// - Transactional: each migration runs in a transaction
/// - Ordered: migrations run in filename order
pub async fn run_migrations(pool: &PgPool) -> DbResult<()> {
    info!("Checking for pending migrations");

    MIGRATOR.run(pool).await?;

    info!("All migrations applied successfully");
    Ok(())
}

/// Returns information about migrations.
///
/// ## Returns
/// Tuple of (total_migrations, applied_migrations)
pub async fn migration_status(pool: &PgPool) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    let applied: i64 =
        match sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success")
            .fetch_one(pool)
            .await
        {
            Ok(count) => count,
            // The bookkeeping table does not exist before the first run
            Err(e) if is_undefined_table(&e) => 0,
            Err(e) => return Err(e.into()),
        };

    Ok((total, applied as usize))
}

/// SQLSTATE `42P01`, `undefined_table`.
fn is_undefined_table(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db_err| db_err.code())
        .is_some_and(|code| code == UNDEFINED_TABLE)
}

/// Drops every storefront table and function, then recreates the schema.
///
/// Runs inside a single transaction. The `_sqlx_migrations` records are
/// kept, so the migrator still considers the schema current afterwards.
pub async fn reset_schema(pool: &PgPool) -> DbResult<()> {
    warn!("Resetting storefront schema, all data will be lost");

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| DbError::TransactionFailed(format!("begin: {}", e)))?;

    sqlx::query("DROP FUNCTION IF EXISTS calculate_average_book_rating(INTEGER)")
        .execute(&mut *tx)
        .await?;

    for table in STOREFRONT_TABLES {
        debug!(table, "Dropping table");
        let sql = format!("DROP TABLE IF EXISTS {} CASCADE", table);
        sqlx::query(&sql).execute(&mut *tx).await?;
    }

    for migration in MIGRATOR.iter() {
        if migration.migration_type.is_down_migration() {
            continue;
        }
        debug!(version = migration.version, description = %migration.description, "Re-applying migration");
        sqlx::raw_sql(&migration.sql).execute(&mut *tx).await?;
    }

    tx.commit()
        .await
        .map_err(|e| DbError::TransactionFailed(format!("commit: {}", e)))?;

    // Records the migrations when the database had never been migrated
    run_migrations(pool).await?;

    info!("Schema recreated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_db;

    #[test]
    fn test_embedded_migrations_present() {
        assert!(!MIGRATOR.migrations.is_empty());
        let first = MIGRATOR.iter().next().unwrap();
        assert!(first.sql.contains("CREATE TABLE IF NOT EXISTS customer"));
        assert!(first.sql.contains("calculate_average_book_rating"));
    }

    #[test]
    fn test_every_created_table_is_dropped_on_reset() {
        let sql: String = MIGRATOR.iter().map(|m| m.sql.to_string()).collect();
        for table in STOREFRONT_TABLES {
            assert!(
                sql.contains(&format!("CREATE TABLE IF NOT EXISTS {} (", table)),
                "{} missing from schema",
                table
            );
        }
    }

    #[tokio::test]
    async fn test_status_reports_lost_connection() {
        let Some(db) = test_db().await else { return };

        let (total, applied) = migration_status(db.pool()).await.unwrap();
        assert!(applied >= 1 && applied <= total);

        db.pool().close().await;
        assert!(migration_status(db.pool()).await.is_err());
    }
}
