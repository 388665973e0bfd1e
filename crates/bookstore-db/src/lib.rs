//! # bookstore-db: PostgreSQL Layer for the Bookstore Storefront
//!
//! This crate provides database access for the storefront. It owns the
//! connection pool, the schema and every SQL statement.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Bookstore Storefront Data Flow                      │
//! │                                                                         │
//! │  CLI command (storefront checkout)                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   bookstore-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ BookRepo      │    │              │  │   │
//! │  │   │ PgPool        │◄───│ CustomerRepo  │    │ 0001_initial │  │   │
//! │  │   │ facade        │    │ OrderRepo ... │    │ _schema.sql  │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     PostgreSQL                                  │   │
//! │  │   postgres://postgres@localhost:5432/bookstore                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool and the `Database` facade
//! - [`migrations`] - Embedded migrations and schema reset
//! - [`error`] - Database error types
//! - [`repository`] - One repository per aggregate (book, cart, order, ...)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bookstore_db::{Database, DbConfig};
//!
//! let config = DbConfig::new("localhost", 5432, "bookstore", "postgres", "");
//! let db = Database::new(config).await?;
//!
//! let shelf = db.books().by_genre("Fantasy", 10).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig, TableCounts};

// Repository re-exports for convenience
pub use repository::author::AuthorRepository;
pub use repository::book::BookRepository;
pub use repository::cart::CartRepository;
pub use repository::comment::CommentRepository;
pub use repository::customer::CustomerRepository;
pub use repository::order::OrderRepository;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
