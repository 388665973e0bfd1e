//! # bookstore-core: Pure Domain Logic for the Bookstore Storefront
//!
//! This crate holds every business rule of the storefront as pure functions
//! and plain data. It never touches the database, the network or the file
//! system.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Bookstore Storefront Architecture                   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    storefront CLI (apps/storefront)             │   │
//! │  │    books ──► search ──► cart ──► checkout ──► orders/profile    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ bookstore-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌─────────┐ │   │
//! │  │   │  types  │ │  money  │ │  cart   │ │ checkout │ │ filter  │ │   │
//! │  │   │  DTOs   │ │  Money  │ │  Cart   │ │ Payment  │ │Criteria │ │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └──────────┘ └─────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                bookstore-db (PostgreSQL Layer)                  │   │
//! │  │            repositories, migrations, order transaction          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Display DTOs mapped from result rows (books, authors, orders...)
//! - [`money`] - Money type with integer arithmetic
//! - [`filter`] - Catalogue filter criteria and the filter manager
//! - [`cart`] - Cart math and stock reconciliation
//! - [`checkout`] - Payment methods, order lines, loyalty points
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use bookstore_core::money::Money;
//! use bookstore_core::checkout::loyalty_points_for;
//!
//! let total = Money::from_cents(25_990); // 259.90
//! assert_eq!(loyalty_points_for(total), 25);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod checkout;
pub mod error;
pub mod filter;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartAdjustment, CartItem};
pub use checkout::{CheckoutRequest, OrderLine, PaymentMethod, PlacedOrder};
pub use error::{CoreError, CoreResult, ValidationError};
pub use filter::{BookFilterCriteria, BookFilterManager};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity of a single book in the cart.
///
/// Stock is the real bound; this catches typos like 1000 instead of 10.
pub const MAX_ITEM_QUANTITY: i32 = 999;

/// Consecutive failed logins allowed per email before further attempts
/// are refused.
pub const MAX_LOGIN_ATTEMPTS: u32 = 5;

/// Default number of books on a genre shelf.
pub const DEFAULT_GENRE_LIMIT: i64 = 10;

/// Default number of search suggestions.
pub const DEFAULT_SUGGESTION_LIMIT: i64 = 10;

/// Default number of similar books shown on a details page.
pub const DEFAULT_SIMILAR_LIMIT: i64 = 5;

/// Status every new order starts with.
pub const INITIAL_ORDER_STATUS: &str = "New";
