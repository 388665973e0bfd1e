//! # Domain Types
//!
//! Display DTOs that the storefront renders. Each struct mirrors one result
//! row shape; the repositories in `bookstore-db` fill the nested collections.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Storefront DTOs                                 │
//! │                                                                         │
//! │  ┌──────────────────┐   ┌──────────────────┐   ┌──────────────────┐    │
//! │  │ BookDisplayInfo  │   │ AuthorDisplayInfo│   │ OrderDisplayInfo │    │
//! │  │  book_id         │   │  author_id       │   │  order_id        │    │
//! │  │  title, authors  │   │  first/last name │   │  total_amount    │    │
//! │  │  price_cents     │   │  nationality     │   │  items ─────────►│ OrderItemDisplayInfo
//! │  │  stock_quantity  │   └────────┬─────────┘   │  statuses ──────►│ OrderStatusDisplayInfo
//! │  └────────┬─────────┘            │             └──────────────────┘    │
//! │           │                      ▼                                      │
//! │           ▼              AuthorDetailsInfo (+ biography, books)         │
//! │   BookDetailsInfo (+ publisher, isbn, comments ──► CommentDisplayInfo)  │
//! │                                                                         │
//! │  CustomerLoginInfo   CustomerRegistrationInfo   CustomerProfileInfo     │
//! │  SearchSuggestion (Book | Author)                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! All ids are PostgreSQL `SERIAL` keys (`i32`). Prices are minor units
//! (`i64`), see [`crate::money`].

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Books
// =============================================================================

/// A book as shown in lists, shelves and the cart.
///
/// `authors` is a comma-separated list of full names and is empty (never
/// absent) when the book has no linked authors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct BookDisplayInfo {
    pub book_id: i32,
    pub title: String,
    pub authors: String,
    pub price_cents: i64,
    pub cover_image_path: String,
    pub stock_quantity: i32,
    pub genre: String,
}

impl BookDisplayInfo {
    /// Returns the price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Whether at least one copy is available.
    #[inline]
    pub fn in_stock(&self) -> bool {
        self.stock_quantity > 0
    }
}

/// A review left by a customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct CommentDisplayInfo {
    /// Full name of the customer who wrote the comment.
    pub author_name: String,
    pub comment_date: DateTime<Utc>,
    /// 1-5, or `None` when the customer left no rating.
    pub rating: Option<i32>,
    pub comment_text: String,
}

/// Everything shown on a book's page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct BookDetailsInfo {
    pub book_id: i32,
    pub title: String,
    pub authors: String,
    pub price_cents: i64,
    pub cover_image_path: String,
    pub stock_quantity: i32,
    pub genre: String,
    pub description: Option<String>,
    pub publisher_name: Option<String>,
    pub publication_date: Option<NaiveDate>,
    pub isbn: Option<String>,
    pub page_count: Option<i32>,
    pub language: Option<String>,
    /// Average of the non-null ratings, `None` when nobody rated the book.
    pub average_rating: Option<f64>,
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub comments: Vec<CommentDisplayInfo>,
}

impl BookDetailsInfo {
    /// Returns the price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Projects the details onto the list/cart shape.
    pub fn to_display(&self) -> BookDisplayInfo {
        BookDisplayInfo {
            book_id: self.book_id,
            title: self.title.clone(),
            authors: self.authors.clone(),
            price_cents: self.price_cents,
            cover_image_path: self.cover_image_path.clone(),
            stock_quantity: self.stock_quantity,
            genre: self.genre.clone(),
        }
    }
}

// =============================================================================
// Authors
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct AuthorDisplayInfo {
    pub author_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub nationality: Option<String>,
    pub image_path: Option<String>,
}

impl AuthorDisplayInfo {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Author page: display fields plus biography and bibliography.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct AuthorDetailsInfo {
    pub author_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub nationality: Option<String>,
    pub image_path: Option<String>,
    pub biography: Option<String>,
    pub birth_date: Option<NaiveDate>,
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub books: Vec<BookDisplayInfo>,
}

impl AuthorDetailsInfo {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

// =============================================================================
// Customers
// =============================================================================

/// What the login check needs: the id and the stored password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct CustomerLoginInfo {
    pub customer_id: i32,
    pub password_hash: String,
}

/// Input of the registration form. `password` is plain text and is hashed
/// before it reaches the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRegistrationInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct CustomerProfileInfo {
    pub customer_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub join_date: NaiveDate,
    pub loyalty_program: bool,
    pub loyalty_points: i32,
}

impl CustomerProfileInfo {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

// =============================================================================
// Orders
// =============================================================================

/// One line of a placed order. The price is frozen at checkout time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct OrderItemDisplayInfo {
    pub book_title: String,
    pub quantity: i32,
    pub price_per_unit_cents: i64,
}

impl OrderItemDisplayInfo {
    /// Unit price × quantity.
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.price_per_unit_cents) * self.quantity
    }
}

/// One entry of an order's status history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusDisplayInfo {
    pub status: String,
    pub status_date: DateTime<Utc>,
    pub tracking_number: Option<String>,
}

/// An order with its lines and status history.
///
/// ## Invariant
/// `statuses` is in chronological order, so the current status is the last
/// entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct OrderDisplayInfo {
    pub order_id: i32,
    pub order_date: DateTime<Utc>,
    pub total_amount_cents: i64,
    pub shipping_address: String,
    pub payment_method: Option<String>,
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub items: Vec<OrderItemDisplayInfo>,
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub statuses: Vec<OrderStatusDisplayInfo>,
}

impl OrderDisplayInfo {
    /// Returns the total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_amount_cents)
    }

    /// The most recent status entry, if any.
    pub fn latest_status(&self) -> Option<&OrderStatusDisplayInfo> {
        self.statuses.last()
    }
}

// =============================================================================
// Search
// =============================================================================

/// What a search suggestion points to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    Book,
    Author,
}

impl SuggestionKind {
    /// Maps the `type` column of the suggestion query. Unknown values yield
    /// `None` and the row is skipped.
    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "book" => Some(SuggestionKind::Book),
            "author" => Some(SuggestionKind::Author),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionKind::Book => "book",
            SuggestionKind::Author => "author",
        }
    }
}

/// One entry of the search completer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSuggestion {
    pub kind: SuggestionKind,
    pub id: i32,
    pub display_text: String,
    pub image_path: Option<String>,
    /// Only books carry a price.
    pub price_cents: Option<i64>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn status(name: &str, day: u32) -> OrderStatusDisplayInfo {
        OrderStatusDisplayInfo {
            status: name.to_string(),
            status_date: Utc.with_ymd_and_hms(2024, 5, day, 12, 0, 0).unwrap(),
            tracking_number: None,
        }
    }

    #[test]
    fn test_latest_status_is_last_entry() {
        let order = OrderDisplayInfo {
            order_id: 1,
            order_date: Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
            total_amount_cents: 45_000,
            shipping_address: "Kyiv, Khreshchatyk 1".to_string(),
            payment_method: Some("Cash on delivery".to_string()),
            items: vec![],
            statuses: vec![status("New", 1), status("Shipped", 3)],
        };

        assert_eq!(order.latest_status().unwrap().status, "Shipped");
        assert_eq!(order.total().to_string(), "450.00");
    }

    #[test]
    fn test_line_total() {
        let item = OrderItemDisplayInfo {
            book_title: "Kobzar".to_string(),
            quantity: 3,
            price_per_unit_cents: 12_050,
        };
        assert_eq!(item.line_total().cents(), 36_150);
    }

    #[test]
    fn test_suggestion_kind_from_db() {
        assert_eq!(SuggestionKind::from_db("book"), Some(SuggestionKind::Book));
        assert_eq!(
            SuggestionKind::from_db("author"),
            Some(SuggestionKind::Author)
        );
        assert_eq!(SuggestionKind::from_db("publisher"), None);
    }

    #[test]
    fn test_dto_serializes_camel_case() {
        let book = BookDisplayInfo {
            book_id: 3,
            title: "Dune".to_string(),
            authors: String::new(),
            price_cents: 39_900,
            cover_image_path: String::new(),
            stock_quantity: 0,
            genre: "Science Fiction".to_string(),
        };
        let json = serde_json::to_string(&book).unwrap();
        assert!(json.contains("\"bookId\":3"));
        assert!(json.contains("\"stockQuantity\":0"));
        assert!(!book.in_stock());
    }
}
