//! # Repository Module
//!
//! Database repository implementations for the storefront.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  CLI command                                                           │
//! │       │                                                                 │
//! │       │  db.books().by_genre("Fantasy", 10)                            │
//! │       ▼                                                                 │
//! │  BookRepository                                                        │
//! │  ├── list_for_display(&self, limit, offset)                            │
//! │  ├── filtered(&self, criteria)                                         │
//! │  ├── details(&self, id)                                                │
//! │  └── search_suggestions(&self, prefix, limit)                          │
//! │       │                                                                 │
//! │       │  SQL Query ($1, $2 ... bound parameters)                        │
//! │       ▼                                                                 │
//! │  PostgreSQL                                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`book::BookRepository`] - Catalogue listing, filters, details, search
//! - [`author::AuthorRepository`] - Author list and author pages
//! - [`customer::CustomerRepository`] - Login, registration, profile, loyalty
//! - [`cart::CartRepository`] - Persistent cart rows
//! - [`order::OrderRepository`] - The order transaction and order history
//! - [`comment::CommentRepository`] - Reviews and ratings

pub mod author;
pub mod book;
pub mod cart;
pub mod comment;
pub mod customer;
pub mod order;

/// Select list shared by every query returning `BookDisplayInfo` rows.
///
/// Authors are aggregated into one comma-separated string, so callers append
/// their own `WHERE`, then [`BOOK_DISPLAY_GROUP_BY`], then `ORDER BY`.
pub(crate) const BOOK_DISPLAY_SELECT: &str = r#"
    SELECT
        b.book_id,
        b.title,
        COALESCE(
            STRING_AGG(a.first_name || ' ' || a.last_name, ', '
                       ORDER BY a.last_name, a.first_name),
            ''
        ) AS authors,
        b.price_cents,
        COALESCE(b.cover_image_path, '') AS cover_image_path,
        b.stock_quantity,
        COALESCE(b.genre, '') AS genre
    FROM book b
    LEFT JOIN book_author ba ON ba.book_id = b.book_id
    LEFT JOIN author a ON a.author_id = ba.author_id
"#;

pub(crate) const BOOK_DISPLAY_GROUP_BY: &str = " GROUP BY b.book_id ";

/// Escapes LIKE wildcards so user input matches literally.
pub(crate) fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("har"), "har");
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b\\c"), "a\\_b\\\\c");
    }
}
