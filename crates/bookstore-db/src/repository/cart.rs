//! # Cart Repository
//!
//! Persistent cart rows, one per `(customer_id, book_id)`.
//!
//! ```text
//! add_or_update(c, b, qty)
//!     qty <= 0          ──► DELETE row
//!     book missing      ──► NotFound
//!     qty > stock       ──► InsufficientStock
//!     otherwise         ──► INSERT ... ON CONFLICT (customer_id, book_id)
//!                           DO UPDATE SET quantity = EXCLUDED.quantity
//! ```

use sqlx::PgPool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{BOOK_DISPLAY_GROUP_BY, BOOK_DISPLAY_SELECT};
use bookstore_core::validation::{validate_id, validate_quantity};
use bookstore_core::{BookDisplayInfo, CartItem, CoreError};

#[derive(Debug, sqlx::FromRow)]
struct CartItemRow {
    #[sqlx(flatten)]
    book: BookDisplayInfo,
    quantity: i32,
}

/// Repository for cart rows.
#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: PgPool,
}

impl CartRepository {
    /// Creates a new CartRepository.
    pub fn new(pool: PgPool) -> Self {
        CartRepository { pool }
    }

    /// Cart rows joined with current book info, ordered by book id.
    pub async fn items(&self, customer_id: i32) -> DbResult<Vec<CartItem>> {
        if customer_id <= 0 {
            return Ok(Vec::new());
        }

        let sql = format!(
            r#"
            WITH display AS (
                {}
                WHERE b.book_id IN (SELECT book_id FROM cart_item WHERE customer_id = $1)
                {}
            )
            SELECT d.*, ci.quantity
            FROM cart_item ci
            JOIN display d ON d.book_id = ci.book_id
            WHERE ci.customer_id = $1
            ORDER BY ci.book_id
            "#,
            BOOK_DISPLAY_SELECT, BOOK_DISPLAY_GROUP_BY
        );

        let rows = sqlx::query_as::<_, CartItemRow>(&sql)
            .bind(customer_id)
            .fetch_all(&self.pool)
            .await?;

        debug!(customer_id, count = rows.len(), "Loaded cart");
        Ok(rows
            .into_iter()
            .map(|row| CartItem {
                book: row.book,
                quantity: row.quantity,
            })
            .collect())
    }

    /// Sets the quantity of a book in the cart. `quantity <= 0` removes it.
    ///
    /// ## Errors
    /// - `NotFound` when the book does not exist
    /// - `InsufficientStock` when `quantity` exceeds stock
    pub async fn add_or_update(&self, customer_id: i32, book_id: i32, quantity: i32) -> DbResult<()> {
        validate_id("customer_id", customer_id)?;
        validate_id("book_id", book_id)?;

        if quantity <= 0 {
            return self.remove(customer_id, book_id).await;
        }
        validate_quantity(quantity)?;

        let book: Option<(String, i32)> =
            sqlx::query_as("SELECT title, stock_quantity FROM book WHERE book_id = $1")
                .bind(book_id)
                .fetch_optional(&self.pool)
                .await?;

        let Some((title, stock)) = book else {
            return Err(DbError::not_found("Book", book_id));
        };
        if quantity > stock {
            return Err(CoreError::InsufficientStock {
                book_id,
                title,
                available: stock,
                requested: quantity,
            }
            .into());
        }

        sqlx::query(
            r#"
            INSERT INTO cart_item (customer_id, book_id, quantity, added_date)
            VALUES ($1, $2, $3, now())
            ON CONFLICT (customer_id, book_id)
            DO UPDATE SET quantity = EXCLUDED.quantity
            "#,
        )
        .bind(customer_id)
        .bind(book_id)
        .bind(quantity)
        .execute(&self.pool)
        .await?;

        debug!(customer_id, book_id, quantity, "Cart item saved");
        Ok(())
    }

    /// Removes a book from the cart. Succeeds when nothing was there.
    pub async fn remove(&self, customer_id: i32, book_id: i32) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM cart_item WHERE customer_id = $1 AND book_id = $2")
            .bind(customer_id)
            .bind(book_id)
            .execute(&self.pool)
            .await?;

        debug!(customer_id, book_id, removed = result.rows_affected(), "Cart item removed");
        Ok(())
    }

    /// Empties the cart. Returns the number of removed rows.
    pub async fn clear(&self, customer_id: i32) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM cart_item WHERE customer_id = $1")
            .bind(customer_id)
            .execute(&self.pool)
            .await?;

        debug!(customer_id, removed = result.rows_affected(), "Cart cleared");
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{insert_book, insert_customer, test_db};

    #[tokio::test]
    async fn test_upsert_and_remove() {
        let Some(db) = test_db().await else { return };
        let carts = db.carts();
        let customer = insert_customer(&db).await;
        let b1 = insert_book(&db, "Cart book one", "Test", 10_000, 5).await;
        let b2 = insert_book(&db, "Cart book two", "Test", 5_000, 5).await;

        carts.add_or_update(customer, b2, 1).await.unwrap();
        carts.add_or_update(customer, b1, 2).await.unwrap();
        carts.add_or_update(customer, b1, 4).await.unwrap();

        let items = carts.items(customer).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].book.book_id, b1);
        assert_eq!(items[0].quantity, 4);
        assert_eq!(items[0].book.title, "Cart book one");

        // Zero removes
        carts.add_or_update(customer, b1, 0).await.unwrap();
        assert_eq!(carts.items(customer).await.unwrap().len(), 1);

        // Removing twice is fine
        carts.remove(customer, b2).await.unwrap();
        carts.remove(customer, b2).await.unwrap();
        assert!(carts.items(customer).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stock_and_missing_book() {
        let Some(db) = test_db().await else { return };
        let carts = db.carts();
        let customer = insert_customer(&db).await;
        let book = insert_book(&db, "Scarce", "Test", 10_000, 2).await;

        let err = carts.add_or_update(customer, book, 3).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Rule(CoreError::InsufficientStock { available: 2, requested: 3, .. })
        ));

        let err = carts.add_or_update(customer, i32::MAX, 1).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_clear() {
        let Some(db) = test_db().await else { return };
        let carts = db.carts();
        let customer = insert_customer(&db).await;
        let book = insert_book(&db, "Clearable", "Test", 1_000, 9).await;

        carts.add_or_update(customer, book, 3).await.unwrap();
        assert_eq!(carts.clear(customer).await.unwrap(), 1);
        assert_eq!(carts.clear(customer).await.unwrap(), 0);
    }
}
