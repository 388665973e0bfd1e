//! # Order Repository
//!
//! The order transaction and order history.
//!
//! ## Order Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    create_order (one transaction)                       │
//! │                                                                         │
//! │  reject customer_id <= 0, no lines, blank address   (no tx opened)     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN                                                                  │
//! │  INSERT INTO "order" (... total 0 ...) RETURNING order_id               │
//! │       │                                                                 │
//! │       ▼  for each line with quantity > 0, in book id order              │
//! │  SELECT price_cents, stock_quantity ... FOR UPDATE                      │
//! │       ├── no row            → NotFound            ─┐                    │
//! │       ├── quantity > stock  → InsufficientStock   ─┤                    │
//! │  UPDATE book SET stock_quantity = stock_quantity - q                    │
//! │    WHERE book_id = $1 AND stock_quantity >= q                           │
//! │       ├── 0 rows            → TransactionFailed   ─┤                    │
//! │  INSERT INTO order_item (price frozen)             │                    │
//! │       │                                            │                    │
//! │       ▼                                            │                    │
//! │  no item inserted?          → EmptyCart           ─┤                    │
//! │  UPDATE "order" SET total_amount_cents             │                    │
//! │  INSERT INTO order_status ('New', now())           │                    │
//! │  COMMIT                                            ▼                    │
//! │                                       tx dropped → ROLLBACK             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use sqlx::PgPool;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use bookstore_core::validation::{validate_id, validate_shipping_address};
use bookstore_core::{
    CheckoutRequest, CoreError, Money, OrderDisplayInfo, OrderItemDisplayInfo, OrderLine,
    OrderStatusDisplayInfo, PlacedOrder, ValidationError, INITIAL_ORDER_STATUS,
};

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    order_id: i32,
    #[sqlx(flatten)]
    item: OrderItemDisplayInfo,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderStatusRow {
    order_id: i32,
    #[sqlx(flatten)]
    status: OrderStatusDisplayInfo,
}

const ORDER_HEADER_SELECT: &str = r#"
    SELECT order_id, order_date, total_amount_cents, shipping_address, payment_method
    FROM "order"
"#;

/// Repository for orders.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: PgPool) -> Self {
        OrderRepository { pool }
    }

    /// Places an order from a validated checkout request.
    pub async fn place(&self, request: &CheckoutRequest) -> DbResult<PlacedOrder> {
        request.validate()?;
        self.create_order(
            request.customer_id,
            &request.lines,
            &request.shipping_address,
            request.payment_label(),
        )
        .await
    }

    /// Creates an order, its items and its first status atomically.
    ///
    /// Stock is decremented in the same transaction and unit prices are
    /// frozen at their current value. Lines with `quantity <= 0` are skipped.
    ///
    /// ## Errors
    /// - Validation errors (bad customer id, blank address) before any SQL
    /// - `CoreError::EmptyCart` when no line has a positive quantity
    /// - `DbError::NotFound` for a missing book
    /// - `CoreError::InsufficientStock` when a line exceeds stock
    ///
    /// On any error nothing is written.
    pub async fn create_order(
        &self,
        customer_id: i32,
        lines: &[OrderLine],
        shipping_address: &str,
        payment_method: Option<&str>,
    ) -> DbResult<PlacedOrder> {
        validate_id("customer_id", customer_id)?;
        if lines.is_empty() {
            return Err(CoreError::EmptyCart.into());
        }
        validate_shipping_address(shipping_address)?;

        let payment_method = payment_method.map(str::trim).filter(|m| !m.is_empty());

        // Lock rows in book id order so concurrent checkouts cannot deadlock
        let mut lines: Vec<OrderLine> = lines.to_vec();
        lines.sort_by_key(|line| line.book_id);

        debug!(customer_id, lines = lines.len(), "Starting order transaction");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(format!("begin: {}", e)))?;

        let order_id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO "order" (customer_id, order_date, total_amount_cents, shipping_address, payment_method)
            VALUES ($1, now(), 0, $2, $3)
            RETURNING order_id
            "#,
        )
        .bind(customer_id)
        .bind(shipping_address.trim())
        .bind(payment_method)
        .fetch_one(&mut *tx)
        .await?;

        let mut total = Money::zero();
        let mut inserted = 0usize;

        for line in &lines {
            if line.quantity <= 0 {
                warn!(order_id, book_id = line.book_id, quantity = line.quantity, "Skipping non-positive line");
                continue;
            }

            let book: Option<(String, i64, i32)> = sqlx::query_as(
                "SELECT title, price_cents, stock_quantity FROM book WHERE book_id = $1 FOR UPDATE",
            )
            .bind(line.book_id)
            .fetch_optional(&mut *tx)
            .await?;

            let Some((title, price_cents, stock)) = book else {
                return Err(DbError::not_found("Book", line.book_id));
            };

            if line.quantity > stock {
                return Err(CoreError::InsufficientStock {
                    book_id: line.book_id,
                    title,
                    available: stock,
                    requested: line.quantity,
                }
                .into());
            }

            let updated = sqlx::query(
                r#"
                UPDATE book
                SET stock_quantity = stock_quantity - $1
                WHERE book_id = $2 AND stock_quantity >= $1
                "#,
            )
            .bind(line.quantity)
            .bind(line.book_id)
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() == 0 {
                return Err(DbError::TransactionFailed(format!(
                    "stock of book {} changed during checkout",
                    line.book_id
                )));
            }

            sqlx::query(
                r#"
                INSERT INTO order_item (order_id, book_id, quantity, price_per_unit_cents)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(order_id)
            .bind(line.book_id)
            .bind(line.quantity)
            .bind(price_cents)
            .execute(&mut *tx)
            .await?;

            total += Money::from_cents(price_cents) * line.quantity;
            inserted += 1;
        }

        if inserted == 0 {
            return Err(CoreError::EmptyCart.into());
        }

        sqlx::query(r#"UPDATE "order" SET total_amount_cents = $1 WHERE order_id = $2"#)
            .bind(total.cents())
            .bind(order_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO order_status (order_id, status, status_date) VALUES ($1, $2, now())",
        )
        .bind(order_id)
        .bind(INITIAL_ORDER_STATUS)
        .execute(&mut *tx)
        .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(format!("commit: {}", e)))?;

        info!(order_id, customer_id, items = inserted, total = %total, "Order created");
        Ok(PlacedOrder { order_id, total })
    }

    /// A customer's orders, newest first, with items and statuses.
    pub async fn orders_for_customer(&self, customer_id: i32) -> DbResult<Vec<OrderDisplayInfo>> {
        if customer_id <= 0 {
            return Ok(Vec::new());
        }

        let sql = format!("{} WHERE customer_id = $1 ORDER BY order_date DESC, order_id DESC", ORDER_HEADER_SELECT);
        let mut orders = sqlx::query_as::<_, OrderDisplayInfo>(&sql)
            .bind(customer_id)
            .fetch_all(&self.pool)
            .await?;

        self.fill_lines(&mut orders).await?;

        debug!(customer_id, count = orders.len(), "Loaded order history");
        Ok(orders)
    }

    /// One order with items and statuses. `None` when missing.
    pub async fn details(&self, order_id: i32) -> DbResult<Option<OrderDisplayInfo>> {
        if order_id <= 0 {
            return Ok(None);
        }

        let sql = format!("{} WHERE order_id = $1", ORDER_HEADER_SELECT);
        let order = sqlx::query_as::<_, OrderDisplayInfo>(&sql)
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await?;

        self.with_lines(order).await
    }

    /// Like [`details`](Self::details), but only if the order belongs to
    /// `customer_id`.
    pub async fn details_for_customer(&self, customer_id: i32, order_id: i32) -> DbResult<Option<OrderDisplayInfo>> {
        if order_id <= 0 || customer_id <= 0 {
            return Ok(None);
        }

        let sql = format!("{} WHERE order_id = $1 AND customer_id = $2", ORDER_HEADER_SELECT);
        let order = sqlx::query_as::<_, OrderDisplayInfo>(&sql)
            .bind(order_id)
            .bind(customer_id)
            .fetch_optional(&self.pool)
            .await?;

        self.with_lines(order).await
    }

    /// Appends a status entry stamped with the current time.
    pub async fn add_status(&self, order_id: i32, status: &str, tracking_number: Option<&str>) -> DbResult<()> {
        validate_id("order_id", order_id)?;
        let status = status.trim();
        if status.is_empty() {
            return Err(ValidationError::required("status").into());
        }
        let tracking_number = tracking_number.map(str::trim).filter(|t| !t.is_empty());

        sqlx::query(
            r#"
            INSERT INTO order_status (order_id, status, status_date, tracking_number)
            VALUES ($1, $2, now(), $3)
            "#,
        )
        .bind(order_id)
        .bind(status)
        .bind(tracking_number)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::ForeignKeyViolation { .. } => DbError::not_found("Order", order_id),
            other => other,
        })?;

        info!(order_id, status, "Order status added");
        Ok(())
    }

    async fn with_lines(&self, order: Option<OrderDisplayInfo>) -> DbResult<Option<OrderDisplayInfo>> {
        let Some(order) = order else {
            return Ok(None);
        };
        let mut orders = vec![order];
        self.fill_lines(&mut orders).await?;
        Ok(orders.pop())
    }

    /// Loads items and statuses for every order with one query each.
    async fn fill_lines(&self, orders: &mut [OrderDisplayInfo]) -> DbResult<()> {
        if orders.is_empty() {
            return Ok(());
        }
        let ids: Vec<i32> = orders.iter().map(|o| o.order_id).collect();

        let items = sqlx::query_as::<_, OrderItemRow>(
            r#"
            SELECT oi.order_id, b.title AS book_title, oi.quantity, oi.price_per_unit_cents
            FROM order_item oi
            JOIN book b ON b.book_id = oi.book_id
            WHERE oi.order_id = ANY($1)
            ORDER BY oi.order_id, oi.order_item_id
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let statuses = sqlx::query_as::<_, OrderStatusRow>(
            r#"
            SELECT order_id, status, status_date, tracking_number
            FROM order_status
            WHERE order_id = ANY($1)
            ORDER BY order_id, status_date, order_status_id
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut item_map: HashMap<i32, Vec<OrderItemDisplayInfo>> = HashMap::new();
        for row in items {
            item_map.entry(row.order_id).or_default().push(row.item);
        }
        let mut status_map: HashMap<i32, Vec<OrderStatusDisplayInfo>> = HashMap::new();
        for row in statuses {
            status_map.entry(row.order_id).or_default().push(row.status);
        }

        for order in orders.iter_mut() {
            order.items = item_map.remove(&order.order_id).unwrap_or_default();
            order.statuses = status_map.remove(&order.order_id).unwrap_or_default();
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{insert_book, insert_customer, stock_of, test_db};
    use bookstore_core::PaymentMethod;

    fn line(book_id: i32, quantity: i32) -> OrderLine {
        OrderLine { book_id, quantity }
    }

    #[tokio::test]
    async fn test_create_order_happy_path() {
        let Some(db) = test_db().await else { return };
        let customer = insert_customer(&db).await;
        let b1 = insert_book(&db, "Order book A", "Test", 12_500, 5).await;
        let b2 = insert_book(&db, "Order book B", "Test", 3_000, 2).await;

        let placed = db
            .orders()
            .create_order(
                customer,
                &[line(b1, 2), line(b2, 1)],
                "Lviv, Rynok Square 1",
                Some(PaymentMethod::Card.label()),
            )
            .await
            .unwrap();

        assert_eq!(placed.total.cents(), 28_000);
        assert_eq!(stock_of(&db, b1).await, 3);
        assert_eq!(stock_of(&db, b2).await, 1);

        let order = db.orders().details(placed.order_id).await.unwrap().unwrap();
        assert_eq!(order.total_amount_cents, 28_000);
        assert_eq!(order.payment_method.as_deref(), Some("Visa/Mastercard card"));
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.items[0].line_total().cents(), 25_000);
        assert_eq!(order.statuses.len(), 1);
        assert_eq!(order.latest_status().unwrap().status, INITIAL_ORDER_STATUS);
    }

    #[tokio::test]
    async fn test_blank_payment_is_null_and_zero_lines_skipped() {
        let Some(db) = test_db().await else { return };
        let customer = insert_customer(&db).await;
        let book = insert_book(&db, "Skip lines", "Test", 1_000, 5).await;

        let placed = db
            .orders()
            .create_order(customer, &[line(book, 0), line(book, 2)], "Odesa", Some("  "))
            .await
            .unwrap();

        let order = db.orders().details(placed.order_id).await.unwrap().unwrap();
        assert_eq!(order.payment_method, None);
        assert_eq!(order.items.len(), 1);
        assert_eq!(stock_of(&db, book).await, 3);
    }

    #[tokio::test]
    async fn test_insufficient_stock_rolls_back() {
        let Some(db) = test_db().await else { return };
        let customer = insert_customer(&db).await;
        let plenty = insert_book(&db, "Plenty", "Test", 1_000, 10).await;
        let scarce = insert_book(&db, "Scarce order", "Test", 1_000, 1).await;

        let before = db.orders().orders_for_customer(customer).await.unwrap().len();
        let err = db
            .orders()
            .create_order(customer, &[line(plenty, 3), line(scarce, 2)], "Kharkiv", None)
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Rule(CoreError::InsufficientStock { .. })));
        // The first line's decrement was rolled back
        assert_eq!(stock_of(&db, plenty).await, 10);
        assert_eq!(stock_of(&db, scarce).await, 1);
        assert_eq!(db.orders().orders_for_customer(customer).await.unwrap().len(), before);
    }

    #[tokio::test]
    async fn test_missing_book_rolls_back() {
        let Some(db) = test_db().await else { return };
        let customer = insert_customer(&db).await;
        let book = insert_book(&db, "Exists", "Test", 1_000, 4).await;

        let err = db
            .orders()
            .create_order(customer, &[line(book, 1), line(i32::MAX, 1)], "Dnipro", None)
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::NotFound { .. }));
        assert_eq!(stock_of(&db, book).await, 4);
        assert!(db.orders().orders_for_customer(customer).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejections_before_transaction() {
        let Some(db) = test_db().await else { return };
        let orders = db.orders();
        let customer = insert_customer(&db).await;

        assert!(orders.create_order(0, &[line(1, 1)], "Kyiv", None).await.is_err());
        assert!(matches!(
            orders.create_order(customer, &[], "Kyiv", None).await,
            Err(DbError::Rule(CoreError::EmptyCart))
        ));
        assert!(orders.create_order(customer, &[line(1, 1)], "   ", None).await.is_err());

        // Only non-positive lines: nothing inserted, rolled back
        let book = insert_book(&db, "Never ordered", "Test", 1_000, 1).await;
        assert!(matches!(
            orders.create_order(customer, &[line(book, 0)], "Kyiv", None).await,
            Err(DbError::Rule(CoreError::EmptyCart))
        ));
        assert!(orders.orders_for_customer(customer).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_checkouts_for_last_copy() {
        let Some(db) = test_db().await else { return };
        let c1 = insert_customer(&db).await;
        let c2 = insert_customer(&db).await;
        let book = insert_book(&db, "Last copy", "Test", 9_900, 1).await;

        let orders1 = db.orders();
        let orders2 = db.orders();
        let lines = [line(book, 1)];
        let (r1, r2) = tokio::join!(
            orders1.create_order(c1, &lines, "Kyiv", None),
            orders2.create_order(c2, &lines, "Lviv", None),
        );

        assert_eq!(r1.is_ok() as u8 + r2.is_ok() as u8, 1);
        assert_eq!(stock_of(&db, book).await, 0);
    }

    #[tokio::test]
    async fn test_history_and_statuses() {
        let Some(db) = test_db().await else { return };
        let customer = insert_customer(&db).await;
        let other = insert_customer(&db).await;
        let book = insert_book(&db, "History", "Test", 2_000, 10).await;
        let orders = db.orders();

        let first = orders.create_order(customer, &[line(book, 1)], "Kyiv", None).await.unwrap();
        let second = orders.create_order(customer, &[line(book, 2)], "Kyiv", None).await.unwrap();

        orders.add_status(first.order_id, "Shipped", Some("UA123")).await.unwrap();

        let history = orders.orders_for_customer(customer).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].order_id, second.order_id);
        assert_eq!(history[1].statuses.len(), 2);
        let latest = history[1].latest_status().unwrap();
        assert_eq!(latest.status, "Shipped");
        assert_eq!(latest.tracking_number.as_deref(), Some("UA123"));

        assert!(orders.details_for_customer(other, first.order_id).await.unwrap().is_none());
        assert!(orders.details_for_customer(customer, first.order_id).await.unwrap().is_some());

        assert!(matches!(
            orders.add_status(i32::MAX, "Lost", None).await,
            Err(DbError::NotFound { .. })
        ));
        assert!(orders.add_status(first.order_id, " ", None).await.is_err());
    }
}
