//! Fixtures for repository and command tests.
//!
//! Tests connect to `BOOKSTORE_TEST_DATABASE_URL` and skip themselves when
//! it is unset. Every fixture inserts rows with unique names so tests can
//! share one database and run in parallel.

use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use crate::pool::Database;

pub const TEST_DATABASE_URL_ENV: &str = "BOOKSTORE_TEST_DATABASE_URL";

/// Connects and migrates, or returns `None` when no test database is set.
pub async fn test_db() -> Option<Database> {
    let url = std::env::var(TEST_DATABASE_URL_ENV).ok()?;
    let pool = PgPoolOptions::new()
        .max_connections(4)
        .connect(&url)
        .await
        .expect("test database reachable");
    let db = Database::from_pool(pool);
    db.run_migrations().await.expect("migrations apply");
    Some(db)
}

/// A short random tag for unique names.
pub fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, &Uuid::new_v4().simple().to_string()[..12])
}

pub async fn insert_book(db: &Database, title: &str, genre: &str, price_cents: i64, stock: i32) -> i32 {
    sqlx::query_scalar(
        "INSERT INTO book (title, price_cents, stock_quantity, genre, language)
         VALUES ($1, $2, $3, $4, 'English')
         RETURNING book_id",
    )
    .bind(title)
    .bind(price_cents)
    .bind(stock)
    .bind(genre)
    .fetch_one(db.pool())
    .await
    .expect("insert book")
}

pub async fn insert_author(db: &Database, first: &str, last: &str) -> i32 {
    sqlx::query_scalar(
        "INSERT INTO author (first_name, last_name, nationality, biography)
         VALUES ($1, $2, 'Ukrainian', 'Test biography')
         RETURNING author_id",
    )
    .bind(first)
    .bind(last)
    .fetch_one(db.pool())
    .await
    .expect("insert author")
}

pub async fn link_author(db: &Database, book_id: i32, author_id: i32) {
    sqlx::query("INSERT INTO book_author (book_id, author_id) VALUES ($1, $2)")
        .bind(book_id)
        .bind(author_id)
        .execute(db.pool())
        .await
        .expect("link author");
}

pub async fn insert_customer(db: &Database) -> i32 {
    sqlx::query_scalar(
        "INSERT INTO customer (first_name, last_name, email, password_hash)
         VALUES ('Test', 'Reader', $1, 'not-a-real-hash')
         RETURNING customer_id",
    )
    .bind(format!("{}@example.com", unique("reader")))
    .fetch_one(db.pool())
    .await
    .expect("insert customer")
}

pub async fn stock_of(db: &Database, book_id: i32) -> i32 {
    sqlx::query_scalar("SELECT stock_quantity FROM book WHERE book_id = $1")
        .bind(book_id)
        .fetch_one(db.pool())
        .await
        .expect("stock query")
}

pub async fn set_stock(db: &Database, book_id: i32, stock: i32) {
    sqlx::query("UPDATE book SET stock_quantity = $1 WHERE book_id = $2")
        .bind(stock)
        .bind(book_id)
        .execute(db.pool())
        .await
        .expect("set stock");
}

/// Makes every delete of `customer_id`'s cart rows raise. Other customers
/// are unaffected.
pub async fn fail_cart_deletes(db: &Database, customer_id: i32) {
    let sql = format!(
        r#"
        CREATE OR REPLACE FUNCTION keep_cart_{id}() RETURNS trigger AS $$
        BEGIN
            IF OLD.customer_id = {id} THEN
                RAISE EXCEPTION 'cart of customer {id} is locked';
            END IF;
            RETURN OLD;
        END;
        $$ LANGUAGE plpgsql;

        CREATE TRIGGER keep_cart_{id} BEFORE DELETE ON cart_item
            FOR EACH ROW EXECUTE FUNCTION keep_cart_{id}();
        "#,
        id = customer_id
    );
    sqlx::raw_sql(&sql).execute(db.pool()).await.expect("install trigger");
}

/// Undoes [`fail_cart_deletes`].
pub async fn allow_cart_deletes(db: &Database, customer_id: i32) {
    let sql = format!(
        "DROP TRIGGER IF EXISTS keep_cart_{id} ON cart_item;
         DROP FUNCTION IF EXISTS keep_cart_{id}();",
        id = customer_id
    );
    sqlx::raw_sql(&sql).execute(db.pool()).await.expect("drop trigger");
}

pub async fn cart_rows(db: &Database, customer_id: i32) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM cart_item WHERE customer_id = $1")
        .bind(customer_id)
        .fetch_one(db.pool())
        .await
        .expect("cart count")
}
