//! Fixtures for command tests.
//!
//! Builds a [`Storefront`] over `bookstore_db::test_support::test_db` with a
//! customer logged in. Tests skip themselves when
//! `BOOKSTORE_TEST_DATABASE_URL` is unset.

use bookstore_db::test_support::{insert_customer, test_db};
use bookstore_db::Database;

use crate::state::{SessionStore, Storefront, StorefrontConfig};

/// A fresh customer logged in on the test database.
pub async fn logged_in() -> Option<(Storefront, i32)> {
    let db = test_db().await?;
    let customer_id = insert_customer(&db).await;
    Some((storefront_as(db, customer_id), customer_id))
}

/// A storefront whose session belongs to `customer_id`. The session file
/// lives in a fresh temp directory and is never saved.
pub fn storefront_as(db: Database, customer_id: i32) -> Storefront {
    let path = std::env::temp_dir()
        .join(format!("bookstore-session-{}", uuid::Uuid::new_v4()))
        .join("session.json");
    let mut session = SessionStore::load(path);
    session.login(customer_id, "reader@example.com");
    Storefront::new(db, StorefrontConfig::default(), session)
}
