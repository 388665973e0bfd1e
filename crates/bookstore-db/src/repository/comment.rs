//! # Comment Repository
//!
//! Book reviews. One comment per customer per book, enforced by the
//! `comment_book_customer_key` constraint.

use sqlx::PgPool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use bookstore_core::validation::{validate_comment_text, validate_id, validate_rating};
use bookstore_core::{CommentDisplayInfo, CoreError};

/// Repository for book comments.
#[derive(Debug, Clone)]
pub struct CommentRepository {
    pool: PgPool,
}

impl CommentRepository {
    /// Creates a new CommentRepository.
    pub fn new(pool: PgPool) -> Self {
        CommentRepository { pool }
    }

    /// Comments on a book, newest first.
    pub async fn for_book(&self, book_id: i32) -> DbResult<Vec<CommentDisplayInfo>> {
        if book_id <= 0 {
            return Ok(Vec::new());
        }

        let comments = sqlx::query_as::<_, CommentDisplayInfo>(
            r#"
            SELECT c.first_name || ' ' || c.last_name AS author_name,
                   cm.comment_date, cm.rating, cm.comment_text
            FROM comment cm
            JOIN customer c ON c.customer_id = cm.customer_id
            WHERE cm.book_id = $1
            ORDER BY cm.comment_date DESC, cm.comment_id DESC
            "#,
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;

        debug!(book_id, count = comments.len(), "Loaded comments");
        Ok(comments)
    }

    /// Adds a comment. A rating of `0` means "no rating" and is stored as NULL.
    ///
    /// ## Errors
    /// - Validation errors for blank text or a rating outside 0-5
    /// - `CoreError::AlreadyCommented` for a second comment on the same book
    /// - `DbError::ForeignKeyViolation` for a missing book or customer
    pub async fn add(&self, book_id: i32, customer_id: i32, text: &str, rating: i32) -> DbResult<()> {
        validate_id("book_id", book_id)?;
        validate_id("customer_id", customer_id)?;
        let text = validate_comment_text(text)?;
        validate_rating(rating)?;

        let rating = (rating > 0).then_some(rating);

        sqlx::query(
            r#"
            INSERT INTO comment (book_id, customer_id, comment_text, comment_date, rating)
            VALUES ($1, $2, $3, now(), $4)
            "#,
        )
        .bind(book_id)
        .bind(customer_id)
        .bind(&text)
        .bind(rating)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.is_unique_violation() {
                    return DbError::Rule(CoreError::AlreadyCommented { book_id });
                }
            }
            DbError::from(e)
        })?;

        info!(book_id, customer_id, rating, "Comment added");
        Ok(())
    }

    pub async fn has_commented(&self, book_id: i32, customer_id: i32) -> DbResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM comment WHERE book_id = $1 AND customer_id = $2)",
        )
        .bind(book_id)
        .bind(customer_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{insert_book, insert_customer, test_db};

    #[tokio::test]
    async fn test_add_and_list() {
        let Some(db) = test_db().await else { return };
        let comments = db.comments();
        let book = insert_book(&db, "Commented book", "Test", 1_000, 1).await;
        let c1 = insert_customer(&db).await;
        let c2 = insert_customer(&db).await;

        comments.add(book, c1, "  Loved it  ", 5).await.unwrap();
        comments.add(book, c2, "No opinion on stars", 0).await.unwrap();

        let list = comments.for_book(book).await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].comment_text, "No opinion on stars");
        assert_eq!(list[0].rating, None);
        assert_eq!(list[1].comment_text, "Loved it");
        assert_eq!(list[1].rating, Some(5));
        assert_eq!(list[1].author_name, "Test Reader");

        assert!(comments.has_commented(book, c1).await.unwrap());
        assert!(comments.for_book(0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_second_comment_rejected() {
        let Some(db) = test_db().await else { return };
        let comments = db.comments();
        let book = insert_book(&db, "Once only", "Test", 1_000, 1).await;
        let customer = insert_customer(&db).await;

        comments.add(book, customer, "First", 4).await.unwrap();
        let err = comments.add(book, customer, "Second", 2).await.unwrap_err();
        assert!(matches!(err, DbError::Rule(CoreError::AlreadyCommented { .. })));
        assert!(err.is_rule_violation());
    }

    #[tokio::test]
    async fn test_validation_and_average() {
        let Some(db) = test_db().await else { return };
        let comments = db.comments();
        let book = insert_book(&db, "Rated", "Test", 1_000, 1).await;
        let c1 = insert_customer(&db).await;
        let c2 = insert_customer(&db).await;
        let c3 = insert_customer(&db).await;

        assert!(comments.add(book, c1, "   ", 3).await.is_err());
        assert!(comments.add(book, c1, "Too many stars", 6).await.is_err());
        assert!(matches!(
            comments.add(i32::MAX, c1, "Ghost book", 3).await,
            Err(DbError::ForeignKeyViolation { .. })
        ));

        comments.add(book, c1, "Good", 4).await.unwrap();
        comments.add(book, c2, "Fine", 3).await.unwrap();
        comments.add(book, c3, "Unrated", 0).await.unwrap();

        let details = db.books().details(book).await.unwrap().unwrap();
        assert_eq!(details.average_rating, Some(3.5));
        assert_eq!(details.comments.len(), 3);
    }
}
