//! # Review Commands
//!
//! One review per customer and book. The rating is optional (0 = none).

use serde::Serialize;

use bookstore_core::{CommentDisplayInfo, CoreError};

use crate::error::{ApiError, ApiResult};
use crate::render::{stars, Render, Text};
use crate::state::{Storefront, StorefrontConfig};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentList {
    pub book_id: i32,
    pub title: String,
    pub comments: Vec<CommentDisplayInfo>,
}

impl Render for CommentList {
    fn render(&self, _config: &StorefrontConfig, out: &mut Text) {
        out.heading(format!("Reviews of {} ({})", self.title, self.comments.len()));
        if self.comments.is_empty() {
            out.line("No reviews yet.");
        }
        for c in &self.comments {
            out.line(format!(
                "{}  {}  {}",
                c.comment_date.format("%Y-%m-%d"),
                c.author_name,
                stars(c.rating)
            ));
            out.line(format!("  {}", c.comment_text));
        }
    }
}

/// `comments list <book>`.
pub async fn list(sf: &Storefront, book_id: i32) -> ApiResult<CommentList> {
    let book = sf
        .db()
        .books()
        .display_info(book_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Book", book_id))?;
    let comments = sf.db().comments().for_book(book_id).await?;

    Ok(CommentList {
        book_id,
        title: book.title,
        comments,
    })
}

/// `comments add <book> <text> [--rating N]`. Returns the updated list.
pub async fn add(sf: &Storefront, book_id: i32, text: &str, rating: i32) -> ApiResult<CommentList> {
    let customer_id = sf.require_customer()?;
    let comments = sf.db().comments();

    if comments.has_commented(book_id, customer_id).await? {
        return Err(CoreError::AlreadyCommented { book_id }.into());
    }
    comments.add(book_id, customer_id, text, rating).await?;
    list(sf, book_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::test_support::logged_in;
    use bookstore_db::test_support::{insert_book, unique};

    #[tokio::test]
    async fn test_second_review_is_refused() {
        let Some((sf, _)) = logged_in().await else { return };
        let book = insert_book(sf.db(), &unique("Reviewed"), "Test", 1_000, 5).await;

        let reviews = add(&sf, book, "A fine read", 5).await.unwrap();
        assert_eq!(reviews.comments.len(), 1);
        assert_eq!(reviews.comments[0].rating, Some(5));

        let err = add(&sf, book, "Changed my mind", 1).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);
        assert_eq!(list(&sf, book).await.unwrap().comments.len(), 1);
    }

    #[tokio::test]
    async fn test_reviews_of_missing_book() {
        let Some((sf, _)) = logged_in().await else { return };
        let err = list(&sf, i32::MAX).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
