//! # Author Repository
//!
//! Author list and author pages.

use sqlx::PgPool;
use tracing::debug;

use crate::error::DbResult;
use crate::repository::{BOOK_DISPLAY_GROUP_BY, BOOK_DISPLAY_SELECT};
use bookstore_core::{AuthorDetailsInfo, AuthorDisplayInfo, BookDisplayInfo};

/// Repository for author queries.
#[derive(Debug, Clone)]
pub struct AuthorRepository {
    pool: PgPool,
}

impl AuthorRepository {
    /// Creates a new AuthorRepository.
    pub fn new(pool: PgPool) -> Self {
        AuthorRepository { pool }
    }

    /// All authors, ordered by last then first name.
    pub async fn list_for_display(&self) -> DbResult<Vec<AuthorDisplayInfo>> {
        let authors = sqlx::query_as::<_, AuthorDisplayInfo>(
            r#"
            SELECT author_id, first_name, last_name, nationality, image_path
            FROM author
            ORDER BY last_name, first_name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = authors.len(), "Listed authors");
        Ok(authors)
    }

    /// Author page with biography and books (ordered by title).
    ///
    /// ## Returns
    /// * `Ok(None)` - no such author, or `author_id <= 0`
    pub async fn details(&self, author_id: i32) -> DbResult<Option<AuthorDetailsInfo>> {
        if author_id <= 0 {
            return Ok(None);
        }

        let author = sqlx::query_as::<_, AuthorDetailsInfo>(
            r#"
            SELECT author_id, first_name, last_name, nationality, image_path,
                   biography, birth_date
            FROM author
            WHERE author_id = $1
            "#,
        )
        .bind(author_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(mut author) = author else {
            debug!(author_id, "Author not found");
            return Ok(None);
        };

        // Filter on a second join so the aggregate still lists co-authors
        let sql = format!(
            "{} WHERE b.book_id IN (SELECT book_id FROM book_author WHERE author_id = $1) {} ORDER BY b.title",
            BOOK_DISPLAY_SELECT, BOOK_DISPLAY_GROUP_BY
        );
        author.books = sqlx::query_as::<_, BookDisplayInfo>(&sql)
            .bind(author_id)
            .fetch_all(&self.pool)
            .await?;

        debug!(author_id, books = author.books.len(), "Loaded author details");
        Ok(Some(author))
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::{insert_author, insert_book, link_author, test_db, unique};

    #[tokio::test]
    async fn test_details_lists_books_with_coauthors() {
        let Some(db) = test_db().await else { return };

        let last = unique("Franko");
        let author_id = insert_author(&db, "Ivan", &last).await;
        let coauthor_id = insert_author(&db, "Mykhailo", &unique("Kotsiubynskyi")).await;

        let b1 = insert_book(&db, "Zakhar Berkut", "Historical", 20_000, 2).await;
        let b2 = insert_book(&db, "Boryslav Laughs", "Novel", 18_000, 1).await;
        link_author(&db, b1, author_id).await;
        link_author(&db, b2, author_id).await;
        link_author(&db, b2, coauthor_id).await;

        let details = db.authors().details(author_id).await.unwrap().unwrap();
        assert_eq!(details.full_name(), format!("Ivan {}", last));
        assert_eq!(details.biography.as_deref(), Some("Test biography"));
        assert_eq!(details.books.len(), 2);
        assert_eq!(details.books[0].book_id, b2);
        assert!(details.books[0].authors.contains("Mykhailo"));

        assert!(db.authors().details(0).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_contains_new_author() {
        let Some(db) = test_db().await else { return };
        let last = unique("Listed");
        let author_id = insert_author(&db, "Marko", &last).await;

        let authors = db.authors().list_for_display().await.unwrap();
        let listed = authors.iter().find(|a| a.author_id == author_id).unwrap();
        assert_eq!(listed.full_name(), format!("Marko {}", last));
        assert_eq!(listed.nationality.as_deref(), Some("Ukrainian"));
    }
}
