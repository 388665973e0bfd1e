//! # Book Repository
//!
//! Catalogue queries: listings, genre shelves, filters, details and the
//! search completer.
//!
//! ## Filter Translation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BookFilterCriteria ──► QueryBuilder<Postgres>                          │
//! │                                                                         │
//! │  SELECT ... FROM book b LEFT JOIN book_author ... LEFT JOIN author ...  │
//! │  WHERE b.genre IN ($1, $2)                                              │
//! │    AND b.language IN ($3)                                               │
//! │    AND b.price_cents >= $4                                              │
//! │    AND b.stock_quantity > 0                                             │
//! │  GROUP BY b.book_id                                                     │
//! │  ORDER BY b.title                                                       │
//! │                                                                         │
//! │  Values are always bound, never spliced into the SQL text.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, warn};

use crate::error::DbResult;
use crate::repository::comment::CommentRepository;
use crate::repository::{escape_like, BOOK_DISPLAY_GROUP_BY, BOOK_DISPLAY_SELECT};
use bookstore_core::{
    BookDetailsInfo, BookDisplayInfo, BookFilterCriteria, SearchSuggestion, SuggestionKind,
    DEFAULT_GENRE_LIMIT, DEFAULT_SIMILAR_LIMIT, DEFAULT_SUGGESTION_LIMIT,
};

/// Raw row of the suggestion query before the kind is checked.
#[derive(Debug, sqlx::FromRow)]
struct SuggestionRow {
    kind: String,
    id: i32,
    display_text: String,
    image_path: Option<String>,
    price_cents: Option<i64>,
}

/// Books whose title starts with the prefix or has a word starting with it,
/// then authors matched on first, last or full name. Books come first.
const SUGGESTIONS_SQL: &str = r#"
    SELECT kind, id, display_text, image_path, price_cents
    FROM (
        SELECT
            'book'::TEXT AS kind,
            b.book_id AS id,
            b.title AS display_text,
            b.cover_image_path AS image_path,
            b.price_cents AS price_cents,
            0 AS rank_group,
            b.title AS sort_key
        FROM book b
        WHERE b.title ILIKE $1 OR b.title ILIKE $2

        UNION ALL

        SELECT
            'author'::TEXT,
            a.author_id,
            a.first_name || ' ' || a.last_name,
            a.image_path,
            NULL::BIGINT,
            1,
            a.last_name || ' ' || a.first_name
        FROM author a
        WHERE a.first_name ILIKE $1
           OR a.last_name ILIKE $1
           OR (a.first_name || ' ' || a.last_name) ILIKE $1
    ) matches
    ORDER BY rank_group, sort_key
    LIMIT $3
"#;

/// Repository for catalogue queries.
#[derive(Debug, Clone)]
pub struct BookRepository {
    pool: PgPool,
}

impl BookRepository {
    /// Creates a new BookRepository.
    pub fn new(pool: PgPool) -> Self {
        BookRepository { pool }
    }

    /// Lists books ordered by title.
    ///
    /// ## Arguments
    /// * `limit` - Page size; `<= 0` returns every book
    /// * `offset` - Rows to skip (only with a positive limit)
    pub async fn list_for_display(&self, limit: i64, offset: i64) -> DbResult<Vec<BookDisplayInfo>> {
        debug!(limit, offset, "Listing books");

        let mut sql = format!("{}{} ORDER BY b.title", BOOK_DISPLAY_SELECT, BOOK_DISPLAY_GROUP_BY);

        let books = if limit > 0 {
            sql.push_str(" LIMIT $1 OFFSET $2");
            sqlx::query_as::<_, BookDisplayInfo>(&sql)
                .bind(limit)
                .bind(offset.max(0))
                .fetch_all(&self.pool)
                .await?
        } else {
            sqlx::query_as::<_, BookDisplayInfo>(&sql)
                .fetch_all(&self.pool)
                .await?
        };

        debug!(count = books.len(), "Listed books");
        Ok(books)
    }

    /// Total number of books.
    pub async fn count(&self) -> DbResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM book")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// A genre shelf. Empty genre yields nothing, `limit <= 0` means 10.
    pub async fn by_genre(&self, genre: &str, limit: i64) -> DbResult<Vec<BookDisplayInfo>> {
        let genre = genre.trim();
        if genre.is_empty() {
            warn!("Genre shelf requested without a genre");
            return Ok(Vec::new());
        }
        let limit = if limit > 0 { limit } else { DEFAULT_GENRE_LIMIT };

        let sql = format!(
            "{} WHERE b.genre = $1 {} ORDER BY b.title LIMIT $2",
            BOOK_DISPLAY_SELECT, BOOK_DISPLAY_GROUP_BY
        );
        let books = sqlx::query_as::<_, BookDisplayInfo>(&sql)
            .bind(genre)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        debug!(genre, count = books.len(), "Loaded genre shelf");
        Ok(books)
    }

    /// Books matching every active predicate of `criteria`.
    ///
    /// ## Errors
    /// Invalid price bounds are rejected before any SQL runs.
    pub async fn filtered(&self, criteria: &BookFilterCriteria) -> DbResult<Vec<BookDisplayInfo>> {
        criteria.validate()?;

        let mut builder = build_filter_query(criteria);
        debug!(sql = builder.sql(), "Running filtered book query");

        let books = builder
            .build_query_as::<BookDisplayInfo>()
            .fetch_all(&self.pool)
            .await?;

        debug!(count = books.len(), "Filter matched books");
        Ok(books)
    }

    /// Distinct non-empty genres, sorted.
    pub async fn genres(&self) -> DbResult<Vec<String>> {
        let genres = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT genre FROM book
             WHERE genre IS NOT NULL AND genre <> ''
             ORDER BY genre",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(genres)
    }

    /// Distinct non-empty languages, sorted.
    pub async fn languages(&self) -> DbResult<Vec<String>> {
        let languages = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT language FROM book
             WHERE language IS NOT NULL AND language <> ''
             ORDER BY language",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(languages)
    }

    /// Full book page: details, average rating and comments (newest first).
    ///
    /// ## Returns
    /// * `Ok(None)` - no such book, or `book_id <= 0`
    pub async fn details(&self, book_id: i32) -> DbResult<Option<BookDetailsInfo>> {
        if book_id <= 0 {
            return Ok(None);
        }

        let details = sqlx::query_as::<_, BookDetailsInfo>(
            r#"
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
                COALESCE(b.genre, '') AS genre,
                b.description,
                p.name AS publisher_name,
                b.publication_date,
                b.isbn,
                b.page_count,
                b.language,
                calculate_average_book_rating(b.book_id)::FLOAT8 AS average_rating
            FROM book b
            LEFT JOIN publisher p ON p.publisher_id = b.publisher_id
            LEFT JOIN book_author ba ON ba.book_id = b.book_id
            LEFT JOIN author a ON a.author_id = ba.author_id
            WHERE b.book_id = $1
            GROUP BY b.book_id, p.name
            "#,
        )
        .bind(book_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(mut details) = details else {
            debug!(book_id, "Book not found");
            return Ok(None);
        };

        details.comments = CommentRepository::new(self.pool.clone())
            .for_book(book_id)
            .await?;

        Ok(Some(details))
    }

    /// One book in list shape. `None` when missing or `book_id <= 0`.
    pub async fn display_info(&self, book_id: i32) -> DbResult<Option<BookDisplayInfo>> {
        if book_id <= 0 {
            return Ok(None);
        }

        let sql = format!("{} WHERE b.book_id = $1 {}", BOOK_DISPLAY_SELECT, BOOK_DISPLAY_GROUP_BY);
        let book = sqlx::query_as::<_, BookDisplayInfo>(&sql)
            .bind(book_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    /// Other books of the same genre, excluding `book_id`.
    ///
    /// Empty genre or `book_id <= 0` yields nothing; `limit <= 0` means 5.
    pub async fn similar(&self, book_id: i32, genre: &str, limit: i64) -> DbResult<Vec<BookDisplayInfo>> {
        let genre = genre.trim();
        if genre.is_empty() || book_id <= 0 {
            return Ok(Vec::new());
        }
        let limit = if limit > 0 { limit } else { DEFAULT_SIMILAR_LIMIT };

        let sql = format!(
            "{} WHERE b.genre = $1 AND b.book_id <> $2 {} ORDER BY b.title LIMIT $3",
            BOOK_DISPLAY_SELECT, BOOK_DISPLAY_GROUP_BY
        );
        let books = sqlx::query_as::<_, BookDisplayInfo>(&sql)
            .bind(genre)
            .bind(book_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    /// Search completer entries for a typed prefix.
    ///
    /// ## Rules
    /// - Empty prefix → empty list
    /// - Case-insensitive prefix match; books also match on any word start
    /// - `limit <= 0` means 10, counted across books and authors
    /// - Rows of an unknown kind are skipped
    pub async fn search_suggestions(&self, prefix: &str, limit: i64) -> DbResult<Vec<SearchSuggestion>> {
        let prefix = prefix.trim();
        if prefix.is_empty() {
            return Ok(Vec::new());
        }
        let limit = if limit > 0 { limit } else { DEFAULT_SUGGESTION_LIMIT };

        let escaped = escape_like(prefix);
        let starts_with = format!("{}%", escaped);
        let word_start = format!("% {}%", escaped);

        let rows = sqlx::query_as::<_, SuggestionRow>(SUGGESTIONS_SQL)
            .bind(&starts_with)
            .bind(&word_start)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        let suggestions: Vec<SearchSuggestion> = rows
            .into_iter()
            .filter_map(|row| {
                let Some(kind) = SuggestionKind::from_db(&row.kind) else {
                    warn!(kind = %row.kind, "Skipping suggestion of unknown kind");
                    return None;
                };
                Some(SearchSuggestion {
                    kind,
                    id: row.id,
                    display_text: row.display_text,
                    image_path: row.image_path.filter(|p| !p.is_empty()),
                    price_cents: row.price_cents,
                })
            })
            .collect();

        debug!(prefix, count = suggestions.len(), "Search suggestions");
        Ok(suggestions)
    }
}

/// Builds the catalogue filter query. Separate from execution so the SQL
/// text can be inspected.
pub(crate) fn build_filter_query(criteria: &BookFilterCriteria) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::<Postgres>::new(BOOK_DISPLAY_SELECT);
    let mut has_where = false;

    let mut next_clause = |builder: &mut QueryBuilder<'static, Postgres>| {
        builder.push(if has_where { " AND " } else { " WHERE " });
        has_where = true;
    };

    if !criteria.genres.is_empty() {
        next_clause(&mut builder);
        builder.push("b.genre IN (");
        let mut values = builder.separated(", ");
        for genre in &criteria.genres {
            values.push_bind(genre.clone());
        }
        values.push_unseparated(")");
    }

    if !criteria.languages.is_empty() {
        next_clause(&mut builder);
        builder.push("b.language IN (");
        let mut values = builder.separated(", ");
        for language in &criteria.languages {
            values.push_bind(language.clone());
        }
        values.push_unseparated(")");
    }

    if let Some(min) = criteria.min_price {
        next_clause(&mut builder);
        builder.push("b.price_cents >= ").push_bind(min.cents());
    }

    if let Some(max) = criteria.max_price {
        next_clause(&mut builder);
        builder.push("b.price_cents <= ").push_bind(max.cents());
    }

    if criteria.in_stock_only {
        next_clause(&mut builder);
        builder.push("b.stock_quantity > 0");
    }

    builder.push(BOOK_DISPLAY_GROUP_BY);
    builder.push(" ORDER BY b.title");
    builder
}

// =============================================================================
// Unit Tests
// =============================================================================
