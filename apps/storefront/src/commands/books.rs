//! # Book Commands
//!
//! Catalogue pages, the book page, genre shelves and the filter panel.

use serde::Serialize;
use tracing::debug;

use bookstore_core::{BookDetailsInfo, BookDisplayInfo, BookFilterManager, Money, DEFAULT_SIMILAR_LIMIT};

use crate::error::{ApiError, ApiResult};
use crate::render::{book_lines, stars, Render, Text};
use crate::state::{Storefront, StorefrontConfig};

/// One page of the catalogue.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookPage {
    pub page: i64,
    pub page_size: i64,
    pub total_books: i64,
    pub books: Vec<BookDisplayInfo>,
}

impl BookPage {
    pub fn total_pages(&self) -> i64 {
        if self.total_books <= 0 || self.page_size <= 0 {
            return 1;
        }
        let full = self.total_books / self.page_size;
        if self.total_books % self.page_size == 0 {
            full
        } else {
            full + 1
        }
    }
}

impl Render for BookPage {
    fn render(&self, config: &StorefrontConfig, out: &mut Text) {
        out.heading(format!(
            "Books (page {} of {}, {} total)",
            self.page,
            self.total_pages(),
            self.total_books
        ));
        book_lines(&self.books, config, out);
    }
}

/// A titled list of books (genre shelf, filter results).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookList {
    pub title: String,
    pub books: Vec<BookDisplayInfo>,
}

impl Render for BookList {
    fn render(&self, config: &StorefrontConfig, out: &mut Text) {
        out.heading(format!("{} ({})", self.title, self.books.len()));
        book_lines(&self.books, config, out);
    }
}

/// The book page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookView {
    pub book: BookDetailsInfo,
    pub similar: Vec<BookDisplayInfo>,
}

impl Render for BookView {
    fn render(&self, config: &StorefrontConfig, out: &mut Text) {
        let b = &self.book;
        out.heading(&b.title);
        if !b.authors.is_empty() {
            out.line(format!("by {}", b.authors));
        }
        out.blank();
        out.line(format!("Price:     {}", config.format_currency(b.price_cents)));
        out.line(format!("In stock:  {}", b.stock_quantity));
        if !b.genre.is_empty() {
            out.line(format!("Genre:     {}", b.genre));
        }
        if let Some(language) = &b.language {
            out.line(format!("Language:  {}", language));
        }
        if let Some(publisher) = &b.publisher_name {
            out.line(format!("Publisher: {}", publisher));
        }
        if let Some(date) = b.publication_date {
            out.line(format!("Published: {}", date));
        }
        if let Some(pages) = b.page_count {
            out.line(format!("Pages:     {}", pages));
        }
        if let Some(isbn) = &b.isbn {
            out.line(format!("ISBN:      {}", isbn));
        }
        match b.average_rating {
            Some(avg) => out.line(format!("Rating:    {:.2} / 5 ({} reviews)", avg, b.comments.len())),
            None => out.line("Rating:    no ratings yet"),
        };
        if let Some(description) = &b.description {
            out.blank();
            out.line(description.as_str());
        }

        out.blank();
        out.line(format!("Reviews ({})", b.comments.len()));
        for c in &b.comments {
            out.line(format!(
                "  {}  {}  {}",
                c.comment_date.format("%Y-%m-%d"),
                c.author_name,
                stars(c.rating)
            ));
            out.line(format!("    {}", c.comment_text));
        }

        if !self.similar.is_empty() {
            out.blank();
            out.line("Similar books");
            for s in &self.similar {
                out.line(format!("  {}", crate::render::book_line(s, config)));
            }
        }
    }
}

/// Genre or language names.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NameList {
    pub title: String,
    pub names: Vec<String>,
}

impl Render for NameList {
    fn render(&self, _config: &StorefrontConfig, out: &mut Text) {
        out.heading(&self.title);
        for name in &self.names {
            out.line(name.as_str());
        }
    }
}

/// `books list [--page N]`. Pages start at 1.
pub async fn list(sf: &Storefront, page: i64) -> ApiResult<BookPage> {
    let page_size = sf.config().display.page_size;
    let offset = page_offset(page, page_size)?;
    let books = sf.db().books();

    let total_books = books.count().await?;
    let items = books.list_for_display(page_size, offset).await?;

    debug!(page, page_size, total_books, "books list");
    Ok(BookPage {
        page,
        page_size,
        total_books,
        books: items,
    })
}

/// Rows to skip before `page`.
fn page_offset(page: i64, page_size: i64) -> ApiResult<i64> {
    if page < 1 {
        return Err(ApiError::validation("page must be at least 1"));
    }
    (page - 1)
        .checked_mul(page_size)
        .ok_or_else(|| ApiError::validation(format!("page {} is out of range", page)))
}

/// `books show <id>`.
pub async fn show(sf: &Storefront, book_id: i32) -> ApiResult<BookView> {
    let books = sf.db().books();
    let book = books
        .details(book_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Book", book_id))?;
    let similar = books.similar(book_id, &book.genre, DEFAULT_SIMILAR_LIMIT).await?;

    Ok(BookView { book, similar })
}

/// `books genre <genre>`.
pub async fn by_genre(sf: &Storefront, genre: &str, limit: i64) -> ApiResult<BookList> {
    let books = sf.db().books().by_genre(genre, limit).await?;
    Ok(BookList {
        title: genre.trim().to_string(),
        books,
    })
}

/// Raw filter arguments as typed on the command line.
#[derive(Debug, Clone, Default)]
pub struct FilterArgs {
    pub genres: Vec<String>,
    pub languages: Vec<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub in_stock: bool,
}

/// `books filter ...`. Prices are parsed as currency amounts ("120.50").
pub async fn filter(sf: &Storefront, args: FilterArgs) -> ApiResult<BookList> {
    let criteria = build_filter(args)?.into_criteria()?;

    let books = sf.db().books().filtered(&criteria).await?;
    let title = if criteria.is_empty() {
        "All books".to_string()
    } else {
        "Filtered books".to_string()
    };
    Ok(BookList { title, books })
}

fn build_filter(args: FilterArgs) -> ApiResult<BookFilterManager> {
    let min = args.min_price.as_deref().map(Money::parse).transpose()?;
    let max = args.max_price.as_deref().map(Money::parse).transpose()?;

    let mut manager = BookFilterManager::new();
    manager.set_genre_filter(args.genres);
    manager.set_language_filter(args.languages);
    manager.set_price_range_filter(min, max);
    manager.set_in_stock_only(args.in_stock);
    Ok(manager)
}

/// `books genres`.
pub async fn genres(sf: &Storefront) -> ApiResult<NameList> {
    Ok(NameList {
        title: "Genres".to_string(),
        names: sf.db().books().genres().await?,
    })
}

/// `books languages`.
pub async fn languages(sf: &Storefront) -> ApiResult<NameList> {
    Ok(NameList {
        title: "Languages".to_string(),
        names: sf.db().books().languages().await?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages() {
        let page = |total| BookPage {
            page: 1,
            page_size: 20,
            total_books: total,
            books: Vec::new(),
        };
        assert_eq!(page(0).total_pages(), 1);
        assert_eq!(page(20).total_pages(), 1);
        assert_eq!(page(21).total_pages(), 2);
        assert_eq!(page(i64::MAX).total_pages(), i64::MAX / 20 + 1);

        let huge = BookPage {
            page_size: i64::MAX,
            ..page(5)
        };
        assert_eq!(huge.total_pages(), 1);
    }

    #[test]
    fn test_page_offset() {
        assert_eq!(page_offset(1, 20).unwrap(), 0);
        assert_eq!(page_offset(3, 20).unwrap(), 40);
        assert!(page_offset(0, 20).is_err());

        let err = page_offset(i64::MAX, 20).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::ValidationError);
    }

    #[test]
    fn test_build_filter_parses_prices() {
        let manager = build_filter(FilterArgs {
            genres: vec!["Poetry".into(), " Poetry ".into()],
            min_price: Some("100".into()),
            max_price: Some("250.50".into()),
            in_stock: true,
            ..FilterArgs::default()
        })
        .unwrap();

        let criteria = manager.into_criteria().unwrap();
        assert_eq!(criteria.genres, vec!["Poetry"]);
        assert_eq!(criteria.min_price, Some(Money::from_cents(10_000)));
        assert_eq!(criteria.max_price, Some(Money::from_cents(25_050)));
        assert!(criteria.in_stock_only);
    }

    #[test]
    fn test_build_filter_rejects_bad_input() {
        assert!(build_filter(FilterArgs {
            min_price: Some("cheap".into()),
            ..FilterArgs::default()
        })
        .is_err());

        let manager = build_filter(FilterArgs {
            min_price: Some("300".into()),
            max_price: Some("100".into()),
            ..FilterArgs::default()
        })
        .unwrap();
        assert!(manager.into_criteria().is_err());
    }
}
