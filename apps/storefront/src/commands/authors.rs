//! # Author Commands

use serde::Serialize;

use bookstore_core::{AuthorDetailsInfo, AuthorDisplayInfo};

use crate::error::{ApiError, ApiResult};
use crate::render::{book_lines, Render, Text};
use crate::state::{Storefront, StorefrontConfig};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorList {
    pub authors: Vec<AuthorDisplayInfo>,
}

impl Render for AuthorList {
    fn render(&self, _config: &StorefrontConfig, out: &mut Text) {
        out.heading(format!("Authors ({})", self.authors.len()));
        for a in &self.authors {
            let nationality = a
                .nationality
                .as_deref()
                .map(|n| format!("  ({})", n))
                .unwrap_or_default();
            out.line(format!("#{:<5} {}{}", a.author_id, a.full_name(), nationality));
        }
    }
}

impl Render for AuthorDetailsInfo {
    fn render(&self, config: &StorefrontConfig, out: &mut Text) {
        out.heading(self.full_name());
        if let Some(nationality) = &self.nationality {
            out.line(format!("Nationality: {}", nationality));
        }
        if let Some(born) = self.birth_date {
            out.line(format!("Born:        {}", born));
        }
        if let Some(bio) = &self.biography {
            out.blank();
            out.line(bio.as_str());
        }
        out.blank();
        out.line(format!("Books ({})", self.books.len()));
        book_lines(&self.books, config, out);
    }
}

/// `authors list`.
pub async fn list(sf: &Storefront) -> ApiResult<AuthorList> {
    Ok(AuthorList {
        authors: sf.db().authors().list_for_display().await?,
    })
}

/// `authors show <id>`.
pub async fn show(sf: &Storefront, author_id: i32) -> ApiResult<AuthorDetailsInfo> {
    sf.db()
        .authors()
        .details(author_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Author", author_id))
}
