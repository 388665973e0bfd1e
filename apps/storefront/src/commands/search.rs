//! # Search Command
//!
//! Prefix suggestions over book titles and author names, the way the
//! search box completer offered them.

use serde::Serialize;

use bookstore_core::validation::validate_search_prefix;
use bookstore_core::{SearchSuggestion, SuggestionKind};

use crate::error::ApiResult;
use crate::render::{Render, Text};
use crate::state::{Storefront, StorefrontConfig};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionList {
    pub prefix: String,
    pub suggestions: Vec<SearchSuggestion>,
}

impl Render for SuggestionList {
    fn render(&self, config: &StorefrontConfig, out: &mut Text) {
        if self.suggestions.is_empty() {
            out.line(format!("Nothing matches '{}'.", self.prefix));
            return;
        }
        for s in &self.suggestions {
            let line = match (s.kind, s.price_cents) {
                (SuggestionKind::Book, Some(price)) => format!(
                    "book    #{:<5} {}  {}",
                    s.id,
                    s.display_text,
                    config.format_currency(price)
                ),
                (SuggestionKind::Book, None) => format!("book    #{:<5} {}", s.id, s.display_text),
                (SuggestionKind::Author, _) => format!("author  #{:<5} {}", s.id, s.display_text),
            };
            out.line(line);
        }
    }
}

/// `search <prefix>`. A blank prefix yields no suggestions.
pub async fn suggest(sf: &Storefront, prefix: &str, limit: i64) -> ApiResult<SuggestionList> {
    let prefix = validate_search_prefix(prefix)?;
    let suggestions = if prefix.is_empty() {
        Vec::new()
    } else {
        sf.db().books().search_suggestions(&prefix, limit).await?
    };
    Ok(SuggestionList { prefix, suggestions })
}
