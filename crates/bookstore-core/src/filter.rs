//! # Catalogue Filter
//!
//! Filter criteria for the book catalogue and the manager that accumulates
//! them as the user toggles filters.
//!
//! ## From Criteria to SQL
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BookFilterCriteria                   WHERE clause (bookstore-db)       │
//! │  ──────────────────                   ───────────────────────────       │
//! │  genres = ["Fantasy", "Horror"]  ──►  b.genre IN ($1, $2)               │
//! │  languages = ["English"]         ──►  b.language IN ($3)                │
//! │  min_price = Some(100.00)        ──►  b.price_cents >= $4               │
//! │  max_price = None                ──►  (no predicate)                    │
//! │  in_stock_only = true            ──►  b.stock_quantity > 0              │
//! │                                                                         │
//! │  Predicates are joined with AND. An empty criteria set lists all books. │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::Money;
use crate::validation::ValidationResult;

/// Optional predicates over the catalogue.
///
/// An unset price bound is `None` rather than a negative sentinel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookFilterCriteria {
    pub genres: Vec<String>,
    pub languages: Vec<String>,
    pub min_price: Option<Money>,
    pub max_price: Option<Money>,
    pub in_stock_only: bool,
}

impl BookFilterCriteria {
    /// True when no predicate is active.
    pub fn is_empty(&self) -> bool {
        self.genres.is_empty()
            && self.languages.is_empty()
            && self.min_price.is_none()
            && self.max_price.is_none()
            && !self.in_stock_only
    }

    /// Checks the price bounds.
    ///
    /// ## Rules
    /// - Bounds must not be negative
    /// - When both are set, `min <= max`
    pub fn validate(&self) -> ValidationResult<()> {
        for (field, bound) in [("min_price", self.min_price), ("max_price", self.max_price)] {
            if let Some(bound) = bound {
                if bound.is_negative() {
                    return Err(ValidationError::OutOfRange {
                        field: field.to_string(),
                        min: 0,
                        max: i64::MAX,
                    });
                }
            }
        }

        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            if min > max {
                return Err(ValidationError::OutOfRange {
                    field: "min_price".to_string(),
                    min: 0,
                    max: max.cents(),
                });
            }
        }

        Ok(())
    }
}

// =============================================================================
// Filter Manager
// =============================================================================

/// Holds the active filter while the user refines it.
///
/// ## Example
/// ```rust
/// use bookstore_core::filter::BookFilterManager;
/// use bookstore_core::money::Money;
///
/// let mut filters = BookFilterManager::new();
/// filters.set_genre_filter(vec!["Fantasy".into()]);
/// filters.set_price_range_filter(None, Some(Money::from_cents(50_000)));
/// assert!(!filters.current_criteria().is_empty());
///
/// filters.reset_filters();
/// assert!(filters.current_criteria().is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct BookFilterManager {
    criteria: BookFilterCriteria,
}

impl BookFilterManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the genre set. Blank entries are dropped and duplicates
    /// collapsed.
    pub fn set_genre_filter(&mut self, genres: Vec<String>) {
        self.criteria.genres = normalize(genres);
    }

    /// Replaces the language set, normalized like genres.
    pub fn set_language_filter(&mut self, languages: Vec<String>) {
        self.criteria.languages = normalize(languages);
    }

    pub fn set_price_range_filter(&mut self, min: Option<Money>, max: Option<Money>) {
        self.criteria.min_price = min;
        self.criteria.max_price = max;
    }

    pub fn set_in_stock_only(&mut self, in_stock_only: bool) {
        self.criteria.in_stock_only = in_stock_only;
    }

    /// Clears every predicate.
    pub fn reset_filters(&mut self) {
        self.criteria = BookFilterCriteria::default();
    }

    pub fn current_criteria(&self) -> &BookFilterCriteria {
        &self.criteria
    }

    /// Consumes the manager, yielding validated criteria.
    pub fn into_criteria(self) -> ValidationResult<BookFilterCriteria> {
        self.criteria.validate()?;
        Ok(self.criteria)
    }
}

fn normalize(values: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        let value = value.trim();
        if !value.is_empty() && !out.iter().any(|v| v == value) {
            out.push(value.to_string());
        }
    }
    out
}

// =============================================================================
// Unit Tests
// =============================================================================
