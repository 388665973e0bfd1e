//! # Cart
//!
//! In-memory view of a customer's cart. The rows themselves live in the
//! `cart_item` table; this module holds the math and the stock rules that
//! apply whenever the cart is loaded or checked out.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  CLI command           Cart method             Persisted as            │
//! │  ───────────           ───────────             ────────────            │
//! │                                                                         │
//! │  cart add 7 --qty 2 ──► add_item()   ───────► upsert cart_item         │
//! │  cart set 7 5       ──► set_quantity() ─────► upsert / delete          │
//! │  cart remove 7      ──► remove()     ───────► delete cart_item         │
//! │  cart show          ──► reconcile()  ───────► clamp / delete stale     │
//! │  checkout           ──► refresh() + check_stock() ──► create_order     │
//! │                                                                         │
//! │  Items are keyed by book id, so a book appears at most once.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::checkout::OrderLine;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::BookDisplayInfo;
use crate::validation::validate_quantity;

/// A book in the cart together with the requested quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub book: BookDisplayInfo,
    pub quantity: i32,
}

impl CartItem {
    /// Current price × quantity.
    pub fn line_total(&self) -> Money {
        self.book.price() * self.quantity
    }
}

/// A change the cart had to make to stay consistent with stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum CartAdjustment {
    /// The book no longer exists.
    Removed { book_id: i32, title: String },
    /// The book is sold out.
    OutOfStock { book_id: i32, title: String },
    /// The quantity exceeded stock and was lowered.
    Clamped {
        book_id: i32,
        title: String,
        from: i32,
        to: i32,
    },
}

impl CartAdjustment {
    pub fn book_id(&self) -> i32 {
        match self {
            CartAdjustment::Removed { book_id, .. }
            | CartAdjustment::OutOfStock { book_id, .. }
            | CartAdjustment::Clamped { book_id, .. } => *book_id,
        }
    }
}

/// The shopping cart.
///
/// ## Invariants
/// - Items are unique by book id
/// - Every quantity is > 0 (setting 0 removes the item)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    items: BTreeMap<i32, CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a cart from stored rows. Rows with a non-positive quantity are
    /// ignored.
    pub fn from_items(items: impl IntoIterator<Item = CartItem>) -> Self {
        let items = items
            .into_iter()
            .filter(|item| item.quantity > 0)
            .map(|item| (item.book.book_id, item))
            .collect();
        Cart { items }
    }

    /// Adds `quantity` copies of a book, merging with an existing entry.
    ///
    /// ## Returns
    /// The new quantity for the book, which the caller persists.
    ///
    /// ## Errors
    /// - quantity not in 1..=MAX_ITEM_QUANTITY
    /// - the book is sold out or the new total exceeds stock
    pub fn add_item(&mut self, book: &BookDisplayInfo, quantity: i32) -> CoreResult<i32> {
        validate_quantity(quantity)?;

        let current = self
            .items
            .get(&book.book_id)
            .map(|item| item.quantity)
            .unwrap_or(0);
        let new_quantity = current + quantity;
        validate_quantity(new_quantity)?;

        if new_quantity > book.stock_quantity {
            return Err(CoreError::InsufficientStock {
                book_id: book.book_id,
                title: book.title.clone(),
                available: book.stock_quantity,
                requested: new_quantity,
            });
        }

        self.items.insert(
            book.book_id,
            CartItem {
                book: book.clone(),
                quantity: new_quantity,
            },
        );
        Ok(new_quantity)
    }

    /// Sets the quantity of a book outright. Zero or less removes it.
    pub fn set_quantity(&mut self, book: &BookDisplayInfo, quantity: i32) -> CoreResult<()> {
        if quantity <= 0 {
            self.remove(book.book_id);
            return Ok(());
        }
        validate_quantity(quantity)?;

        if quantity > book.stock_quantity {
            return Err(CoreError::InsufficientStock {
                book_id: book.book_id,
                title: book.title.clone(),
                available: book.stock_quantity,
                requested: quantity,
            });
        }

        self.items.insert(
            book.book_id,
            CartItem {
                book: book.clone(),
                quantity,
            },
        );
        Ok(())
    }

    /// Removes a book. Returns whether it was present.
    pub fn remove(&mut self, book_id: i32) -> bool {
        self.items.remove(&book_id).is_some()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn get(&self, book_id: i32) -> Option<&CartItem> {
        self.items.get(&book_id)
    }

    /// Items ordered by book id.
    pub fn items(&self) -> impl Iterator<Item = &CartItem> {
        self.items.values()
    }

    /// Number of distinct books.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Number of copies across all books (the cart badge).
    pub fn total_quantity(&self) -> i64 {
        self.items.values().map(|i| i.quantity as i64).sum()
    }

    pub fn total(&self) -> Money {
        self.items.values().map(CartItem::line_total).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The lines handed to the order transaction.
    pub fn order_lines(&self) -> Vec<OrderLine> {
        self.items
            .values()
            .map(|item| OrderLine {
                book_id: item.book.book_id,
                quantity: item.quantity,
            })
            .collect()
    }

    /// Replaces the book info with fresh rows, then applies stock rules.
    ///
    /// Books missing from `fresh` are dropped as [`CartAdjustment::Removed`].
    pub fn refresh(&mut self, fresh: &HashMap<i32, BookDisplayInfo>) -> Vec<CartAdjustment> {
        let mut adjustments = Vec::new();

        self.items.retain(|book_id, item| match fresh.get(book_id) {
            Some(book) => {
                item.book = book.clone();
                true
            }
            None => {
                adjustments.push(CartAdjustment::Removed {
                    book_id: *book_id,
                    title: item.book.title.clone(),
                });
                false
            }
        });

        adjustments.extend(self.reconcile());
        adjustments
    }

    /// Applies the stock rules against the book info each item carries.
    ///
    /// ## Rules
    /// ```text
    /// stock == 0          ──► drop item        (OutOfStock)
    /// quantity > stock    ──► quantity = stock (Clamped)
    /// otherwise           ──► unchanged
    /// ```
    pub fn reconcile(&mut self) -> Vec<CartAdjustment> {
        let mut adjustments = Vec::new();

        self.items.retain(|book_id, item| {
            if item.book.stock_quantity <= 0 {
                adjustments.push(CartAdjustment::OutOfStock {
                    book_id: *book_id,
                    title: item.book.title.clone(),
                });
                return false;
            }
            if item.quantity > item.book.stock_quantity {
                adjustments.push(CartAdjustment::Clamped {
                    book_id: *book_id,
                    title: item.book.title.clone(),
                    from: item.quantity,
                    to: item.book.stock_quantity,
                });
                item.quantity = item.book.stock_quantity;
            }
            true
        });

        adjustments
    }

    /// Checkout pre-check: every item must be fully covered by stock.
    ///
    /// ## Errors
    /// - [`CoreError::EmptyCart`] for an empty cart
    /// - [`CoreError::InsufficientStock`] for the first uncovered item
    pub fn check_stock(&self) -> CoreResult<()> {
        if self.is_empty() {
            return Err(CoreError::EmptyCart);
        }

        for item in self.items.values() {
            if item.book.stock_quantity < item.quantity {
                return Err(CoreError::InsufficientStock {
                    book_id: item.book.book_id,
                    title: item.book.title.clone(),
                    available: item.book.stock_quantity,
                    requested: item.quantity,
                });
            }
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn book(id: i32, price_cents: i64, stock: i32) -> BookDisplayInfo {
        BookDisplayInfo {
            book_id: id,
            title: format!("Book {}", id),
            authors: "Taras Shevchenko".to_string(),
            price_cents,
            cover_image_path: String::new(),
            stock_quantity: stock,
            genre: "Poetry".to_string(),
        }
    }

    #[test]
    fn test_add_item_merges_quantities() {
        let mut cart = Cart::new();
        let b = book(1, 15_000, 10);

        assert_eq!(cart.add_item(&b, 2).unwrap(), 2);
        assert_eq!(cart.add_item(&b, 3).unwrap(), 5);

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.total_quantity(), 5);
        assert_eq!(cart.total().cents(), 75_000);
    }

    #[test]
    fn test_add_item_respects_stock() {
        let mut cart = Cart::new();
        let b = book(1, 15_000, 3);

        cart.add_item(&b, 2).unwrap();
        let err = cart.add_item(&b, 2).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock {
                available: 3,
                requested: 4,
                ..
            }
        ));
        // Failed add leaves the cart untouched
        assert_eq!(cart.get(1).unwrap().quantity, 2);
    }

    #[test]
    fn test_set_quantity_zero_removes() {
        let mut cart = Cart::new();
        let b = book(1, 15_000, 3);
        cart.set_quantity(&b, 2).unwrap();
        cart.set_quantity(&b, 0).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_reconcile_clamps_and_drops() {
        let mut cart = Cart::from_items(vec![
            CartItem {
                book: book(1, 10_000, 2),
                quantity: 5,
            },
            CartItem {
                book: book(2, 10_000, 0),
                quantity: 1,
            },
            CartItem {
                book: book(3, 10_000, 9),
                quantity: 1,
            },
        ]);

        let adjustments = cart.reconcile();

        assert_eq!(
            adjustments,
            vec![
                CartAdjustment::Clamped {
                    book_id: 1,
                    title: "Book 1".to_string(),
                    from: 5,
                    to: 2
                },
                CartAdjustment::OutOfStock {
                    book_id: 2,
                    title: "Book 2".to_string()
                },
            ]
        );
        assert_eq!(cart.item_count(), 2);
        assert_eq!(cart.get(1).unwrap().quantity, 2);
    }

    #[test]
    fn test_refresh_drops_missing_books() {
        let mut cart = Cart::from_items(vec![
            CartItem {
                book: book(1, 10_000, 5),
                quantity: 1,
            },
            CartItem {
                book: book(2, 10_000, 5),
                quantity: 1,
            },
        ]);

        let mut fresh = HashMap::new();
        // Price went up, stock went down
        fresh.insert(1, book(1, 12_000, 1));

        let adjustments = cart.refresh(&fresh);

        assert_eq!(adjustments.len(), 1);
        assert_eq!(adjustments[0].book_id(), 2);
        assert_eq!(cart.total().cents(), 12_000);
    }

    #[test]
    fn test_check_stock() {
        assert!(matches!(Cart::new().check_stock(), Err(CoreError::EmptyCart)));

        let mut items = vec![CartItem {
            book: book(1, 10_000, 5),
            quantity: 5,
        }];
        assert!(Cart::from_items(items.clone()).check_stock().is_ok());

        items[0].book.stock_quantity = 4;
        assert!(Cart::from_items(items).check_stock().is_err());
    }

    #[test]
    fn test_order_lines() {
        let mut cart = Cart::new();
        cart.add_item(&book(2, 100, 5), 1).unwrap();
        cart.add_item(&book(1, 100, 5), 3).unwrap();

        let lines = cart.order_lines();
        assert_eq!(
            lines,
            vec![
                OrderLine {
                    book_id: 1,
                    quantity: 3
                },
                OrderLine {
                    book_id: 2,
                    quantity: 1
                },
            ]
        );
    }
}
