//! # Cart Commands
//!
//! The cart lives in the `cart_item` table so it survives between runs.
//! Every command loads it first and reconciles it against current stock:
//!
//! ```text
//! carts().items(customer)      (joined with live book rows)
//!      │
//!      ▼
//! Cart::reconcile()
//!      ├── sold out        ──► row deleted       ("... is sold out")
//!      ├── qty > stock     ──► row lowered       ("... only N left")
//!      ▼
//! apply the command, write the changed row back
//! ```

use serde::Serialize;
use tracing::{debug, info};

use bookstore_core::{Cart, CartAdjustment, CartItem};

use crate::error::{ApiError, ApiResult};
use crate::render::{Render, Text};
use crate::state::{Storefront, StorefrontConfig};

/// The cart page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<CartItem>,
    /// Changes made because stock moved since the items were added.
    pub adjustments: Vec<CartAdjustment>,
    pub total_quantity: i64,
    pub total_cents: i64,
}

impl CartView {
    pub fn from_cart(cart: &Cart, adjustments: Vec<CartAdjustment>) -> Self {
        CartView {
            items: cart.items().cloned().collect(),
            adjustments,
            total_quantity: cart.total_quantity(),
            total_cents: cart.total().cents(),
        }
    }
}

impl Render for CartView {
    fn render(&self, config: &StorefrontConfig, out: &mut Text) {
        for adjustment in &self.adjustments {
            out.line(adjustment_message(adjustment));
        }
        if !self.adjustments.is_empty() {
            out.blank();
        }

        out.heading(format!("Cart ({} items)", self.total_quantity));
        if self.items.is_empty() {
            out.line("Your cart is empty.");
            return;
        }
        for item in &self.items {
            out.line(format!(
                "#{:<5} {} x{}  {}",
                item.book.book_id,
                item.book.title,
                item.quantity,
                config.format_currency(item.line_total().cents())
            ));
        }
        out.blank();
        out.line(format!("Total: {}", config.format_currency(self.total_cents)));
    }
}

pub fn adjustment_message(adjustment: &CartAdjustment) -> String {
    match adjustment {
        CartAdjustment::Removed { title, .. } => {
            format!("'{}' is no longer available and was removed from the cart.", title)
        }
        CartAdjustment::OutOfStock { title, .. } => {
            format!("'{}' is sold out and was removed from the cart.", title)
        }
        CartAdjustment::Clamped { title, from, to, .. } => {
            format!("Only {} of '{}' left in stock, quantity lowered from {}.", to, title, from)
        }
    }
}

/// Loads the customer's cart, reconciles it and writes the corrections back.
pub async fn load_cart(sf: &Storefront, customer_id: i32) -> ApiResult<(Cart, Vec<CartAdjustment>)> {
    let carts = sf.db().carts();
    let mut cart = Cart::from_items(carts.items(customer_id).await?);
    let adjustments = cart.reconcile();

    for adjustment in &adjustments {
        match adjustment {
            CartAdjustment::Clamped { book_id, to, .. } => {
                carts.add_or_update(customer_id, *book_id, *to).await?;
            }
            other => carts.remove(customer_id, other.book_id()).await?,
        }
    }
    if !adjustments.is_empty() {
        info!(customer_id, count = adjustments.len(), "Cart reconciled with stock");
    }

    Ok((cart, adjustments))
}

/// `cart show`.
pub async fn show(sf: &Storefront) -> ApiResult<CartView> {
    let customer_id = sf.require_customer()?;
    let (cart, adjustments) = load_cart(sf, customer_id).await?;
    Ok(CartView::from_cart(&cart, adjustments))
}

/// `cart add <book> [--qty N]`. Adds to what is already in the cart.
pub async fn add(sf: &Storefront, book_id: i32, quantity: i32) -> ApiResult<CartView> {
    let customer_id = sf.require_customer()?;
    let (mut cart, adjustments) = load_cart(sf, customer_id).await?;

    let book = sf
        .db()
        .books()
        .display_info(book_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Book", book_id))?;

    let new_quantity = cart.add_item(&book, quantity)?;
    sf.db().carts().add_or_update(customer_id, book_id, new_quantity).await?;

    debug!(customer_id, book_id, new_quantity, "Added to cart");
    Ok(CartView::from_cart(&cart, adjustments))
}

/// `cart set <book> <qty>`. Zero or less removes the book.
pub async fn set(sf: &Storefront, book_id: i32, quantity: i32) -> ApiResult<CartView> {
    if quantity <= 0 {
        return remove(sf, book_id).await;
    }

    let customer_id = sf.require_customer()?;
    let (mut cart, adjustments) = load_cart(sf, customer_id).await?;

    let book = sf
        .db()
        .books()
        .display_info(book_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Book", book_id))?;

    cart.set_quantity(&book, quantity)?;
    sf.db().carts().add_or_update(customer_id, book_id, quantity).await?;

    Ok(CartView::from_cart(&cart, adjustments))
}

/// `cart remove <book>`.
pub async fn remove(sf: &Storefront, book_id: i32) -> ApiResult<CartView> {
    let customer_id = sf.require_customer()?;
    let (mut cart, adjustments) = load_cart(sf, customer_id).await?;

    if !cart.remove(book_id) {
        return Err(ApiError::cart(format!("Book {} is not in the cart", book_id)));
    }
    sf.db().carts().remove(customer_id, book_id).await?;

    Ok(CartView::from_cart(&cart, adjustments))
}

/// `cart clear`.
pub async fn clear(sf: &Storefront) -> ApiResult<CartView> {
    let customer_id = sf.require_customer()?;
    let removed = sf.db().carts().clear(customer_id).await?;

    debug!(customer_id, removed, "Cart cleared");
    Ok(CartView::from_cart(&Cart::new(), Vec::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::test_support::logged_in;
    use bookstore_core::BookDisplayInfo;
    use bookstore_db::test_support::{insert_book, set_stock, unique};

    fn book(id: i32, price_cents: i64, stock: i32) -> BookDisplayInfo {
        BookDisplayInfo {
            book_id: id,
            title: format!("Book {}", id),
            authors: String::new(),
            price_cents,
            cover_image_path: String::new(),
            stock_quantity: stock,
            genre: String::new(),
        }
    }

    #[test]
    fn test_view_totals() {
        let mut cart = Cart::new();
        cart.add_item(&book(1, 10_000, 5), 2).unwrap();
        cart.add_item(&book(2, 2_550, 5), 1).unwrap();

        let view = CartView::from_cart(&cart, Vec::new());
        assert_eq!(view.items.len(), 2);
        assert_eq!(view.total_quantity, 3);
        assert_eq!(view.total_cents, 22_550);

        let text = crate::render::to_text(&view, &StorefrontConfig::default());
        assert!(text.starts_with("Cart (3 items)"));
        assert!(text.contains("Total: 225.50 грн"));
    }

    #[test]
    fn test_adjustments_are_listed_first() {
        let view = CartView::from_cart(
            &Cart::new(),
            vec![CartAdjustment::Clamped {
                book_id: 1,
                title: "Kobzar".to_string(),
                from: 4,
                to: 2,
            }],
        );
        let text = crate::render::to_text(&view, &StorefrontConfig::default());
        assert!(text.starts_with("Only 2 of 'Kobzar' left in stock, quantity lowered from 4."));
        assert!(text.ends_with("Your cart is empty."));
    }

    #[test]
    fn test_adjustment_messages() {
        let sold_out = CartAdjustment::OutOfStock {
            book_id: 3,
            title: "Zakhar Berkut".to_string(),
        };
        assert_eq!(
            adjustment_message(&sold_out),
            "'Zakhar Berkut' is sold out and was removed from the cart."
        );
    }

    #[tokio::test]
    async fn test_add_adds_to_existing_quantity() {
        let Some((sf, customer)) = logged_in().await else { return };
        let book = insert_book(sf.db(), &unique("Cart add"), "Test", 10_000, 5).await;

        add(&sf, book, 2).await.unwrap();
        let view = add(&sf, book, 1).await.unwrap();
        assert_eq!(view.total_quantity, 3);
        assert_eq!(view.total_cents, 30_000);

        let (cart, adjustments) = load_cart(&sf, customer).await.unwrap();
        assert!(adjustments.is_empty());
        assert_eq!(cart.get(book).unwrap().quantity, 3);

        // 3 + 3 is more than the 5 in stock
        let err = add(&sf, book, 3).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        let (cart, _) = load_cart(&sf, customer).await.unwrap();
        assert_eq!(cart.get(book).unwrap().quantity, 3);
    }

    #[tokio::test]
    async fn test_load_cart_writes_back_adjustments() {
        let Some((sf, customer)) = logged_in().await else { return };
        let scarce = insert_book(sf.db(), &unique("Scarce"), "Test", 1_000, 5).await;
        let gone = insert_book(sf.db(), &unique("Gone"), "Test", 1_000, 5).await;
        add(&sf, scarce, 4).await.unwrap();
        add(&sf, gone, 1).await.unwrap();

        set_stock(sf.db(), scarce, 2).await;
        set_stock(sf.db(), gone, 0).await;

        let view = show(&sf).await.unwrap();
        assert_eq!(view.adjustments.len(), 2);
        assert_eq!(view.total_quantity, 2);

        // Persisted, so the next load sees nothing to fix
        let (cart, adjustments) = load_cart(&sf, customer).await.unwrap();
        assert!(adjustments.is_empty());
        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.get(scarce).unwrap().quantity, 2);
    }

    #[tokio::test]
    async fn test_remove_missing_book_is_cart_error() {
        let Some((sf, _)) = logged_in().await else { return };
        let book = insert_book(sf.db(), &unique("Never added"), "Test", 1_000, 5).await;

        let err = remove(&sf, book).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::CartError);
    }
}
