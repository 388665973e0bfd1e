//! # Checkout
//!
//! ```text
//! checkout --address "Kyiv" --payment card
//!      │
//!      ▼
//! load_cart ──► adjustments? ──yes──► CartError (review the cart first)
//!      │ no
//!      ▼
//! cart.check_stock()            (fast, pre-transaction)
//!      │
//!      ▼
//! orders().place(request)       (single transaction, rows locked)
//!      │
//!      ▼
//! award floor(total / 10.00) loyalty points ──► clear the cart
//! ```
//!
//! Once the order commits, a failed bonus or cart clear is only logged. The
//! receipt is still returned.
//!
//! The pre-check only gives a friendlier error. The transaction re-checks
//! stock under row locks, so two buyers racing for the last copy cannot
//! both succeed.

use serde::Serialize;
use tracing::{info, warn};

use bookstore_core::checkout::loyalty_points_for;
use bookstore_core::{CheckoutRequest, PaymentMethod};

use crate::commands::cart::{adjustment_message, load_cart};
use crate::error::{ApiError, ApiResult};
use crate::render::{Render, Text};
use crate::state::{Storefront, StorefrontConfig};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutReceipt {
    pub order_id: i32,
    pub total_cents: i64,
    pub points_awarded: i32,
    /// Balance after this order, when points were awarded.
    pub loyalty_balance: Option<i32>,
}

impl Render for CheckoutReceipt {
    fn render(&self, config: &StorefrontConfig, out: &mut Text) {
        out.line(format!(
            "Order #{} placed. Total: {}",
            self.order_id,
            config.format_currency(self.total_cents)
        ));
        if let Some(balance) = self.loyalty_balance {
            out.line(format!(
                "You earned {} loyalty points ({} total).",
                self.points_awarded, balance
            ));
        }
    }
}

/// `checkout`.
pub async fn place_order(
    sf: &Storefront,
    address: Option<String>,
    payment: Option<PaymentMethod>,
) -> ApiResult<CheckoutReceipt> {
    let customer_id = sf.require_customer()?;

    let (cart, adjustments) = load_cart(sf, customer_id).await?;
    if !adjustments.is_empty() {
        let details: Vec<String> = adjustments.iter().map(adjustment_message).collect();
        return Err(ApiError::cart(format!(
            "Your cart changed, please review it and check out again. {}",
            details.join(" ")
        )));
    }
    cart.check_stock()?;

    let shipping_address = match address {
        Some(address) => address,
        None => profile_address(sf, customer_id).await?,
    };

    let request = CheckoutRequest {
        customer_id,
        lines: cart.order_lines(),
        shipping_address,
        payment_method: payment,
    };
    let placed = sf.db().orders().place(&request).await?;

    let points = loyalty_points_for(placed.total);
    let loyalty_balance = if points > 0 {
        match sf.db().customers().add_loyalty_points(customer_id, points).await {
            Ok(balance) => Some(balance),
            Err(e) => {
                // The order is committed; a missed bonus must not hide that
                warn!(order_id = placed.order_id, error = %e, "Failed to award loyalty points");
                None
            }
        }
    } else {
        None
    };

    // The order stands even if the cart cannot be cleared
    if let Err(e) = sf.db().carts().clear(customer_id).await {
        warn!(order_id = placed.order_id, error = %e, "Failed to clear cart after checkout");
    }

    info!(
        order_id = placed.order_id,
        customer_id,
        total = %placed.total,
        points,
        "Checkout complete"
    );
    Ok(CheckoutReceipt {
        order_id: placed.order_id,
        total_cents: placed.total.cents(),
        points_awarded: if loyalty_balance.is_some() { points } else { 0 },
        loyalty_balance,
    })
}

async fn profile_address(sf: &Storefront, customer_id: i32) -> ApiResult<String> {
    let profile = sf
        .db()
        .customers()
        .profile(customer_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Customer", customer_id))?;

    profile
        .address
        .filter(|a| !a.trim().is_empty())
        .ok_or_else(|| ApiError::validation("No shipping address: pass --address or set one with `profile set-address`"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::cart;
    use crate::error::ErrorCode;
    use crate::test_support::logged_in;
    use bookstore_db::test_support::{
        allow_cart_deletes, cart_rows, fail_cart_deletes, insert_book, set_stock, stock_of, unique,
    };

    #[test]
    fn test_receipt_with_points() {
        let receipt = CheckoutReceipt {
            order_id: 42,
            total_cents: 35_000,
            points_awarded: 35,
            loyalty_balance: Some(50),
        };
        let text = crate::render::to_text(&receipt, &StorefrontConfig::default());
        assert_eq!(
            text,
            "Order #42 placed. Total: 350.00 грн\nYou earned 35 loyalty points (50 total)."
        );
    }

    #[test]
    fn test_receipt_without_points() {
        let receipt = CheckoutReceipt {
            order_id: 1,
            total_cents: 950,
            points_awarded: 0,
            loyalty_balance: None,
        };
        let text = crate::render::to_text(&receipt, &StorefrontConfig::default());
        assert_eq!(text, "Order #1 placed. Total: 9.50 грн");
    }

    #[tokio::test]
    async fn test_checkout_awards_points_and_empties_cart() {
        let Some((sf, customer)) = logged_in().await else { return };
        let book = insert_book(sf.db(), &unique("Checkout"), "Test", 12_550, 5).await;
        cart::add(&sf, book, 2).await.unwrap();

        let receipt = place_order(&sf, Some("Kyiv, Khreshchatyk 1".into()), Some(PaymentMethod::Card))
            .await
            .unwrap();

        // 251.00 spent, one point per full 10.00
        assert_eq!(receipt.total_cents, 25_100);
        assert_eq!(receipt.points_awarded, 25);
        assert_eq!(receipt.loyalty_balance, Some(25));

        let profile = sf.db().customers().profile(customer).await.unwrap().unwrap();
        assert!(profile.loyalty_program);
        assert_eq!(profile.loyalty_points, 25);

        assert_eq!(cart_rows(sf.db(), customer).await, 0);
        assert_eq!(stock_of(sf.db(), book).await, 3);

        let orders = sf.db().orders().orders_for_customer(customer).await.unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].order_id, receipt.order_id);
    }

    #[tokio::test]
    async fn test_checkout_stops_when_cart_changed() {
        let Some((sf, customer)) = logged_in().await else { return };
        let book = insert_book(sf.db(), &unique("Shrinking"), "Test", 1_000, 5).await;
        cart::add(&sf, book, 3).await.unwrap();
        set_stock(sf.db(), book, 1).await;

        let err = place_order(&sf, Some("Lviv".into()), None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::CartError);
        assert!(err.message.contains("Only 1 of"));
        assert!(sf.db().orders().orders_for_customer(customer).await.unwrap().is_empty());

        // The lowered quantity was kept, so a second attempt goes through
        let receipt = place_order(&sf, Some("Lviv".into()), None).await.unwrap();
        assert_eq!(receipt.total_cents, 1_000);
        assert_eq!(receipt.points_awarded, 1);
        assert_eq!(stock_of(sf.db(), book).await, 0);
    }

    #[tokio::test]
    async fn test_checkout_needs_an_address() {
        let Some((sf, _)) = logged_in().await else { return };
        let book = insert_book(sf.db(), &unique("No address"), "Test", 1_000, 5).await;
        cart::add(&sf, book, 1).await.unwrap();

        let err = place_order(&sf, None, None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(stock_of(sf.db(), book).await, 5);
    }

    #[tokio::test]
    async fn test_order_stands_when_cart_clear_fails() {
        let Some((sf, customer)) = logged_in().await else { return };
        let book = insert_book(sf.db(), &unique("Stuck cart"), "Test", 1_500, 5).await;
        cart::add(&sf, book, 2).await.unwrap();

        fail_cart_deletes(sf.db(), customer).await;
        let result = place_order(&sf, Some("Odesa".into()), None).await;
        allow_cart_deletes(sf.db(), customer).await;

        let receipt = result.unwrap();
        assert_eq!(receipt.total_cents, 3_000);
        assert_eq!(stock_of(sf.db(), book).await, 3);
        assert_eq!(cart_rows(sf.db(), customer).await, 1);

        let orders = sf.db().orders().orders_for_customer(customer).await.unwrap();
        assert_eq!(orders.len(), 1);
    }
}
