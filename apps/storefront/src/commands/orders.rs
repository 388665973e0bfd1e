//! Order history for the logged-in customer.

use serde::Serialize;

use bookstore_core::OrderDisplayInfo;

use crate::error::{ApiError, ApiResult};
use crate::render::{order_block, Render, Text};
use crate::state::{Storefront, StorefrontConfig};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderList {
    pub orders: Vec<OrderDisplayInfo>,
}

impl Render for OrderList {
    fn render(&self, config: &StorefrontConfig, out: &mut Text) {
        out.heading(format!("Orders ({})", self.orders.len()));
        if self.orders.is_empty() {
            out.line("You have not placed any orders yet.");
        }
        for (i, order) in self.orders.iter().enumerate() {
            if i > 0 {
                out.blank();
            }
            order_block(order, config, out);
        }
    }
}

impl Render for OrderDisplayInfo {
    fn render(&self, config: &StorefrontConfig, out: &mut Text) {
        order_block(self, config, out);
    }
}

/// `orders list`, newest first.
pub async fn list(sf: &Storefront) -> ApiResult<OrderList> {
    let customer_id = sf.require_customer()?;
    let orders = sf.db().orders().orders_for_customer(customer_id).await?;
    Ok(OrderList { orders })
}

/// `orders show <id>`. Another customer's order reads as not found.
pub async fn show(sf: &Storefront, order_id: i32) -> ApiResult<OrderDisplayInfo> {
    let customer_id = sf.require_customer()?;
    sf.db()
        .orders()
        .details_for_customer(customer_id, order_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Order", order_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{cart, checkout};
    use crate::error::ErrorCode;
    use crate::test_support::{logged_in, storefront_as};
    use bookstore_db::test_support::{insert_book, insert_customer, unique};

    #[test]
    fn test_empty_history() {
        let text = crate::render::to_text(&OrderList { orders: Vec::new() }, &StorefrontConfig::default());
        assert_eq!(text, "Orders (0)\n==========\nYou have not placed any orders yet.");
    }

    #[tokio::test]
    async fn test_other_customers_order_is_not_found() {
        let Some((sf, _)) = logged_in().await else { return };
        let book = insert_book(sf.db(), &unique("Private order"), "Test", 2_000, 5).await;
        cart::add(&sf, book, 1).await.unwrap();
        let receipt = checkout::place_order(&sf, Some("Kharkiv".into()), None).await.unwrap();

        let mine = show(&sf, receipt.order_id).await.unwrap();
        assert_eq!(mine.items.len(), 1);
        assert_eq!(list(&sf).await.unwrap().orders.len(), 1);

        let other = insert_customer(sf.db()).await;
        let other_sf = storefront_as(sf.db().clone(), other);
        let err = show(&other_sf, receipt.order_id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert!(list(&other_sf).await.unwrap().orders.is_empty());
    }
}
