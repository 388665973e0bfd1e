//! # Checkout
//!
//! Types that cross the boundary between the cart and the order
//! transaction in bookstore-db.
//!
//! ```text
//! Cart ──order_lines()──► CheckoutRequest ──validate()──► create_order(tx)
//!                                                              │
//!                                                              ▼
//!                                                         PlacedOrder
//!                                                              │
//!                                          loyalty_points_for(total)
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::validation::{validate_id, validate_shipping_address};

/// One cent of loyalty for every this many cents spent (one point per 10.00).
const CENTS_PER_LOYALTY_POINT: i64 = 1_000;

// =============================================================================
// Payment Method
// =============================================================================

/// Payment methods offered at checkout.
///
/// Stored in `"order".payment_method` by label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CashOnDelivery,
    Card,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 2] = [PaymentMethod::CashOnDelivery, PaymentMethod::Card];

    /// The label written to the database.
    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::CashOnDelivery => "Cash on delivery",
            PaymentMethod::Card => "Visa/Mastercard card",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Accepts the stored label or the short names `cash` / `card`.
impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        for method in PaymentMethod::ALL {
            if s.eq_ignore_ascii_case(method.label()) {
                return Ok(method);
            }
        }
        match s.to_ascii_lowercase().as_str() {
            "cash" | "cod" | "cash_on_delivery" => Ok(PaymentMethod::CashOnDelivery),
            "card" | "visa" | "mastercard" => Ok(PaymentMethod::Card),
            _ => Err(ValidationError::NotAllowed {
                field: "payment_method".to_string(),
                allowed: vec!["cash".to_string(), "card".to_string()],
            }),
        }
    }
}

// =============================================================================
// Order Input / Output
// =============================================================================

/// One requested line of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub book_id: i32,
    pub quantity: i32,
}

/// Everything the order transaction needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub customer_id: i32,
    pub lines: Vec<OrderLine>,
    pub shipping_address: String,
    pub payment_method: Option<PaymentMethod>,
}

impl CheckoutRequest {
    /// Checks the request before any transaction is opened.
    ///
    /// Lines with a non-positive quantity are allowed here; the transaction
    /// skips them. A request made only of such lines fails there instead.
    pub fn validate(&self) -> CoreResult<()> {
        validate_id("customer_id", self.customer_id)?;
        if self.lines.is_empty() {
            return Err(CoreError::EmptyCart);
        }
        validate_shipping_address(&self.shipping_address)?;
        Ok(())
    }

    /// Label for the payment column, `None` when not chosen.
    pub fn payment_label(&self) -> Option<&'static str> {
        self.payment_method.map(|m| m.label())
    }
}

/// Result of a committed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedOrder {
    pub order_id: i32,
    pub total: Money,
}

/// Loyalty points earned for an order total: one point per full 10.00.
///
/// ```rust
/// use bookstore_core::checkout::loyalty_points_for;
/// use bookstore_core::money::Money;
///
/// assert_eq!(loyalty_points_for(Money::from_cents(999)), 0);
/// assert_eq!(loyalty_points_for(Money::from_cents(25_990)), 25);
/// ```
pub fn loyalty_points_for(total: Money) -> i32 {
    if !total.is_positive() {
        return 0;
    }
    (total.cents() / CENTS_PER_LOYALTY_POINT).min(i32::MAX as i64) as i32
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CheckoutRequest {
        CheckoutRequest {
            customer_id: 1,
            lines: vec![OrderLine {
                book_id: 3,
                quantity: 2,
            }],
            shipping_address: "Kyiv, Khreshchatyk 1".to_string(),
            payment_method: Some(PaymentMethod::Card),
        }
    }

    #[test]
    fn test_payment_method_parsing() {
        assert_eq!(
            "cash".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::CashOnDelivery
        );
        assert_eq!(
            "Visa/Mastercard card".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::Card
        );
        assert!("bitcoin".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_valid_request() {
        let req = request();
        assert!(req.validate().is_ok());
        assert_eq!(req.payment_label(), Some("Visa/Mastercard card"));
    }

    #[test]
    fn test_request_rejections() {
        let mut req = request();
        req.customer_id = 0;
        assert!(matches!(req.validate(), Err(CoreError::Validation(_))));

        let mut req = request();
        req.lines.clear();
        assert!(matches!(req.validate(), Err(CoreError::EmptyCart)));

        let mut req = request();
        req.shipping_address = "   ".to_string();
        assert!(matches!(req.validate(), Err(CoreError::Validation(_))));
    }

    #[test]
    fn test_loyalty_points() {
        assert_eq!(loyalty_points_for(Money::zero()), 0);
        assert_eq!(loyalty_points_for(Money::from_cents(-5_000)), 0);
        assert_eq!(loyalty_points_for(Money::from_cents(1_000)), 1);
        assert_eq!(loyalty_points_for(Money::from_cents(1_999)), 1);
    }
}
