//! # Profile Commands
//!
//! The profile page: personal data, loyalty status, and edits to name,
//! phone and address.

use bookstore_core::CustomerProfileInfo;

use crate::error::{ApiError, ApiResult};
use crate::render::{Render, Text};
use crate::state::{Storefront, StorefrontConfig};

impl Render for CustomerProfileInfo {
    fn render(&self, _config: &StorefrontConfig, out: &mut Text) {
        out.heading(self.full_name());
        out.line(format!("Email:    {}", self.email));
        out.line(format!("Phone:    {}", self.phone.as_deref().unwrap_or("-")));
        out.line(format!("Address:  {}", self.address.as_deref().unwrap_or("-")));
        out.line(format!("Joined:   {}", self.join_date));
        if self.loyalty_program {
            out.line(format!("Loyalty:  member, {} points", self.loyalty_points));
        } else {
            out.line("Loyalty:  not a member yet (place an order to join)");
        }
    }
}

/// `profile show`.
pub async fn show(sf: &Storefront) -> ApiResult<CustomerProfileInfo> {
    let customer_id = sf.require_customer()?;
    load(sf, customer_id).await
}

/// `profile set-name <first> <last>`.
pub async fn set_name(sf: &Storefront, first_name: &str, last_name: &str) -> ApiResult<CustomerProfileInfo> {
    let customer_id = sf.require_customer()?;
    sf.db().customers().update_name(customer_id, first_name, last_name).await?;
    load(sf, customer_id).await
}

/// `profile set-phone <phone>`. Empty clears it.
pub async fn set_phone(sf: &Storefront, phone: &str) -> ApiResult<CustomerProfileInfo> {
    let customer_id = sf.require_customer()?;
    sf.db().customers().update_phone(customer_id, phone).await?;
    load(sf, customer_id).await
}

/// `profile set-address <address>`. Empty clears it.
pub async fn set_address(sf: &Storefront, address: &str) -> ApiResult<CustomerProfileInfo> {
    let customer_id = sf.require_customer()?;
    sf.db().customers().update_address(customer_id, address).await?;
    load(sf, customer_id).await
}

async fn load(sf: &Storefront, customer_id: i32) -> ApiResult<CustomerProfileInfo> {
    sf.db()
        .customers()
        .profile(customer_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Customer", customer_id))
}
