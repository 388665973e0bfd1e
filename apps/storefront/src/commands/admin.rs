//! # Database Administration
//!
//! `db migrate`, `db reset --yes`, `db stats` and `db set-status`. These do
//! not require a logged-in customer.

use serde::Serialize;
use tracing::warn;

use bookstore_core::OrderDisplayInfo;
use bookstore_db::TableCounts;

use crate::error::{ApiError, ApiResult};
use crate::render::{Message, Render, Text};
use crate::state::{Storefront, StorefrontConfig};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationReport {
    pub total: usize,
    pub applied: usize,
}

impl Render for MigrationReport {
    fn render(&self, _config: &StorefrontConfig, out: &mut Text) {
        out.line(format!("Migrations applied: {} of {}", self.applied, self.total));
    }
}

impl Render for TableCounts {
    fn render(&self, _config: &StorefrontConfig, out: &mut Text) {
        out.heading("Table row counts");
        for (table, count) in self.rows() {
            out.line(format!("{:<14} {:>8}", table, count));
        }
    }
}

/// `db migrate`. Connecting already runs pending migrations, so this reports
/// the state after that.
pub async fn migrate(sf: &Storefront) -> ApiResult<MigrationReport> {
    sf.db().run_migrations().await?;
    let (total, applied) = sf.db().migration_status().await?;
    Ok(MigrationReport { total, applied })
}

/// `db reset --yes`.
pub async fn reset(sf: &Storefront, confirmed: bool) -> ApiResult<Message> {
    if !confirmed {
        return Err(ApiError::validation(
            "This deletes all data. Re-run with --yes to confirm.",
        ));
    }
    warn!("Resetting database on request");
    sf.db().reset_schema().await?;
    Ok(Message::new("Database schema recreated. All data was removed."))
}

/// `db stats`.
pub async fn stats(sf: &Storefront) -> ApiResult<TableCounts> {
    Ok(sf.db().table_counts().await?)
}

/// `db set-status <order> <status> [--tracking T]`. Returns the updated order.
pub async fn set_status(
    sf: &Storefront,
    order_id: i32,
    status: &str,
    tracking: Option<&str>,
) -> ApiResult<OrderDisplayInfo> {
    let orders = sf.db().orders();
    orders.add_status(order_id, status, tracking).await?;

    orders
        .details(order_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Order", order_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_render() {
        let counts = TableCounts {
            books: 20,
            ..TableCounts::default()
        };
        let text = crate::render::to_text(&counts, &StorefrontConfig::default());
        assert!(text.starts_with("Table row counts"));
        assert!(text.contains("book                 20"));
    }

    #[test]
    fn test_migration_report() {
        let report = MigrationReport { total: 1, applied: 1 };
        let text = crate::render::to_text(&report, &StorefrontConfig::default());
        assert_eq!(text, "Migrations applied: 1 of 1");
    }
}
