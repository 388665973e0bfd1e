//! # Output Rendering
//!
//! Every command returns a value that can be printed as plain text or, with
//! `--json`, as pretty JSON. Text goes to stdout; logs stay on stderr.

use std::io::{self, Write};

use serde::Serialize;

use bookstore_core::{BookDisplayInfo, OrderDisplayInfo};

use crate::error::{ApiError, ApiResult};
use crate::state::StorefrontConfig;

/// A command result that knows how to print itself.
pub trait Render: Serialize {
    fn render(&self, config: &StorefrontConfig, out: &mut Text);
}

/// Line buffer for text output.
#[derive(Debug, Default)]
pub struct Text {
    lines: Vec<String>,
}

impl Text {
    pub fn line(&mut self, line: impl Into<String>) -> &mut Self {
        self.lines.push(line.into());
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        self.lines.push(String::new());
        self
    }

    /// A heading followed by an underline of the same width.
    pub fn heading(&mut self, title: impl Into<String>) -> &mut Self {
        let title = title.into();
        let rule = "=".repeat(title.chars().count());
        self.lines.push(title);
        self.lines.push(rule);
        self
    }

    pub fn finish(self) -> String {
        self.lines.join("\n")
    }
}

pub fn to_text<T: Render>(value: &T, config: &StorefrontConfig) -> String {
    let mut out = Text::default();
    value.render(config, &mut out);
    out.finish()
}

pub fn to_json<T: Serialize>(value: &T) -> ApiResult<String> {
    serde_json::to_string_pretty(value).map_err(|e| ApiError::internal(e.to_string()))
}

/// Prints a command result to stdout.
pub fn print<T: Render>(value: &T, config: &StorefrontConfig, json: bool) -> ApiResult<()> {
    let output = if json { to_json(value)? } else { to_text(value, config) };
    write_output(&mut io::stdout().lock(), &output)
}

/// Writes `output` and a newline. A reader that went away (`| head`) is not
/// an error.
fn write_output(out: &mut impl Write, output: &str) -> ApiResult<()> {
    if output.is_empty() {
        return Ok(());
    }
    match writeln!(out, "{}", output).and_then(|()| out.flush()) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        Err(e) => Err(ApiError::internal(format!("Cannot write output: {}", e))),
    }
}

/// A plain confirmation message.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Message { message: message.into() }
    }
}

impl Render for Message {
    fn render(&self, _config: &StorefrontConfig, out: &mut Text) {
        out.line(&self.message);
    }
}

/// One catalogue row: `#12  Kobzar  (Taras Shevchenko)  350.00 грн  [3 in stock]`.
pub fn book_line(book: &BookDisplayInfo, config: &StorefrontConfig) -> String {
    let authors = if book.authors.is_empty() {
        String::new()
    } else {
        format!("  ({})", book.authors)
    };
    let stock = if book.in_stock() {
        format!("[{} in stock]", book.stock_quantity)
    } else {
        "[out of stock]".to_string()
    };
    format!(
        "#{:<5} {}{}  {}  {}",
        book.book_id,
        book.title,
        authors,
        config.format_currency(book.price_cents),
        stock
    )
}

pub fn book_lines(books: &[BookDisplayInfo], config: &StorefrontConfig, out: &mut Text) {
    if books.is_empty() {
        out.line("No books found.");
    }
    for book in books {
        out.line(book_line(book, config));
    }
}

/// Order header, items and status history.
pub fn order_block(order: &OrderDisplayInfo, config: &StorefrontConfig, out: &mut Text) {
    let status = order
        .latest_status()
        .map(|s| s.status.as_str())
        .unwrap_or("unknown");
    out.line(format!(
        "Order #{}  {}  {}  [{}]",
        order.order_id,
        order.order_date.format("%Y-%m-%d %H:%M"),
        config.format_currency(order.total_amount_cents),
        status
    ));
    out.line(format!("  Ship to: {}", order.shipping_address));
    if let Some(payment) = &order.payment_method {
        out.line(format!("  Payment: {}", payment));
    }
    for item in &order.items {
        out.line(format!(
            "  {} x{}  {} each",
            item.book_title,
            item.quantity,
            config.format_currency(item.price_per_unit_cents)
        ));
    }
    if order.statuses.len() > 1 {
        out.line("  History:");
        for entry in &order.statuses {
            let tracking = entry
                .tracking_number
                .as_deref()
                .map(|t| format!(" (tracking {})", t))
                .unwrap_or_default();
            out.line(format!(
                "    {}  {}{}",
                entry.status_date.format("%Y-%m-%d %H:%M"),
                entry.status,
                tracking
            ));
        }
    }
}

/// `★★★☆☆` for 1-5, empty for no rating.
pub fn stars(rating: Option<i32>) -> String {
    match rating {
        Some(r) if (1..=5).contains(&r) => {
            let r = r as usize;
            format!("{}{}", "★".repeat(r), "☆".repeat(5 - r))
        }
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookstore_core::{OrderItemDisplayInfo, OrderStatusDisplayInfo};
    use chrono::{TimeZone, Utc};

    fn book(stock: i32) -> BookDisplayInfo {
        BookDisplayInfo {
            book_id: 12,
            title: "Kobzar".to_string(),
            authors: "Taras Shevchenko".to_string(),
            price_cents: 35_000,
            cover_image_path: String::new(),
            stock_quantity: stock,
            genre: "Poetry".to_string(),
        }
    }

    #[test]
    fn test_book_line() {
        let config = StorefrontConfig::default();
        assert_eq!(
            book_line(&book(3), &config),
            "#12    Kobzar  (Taras Shevchenko)  350.00 грн  [3 in stock]"
        );
        assert!(book_line(&book(0), &config).ends_with("[out of stock]"));
    }

    #[test]
    fn test_stars() {
        assert_eq!(stars(Some(3)), "★★★☆☆");
        assert_eq!(stars(None), "");
        assert_eq!(stars(Some(0)), "");
    }

    #[test]
    fn test_heading() {
        let mut out = Text::default();
        out.heading("Cart");
        assert_eq!(out.finish(), "Cart\n====");
    }

    #[test]
    fn test_order_block() {
        let date = Utc.with_ymd_and_hms(2024, 5, 1, 10, 30, 0).unwrap();
        let order = OrderDisplayInfo {
            order_id: 9,
            order_date: date,
            total_amount_cents: 70_000,
            shipping_address: "Kyiv".to_string(),
            payment_method: None,
            items: vec![OrderItemDisplayInfo {
                book_title: "Kobzar".to_string(),
                quantity: 2,
                price_per_unit_cents: 35_000,
            }],
            statuses: vec![OrderStatusDisplayInfo {
                status: "New".to_string(),
                status_date: date,
                tracking_number: None,
            }],
        };

        let mut out = Text::default();
        order_block(&order, &StorefrontConfig::default(), &mut out);
        let text = out.finish();
        assert!(text.starts_with("Order #9  2024-05-01 10:30  700.00 грн  [New]"));
        assert!(text.contains("Kobzar x2  350.00 грн each"));
        assert!(!text.contains("Payment"));
        assert!(!text.contains("History"));
    }

    /// Accepts nothing, like stdout after the reading end of a pipe closed.
    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_output() {
        let mut buf = Vec::new();
        write_output(&mut buf, "Cart\n====").unwrap();
        write_output(&mut buf, "").unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "Cart\n====\n");

        assert!(write_output(&mut ClosedPipe, "Books").is_ok());
    }

    #[test]
    fn test_message_json() {
        let json = to_json(&Message::new("Logged out")).unwrap();
        assert!(json.contains(r#""message": "Logged out""#));
    }
}
