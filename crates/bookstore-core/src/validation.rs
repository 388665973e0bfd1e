//! # Validation Module
//!
//! Input validation for the storefront.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: CLI parsing (clap)                                           │
//! │  ├── Types and required arguments                                      │
//! │  └── Immediate usage errors                                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  └── Business rules (email shape, rating range, quantities)            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (PostgreSQL)                                        │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── UNIQUE (customer_email_key, one comment per book)                 │
//! │  └── Foreign keys                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use bookstore_core::validation::{validate_email, validate_quantity};
//!
//! validate_email("reader@example.com").unwrap();
//! validate_quantity(5).unwrap();
//! ```

use crate::error::ValidationError;
use crate::types::CustomerRegistrationInfo;
use crate::MAX_ITEM_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MIN_PASSWORD_LEN: usize = 6;
const MAX_PASSWORD_LEN: usize = 128;
const MAX_NAME_LEN: usize = 100;
const MAX_EMAIL_LEN: usize = 254;
const MAX_ADDRESS_LEN: usize = 500;
const MAX_COMMENT_LEN: usize = 2000;
const MAX_PREFIX_LEN: usize = 100;

fn required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::required(field));
    }
    Ok(())
}

fn max_chars(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }
    Ok(())
}

// =============================================================================
// Customer Validators
// =============================================================================

/// Validates an email address.
///
/// ## Rules
/// - Must not be empty
/// - Exactly one `@` with a non-empty local part
/// - Domain contains a dot that is neither first nor last
/// - No whitespace
///
/// ## Example
/// ```rust
/// use bookstore_core::validation::validate_email;
///
/// assert!(validate_email("olena@example.com").is_ok());
/// assert!(validate_email("olena@localhost").is_err());
/// assert!(validate_email("").is_err());
/// ```
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();
    required("email", email)?;
    max_chars("email", email, MAX_EMAIL_LEN)?;

    let invalid = || ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: "expected name@domain.tld".to_string(),
    };

    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    match domain.find('.') {
        Some(pos) if pos > 0 && !domain.ends_with('.') => Ok(()),
        _ => Err(invalid()),
    }
}

/// Validates a plain-text password before it is hashed.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::required("password"));
    }
    let len = password.chars().count();
    if len < MIN_PASSWORD_LEN {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: MIN_PASSWORD_LEN,
        });
    }
    if len > MAX_PASSWORD_LEN {
        return Err(ValidationError::TooLong {
            field: "password".to_string(),
            max: MAX_PASSWORD_LEN,
        });
    }
    Ok(())
}

/// Validates a first or last name. `field` names the value in the error.
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    required(field, name)?;
    max_chars(field, name.trim(), MAX_NAME_LEN)
}

/// Validates a phone number.
///
/// Empty input is allowed and clears the stored phone. Otherwise digits
/// with an optional leading `+`, spaces, dashes and parentheses; 7 to 15
/// digits in total.
///
/// ## Example
/// ```rust
/// use bookstore_core::validation::validate_phone;
///
/// assert!(validate_phone("+380 (44) 123-45-67").is_ok());
/// assert!(validate_phone("").is_ok());
/// assert!(validate_phone("call me").is_err());
/// ```
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    let phone = phone.trim();
    if phone.is_empty() {
        return Ok(());
    }

    let invalid = |reason: &str| ValidationError::InvalidFormat {
        field: "phone".to_string(),
        reason: reason.to_string(),
    };

    let body = phone.strip_prefix('+').unwrap_or(phone);
    if !body
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '(' | ')'))
    {
        return Err(invalid("only digits, spaces, dashes and parentheses"));
    }

    let digits = body.chars().filter(char::is_ascii_digit).count();
    if !(7..=15).contains(&digits) {
        return Err(invalid("must contain 7 to 15 digits"));
    }
    Ok(())
}

/// Validates all registration fields in form order.
pub fn validate_registration(info: &CustomerRegistrationInfo) -> ValidationResult<()> {
    validate_name("first_name", &info.first_name)?;
    validate_name("last_name", &info.last_name)?;
    validate_email(&info.email)?;
    validate_password(&info.password)
}

/// Validates a shipping address. Required after trimming.
pub fn validate_shipping_address(address: &str) -> ValidationResult<()> {
    required("shipping_address", address)?;
    max_chars("shipping_address", address.trim(), MAX_ADDRESS_LEN)
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a cart quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  $ storefront cart add 12 --qty 5                                       │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(5) ← THIS FUNCTION                                  │
/// │       │                                                                 │
/// │       ├── qty <= 0? → Error: "quantity must be positive"               │
/// │       │                                                                 │
/// │       ├── qty > 999? → Error: "quantity must be between 1 and 999"     │
/// │       │                                                                 │
/// │       └── OK → stock check, then upsert into cart_item                 │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: i32) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY as i64,
        });
    }

    Ok(())
}

/// Validates a review rating. 0 means "no rating" and is stored as NULL.
pub fn validate_rating(rating: i32) -> ValidationResult<()> {
    if !(0..=5).contains(&rating) {
        return Err(ValidationError::OutOfRange {
            field: "rating".to_string(),
            min: 0,
            max: 5,
        });
    }
    Ok(())
}

/// Validates a row id.
pub fn validate_id(field: &str, id: i32) -> ValidationResult<()> {
    if id <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Text Validators
// =============================================================================

/// Validates review text.
///
/// ## Returns
/// The trimmed text.
pub fn validate_comment_text(text: &str) -> ValidationResult<String> {
    let text = text.trim();
    required("comment", text)?;
    max_chars("comment", text, MAX_COMMENT_LEN)?;
    Ok(text.to_string())
}

/// Validates a search prefix.
///
/// ## Rules
/// - Can be empty (the search yields nothing)
/// - Maximum 100 characters
///
/// ## Returns
/// The trimmed prefix.
pub fn validate_search_prefix(prefix: &str) -> ValidationResult<String> {
    let prefix = prefix.trim();
    max_chars("query", prefix, MAX_PREFIX_LEN)?;
    Ok(prefix.to_string())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("a@b.co").is_ok());
        assert!(validate_email("  reader@example.com ").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign.com").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("a@@example.com").is_err());
        assert!(validate_email("a@.com").is_err());
        assert!(validate_email("a@example.").is_err());
        assert!(validate_email("a b@example.com").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("secret1").is_ok());
        assert_eq!(
            validate_password("12345"),
            Err(ValidationError::TooShort {
                field: "password".to_string(),
                min: 6
            })
        );
        assert!(validate_password("").is_err());
        assert!(validate_password(&"x".repeat(200)).is_err());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("first_name", "Lesya").is_ok());
        assert_eq!(
            validate_name("last_name", "  "),
            Err(ValidationError::required("last_name"))
        );
        assert!(validate_name("first_name", &"N".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("0441234567").is_ok());
        assert!(validate_phone("+380 44 123 45 67").is_ok());
        assert!(validate_phone("").is_ok());

        assert!(validate_phone("12345").is_err());
        assert!(validate_phone("+38O441234567").is_err());
    }

    #[test]
    fn test_validate_registration_reports_first_problem() {
        let info = CustomerRegistrationInfo {
            first_name: "Ivan".to_string(),
            last_name: "".to_string(),
            email: "bad".to_string(),
            password: "1".to_string(),
        };
        assert_eq!(
            validate_registration(&info),
            Err(ValidationError::required("last_name"))
        );
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_rating() {
        for rating in 0..=5 {
            assert!(validate_rating(rating).is_ok());
        }
        assert!(validate_rating(-1).is_err());
        assert!(validate_rating(6).is_err());
    }

    #[test]
    fn test_validate_comment_text() {
        assert_eq!(validate_comment_text("  Great book \n").unwrap(), "Great book");
        assert!(validate_comment_text("   ").is_err());
        assert!(validate_comment_text(&"a".repeat(2001)).is_err());
    }

    #[test]
    fn test_validate_search_prefix() {
        assert_eq!(validate_search_prefix(" har ").unwrap(), "har");
        assert_eq!(validate_search_prefix("").unwrap(), "");
        assert!(validate_search_prefix(&"q".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_id() {
        assert!(validate_id("book_id", 1).is_ok());
        assert!(validate_id("book_id", 0).is_err());
    }
}
