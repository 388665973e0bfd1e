//! # API Error Type
//!
//! Unified error type for storefront commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Storefront                         │
//! │                                                                         │
//! │  storefront cart add 42                                                 │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Command Function                                                │  │
//! │  │  Result<T, ApiError>                                             │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Database Error? ─── DbError::QueryFailed("...") ──┐            │  │
//! │  │         │                                          │            │  │
//! │  │         ▼                                          ▼            │  │
//! │  │  Rule Error? ─── CoreError::InsufficientStock ─── ApiError ────►│  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Success ──────────────────────────────────────────────────────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  stderr: "Error: Only 2 copies of 'Kobzar' in stock, 5 requested"      │
//! │  --json: {"code":"INSUFFICIENT_STOCK","message":"..."}  (exit code 5)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Internal details (SQL errors, pool problems) are logged and replaced by a
//! generic message.

use serde::Serialize;
use thiserror::Error;

use bookstore_core::{CoreError, ValidationError};
use bookstore_db::DbError;

/// API error returned from storefront commands.
///
/// ## Serialization
/// This is what `--json` prints when a command fails:
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Book not found: 42"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Error)]
#[serde(rename_all = "camelCase")]
#[error("[{code:?}] {message}")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for command failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found
    NotFound,

    /// Input validation failed
    ValidationError,

    /// Value already taken (email, second review)
    Conflict,

    /// Database operation failed
    DatabaseError,

    /// Internal error
    Internal,

    /// Cart operation failed
    CartError,

    /// Insufficient stock
    InsufficientStock,

    /// No customer logged in, or wrong credentials
    Unauthorized,

    /// Config file or environment could not be read
    ConfigError,
}

impl ErrorCode {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            ErrorCode::ValidationError | ErrorCode::ConfigError => 2,
            ErrorCode::Unauthorized => 3,
            ErrorCode::NotFound => 4,
            ErrorCode::Conflict
            | ErrorCode::CartError
            | ErrorCode::InsufficientStock => 5,
            ErrorCode::DatabaseError | ErrorCode::Internal => 1,
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: impl std::fmt::Display) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    /// Creates a cart error.
    pub fn cart(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::CartError, message)
    }

    /// The command needs a logged-in customer.
    pub fn unauthorized() -> Self {
        ApiError::new(ErrorCode::Unauthorized, "Not logged in. Run `storefront login` first")
    }

    pub fn config(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ConfigError, message)
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::Conflict,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::Rule(e) => ApiError::from(e),
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Migration failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database transaction failed")
            }
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::new(ErrorCode::ValidationError, "Invalid reference")
            }
            DbError::CheckViolation { message } => {
                tracing::error!("Check violation: {}", message);
                ApiError::new(ErrorCode::ValidationError, "Value rejected by the database")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InsufficientStock {
                title,
                available,
                requested,
                ..
            } => ApiError::new(
                ErrorCode::InsufficientStock,
                format!(
                    "Only {} copies of '{}' in stock, {} requested",
                    available, title, requested
                ),
            ),
            CoreError::EmptyCart => ApiError::cart("Cart is empty"),
            e @ CoreError::InvalidCredentials { .. } => {
                ApiError::new(ErrorCode::Unauthorized, e.to_string())
            }
            e @ CoreError::TooManyLoginAttempts { .. } => ApiError::new(
                ErrorCode::Unauthorized,
                format!("{}. Run `storefront logout` to reset", e),
            ),
            e @ CoreError::AlreadyCommented { .. } => {
                ApiError::new(ErrorCode::Conflict, e.to_string())
            }
            CoreError::Validation(e) => ApiError::from(e),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_error_message() {
        let err = ApiError::from(CoreError::InsufficientStock {
            book_id: 1,
            title: "Kobzar".to_string(),
            available: 2,
            requested: 5,
        });
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(err.message, "Only 2 copies of 'Kobzar' in stock, 5 requested");
    }

    #[test]
    fn test_db_rule_unwraps_to_core_mapping() {
        let err = ApiError::from(DbError::Rule(CoreError::EmptyCart));
        assert_eq!(err.code, ErrorCode::CartError);

        let err = ApiError::from(DbError::from(ValidationError::required("email")));
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.message, "email is required");
    }

    #[test]
    fn test_internal_details_hidden() {
        let err = ApiError::from(DbError::QueryFailed("syntax error at or near".into()));
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(!err.message.contains("syntax"));
    }

    #[test]
    fn test_duplicate_is_conflict() {
        let err = ApiError::from(DbError::duplicate("email", "a@b.ua"));
        assert_eq!(err.code, ErrorCode::Conflict);
        assert_eq!(err.code.exit_code(), 5);
    }

    #[test]
    fn test_display_includes_code() {
        let err = ApiError::not_found("Book", 42);
        assert_eq!(err.to_string(), "[NotFound] Book not found: 42");
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_string(&ApiError::unauthorized()).unwrap();
        assert!(json.starts_with(r#"{"code":"UNAUTHORIZED","message":"#));
    }
}
