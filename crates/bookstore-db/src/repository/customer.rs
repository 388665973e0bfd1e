//! # Customer Repository
//!
//! Login lookup, registration, profile edits and loyalty points.
//!
//! ## Registration Flow
//! ```text
//! storefront register
//!      │
//!      ▼
//! validate_registration()  (bookstore-core)
//!      │
//!      ▼
//! argon2 hash              (storefront)
//!      │
//!      ▼
//! register(info, hash) ──► INSERT ... RETURNING customer_id
//!      │
//!      └── 23505 on customer_email_key ──► DbError::UniqueViolation { field: "email" }
//! ```
//!
//! Emails are stored and looked up lowercased.

use sqlx::PgPool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use bookstore_core::validation::{
    validate_email, validate_id, validate_name, validate_phone, validate_shipping_address,
};
use bookstore_core::{CustomerLoginInfo, CustomerProfileInfo, CustomerRegistrationInfo, ValidationError};

/// Repository for customer accounts.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: PgPool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: PgPool) -> Self {
        CustomerRepository { pool }
    }

    /// Id and password hash for an email. Empty email → `None`.
    pub async fn login_info(&self, email: &str) -> DbResult<Option<CustomerLoginInfo>> {
        let email = email.trim();
        if email.is_empty() {
            return Ok(None);
        }

        let info = sqlx::query_as::<_, CustomerLoginInfo>(
            "SELECT customer_id, password_hash FROM customer WHERE email = LOWER($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(info)
    }

    pub async fn profile(&self, customer_id: i32) -> DbResult<Option<CustomerProfileInfo>> {
        if customer_id <= 0 {
            return Ok(None);
        }

        let profile = sqlx::query_as::<_, CustomerProfileInfo>(
            r#"
            SELECT customer_id, first_name, last_name, email, phone, address,
                   join_date, loyalty_program, loyalty_points
            FROM customer
            WHERE customer_id = $1
            "#,
        )
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }

    /// Creates a customer account.
    ///
    /// `info.password` is ignored; the caller passes the finished hash.
    /// New accounts start outside the loyalty program with zero points.
    ///
    /// ## Returns
    /// The new customer id.
    ///
    /// ## Errors
    /// - Validation errors for blank names, a malformed email or an empty hash
    /// - `DbError::UniqueViolation { field: "email" }` for a taken email
    pub async fn register(&self, info: &CustomerRegistrationInfo, password_hash: &str) -> DbResult<i32> {
        validate_name("first_name", &info.first_name)?;
        validate_name("last_name", &info.last_name)?;
        validate_email(&info.email)?;
        if password_hash.is_empty() {
            return Err(ValidationError::required("password").into());
        }

        let email = info.email.trim().to_lowercase();

        let customer_id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO customer
                (first_name, last_name, email, password_hash,
                 join_date, loyalty_program, loyalty_points)
            VALUES ($1, $2, $3, $4, CURRENT_DATE, FALSE, 0)
            RETURNING customer_id
            "#,
        )
        .bind(info.first_name.trim())
        .bind(info.last_name.trim())
        .bind(&email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.is_unique_violation() {
                    return DbError::duplicate("email", email.clone());
                }
            }
            DbError::from(e)
        })?;

        info!(customer_id, "Customer registered");
        Ok(customer_id)
    }

    /// Both names are required.
    pub async fn update_name(&self, customer_id: i32, first_name: &str, last_name: &str) -> DbResult<()> {
        validate_id("customer_id", customer_id)?;
        validate_name("first_name", first_name)?;
        validate_name("last_name", last_name)?;

        let result = sqlx::query(
            "UPDATE customer SET first_name = $1, last_name = $2 WHERE customer_id = $3",
        )
        .bind(first_name.trim())
        .bind(last_name.trim())
        .bind(customer_id)
        .execute(&self.pool)
        .await?;

        self.ensure_updated(customer_id, result.rows_affected()).await?;
        debug!(customer_id, "Customer name updated");
        Ok(())
    }

    /// An empty phone clears the stored value.
    pub async fn update_phone(&self, customer_id: i32, phone: &str) -> DbResult<()> {
        validate_id("customer_id", customer_id)?;
        validate_phone(phone)?;

        let result = sqlx::query("UPDATE customer SET phone = $1 WHERE customer_id = $2")
            .bind(non_empty(phone))
            .bind(customer_id)
            .execute(&self.pool)
            .await?;

        self.ensure_updated(customer_id, result.rows_affected()).await?;
        debug!(customer_id, "Customer phone updated");
        Ok(())
    }

    /// An empty address clears the stored value.
    pub async fn update_address(&self, customer_id: i32, address: &str) -> DbResult<()> {
        validate_id("customer_id", customer_id)?;
        if !address.trim().is_empty() {
            validate_shipping_address(address)?;
        }

        let result = sqlx::query("UPDATE customer SET address = $1 WHERE customer_id = $2")
            .bind(non_empty(address))
            .bind(customer_id)
            .execute(&self.pool)
            .await?;

        self.ensure_updated(customer_id, result.rows_affected()).await?;
        debug!(customer_id, "Customer address updated");
        Ok(())
    }

    /// Adds points and enrolls the customer in the loyalty program.
    ///
    /// ## Returns
    /// The new point balance.
    pub async fn add_loyalty_points(&self, customer_id: i32, points: i32) -> DbResult<i32> {
        validate_id("customer_id", customer_id)?;
        if points <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "points".to_string(),
            }
            .into());
        }

        let balance = sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE customer
            SET loyalty_points = loyalty_points + $1, loyalty_program = TRUE
            WHERE customer_id = $2
            RETURNING loyalty_points
            "#,
        )
        .bind(points)
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Customer", customer_id))?;

        info!(customer_id, points, balance, "Loyalty points added");
        Ok(balance)
    }

    /// Zero affected rows is fine for an existing customer, `NotFound` otherwise.
    async fn ensure_updated(&self, customer_id: i32, rows_affected: u64) -> DbResult<()> {
        if rows_affected > 0 {
            return Ok(());
        }

        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM customer WHERE customer_id = $1)",
        )
        .bind(customer_id)
        .fetch_one(&self.pool)
        .await?;

        if exists {
            Ok(())
        } else {
            Err(DbError::not_found("Customer", customer_id))
        }
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}

// =============================================================================
// Unit Tests
// =============================================================================
