//! # Authentication Commands
//!
//! ## Login Flow
//! ```text
//! storefront login -e reader@example.com -p ******
//!      │
//!      ▼
//! session.is_locked(email)? ──yes──► TooManyLoginAttempts
//!      │ no
//!      ▼
//! customers().login_info(email)
//!      │
//!      ├── unknown email ─────┐
//!      ▼                      │
//! argon2 verify_password      │
//!      ├── mismatch ──────────┴──► record_failure ──► InvalidCredentials { remaining }
//!      ▼
//! session.login(customer_id) ──► saved to the session file
//! ```
//!
//! An unknown email and a wrong password produce the same error.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use serde::Serialize;
use tracing::{info, warn};

use bookstore_core::validation::validate_registration;
use bookstore_core::{CoreError, CustomerProfileInfo, CustomerRegistrationInfo};

use crate::error::{ApiError, ApiResult};
use crate::render::{Render, Text};
use crate::state::{SessionStore, Storefront, StorefrontConfig};

/// Hashes a password with Argon2id and a random salt.
pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::internal(format!("Failed to hash password: {}", e)))
}

/// Checks a password against a stored hash. A malformed hash never matches.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Result of `register`, `login` and `whoami`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthStatus {
    pub logged_in: bool,
    pub customer: Option<CustomerProfileInfo>,
    pub message: String,
}

impl Render for AuthStatus {
    fn render(&self, _config: &StorefrontConfig, out: &mut Text) {
        out.line(&self.message);
        if let Some(c) = &self.customer {
            out.line(format!("  #{}  {} <{}>", c.customer_id, c.full_name(), c.email));
            if c.loyalty_program {
                out.line(format!("  Loyalty points: {}", c.loyalty_points));
            }
        }
    }
}

/// `register`: creates the account and logs it in.
pub async fn register(sf: &mut Storefront, info: CustomerRegistrationInfo) -> ApiResult<AuthStatus> {
    validate_registration(&info)?;
    let hash = hash_password(&info.password)?;

    let customer_id = sf.db().customers().register(&info, &hash).await?;

    let session = sf.session_mut();
    session.login(customer_id, &info.email);
    session.save()?;

    info!(customer_id, "Registered and logged in");
    let customer = sf.db().customers().profile(customer_id).await?;
    Ok(AuthStatus {
        logged_in: true,
        customer,
        message: "Registration successful. You are logged in.".to_string(),
    })
}

/// `login`.
pub async fn login(sf: &mut Storefront, email: &str, password: &str) -> ApiResult<AuthStatus> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(ApiError::validation("email and password are required"));
    }
    if sf.session().is_locked(email) {
        warn!("Login refused: attempt limit reached");
        return Err(CoreError::TooManyLoginAttempts {
            email: email.to_lowercase(),
        }
        .into());
    }

    let login = sf.db().customers().login_info(email).await?;
    let customer_id = match login {
        Some(login) if verify_password(password, &login.password_hash) => login.customer_id,
        _ => {
            let session = sf.session_mut();
            let remaining = session.record_failure(email);
            session.save()?;
            warn!(remaining, "Login failed");
            return Err(CoreError::InvalidCredentials { remaining }.into());
        }
    };

    let session = sf.session_mut();
    session.login(customer_id, email);
    session.save()?;

    info!(customer_id, "Logged in");
    let customer = sf.db().customers().profile(customer_id).await?;
    let name = customer.as_ref().map(|c| c.first_name.clone()).unwrap_or_default();
    Ok(AuthStatus {
        logged_in: true,
        customer,
        message: format!("Welcome, {}!", name),
    })
}

/// `logout`: forgets the customer and resets failed attempts. Works without
/// a database connection.
pub fn logout(session: &mut SessionStore) -> ApiResult<AuthStatus> {
    let was_logged_in = session.customer_id().is_some();
    session.logout();
    session.save()?;

    Ok(AuthStatus {
        logged_in: false,
        customer: None,
        message: if was_logged_in {
            "Logged out.".to_string()
        } else {
            "Not logged in.".to_string()
        },
    })
}

/// `whoami`. A session pointing at a deleted customer reads as logged out.
pub async fn whoami(sf: &Storefront) -> ApiResult<AuthStatus> {
    let Some(customer_id) = sf.session().customer_id() else {
        return Ok(AuthStatus {
            logged_in: false,
            customer: None,
            message: "Not logged in.".to_string(),
        });
    };

    let customer = sf.db().customers().profile(customer_id).await?;
    let message = if customer.is_some() {
        "Logged in as:".to_string()
    } else {
        "Session refers to a missing customer. Log in again.".to_string()
    };
    Ok(AuthStatus {
        logged_in: customer.is_some(),
        customer,
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("secret123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("secret123", &hash));
        assert!(!verify_password("Secret123", &hash));
    }

    #[test]
    fn test_same_password_different_hashes() {
        let a = hash_password("secret123").unwrap();
        let b = hash_password("secret123").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_hash_never_matches() {
        assert!(!verify_password("anything", "!locked"));
        assert!(!verify_password("", ""));
    }
}
