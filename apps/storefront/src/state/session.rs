//! # Login Session
//!
//! Who is logged in, persisted between invocations as a small JSON file.
//!
//! ## Login Attempt Limit
//! ```text
//! login(email, wrong password)
//!      │
//!      ▼
//! failed_logins[email] += 1 ──► "Invalid email or password (N attempts left)"
//!      │
//!      ▼  after MAX_LOGIN_ATTEMPTS failures
//! TooManyLoginAttempts  ──► refused until a successful login or `logout`
//! ```
//!
//! The file lives in the platform data dir unless `BOOKSTORE_SESSION_PATH`
//! points elsewhere.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use bookstore_core::MAX_LOGIN_ATTEMPTS;

use crate::error::{ApiError, ApiResult};

pub const SESSION_PATH_ENV: &str = "BOOKSTORE_SESSION_PATH";
const SESSION_FILE_NAME: &str = "session.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Session {
    pub customer_id: Option<i32>,
    pub email: Option<String>,
    /// Consecutive failures per lowercased email.
    pub failed_logins: HashMap<String, u32>,
}

/// A [`Session`] bound to the file it was loaded from.
#[derive(Debug)]
pub struct SessionStore {
    path: PathBuf,
    session: Session,
}

impl SessionStore {
    /// Loads the session at `path`. A missing or unreadable file yields an
    /// empty session.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let session = match std::fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                warn!(?path, error = %e, "Discarding unreadable session file");
                Session::default()
            }),
            Err(_) => Session::default(),
        };
        debug!(?path, logged_in = session.customer_id.is_some(), "Session loaded");
        SessionStore { path, session }
    }

    /// Session path from `BOOKSTORE_SESSION_PATH` or the platform data dir.
    pub fn default_path() -> ApiResult<PathBuf> {
        if let Ok(path) = std::env::var(SESSION_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }
        let dirs = directories::ProjectDirs::from("ua", "bookstore", "storefront")
            .ok_or_else(|| ApiError::config("Could not determine app data directory"))?;
        Ok(dirs.data_dir().join(SESSION_FILE_NAME))
    }

    pub fn save(&self) -> ApiResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ApiError::internal(format!("Cannot create {}: {}", parent.display(), e)))?;
        }
        let contents = serde_json::to_string_pretty(&self.session)
            .map_err(|e| ApiError::internal(e.to_string()))?;
        std::fs::write(&self.path, contents)
            .map_err(|e| ApiError::internal(format!("Cannot write {}: {}", self.path.display(), e)))?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn customer_id(&self) -> Option<i32> {
        self.session.customer_id
    }

    /// The logged-in customer, or `Unauthorized`.
    pub fn require_customer(&self) -> ApiResult<i32> {
        self.session.customer_id.ok_or_else(ApiError::unauthorized)
    }

    /// Failed attempts recorded for `email`.
    pub fn failures(&self, email: &str) -> u32 {
        self.session
            .failed_logins
            .get(&email_key(email))
            .copied()
            .unwrap_or(0)
    }

    /// True once `email` has used up its attempts.
    pub fn is_locked(&self, email: &str) -> bool {
        self.failures(email) >= MAX_LOGIN_ATTEMPTS
    }

    /// Records a failed login. Returns the attempts left.
    pub fn record_failure(&mut self, email: &str) -> u32 {
        let count = self.session.failed_logins.entry(email_key(email)).or_insert(0);
        *count += 1;
        MAX_LOGIN_ATTEMPTS.saturating_sub(*count)
    }

    /// Marks `customer_id` as logged in and resets the failures for `email`.
    pub fn login(&mut self, customer_id: i32, email: &str) {
        self.session.failed_logins.remove(&email_key(email));
        self.session.customer_id = Some(customer_id);
        self.session.email = Some(email_key(email));
    }

    /// Forgets the customer and every recorded failure.
    pub fn logout(&mut self) {
        self.session = Session::default();
    }
}

fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("bookstore-session-{}", uuid::Uuid::new_v4()))
            .join(SESSION_FILE_NAME)
    }

    #[test]
    fn test_missing_file_is_empty_session() {
        let store = SessionStore::load(temp_path());
        assert_eq!(store.customer_id(), None);
        assert!(store.require_customer().is_err());
    }

    #[test]
    fn test_login_persists() {
        let path = temp_path();
        let mut store = SessionStore::load(&path);
        store.login(7, " Reader@Example.COM ");
        store.save().unwrap();

        let reloaded = SessionStore::load(&path);
        assert_eq!(reloaded.require_customer().unwrap(), 7);
        assert_eq!(reloaded.session().email.as_deref(), Some("reader@example.com"));
    }

    #[test]
    fn test_attempt_limit() {
        let mut store = SessionStore::load(temp_path());
        let email = "a@b.ua";

        for expected_left in (0..MAX_LOGIN_ATTEMPTS).rev() {
            assert!(!store.is_locked(email));
            assert_eq!(store.record_failure(email), expected_left);
        }
        assert!(store.is_locked("A@B.UA"));
        assert!(!store.is_locked("other@b.ua"));

        // Success resets this email only
        store.record_failure("other@b.ua");
        store.login(1, email);
        assert_eq!(store.failures(email), 0);
        assert_eq!(store.failures("other@b.ua"), 1);

        store.logout();
        assert_eq!(store.failures("other@b.ua"), 0);
        assert_eq!(store.customer_id(), None);
    }

    #[test]
    fn test_corrupt_file_is_discarded() {
        let path = temp_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(SessionStore::load(&path).session(), &Session::default());
    }
}
