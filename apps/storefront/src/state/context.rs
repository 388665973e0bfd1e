//! # Storefront Context
//!
//! Database handle, configuration and login session for one command.

use tracing::info;

use bookstore_db::Database;

use crate::error::{ApiError, ApiResult};
use crate::state::{SessionStore, StorefrontConfig};

#[derive(Debug)]
pub struct Storefront {
    db: Database,
    config: StorefrontConfig,
    session: SessionStore,
}

impl Storefront {
    /// Connects to the configured database (running migrations) and wraps it
    /// with the config and session.
    pub async fn connect(config: StorefrontConfig, session: SessionStore) -> ApiResult<Self> {
        let db_config = config.db_config()?;
        info!(database = %db_config.display_target(), "Connecting to database");
        let db = Database::new(db_config).await.map_err(ApiError::from)?;
        Ok(Storefront::new(db, config, session))
    }

    pub fn new(db: Database, config: StorefrontConfig, session: SessionStore) -> Self {
        Storefront { db, config, session }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &StorefrontConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionStore {
        &mut self.session
    }

    /// The logged-in customer id, or `Unauthorized`.
    pub fn require_customer(&self) -> ApiResult<i32> {
        self.session.require_customer()
    }
}
