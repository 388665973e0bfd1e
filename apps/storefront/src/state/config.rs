//! # Storefront Configuration
//!
//! Settings loaded once at startup.
//!
//! ## Configuration Sources (later overrides earlier)
//! 1. Defaults (this file)
//! 2. Config file (`storefront.toml`, or the `--config` path)
//! 3. Environment variables (`BOOKSTORE_*`)
//! 4. Command-line flags (applied by the caller)
//!
//! ## Example `storefront.toml`
//! ```toml
//! [database]
//! host = "db.internal"
//! name = "bookstore"
//! user = "shop"
//!
//! [display]
//! page_size = 30
//! currency_symbol = "грн"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use bookstore_db::DbConfig;

use crate::error::{ApiError, ApiResult};

pub const CONFIG_FILE_NAME: &str = "storefront.toml";

/// Largest accepted `display.page_size`.
pub const MAX_PAGE_SIZE: i64 = 500;

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorefrontConfig {
    pub database: DatabaseSettings,
    pub display: DisplaySettings,
}

/// Where to connect. `url` wins over the individual fields when set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    /// Same values the connection dialog used to pre-fill.
    fn default() -> Self {
        DatabaseSettings {
            url: None,
            host: "localhost".to_string(),
            port: 5432,
            name: "bookstore".to_string(),
            user: "postgres".to_string(),
            password: String::new(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    /// Books per catalogue page.
    pub page_size: i64,

    /// Currency symbol (for display)
    pub currency_symbol: String,

    /// Print the symbol after the amount ("12.50 грн") instead of before.
    pub symbol_after: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        DisplaySettings {
            page_size: 20,
            currency_symbol: "грн".to_string(),
            symbol_after: true,
        }
    }
}

impl StorefrontConfig {
    /// Loads configuration from file and environment on top of defaults.
    ///
    /// A missing file is not an error. A file that exists but cannot be
    /// parsed is.
    pub fn load(config_path: Option<&Path>) -> ApiResult<Self> {
        let mut config = match config_path.map(Path::to_path_buf).or_else(Self::default_config_path) {
            Some(path) if path.exists() => {
                info!(?path, "Loading storefront config from file");
                Self::from_file(&path)?
            }
            Some(path) => {
                debug!(?path, "Config file not found, using defaults");
                StorefrontConfig::default()
            }
            None => StorefrontConfig::default(),
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> ApiResult<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ApiError::config(format!("Cannot read {}: {}", path.display(), e)))?;
        toml::from_str(&contents)
            .map_err(|e| ApiError::config(format!("Invalid config {}: {}", path.display(), e)))
    }

    /// Applies environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from any key lookup. Unparseable numbers are ignored.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("BOOKSTORE_DATABASE_URL") {
            debug!("Overriding database URL from environment");
            self.database.url = Some(url);
        }
        if let Some(host) = lookup("BOOKSTORE_DB_HOST") {
            self.database.host = host;
        }
        if let Some(port) = lookup("BOOKSTORE_DB_PORT").and_then(|p| p.parse().ok()) {
            self.database.port = port;
        }
        if let Some(name) = lookup("BOOKSTORE_DB_NAME") {
            self.database.name = name;
        }
        if let Some(user) = lookup("BOOKSTORE_DB_USER") {
            self.database.user = user;
        }
        if let Some(password) = lookup("BOOKSTORE_DB_PASSWORD") {
            self.database.password = password;
        }
        if let Some(size) = lookup("BOOKSTORE_PAGE_SIZE").and_then(|s| s.parse().ok()) {
            self.display.page_size = size;
        }
        if let Some(symbol) = lookup("BOOKSTORE_CURRENCY_SYMBOL") {
            self.display.currency_symbol = symbol;
        }
    }

    pub fn validate(&self) -> ApiResult<()> {
        if !(1..=MAX_PAGE_SIZE).contains(&self.display.page_size) {
            return Err(ApiError::config(format!(
                "display.page_size must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }
        if self.database.max_connections == 0 {
            return Err(ApiError::config("database.max_connections must be greater than 0"));
        }
        if self.database.url.is_none() && self.database.host.trim().is_empty() {
            return Err(ApiError::config("database.host is required"));
        }
        Ok(())
    }

    /// Builds the pool configuration.
    pub fn db_config(&self) -> ApiResult<DbConfig> {
        let db = &self.database;
        let config = match &db.url {
            Some(url) => DbConfig::from_url(url)
                .map_err(|e| ApiError::config(format!("Invalid database URL: {}", e)))?,
            None => DbConfig::new(&db.host, db.port, &db.name, &db.user, &db.password),
        };
        Ok(config.max_connections(db.max_connections))
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("ua", "bookstore", "storefront")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Formats a cent amount as a currency string.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let config = StorefrontConfig::default();
    /// assert_eq!(config.format_currency(1234), "12.34 грн");
    /// ```
    pub fn format_currency(&self, cents: i64) -> String {
        let sign = if cents < 0 { "-" } else { "" };
        let amount = format!("{}{}.{:02}", sign, (cents / 100).abs(), (cents % 100).abs());
        let symbol = &self.display.currency_symbol;

        if symbol.is_empty() {
            amount
        } else if self.display.symbol_after {
            format!("{} {}", amount, symbol)
        } else {
            format!("{}{}", symbol, amount)
        }
    }
}
