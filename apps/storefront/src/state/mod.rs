//! # State Module
//!
//! Everything a command needs besides its own arguments.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  main ──► StorefrontConfig::load ──► SessionStore::load                 │
//! │                    │                        │                           │
//! │                    ▼                        ▼                           │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                        Storefront                               │   │
//! │  │  ┌──────────────┐  ┌──────────────────┐  ┌──────────────────┐   │   │
//! │  │  │   Database   │  │ StorefrontConfig │  │  SessionStore    │   │   │
//! │  │  │   (PgPool)   │  │ (read-only)      │  │  (JSON file)     │   │   │
//! │  │  └──────────────┘  └──────────────────┘  └──────────────────┘   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  One process runs one command, so nothing here needs a lock.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod context;
mod session;

pub use config::{DatabaseSettings, DisplaySettings, StorefrontConfig, CONFIG_FILE_NAME};
pub use context::Storefront;
pub use session::{Session, SessionStore, SESSION_PATH_ENV};
