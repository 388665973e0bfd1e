//! # Bookstore Storefront
//!
//! Command-line storefront for the bookstore: browse the catalogue, manage a
//! cart, check out and review books against a PostgreSQL database.
//!
//! ## Module Organization
//! ```text
//! bookstore_storefront/
//! ├── lib.rs          ◄─── You are here (tracing setup & dispatch)
//! ├── cli.rs          ◄─── clap command definitions
//! ├── render.rs       ◄─── Text / JSON output
//! ├── state/
//! │   ├── config.rs   ◄─── storefront.toml + env overrides
//! │   ├── session.rs  ◄─── Logged-in customer, login attempt limit
//! │   └── context.rs  ◄─── Storefront (db + config + session)
//! ├── commands/       ◄─── One module per area of the shop
//! └── error.rs        ◄─── ApiError with stable codes and exit codes
//! ```
//!
//! ## One Invocation
//! ```text
//! Cli::parse ──► init_tracing ──► StorefrontConfig::load ──► SessionStore::load
//!                                                                 │
//!                      logout? ── yes ──► session only, no database
//!                                                                 │ no
//!                                                                 ▼
//!                      Storefront::connect (pool + migrations) ──► dispatch ──► render::print
//! ```

pub mod cli;
pub mod commands;
pub mod error;
pub mod render;
pub mod state;

#[cfg(test)]
mod test_support;

use tracing::debug;
use tracing_subscriber::EnvFilter;

use bookstore_core::CustomerRegistrationInfo;

use cli::{AuthorsAction, BooksAction, CartAction, Cli, Commands, CommentsAction, DbAction, OrdersAction, ProfileAction};
use commands::{admin, auth, authors, books, cart, checkout, comments, orders, profile, search};
use error::ApiResult;
use state::{SessionStore, Storefront, StorefrontConfig};

/// Default log filter when neither `--log-level` nor `RUST_LOG` is set.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Initializes the tracing subscriber. Logs go to stderr so command output
/// on stdout stays clean.
///
/// ## Log Levels
/// - Default: warnings only, so stderr stays quiet for normal use
/// - `--log-level info` - Show orders, registrations and migrations
/// - `--log-level debug` or `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=bookstore_db=trace` - Trace the database crate only
pub fn init_tracing(log_level: Option<&str>) -> anyhow::Result<()> {
    let filter = match log_level {
        Some(level) => EnvFilter::try_new(level)?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
}

/// Runs one command.
pub async fn run(cli: Cli) -> ApiResult<()> {
    let mut config = StorefrontConfig::load(cli.config.as_deref())?;
    if let Some(url) = cli.database_url {
        config.database.url = Some(url);
    }
    let mut session = SessionStore::load(SessionStore::default_path()?);
    debug!(session = ?session.path(), "Session file");

    if let Commands::Logout = cli.command {
        let status = auth::logout(&mut session)?;
        return render::print(&status, &config, cli.json);
    }

    let mut sf = Storefront::connect(config, session).await?;
    let result = dispatch(&mut sf, cli.command, cli.json).await;
    sf.db().close().await;
    result
}

async fn dispatch(sf: &mut Storefront, command: Commands, json: bool) -> ApiResult<()> {
    macro_rules! emit {
        ($value:expr) => {{
            let value = $value;
            render::print(&value, sf.config(), json)
        }};
    }

    match command {
        Commands::Books { action } => match action {
            BooksAction::List { page } => emit!(books::list(sf, page).await?),
            BooksAction::Show { id } => emit!(books::show(sf, id).await?),
            BooksAction::Genre { genre, limit } => emit!(books::by_genre(sf, &genre, limit).await?),
            BooksAction::Filter {
                genres,
                languages,
                min_price,
                max_price,
                in_stock,
            } => emit!(
                books::filter(
                    sf,
                    books::FilterArgs {
                        genres,
                        languages,
                        min_price,
                        max_price,
                        in_stock,
                    },
                )
                .await?
            ),
            BooksAction::Genres => emit!(books::genres(sf).await?),
            BooksAction::Languages => emit!(books::languages(sf).await?),
        },

        Commands::Authors { action } => match action {
            AuthorsAction::List => emit!(authors::list(sf).await?),
            AuthorsAction::Show { id } => emit!(authors::show(sf, id).await?),
        },

        Commands::Search { prefix, limit } => emit!(search::suggest(sf, &prefix, limit).await?),

        Commands::Register {
            first_name,
            last_name,
            email,
            password,
        } => {
            let info = CustomerRegistrationInfo {
                first_name,
                last_name,
                email,
                password,
            };
            emit!(auth::register(sf, info).await?)
        }
        Commands::Login { email, password } => emit!(auth::login(sf, &email, &password).await?),
        Commands::Logout => emit!(auth::logout(sf.session_mut())?),
        Commands::Whoami => emit!(auth::whoami(sf).await?),

        Commands::Profile { action } => match action {
            ProfileAction::Show => emit!(profile::show(sf).await?),
            ProfileAction::SetName { first_name, last_name } => {
                emit!(profile::set_name(sf, &first_name, &last_name).await?)
            }
            ProfileAction::SetPhone { phone } => emit!(profile::set_phone(sf, &phone).await?),
            ProfileAction::SetAddress { address } => emit!(profile::set_address(sf, &address).await?),
        },

        Commands::Cart { action } => match action {
            CartAction::Show => emit!(cart::show(sf).await?),
            CartAction::Add { book_id, qty } => emit!(cart::add(sf, book_id, qty).await?),
            CartAction::Set { book_id, qty } => emit!(cart::set(sf, book_id, qty).await?),
            CartAction::Remove { book_id } => emit!(cart::remove(sf, book_id).await?),
            CartAction::Clear => emit!(cart::clear(sf).await?),
        },

        Commands::Checkout { address, payment } => emit!(checkout::place_order(sf, address, payment).await?),

        Commands::Orders { action } => match action {
            OrdersAction::List => emit!(orders::list(sf).await?),
            OrdersAction::Show { id } => emit!(orders::show(sf, id).await?),
        },

        Commands::Comments { action } => match action {
            CommentsAction::List { book_id } => emit!(comments::list(sf, book_id).await?),
            CommentsAction::Add { book_id, text, rating } => {
                emit!(comments::add(sf, book_id, &text, rating).await?)
            }
        },

        Commands::Db { action } => match action {
            DbAction::Migrate => emit!(admin::migrate(sf).await?),
            DbAction::Reset { yes } => emit!(admin::reset(sf, yes).await?),
            DbAction::Stats => emit!(admin::stats(sf).await?),
            DbAction::SetStatus {
                order_id,
                status,
                tracking,
            } => emit!(admin::set_status(sf, order_id, &status, tracking.as_deref()).await?),
        },
    }
}
