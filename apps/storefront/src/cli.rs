//! Command-line definition.
//!
//! ```bash
//! storefront books list --page 2
//! storefront books filter --genre Poetry --genre Drama --max-price 250 --in-stock
//! storefront login -e reader@example.com
//! storefront cart add 12 --qty 2
//! storefront checkout --address "Kyiv, Khreshchatyk 1" --payment card
//! storefront --json orders list
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use bookstore_core::{PaymentMethod, DEFAULT_GENRE_LIMIT, DEFAULT_SUGGESTION_LIMIT};

#[derive(Debug, Parser)]
#[command(name = "storefront")]
#[command(author, version, about = "Bookstore storefront")]
pub struct Cli {
    /// Config file (default: storefront.toml in the platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// PostgreSQL URL, overrides the config file and BOOKSTORE_DATABASE_URL
    #[arg(long, global = true)]
    pub database_url: Option<String>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Log filter, e.g. `debug` or `bookstore_db=trace` (overrides RUST_LOG)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Browse the catalogue
    Books {
        #[command(subcommand)]
        action: BooksAction,
    },
    /// Browse authors
    Authors {
        #[command(subcommand)]
        action: AuthorsAction,
    },
    /// Suggest books and authors for a prefix
    Search {
        prefix: String,

        #[arg(short, long, default_value_t = DEFAULT_SUGGESTION_LIMIT)]
        limit: i64,
    },
    /// Create a customer account and log in
    Register {
        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "BOOKSTORE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Log in
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "BOOKSTORE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Log out and reset failed login attempts
    Logout,
    /// Show who is logged in
    Whoami,
    /// View or edit your profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
    /// Manage your cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Place an order for everything in the cart
    Checkout {
        /// Shipping address (default: the address in your profile)
        #[arg(short, long)]
        address: Option<String>,

        /// `cash` (on delivery) or `card`
        #[arg(short, long)]
        payment: Option<PaymentMethod>,
    },
    /// Your order history
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
    /// Book reviews
    Comments {
        #[command(subcommand)]
        action: CommentsAction,
    },
    /// Schema management and diagnostics
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum BooksAction {
    /// One page of the catalogue, ordered by title
    List {
        #[arg(short, long, default_value_t = 1)]
        page: i64,
    },
    /// Book details with reviews and similar books
    Show { id: i32 },
    /// Books of one genre
    Genre {
        genre: String,

        #[arg(short, long, default_value_t = DEFAULT_GENRE_LIMIT)]
        limit: i64,
    },
    /// Filter by genre, language, price and stock
    Filter {
        /// Repeat to allow several genres
        #[arg(long = "genre")]
        genres: Vec<String>,

        /// Repeat to allow several languages
        #[arg(long = "language")]
        languages: Vec<String>,

        #[arg(long)]
        min_price: Option<String>,

        #[arg(long)]
        max_price: Option<String>,

        #[arg(long)]
        in_stock: bool,
    },
    /// Genres available for filtering
    Genres,
    /// Languages available for filtering
    Languages,
}

#[derive(Debug, Subcommand)]
pub enum AuthorsAction {
    List,
    Show { id: i32 },
}

#[derive(Debug, Subcommand)]
pub enum ProfileAction {
    Show,
    SetName {
        first_name: String,
        last_name: String,
    },
    /// An empty value clears the phone
    SetPhone { phone: String },
    /// An empty value clears the address
    SetAddress { address: String },
}

#[derive(Debug, Subcommand)]
pub enum CartAction {
    /// Show the cart, fixing items that ran out of stock
    Show,
    /// Add copies of a book
    Add {
        book_id: i32,

        #[arg(short, long, default_value_t = 1)]
        qty: i32,
    },
    /// Set the quantity of a book (0 removes it)
    Set { book_id: i32, qty: i32 },
    Remove { book_id: i32 },
    Clear,
}

#[derive(Debug, Subcommand)]
pub enum OrdersAction {
    List,
    Show { id: i32 },
}

#[derive(Debug, Subcommand)]
pub enum CommentsAction {
    List {
        book_id: i32,
    },
    Add {
        book_id: i32,
        text: String,

        /// 1-5 stars, 0 for none
        #[arg(short, long, default_value_t = 0)]
        rating: i32,
    },
}

#[derive(Debug, Subcommand)]
pub enum DbAction {
    /// Apply pending migrations
    Migrate,
    /// Drop every table and recreate the schema
    Reset {
        /// Required: all data is lost
        #[arg(long)]
        yes: bool,
    },
    /// Row counts per table
    Stats,
    /// Append a status to an order
    SetStatus {
        order_id: i32,
        status: String,

        #[arg(long)]
        tracking: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_books_filter() {
        let cli = Cli::try_parse_from([
            "storefront", "books", "filter", "--genre", "Poetry", "--genre", "Drama",
            "--max-price", "250", "--in-stock",
        ])
        .unwrap();

        match cli.command {
            Commands::Books {
                action:
                    BooksAction::Filter {
                        genres,
                        languages,
                        min_price,
                        max_price,
                        in_stock,
                    },
            } => {
                assert_eq!(genres, vec!["Poetry", "Drama"]);
                assert!(languages.is_empty());
                assert_eq!(min_price, None);
                assert_eq!(max_price.as_deref(), Some("250"));
                assert!(in_stock);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["storefront", "orders", "list", "--json"]).unwrap();
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Orders { action: OrdersAction::List }));
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["storefront", "cart", "add", "12"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Cart { action: CartAction::Add { book_id: 12, qty: 1 } }
        ));

        let cli = Cli::try_parse_from(["storefront", "search", "Sh"]).unwrap();
        assert!(matches!(cli.command, Commands::Search { limit: DEFAULT_SUGGESTION_LIMIT, .. }));
    }

    #[test]
    fn test_checkout_payment_parsing() {
        let cli = Cli::try_parse_from(["storefront", "checkout", "-a", "Lviv", "-p", "card"]).unwrap();
        match cli.command {
            Commands::Checkout { address, payment } => {
                assert_eq!(address.as_deref(), Some("Lviv"));
                assert_eq!(payment, Some(PaymentMethod::Card));
            }
            other => panic!("unexpected command: {:?}", other),
        }

        assert!(Cli::try_parse_from(["storefront", "checkout", "-p", "bitcoin"]).is_err());
    }

    #[test]
    fn test_reset_requires_flag_value() {
        let cli = Cli::try_parse_from(["storefront", "db", "reset"]).unwrap();
        assert!(matches!(cli.command, Commands::Db { action: DbAction::Reset { yes: false } }));
    }
}
