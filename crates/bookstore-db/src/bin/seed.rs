//! # Seed Data Generator
//!
//! Populates the database with a demo catalogue for development.
//!
//! ## Usage
//! ```bash
//! # Generate 20 books (default)
//! cargo run -p bookstore-db --bin seed
//!
//! # Generate a custom amount
//! cargo run -p bookstore-db --bin seed -- --count 200
//!
//! # Point at another database and start from an empty schema
//! cargo run -p bookstore-db --bin seed -- --database-url postgres://... --reset
//! ```
//!
//! ## Generated Data
//! - Publishers and authors of Ukrainian literature
//! - Books cycling through the classic titles, numbered past the first round
//! - Reviewer accounts with a locked password (they cannot log in)
//! - A few comments and one order, placed through the order transaction

use bookstore_core::OrderLine;
use bookstore_db::{Database, DbConfig};
use std::env;
use tracing_subscriber::EnvFilter;

const PUBLISHERS: &[(&str, &str)] = &[
    ("A-BA-BA-HA-LA-MA-HA", "Kyiv, info@ababahalamaha.com.ua"),
    ("Old Lion Publishing House", "Lviv, info@starlev.com.ua"),
    ("Folio", "Kharkiv, folio@folio.com.ua"),
];

/// (first, last, birth date, biography)
const AUTHORS: &[(&str, &str, &str, &str)] = &[
    ("Taras", "Shevchenko", "1814-03-09", "Poet, writer and artist. Founder of modern Ukrainian literature."),
    ("Lesya", "Ukrainka", "1871-02-25", "Poet and playwright, author of The Forest Song."),
    ("Ivan", "Franko", "1856-08-27", "Writer, poet and scholar from Galicia."),
    ("Mykhailo", "Kotsiubynskyi", "1864-09-17", "Impressionist prose writer."),
    ("Olha", "Kobylianska", "1863-11-27", "Modernist novelist from Bukovina."),
    ("Ivan", "Nechui-Levytskyi", "1838-11-25", "Realist novelist and translator."),
];

/// (title, genre, author index, base price in cents, publisher index)
const TITLES: &[(&str, &str, usize, i64, usize)] = &[
    ("Kobzar", "Poetry", 0, 35_000, 0),
    ("Haidamaky", "Poetry", 0, 18_000, 2),
    ("The Forest Song", "Drama", 1, 22_000, 1),
    ("Cassandra", "Drama", 1, 16_500, 1),
    ("Zakhar Berkut", "Historical", 2, 24_000, 2),
    ("Boryslav Laughs", "Novel", 2, 19_900, 2),
    ("Shadows of Forgotten Ancestors", "Novel", 3, 21_000, 0),
    ("Fata Morgana", "Novel", 3, 17_500, 1),
    ("The Land", "Novel", 4, 23_000, 2),
    ("Valse Melancolique", "Short Stories", 4, 12_000, 1),
    ("The Kaidash Family", "Novel", 5, 15_000, 0),
    ("Mykola Dzheria", "Novel", 5, 14_500, 2),
];

const LANGUAGES: &[&str] = &["Ukrainian", "Ukrainian", "English"];

const REVIEWERS: &[(&str, &str, &str)] = &[
    ("Oksana", "Reader", "oksana.reader@bookstore.local"),
    ("Petro", "Critic", "petro.critic@bookstore.local"),
];

const COMMENTS: &[(usize, usize, &str, i32)] = &[
    (0, 0, "A book every home should have.", 5),
    (0, 1, "Beautiful edition, heavy to carry around.", 4),
    (2, 0, "Read it twice in one week.", 5),
    (6, 1, "Vivid and strange. No stars, just read it.", 0),
];

/// Not a valid argon2 hash, so these accounts can never log in.
const LOCKED_PASSWORD: &str = "!locked";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 20;
    let mut database_url = env::var("BOOKSTORE_DATABASE_URL")
        .or_else(|_| env::var("DATABASE_URL"))
        .unwrap_or_else(|_| String::from("postgres://postgres@localhost:5432/bookstore"));
    let mut reset = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(20);
                    i += 1;
                }
            }
            "--database-url" | "-d" => {
                if i + 1 < args.len() {
                    database_url = args[i + 1].clone();
                    i += 1;
                }
            }
            "--reset" => reset = true,
            "--help" | "-h" => {
                println!("Bookstore Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>            Number of books to generate (default: 20)");
                println!("  -d, --database-url <URL>   PostgreSQL URL (default: $BOOKSTORE_DATABASE_URL)");
                println!("      --reset                Drop and recreate the schema first");
                println!("  -h, --help                 Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let config = DbConfig::from_url(&database_url)?;

    println!("🌱 Bookstore Seed Data Generator");
    println!("================================");
    println!("Database: {}", config.display_target());
    println!("Books:    {}", count);
    println!();

    let db = Database::new(config).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    if reset {
        db.reset_schema().await?;
        println!("✓ Schema reset");
    }

    let existing = db.books().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} books", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Run with --reset to regenerate.");
        return Ok(());
    }

    let start = std::time::Instant::now();

    let mut publisher_ids = Vec::with_capacity(PUBLISHERS.len());
    for &(name, contact) in PUBLISHERS {
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO publisher (name, contact_info) VALUES ($1, $2) RETURNING publisher_id",
        )
        .bind(name)
        .bind(contact)
        .fetch_one(db.pool())
        .await?;
        publisher_ids.push(id);
    }
    println!("✓ {} publishers", publisher_ids.len());

    let mut author_ids = Vec::with_capacity(AUTHORS.len());
    for &(first, last, birth, bio) in AUTHORS {
        let birth_date = chrono::NaiveDate::parse_from_str(birth, "%Y-%m-%d")?;
        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO author (first_name, last_name, birth_date, nationality, image_path, biography)
            VALUES ($1, $2, $3, 'Ukrainian', $4, $5)
            RETURNING author_id
            "#,
        )
        .bind(first)
        .bind(last)
        .bind(birth_date)
        .bind(format!("images/authors/{}.jpg", last.to_lowercase()))
        .bind(bio)
        .fetch_one(db.pool())
        .await?;
        author_ids.push(id);
    }
    println!("✓ {} authors", author_ids.len());

    let mut book_ids = Vec::with_capacity(count);
    for seed in 0..count {
        let (title, genre, author_idx, base_price, publisher_idx) = TITLES[seed % TITLES.len()];
        let round = seed / TITLES.len();

        let title = if round == 0 {
            title.to_string()
        } else {
            format!("{} (edition {})", title, round + 1)
        };
        let price_cents = base_price + (round as i64) * 1_500;
        let stock = ((seed * 7) % 25) as i32;
        let published = chrono::NaiveDate::from_ymd_opt(1990 + (seed % 34) as i32, 1 + (seed % 12) as u32, 1)
            .unwrap_or_default();

        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO book
                (title, isbn, publication_date, publisher_id, price_cents, stock_quantity,
                 description, language, page_count, cover_image_path, genre)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING book_id
            "#,
        )
        .bind(&title)
        .bind(format!("978-966-{:07}", seed))
        .bind(published)
        .bind(publisher_ids[publisher_idx])
        .bind(price_cents)
        .bind(stock)
        .bind(format!("{} by {}.", title, AUTHORS[author_idx].1))
        .bind(LANGUAGES[seed % LANGUAGES.len()])
        .bind(120 + ((seed * 37) % 480) as i32)
        .bind(format!("images/books/{}.jpg", seed + 1))
        .bind(genre)
        .fetch_one(db.pool())
        .await?;

        sqlx::query("INSERT INTO book_author (book_id, author_id) VALUES ($1, $2)")
            .bind(id)
            .bind(author_ids[author_idx])
            .execute(db.pool())
            .await?;

        book_ids.push(id);
    }
    println!("✓ {} books", book_ids.len());

    let mut reviewer_ids = Vec::with_capacity(REVIEWERS.len());
    for &(first, last, email) in REVIEWERS {
        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO customer (first_name, last_name, email, password_hash, address)
            VALUES ($1, $2, $3, $4, 'Kyiv, Khreshchatyk 1')
            RETURNING customer_id
            "#,
        )
        .bind(first)
        .bind(last)
        .bind(email)
        .bind(LOCKED_PASSWORD)
        .fetch_one(db.pool())
        .await?;
        reviewer_ids.push(id);
    }
    println!("✓ {} reviewer accounts", reviewer_ids.len());

    let mut comments = 0;
    for &(book_idx, reviewer_idx, text, rating) in COMMENTS {
        let Some(&book_id) = book_ids.get(book_idx) else {
            continue;
        };
        db.comments().add(book_id, reviewer_ids[reviewer_idx], text, rating).await?;
        comments += 1;
    }
    println!("✓ {} comments", comments);

    // One order through the real transaction, for the first book in stock
    let in_stock = book_ids.iter().enumerate().find(|(seed, _)| (seed * 7) % 25 > 0);
    if let Some((_, &book_id)) = in_stock {
        let placed = db
            .orders()
            .create_order(
                reviewer_ids[0],
                &[OrderLine { book_id, quantity: 1 }],
                "Kyiv, Khreshchatyk 1",
                Some("Cash on delivery"),
            )
            .await?;
        db.orders().add_status(placed.order_id, "Shipped", Some("UA000000001")).await?;
        println!("✓ Demo order #{} ({})", placed.order_id, placed.total);
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Seeded in {:?}", elapsed);

    let counts = db.table_counts().await?;
    for (table, rows) in counts.rows() {
        println!("  {:<15} {}", table, rows);
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
