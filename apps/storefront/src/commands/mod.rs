//! # Storefront Commands
//!
//! One module per area of the shop. Every handler takes the [`Storefront`]
//! context plus its arguments and returns a [`Render`] value.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs       ◄─── You are here (exports)
//! ├── books.rs     ◄─── Catalogue, book page, filters
//! ├── authors.rs   ◄─── Author list and pages
//! ├── search.rs    ◄─── Prefix suggestions
//! ├── auth.rs      ◄─── Register, login, logout, whoami
//! ├── profile.rs   ◄─── Profile page
//! ├── cart.rs      ◄─── Cart manipulation
//! ├── checkout.rs  ◄─── Order placement
//! ├── orders.rs    ◄─── Order history
//! ├── comments.rs  ◄─── Reviews
//! └── admin.rs     ◄─── Migrations, reset, stats, order status
//! ```
//!
//! ## How Commands Work
//! ```text
//! storefront cart add 12 --qty 2
//!         │
//!         ▼  (clap)
//! Commands::Cart { action: CartAction::Add { book_id: 12, qty: 2 } }
//!         │
//!         ▼  (lib.rs dispatch)
//! commands::cart::add(&storefront, 12, 2) -> ApiResult<CartView>
//!         │
//!         ▼
//! render::print(&view, config, json)
//! ```
//!
//! [`Storefront`]: crate::state::Storefront
//! [`Render`]: crate::render::Render

pub mod admin;
pub mod auth;
pub mod authors;
pub mod books;
pub mod cart;
pub mod checkout;
pub mod comments;
pub mod orders;
pub mod profile;
pub mod search;
