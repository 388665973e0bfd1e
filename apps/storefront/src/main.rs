//! # Storefront Entry Point
//!
//! Parses the command line, sets up logging and runs one command.
//!
//! ## Exit Codes
//! | Code | Meaning                                   |
//! |------|-------------------------------------------|
//! | 0    | Success                                   |
//! | 1    | Database or internal error                |
//! | 2    | Invalid input or configuration            |
//! | 3    | Not logged in, or wrong credentials       |
//! | 4    | Not found                                 |
//! | 5    | Rejected by a shop rule (stock, cart)     |

use std::process::ExitCode;

use clap::Parser;
use tracing::debug;

use bookstore_storefront::cli::Cli;
use bookstore_storefront::error::ApiError;
use bookstore_storefront::{init_tracing, render, run};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref())?;

    let json = cli.json;
    match run(cli).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            report(&e, json)?;
            Ok(ExitCode::from(e.code.exit_code()))
        }
    }
}

fn report(e: &ApiError, json: bool) -> anyhow::Result<()> {
    debug!(code = ?e.code, "Command failed");
    if json {
        eprintln!("{}", render::to_json(e)?);
    } else {
        eprintln!("Error: {}", e.message);
    }
    Ok(())
}
