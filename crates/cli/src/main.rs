//! Kirana CLI - Catalog seeding and data maintenance tools.
//!
//! # Usage
//!
//! ```bash
//! # Create catalog items from a YAML file (existing IDs are skipped)
//! kirana seed data/items.yaml
//!
//! # List catalog items
//! kirana items list
//!
//! # Rewrite every stored cart in its canonical form
//! kirana carts normalize
//! ```
//!
//! All commands talk to Firestore using the `FIREBASE_*` environment
//! variables (`.env` is honored).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "kirana")]
#[command(author, version, about = "Kirana CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create catalog items from a YAML file
    Seed {
        /// Path to the YAML file (a list of items)
        file: String,
    },
    /// Inspect catalog items
    Items {
        #[command(subcommand)]
        action: ItemsAction,
    },
    /// Maintain user carts
    Carts {
        #[command(subcommand)]
        action: CartsAction,
    },
}

#[derive(Subcommand)]
enum ItemsAction {
    /// List every item in the catalog
    List,
}

#[derive(Subcommand)]
enum CartsAction {
    /// Merge duplicate lines and drop invalid quantities in stored carts
    Normalize,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let store = commands::connect()?;
    match cli.command {
        Commands::Seed { file } => commands::seed::run(&store, &file).await?,
        Commands::Items { action } => match action {
            ItemsAction::List => commands::items::list(&store).await?,
        },
        Commands::Carts { action } => match action {
            CartsAction::Normalize => commands::carts::normalize(&store).await?,
        },
    }
    Ok(())
}
