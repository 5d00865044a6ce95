//! cartsync - keep a storefront cart on the device and sync it on login.
//!
//! # Usage
//!
//! ```bash
//! # Add two of a product variant to the cart (local until you log in)
//! cartsync add <product-id> <product-type-id> -q 2
//!
//! # Show the cart with catalog details
//! cartsync list
//!
//! # Log in; the local cart is merged into your server cart
//! cartsync login -u ada@example.com
//!
//! # Manage categories (admin token required)
//! cartsync categories admin
//! ```

mod app;
mod commands;

use std::io;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

use app::App;
use cartsync_core::{ApiError, Config};

#[derive(Parser)]
#[command(name = "cartsync")]
#[command(author, version, about = "Storefront cart that works offline and syncs on login")]
struct Cli {
    /// Ignore any saved session and use the local cart
    #[arg(long, global = true)]
    anonymous: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a product variant to the cart
    Add {
        product_id: Uuid,
        product_type_id: Uuid,
        #[arg(short, long, default_value_t = 1)]
        quantity: i32,
    },
    /// Refresh and print the number of cart lines
    Count,
    /// List cart lines with catalog details
    List,
    /// Remove a product variant from the cart
    Remove {
        product_id: Uuid,
        product_type_id: Uuid,
    },
    /// Set the quantity of a product variant already in the cart
    Update {
        product_id: Uuid,
        product_type_id: Uuid,
        quantity: i32,
    },
    /// Log in with an API token and merge the local cart into the server cart
    Login {
        #[arg(short, long)]
        username: Option<String>,
    },
    /// Forget the saved session and token
    Logout,
    /// Show session and local cart state without contacting the server
    Status,
    /// Manage product categories
    Categories {
        #[command(subcommand)]
        action: CategoryAction,
    },
}

#[derive(Subcommand)]
enum CategoryAction {
    /// List storefront categories
    List,
    /// List all categories, including hidden ones
    Admin,
    /// Create a category
    Add {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        url: String,
        #[arg(long)]
        hidden: bool,
    },
    /// Update a category
    Update {
        #[arg(long)]
        id: i32,
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        url: String,
        #[arg(long)]
        hidden: bool,
    },
    /// Delete a category
    Delete {
        #[arg(long)]
        id: i32,
    },
}

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr; when a log directory is configured they are also
/// written to daily rolling files there. The returned guard flushes the
/// file writer and must be held until exit.
fn init_tracing(config: &Config) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match config.log_dir {
        Some(ref dir) => {
            let appender = tracing_appender::rolling::daily(dir, "cartsync.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Warning: failed to load config ({}), using defaults", e);
        Config::default()
    });
    let _guard = init_tracing(&config);
    info!(api = %config.api_base_url, "cartsync starting");

    let mut app = App::new(config, cli.anonymous)?;
    let result = run(&mut app, cli.command).await;

    if let Err(ref e) = result {
        if e.downcast_ref::<ApiError>().is_some_and(ApiError::is_auth_failure) {
            eprintln!("The server rejected the saved token; run `cartsync login` again.");
        }
    }
    result
}

async fn run(app: &mut App, command: Commands) -> Result<()> {
    match command {
        Commands::Add {
            product_id,
            product_type_id,
            quantity,
        } => commands::cart::add(app, product_id, product_type_id, quantity).await,
        Commands::Count => commands::cart::count(app).await,
        Commands::List => commands::cart::list(app).await,
        Commands::Remove {
            product_id,
            product_type_id,
        } => commands::cart::remove(app, product_id, product_type_id).await,
        Commands::Update {
            product_id,
            product_type_id,
            quantity,
        } => commands::cart::update(app, product_id, product_type_id, quantity).await,
        Commands::Login { username } => commands::auth::login(app, username).await,
        Commands::Logout => commands::auth::logout(app),
        Commands::Status => commands::auth::status(app),
        Commands::Categories { action } => match action {
            CategoryAction::List => commands::category::list(app, false).await,
            CategoryAction::Admin => commands::category::list(app, true).await,
            CategoryAction::Add { name, url, hidden } => {
                commands::category::add(app, name, url, !hidden).await
            }
            CategoryAction::Update {
                id,
                name,
                url,
                hidden,
            } => commands::category::update(app, id, name, url, !hidden).await,
            CategoryAction::Delete { id } => commands::category::delete(app, id).await,
        },
    }
}
