//! QKart CLI - browse the catalog, manage the cart and place orders.
//!
//! # Usage
//!
//! ```bash
//! # Browse and search the catalog
//! qkart products
//! qkart search smash
//!
//! # Type a query per line; searches fire after the debounce delay
//! qkart live-search
//!
//! # Log in and manage the cart
//! qkart login -u criodo -p learnbydoing
//! qkart cart add KCRwjF7lN97HnEaY --qty 2
//! qkart cart set KCRwjF7lN97HnEaY 1
//! qkart cart show
//!
//! # Check out to a saved address
//! qkart addresses add "221B Baker Street, London"
//! qkart checkout --address <ADDRESS_ID>
//! ```
//!
//! Configuration comes from `QKART_*` environment variables (or `.env`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use qkart_client::{AppError, ClientConfig, FileStore, Storefront};

mod commands;
mod output;

#[derive(Parser)]
#[command(name = "qkart")]
#[command(author, version, about = "QKart storefront in the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every product in the catalog
    Products,
    /// Search products by name or category
    Search {
        /// Search text; empty lists everything
        #[arg(default_value = "")]
        query: String,
    },
    /// Read queries from stdin, one per line, and search as you type
    LiveSearch,
    /// Log in and remember the session
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: String,
    },
    /// Create an account
    Register {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: String,
        /// Repeat the password
        #[arg(short, long)]
        confirm: String,
    },
    /// Forget the saved session
    Logout,
    /// Show the logged-in user and wallet balance
    Whoami,
    /// View and change the cart
    Cart {
        #[command(subcommand)]
        action: Option<CartAction>,
    },
    /// Manage shipping addresses
    Addresses {
        #[command(subcommand)]
        action: Option<AddressAction>,
    },
    /// Place the order
    Checkout {
        /// Shipping address id (see `qkart addresses`)
        #[arg(short, long)]
        address: Option<String>,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart and its total
    Show,
    /// Add a product
    Add {
        product_id: String,
        #[arg(short, long, default_value_t = 1)]
        qty: u32,
        /// Fail if the product is already in the cart
        #[arg(long)]
        no_duplicates: bool,
    },
    /// Set a product's quantity; zero removes it
    Set { product_id: String, qty: u32 },
    /// Remove a product
    Remove { product_id: String },
}

#[derive(Subcommand)]
enum AddressAction {
    /// List saved addresses
    List,
    /// Save a new address
    Add { address: String },
    /// Delete a saved address
    Delete { address_id: String },
}

/// Errors that end a CLI run.
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    App(#[from] AppError),
    #[error("Failed to read input: {0}")]
    Io(#[from] std::io::Error),
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            output::failure(&e.to_string());
            std::process::exit(2);
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);

    // Logs go to stderr so command output stays pipeable
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "qkart_client=info,qkart_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    if let Err(e) = run(cli, &config).await {
        match &e {
            CliError::App(err) => {
                err.report();
                output::failure(&err.user_message());
            }
            other => output::failure(&other.to_string()),
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &ClientConfig) -> Result<(), CliError> {
    let storefront: Storefront<FileStore> = Storefront::from_config(config)?;

    match cli.command {
        Commands::Products => commands::catalog::list(&storefront).await?,
        Commands::Search { query } => commands::catalog::search(&storefront, &query).await?,
        Commands::LiveSearch => commands::catalog::live_search(&storefront).await?,
        Commands::Login { username, password } => {
            commands::account::login(&storefront, username, password).await?;
        }
        Commands::Register {
            username,
            password,
            confirm,
        } => commands::account::register(&storefront, username, password, confirm).await?,
        Commands::Logout => commands::account::logout(&storefront)?,
        Commands::Whoami => commands::account::whoami(&storefront)?,
        Commands::Cart { action } => match action.unwrap_or(CartAction::Show) {
            CartAction::Show => commands::cart::show(&storefront).await?,
            CartAction::Add {
                product_id,
                qty,
                no_duplicates,
            } => commands::cart::add(&storefront, &product_id, qty, no_duplicates).await?,
            CartAction::Set { product_id, qty } => {
                commands::cart::set(&storefront, &product_id, qty).await?;
            }
            CartAction::Remove { product_id } => {
                commands::cart::set(&storefront, &product_id, 0).await?;
            }
        },
        Commands::Addresses { action } => match action.unwrap_or(AddressAction::List) {
            AddressAction::List => commands::addresses::list(&storefront).await?,
            AddressAction::Add { address } => {
                commands::addresses::add(&storefront, &address).await?;
            }
            AddressAction::Delete { address_id } => {
                commands::addresses::delete(&storefront, &address_id).await?;
            }
        },
        Commands::Checkout { address } => {
            commands::cart::checkout(&storefront, address.as_deref()).await?;
        }
    }
    Ok(())
}
