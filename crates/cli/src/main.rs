//! Quickcart CLI - a terminal storefront.
//!
//! # Usage
//!
//! ```bash
//! # Search products (page 2)
//! quickcart search "desk lamp" --page 2
//!
//! # Sign in (any non-empty email and password)
//! quickcart login -e ana@example.com -p secret
//!
//! # Add to cart, adjust, and check out
//! quickcart cart add --id 7 --title "Desk Lamp" --price 24.99
//! quickcart cart set 7 2
//! quickcart checkout
//! ```
//!
//! # Commands
//!
//! - `search` - Search products through the search webhook
//! - `view` - Record a product view with the product-info webhook
//! - `login`, `signup`, `login-federated`, `signup-federated`, `logout`, `whoami` - Session
//! - `cart show|add|set|remove` - Cart
//! - `checkout` - Submit the cart as an order
//!
//! Session and cart persist under `QUICKCART_DATA_DIR` between invocations.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quickcart_core::Price;
use quickcart_storefront::config::StorefrontConfig;
use quickcart_storefront::error::AppError;
use quickcart_storefront::state::AppState;
use quickcart_storefront::storage::FileStorage;

mod commands;

#[derive(Parser)]
#[command(name = "quickcart")]
#[command(author, version, about = "Quickcart terminal storefront")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search products
    Search {
        /// Search terms
        query: String,

        /// Results page (1-based)
        #[arg(short, long, default_value_t = 1)]
        page: usize,
    },
    /// Record that a product was viewed
    View {
        /// Product title
        title: String,
    },
    /// Sign in with email and password
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },
    /// Create an account with email and password
    Signup {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },
    /// Sign in with Google
    LoginFederated,
    /// Create an account with Google
    SignupFederated,
    /// Sign out and empty the cart
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Submit the cart as an order
    Checkout,
}

#[derive(Subcommand)]
enum CartAction {
    /// List cart lines and the total
    Show,
    /// Add one unit of a product
    Add {
        /// Product ID
        #[arg(long)]
        id: String,

        /// Product title
        #[arg(long)]
        title: String,

        /// Unit price, e.g. `24.99`
        #[arg(long)]
        price: Price,

        /// Thumbnail URL
        #[arg(long)]
        thumbnail: Option<String>,
    },
    /// Set a line's quantity (0 or less removes it)
    Set {
        /// Product ID
        id: String,

        /// New quantity
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a line
    Remove {
        /// Product ID
        id: String,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
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
#[allow(clippy::print_stderr)]
async fn main() {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", AppError::from(e).user_message());
            std::process::exit(1);
        }
    };

    // Initialize Sentry (must be done before tracing subscriber)
    let sentry_guard = init_sentry(&config);

    // Logs go to stderr so command output stays clean on stdout
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "quickcart_storefront=info,quickcart_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let code = match run(cli, config).await {
        Ok(()) => 0,
        Err(e) => {
            e.report();
            eprintln!("{}", e.user_message());
            1
        }
    };

    // Flush pending Sentry events before exiting
    drop(sentry_guard);
    std::process::exit(code);
}

async fn run(cli: Cli, config: StorefrontConfig) -> Result<(), AppError> {
    let storage = FileStorage::open(&config.data_dir)?;
    let state = AppState::new(config, Arc::new(storage));

    match cli.command {
        Commands::Search { query, page } => commands::catalog::search(&state, &query, page).await?,
        Commands::View { title } => commands::catalog::view(&state, &title).await,
        Commands::Login { email, password } => {
            commands::account::login(&state, &email, &password).await?;
        }
        Commands::Signup { email, password } => {
            commands::account::signup(&state, &email, &password).await?;
        }
        Commands::LoginFederated => commands::account::login_federated(&state).await?,
        Commands::SignupFederated => commands::account::signup_federated(&state).await?,
        Commands::Logout => commands::account::logout(&state)?,
        Commands::Whoami => commands::account::whoami(&state),
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&state),
            CartAction::Add {
                id,
                title,
                price,
                thumbnail,
            } => commands::cart::add(&state, id, title, price, thumbnail)?,
            CartAction::Set { id, quantity } => commands::cart::set(&state, &id, quantity)?,
            CartAction::Remove { id } => commands::cart::remove(&state, &id)?,
        },
        Commands::Checkout => commands::checkout::checkout(&state).await?,
    }
    Ok(())
}
