//! Atelier CLI - account and pricing tools for the content backend.
//!
//! # Usage
//!
//! ```bash
//! # List admin accounts
//! atelier admin list --role PRODUCT --search ops
//!
//! # Create an admin (password from ATELIER_NEW_ADMIN_PASSWORD)
//! atelier admin create -e ops@example.com -r ADMIN
//!
//! # Remove an admin
//! atelier admin remove 65f0c0ffee
//!
//! # Discount one category by 15%
//! atelier price discount --percent 15 --category 64b7a1
//!
//! # Raise two products by 5%
//! atelier price adjust --percent 5 --product p1 --product p2
//! ```
//!
//! # Environment Variables
//!
//! - `ATELIER_API_URL` - Base URL of the content REST API
//! - `ATELIER_EMAIL` / `ATELIER_PASSWORD` - Credentials the CLI signs in with

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Args, Parser, Subcommand};

mod commands;

use commands::price::Target;

#[derive(Parser)]
#[command(name = "atelier")]
#[command(author, version, about = "Atelier content backend tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage admin accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Apply bulk price changes
    Price {
        #[command(subcommand)]
        action: PriceAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// List admin accounts
    List {
        /// Only this role (`SUPERADMIN`, `ADMIN`, `PRODUCT`)
        #[arg(short, long)]
        role: Option<String>,

        /// Email search text
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Create an admin account
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin role (`SUPERADMIN`, `ADMIN`, `PRODUCT`)
        #[arg(short, long, default_value = "ADMIN")]
        role: String,
    },
    /// Delete an admin account
    Remove {
        /// Admin id
        id: String,
    },
}

#[derive(Subcommand)]
enum PriceAction {
    /// Percentage discount (0 to 100)
    Discount(PriceArgs),
    /// Signed percentage price adjustment (greater than -100)
    Adjust(PriceArgs),
}

#[derive(Args)]
struct PriceArgs {
    /// Percentage to apply
    #[arg(short, long, allow_hyphen_values = true)]
    percent: String,

    #[command(flatten)]
    target: TargetArgs,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct TargetArgs {
    /// Every product
    #[arg(long)]
    all: bool,

    /// Every product in one category
    #[arg(long)]
    category: Option<String>,

    /// Specific products (repeatable)
    #[arg(long = "product")]
    products: Vec<String>,
}

impl From<TargetArgs> for Target {
    fn from(args: TargetArgs) -> Self {
        if args.all {
            Self::All
        } else if let Some(category) = args.category {
            Self::Category(category)
        } else {
            Self::Products(args.products)
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    let api = commands::connect().await?;

    match cli.command {
        Commands::Admin { action } => match action {
            AdminAction::List { role, search } => {
                commands::admin::list(&api, role.as_deref(), search).await?;
            }
            AdminAction::Create { email, role } => {
                commands::admin::create(&api, &email, &role).await?;
            }
            AdminAction::Remove { id } => commands::admin::remove(&api, &id).await?,
        },
        Commands::Price { action } => {
            let (mode, args) = match action {
                PriceAction::Discount(args) => (commands::price::Mode::Discount, args),
                PriceAction::Adjust(args) => (commands::price::Mode::Adjust, args),
            };
            commands::price::apply(&api, mode, &args.percent, args.target.into()).await?;
        }
    }
    Ok(())
}
