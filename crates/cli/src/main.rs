//! Liher Fashion CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! liher-cli migrate
//!
//! # Create a superuser staff account
//! liher-cli admin create -e admin@liherfashion.co -p "contraseña segura" \
//!     --first-name Laura --last-name Hernández
//!
//! # Load catalog seed data from a YAML file
//! liher-cli seed -f crates/cli/seed/catalog.yaml
//! ```
//!
//! # Commands
//!
//! - `migrate` - Apply the shared schema migrations
//! - `admin create` - Create superuser staff accounts
//! - `seed` - Load catalog seed data (lookups, products, variants)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "liher-cli")]
#[command(author, version, about = "Liher Fashion CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply database migrations
    Migrate,
    /// Manage staff accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Load catalog seed data
    Seed {
        /// Path to the YAML seed file
        #[arg(short, long, default_value = "crates/cli/seed/catalog.yaml")]
        file: String,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a superuser staff account
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password (validated with the same rules the storefront uses)
        #[arg(short, long)]
        password: String,

        /// Given name
        #[arg(long, default_value = "")]
        first_name: String,

        /// Family name
        #[arg(long, default_value = "")]
        last_name: String,
    },
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
    match cli.command {
        Commands::Migrate => commands::migrate::apply().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                password,
                first_name,
                last_name,
            } => {
                commands::admin::create_superuser(&email, &password, &first_name, &last_name)
                    .await?;
            }
        },
        Commands::Seed { file } => commands::seed::catalog(&file).await?,
    }
    Ok(())
}
