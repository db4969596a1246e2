//! MooStyle CLI - database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! moo-cli migrate
//!
//! # Create an admin account (prints a generated password if none given)
//! moo-cli admin create -e admin@example.com -n "Admin Name" -r admin
//!
//! # Seed the catalog with sample mods
//! moo-cli seed
//!
//! # Run a disaster-recovery drill
//! moo-cli drill ransomware
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "moo-cli")]
#[command(author, version, about = "MooStyle CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage privileged accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Seed the catalog with sample mods
    Seed,
    /// Run a simulated disaster-recovery drill
    Drill {
        /// Incident slug (omit to list available runbooks)
        incident: Option<String>,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin account
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Role (`admin` or `owner`)
        #[arg(short, long, default_value = "admin")]
        role: String,

        /// Password (generated and printed if omitted)
        #[arg(short, long)]
        password: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), commands::CliError> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                name,
                role,
                password,
            } => {
                commands::admin::create_user(&email, &name, &role, password.as_deref()).await?;
            }
        },
        Commands::Seed => commands::seed::run().await?,
        Commands::Drill { incident } => commands::drill::run(incident.as_deref()).await?,
    }
    Ok(())
}
