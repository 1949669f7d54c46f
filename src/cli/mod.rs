//! CLI module for the account directory
//!
//! Administrative subcommands run against the configured storage:
//! - `bootstrap`: define default roles and the first administrator
//! - `count`: number of registered accounts
//! - `grant`: add an account to a role
//! - `roles`: list an account's roles
//! - `hash-password`: print a credential hash for an account

mod account;
mod bootstrap;

use clap::{Parser, Subcommand};

use crate::AccountDirectory;
use crate::config::AppConfig;
use crate::infrastructure::logging;

/// Account Directory - accounts, roles and sessions for the condominium app
#[derive(Parser)]
#[command(name = "account-directory")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Define default roles and, on an empty directory, the first administrator
    Bootstrap,

    /// Print the number of registered accounts
    Count,

    /// Add an account to a role
    Grant {
        /// Email of the account
        email: String,
        /// Role to grant
        role: String,
    },

    /// List the roles of an account
    Roles {
        /// Email of the account
        email: String,
    },

    /// Hash a password for an account, reading it from stdin when not given
    HashPassword {
        /// Email of the account
        email: String,
        #[arg(long)]
        password: Option<String>,
    },
}

/// Run a parsed command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let (config, directory) = prepare().await?;

    match cli.command {
        Command::Bootstrap => bootstrap::run(&directory, &config).await,
        Command::Count => account::count(&directory).await,
        Command::Grant { email, role } => account::grant(&directory, &email, &role).await,
        Command::Roles { email } => account::roles(&directory, &email).await,
        Command::HashPassword { email, password } => {
            account::hash_password(&directory, &email, password).await
        }
    }
}

/// Load configuration, start logging and open the directory
async fn prepare() -> anyhow::Result<(AppConfig, AccountDirectory)> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().unwrap_or_default();
    logging::init_logging(&config.logging);

    let directory = crate::create_directory_with_config(&config).await?;
    Ok((config, directory))
}
