//! Account commands

use std::io::{self, BufRead};

use anyhow::{Context, anyhow};

use crate::AccountDirectory;
use crate::domain::Account;

pub async fn count(directory: &AccountDirectory) -> anyhow::Result<()> {
    println!("{}", directory.count_accounts().await?);
    Ok(())
}

pub async fn grant(directory: &AccountDirectory, email: &str, role: &str) -> anyhow::Result<()> {
    let account = require_account(directory, email).await?;
    directory.assign_role(&account, role).await?;

    println!("Granted '{}' to {}", role, account.email());
    Ok(())
}

pub async fn roles(directory: &AccountDirectory, email: &str) -> anyhow::Result<()> {
    let account = require_account(directory, email).await?;

    for role in directory.list_roles(&account).await? {
        println!("{}", role);
    }
    Ok(())
}

pub async fn hash_password(
    directory: &AccountDirectory,
    email: &str,
    password: Option<String>,
) -> anyhow::Result<()> {
    let password = match password {
        Some(p) => p,
        None => read_line().context("Failed to read password from stdin")?,
    };

    let account = match directory.find_by_email(email).await? {
        Some(account) => account,
        None => Account::from_email(email),
    };

    println!("{}", directory.hash_credential(&account, &password)?);
    Ok(())
}

async fn require_account(directory: &AccountDirectory, email: &str) -> anyhow::Result<Account> {
    directory
        .find_by_email(email)
        .await?
        .ok_or_else(|| anyhow!("No account registered for '{}'", email))
}

fn read_line() -> io::Result<String> {
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
