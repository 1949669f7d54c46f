//! Bootstrap command - seeds roles and the initial administrator

use tracing::info;

use crate::AccountDirectory;
use crate::config::AppConfig;
use crate::directory::seed;

pub async fn run(directory: &AccountDirectory, config: &AppConfig) -> anyhow::Result<()> {
    let report = seed(directory, &config.bootstrap, &config.identity.password).await?;

    for role in &report.roles_created {
        info!(role = %role, "Role created");
    }

    match report.admin {
        Some(admin) => {
            println!("Initial administrator created: {}", admin.email);
            if let Some(password) = admin.generated_password {
                println!("Password: {}", password);
                println!("Please change this password after first login.");
            }
        }
        None => println!("Directory already initialized"),
    }

    Ok(())
}
