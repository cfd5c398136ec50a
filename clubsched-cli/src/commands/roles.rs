use anyhow::Result;
use clubsched_core::constants::VALID_ROLES;
use clubsched_core::roles::{RolesUpdate, requires_password};
use owo_colors::OwoColorize;

use crate::app::App;
use crate::utils::tui;

fn print_roles(roles: &[String]) {
    if roles.is_empty() {
        println!("{}", "No roles".dimmed());
    } else {
        println!("{}", roles.join(", ").bold());
    }
}

pub async fn show(app: &App) -> Result<()> {
    let (_auth, token) = app.signed_in().await?;

    let spinner = tui::create_spinner("Loading roles");
    let result = app.api.roles(&token).await;
    spinner.finish_and_clear();

    print_roles(&result?.roles);
    println!("{}", format!("Available: {}", VALID_ROLES.join(", ")).dimmed());
    Ok(())
}

pub async fn set(app: &App, roles: Vec<String>) -> Result<()> {
    let password = if requires_password(&roles) {
        Some(tui::prompt_secret("Admin password")?)
    } else {
        None
    };
    let update = RolesUpdate::new(roles, password)?;

    let (_auth, token) = app.signed_in().await?;

    let spinner = tui::create_spinner("Updating roles");
    let result = app.api.update_roles(&token, update).await;
    spinner.finish_and_clear();

    print_roles(&result?.roles);
    Ok(())
}
