use anyhow::Result;
use clubsched_core::AuthState;
use clubsched_core::auth;
use owo_colors::OwoColorize;

use crate::app::App;
use crate::utils::tui;

pub async fn signup(app: &App) -> Result<()> {
    let name = tui::prompt_text("Name")?;
    let email = tui::prompt_text("Email")?;
    let password = tui::prompt_secret("Password")?;
    let confirmation = tui::prompt_secret("Confirm password")?;

    let spinner = tui::create_spinner("Creating account");
    let result = auth::signup(&app.api, &name, &email, &password, &confirmation).await;
    spinner.finish_and_clear();
    result?;

    println!("Account created for {}.", email.bold());
    println!("\nSign in with:\n  clubsched login --email {email}");
    Ok(())
}

pub async fn login(app: &App, email: Option<String>) -> Result<()> {
    let email = match email {
        Some(email) => email,
        None => tui::prompt_text("Email")?,
    };
    let password = tui::prompt_secret("Password")?;

    let mut auth = AuthState::new(app.credentials()?);

    let spinner = tui::create_spinner("Signing in");
    let result = auth.login(&app.api, &email, &password).await;
    spinner.finish_and_clear();

    let user = result?;
    println!("Signed in as {}", user.display_name().bold());
    Ok(())
}

pub fn logout(app: &App) -> Result<()> {
    let mut auth = AuthState::new(app.credentials()?);

    if auth.logout()? {
        app.drafts()?.clear()?;
        println!("Signed out.");
    } else {
        println!("{}", "Not signed in".dimmed());
    }
    Ok(())
}

pub async fn whoami(app: &App) -> Result<()> {
    let auth = app.auth().await?;

    match auth.user() {
        Some(user) => {
            println!("{}", user.display_name().bold());
            println!("  Server: {}", app.api.base_url().dimmed());
        }
        None => println!("{}", "Not signed in".dimmed()),
    }
    Ok(())
}
