use anyhow::Result;
use clubsched_core::ClubSchedConfig;
use owo_colors::OwoColorize;

use crate::app::App;

pub fn run(app: &App) -> Result<()> {
    let config_path = ClubSchedConfig::config_path()?;

    println!("{}", "Paths".bold());
    println!("  Config:       {}", config_path.display());
    println!("  Credentials:  {}", app.config.credentials_path()?.display());
    println!("  Draft:        {}", app.config.draft_path()?.display());

    println!("\n{}", "Effective configuration".bold());
    print!("{}", app.config.to_toml()?);

    Ok(())
}
