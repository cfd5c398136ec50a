use anyhow::Result;
use clubsched_core::admin::summarize;
use clubsched_core::{AdminView, RoleFilter};
use owo_colors::OwoColorize;

use crate::app::App;
use crate::render::Render;
use crate::utils::tui;

pub async fn run(app: &App, role: Option<&str>) -> Result<()> {
    let (_auth, token) = app.signed_in().await?;
    let filter = role.map(RoleFilter::parse).unwrap_or_default();

    let mut view = AdminView::new(Some(token), filter);

    let spinner = tui::create_spinner(format!("Loading availability ({})", view.filter()));
    let result = view.refresh(&app.api).await;
    spinner.finish_and_clear();
    result?;

    let mut entries = view.entries();
    entries.sort_by_key(|e| e.start);

    if entries.is_empty() {
        println!("{}", "No availability reported".dimmed());
        return Ok(());
    }

    println!("{} {}", "Coverage".bold(), format!("({})", view.filter()).dimmed());
    for entry in &entries {
        println!("   {}", entry.render());
    }
    println!("\n{}", summarize(view.slots()).render());
    Ok(())
}
