use anyhow::{Context, Result, bail};
use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};

pub fn create_spinner(message: impl Into<String>) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_strings(&["-", "\\", "|", "/"])
        .template("{msg} {spinner}")
    {
        spinner.set_style(style);
    }
    spinner.set_message(message.into());
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner
}

fn required(label: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{label} can't be empty"))
    } else {
        Ok(())
    }
}

/// Ask for a non-empty line of text, re-asking until one is given.
pub fn prompt_text(label: &str) -> Result<String> {
    let name = label.to_string();
    let value: String = Input::new()
        .with_prompt(format!("  {label}"))
        .validate_with(move |input: &String| required(&name, input))
        .interact_text()?;
    Ok(value.trim().to_string())
}

/// Hidden input, for passwords.
pub fn prompt_secret(label: &str) -> Result<String> {
    let secret = rpassword::prompt_password(format!("  {label}: "))
        .with_context(|| format!("Failed to read {}", label.to_lowercase()))?;
    if let Err(reason) = required(label, &secret) {
        bail!(reason);
    }
    Ok(secret)
}
