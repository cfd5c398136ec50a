use anyhow::{Result, bail};
use chrono::Utc;
use clubsched_core::{
    ApiClient, AvailabilityEvent, DragOutcome, DraftStore, EventKind, ScheduleSession, Selection,
    SyncState, WireWarning,
};
use dialoguer::Confirm;
use owo_colors::OwoColorize;

use crate::app::App;
use crate::args::SlotArgs;
use crate::render::{Render, pluralize};
use crate::utils::tui;

/// The signed-in user's session plus the draft file backing it.
struct Schedule {
    session: ScheduleSession<ApiClient>,
    drafts: DraftStore,
    owner: Option<String>,
}

impl Schedule {
    async fn connect(app: &App) -> Result<Self> {
        let (auth, token) = app.signed_in().await?;
        Ok(Schedule {
            session: ScheduleSession::new(app.api.clone(), app.reference, Some(token)),
            drafts: app.drafts()?,
            owner: auth.owner().map(str::to_string),
        })
    }

    /// Connect and pick up unsaved edits, or the server copy if there are none.
    async fn open(app: &App) -> Result<Self> {
        let schedule = Self::connect(app).await?;
        if !schedule
            .drafts
            .restore_into(&schedule.session, schedule.owner.as_deref())?
        {
            schedule.pull().await?;
        }
        Ok(schedule)
    }

    async fn pull(&self) -> Result<()> {
        let spinner = tui::create_spinner("Loading schedule");
        let result = self.session.load().await;
        spinner.finish_and_clear();

        report_skipped(&result?);
        Ok(())
    }

    /// Keep a draft only while there is something unsaved.
    fn persist(&self) -> Result<()> {
        if self.session.state() == SyncState::Clean {
            self.drafts.clear()?;
        } else {
            self.drafts.persist(&self.session, self.owner.as_deref())?;
        }
        Ok(())
    }

    /// Look up an event by id or unique id prefix.
    fn find(&self, id: &str) -> Result<AvailabilityEvent> {
        let events = self.session.events();
        if let Some(event) = events.iter().find(|e| e.id.as_str() == id) {
            return Ok(event.clone());
        }

        let matches: Vec<_> = events
            .into_iter()
            .filter(|e| e.id.as_str().starts_with(id))
            .collect();
        match matches.as_slice() {
            [event] => Ok(event.clone()),
            [] => bail!("No slot with id '{id}'"),
            _ => bail!("'{id}' matches {} slots; use more characters", matches.len()),
        }
    }

    fn print(&self) {
        let mut events = self.session.events();
        events.sort_by_key(|e| e.to_string());

        if events.is_empty() {
            println!("{}", "No availability yet".dimmed());
        }
        for event in &events {
            println!("   {}", event.render());
        }

        println!(
            "\n{} {} · {}",
            events.len(),
            pluralize("slot", events.len()),
            self.session.state().render()
        );
    }
}

fn selection(app: &App, slot: &SlotArgs) -> Result<Selection> {
    let today = Utc::now()
        .with_timezone(&slot.tz.unwrap_or(app.reference))
        .date_naive();
    slot.selection(app.reference, today)
}

fn report_skipped(warnings: &[WireWarning]) {
    for warning in warnings {
        println!(
            "{} entry {}: {}",
            "Skipped".yellow(),
            warning.index,
            warning.reason
        );
    }
}

fn save_hint() {
    println!(
        "{}",
        "Run `clubsched schedule save` to publish your changes.".dimmed()
    );
}

pub async fn show(app: &App) -> Result<()> {
    let schedule = Schedule::open(app).await?;
    schedule.print();
    Ok(())
}

pub async fn pull(app: &App, force: bool) -> Result<()> {
    let schedule = Schedule::connect(app).await?;

    let pending = schedule
        .drafts
        .load(schedule.owner.as_deref())?
        .filter(|draft| draft.dirty);
    if pending.is_some() && !force {
        let confirmed = Confirm::new()
            .with_prompt("Discard your unsaved changes?")
            .default(false)
            .interact()?;
        if !confirmed {
            return Ok(());
        }
    }

    schedule.pull().await?;
    schedule.persist()?;
    schedule.print();
    Ok(())
}

pub async fn add(app: &App, slot: &SlotArgs, kind: EventKind) -> Result<()> {
    let selection = selection(app, slot)?;
    let schedule = Schedule::open(app).await?;

    let event = match schedule.session.add_selection(&selection, kind) {
        Ok(event) => event,
        Err(reason) => bail!("Can't add that slot: {reason}"),
    };
    schedule.persist()?;

    println!("Added {}", event.render());
    save_hint();
    Ok(())
}

pub async fn move_slot(app: &App, id: &str, slot: &SlotArgs) -> Result<()> {
    let target = selection(app, slot)?;
    let schedule = Schedule::open(app).await?;
    let event = schedule.find(id)?;

    match schedule.session.move_event(&event.id, &target)? {
        DragOutcome::Moved(moved) => {
            schedule.persist()?;
            println!("Moved {}", moved.render());
            save_hint();
        }
        DragOutcome::Unchanged => {
            bail!(
                "Can't move there; {} stays where it was.\n\
                Slots must start and end on the same day and can't go on the all-day row.",
                event
            );
        }
    }
    Ok(())
}

pub async fn remove(app: &App, id: &str, force: bool) -> Result<()> {
    let schedule = Schedule::open(app).await?;
    let event = schedule.find(id)?;

    if !force {
        println!("   {}", event.render());
        let confirmed = Confirm::new()
            .with_prompt("Remove this slot?")
            .default(false)
            .interact()?;
        if !confirmed {
            return Ok(());
        }
    }

    schedule.session.remove_event(&event.id);
    schedule.persist()?;

    println!("Removed {}", event);
    save_hint();
    Ok(())
}

pub async fn save(app: &App) -> Result<()> {
    let schedule = Schedule::open(app).await?;

    if schedule.session.state() == SyncState::Clean {
        println!("{}", "Nothing to save".dimmed());
        return Ok(());
    }

    let count = schedule.session.events().len();
    let spinner = tui::create_spinner(format!("Saving {count} {}", pluralize("slot", count)));
    let result = schedule.session.save().await;
    spinner.finish_and_clear();

    // Failed saves keep the draft, so nothing typed is lost.
    schedule.persist()?;
    let warnings = result?;

    println!("Saved {count} {}.", pluralize("slot", count));
    if !warnings.is_empty() {
        println!(
            "{}",
            "The server's reply had entries that couldn't be read; showing your copy.".dimmed()
        );
        report_skipped(&warnings);
    }
    Ok(())
}

pub async fn reset(app: &App, force: bool) -> Result<()> {
    let schedule = Schedule::connect(app).await?;

    if !force {
        let confirmed = Confirm::new()
            .with_prompt("Delete your whole schedule from the server?")
            .default(false)
            .interact()?;
        if !confirmed {
            return Ok(());
        }
    }

    let spinner = tui::create_spinner("Clearing schedule");
    let result = schedule.session.reset().await;
    spinner.finish_and_clear();
    result?;

    schedule.persist()?;
    println!("Schedule cleared.");
    Ok(())
}
