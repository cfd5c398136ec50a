//! Terminal rendering for clubsched-core types.

use clubsched_core::admin::BandSummary;
use clubsched_core::{AdminEntry, AvailabilityEvent, EventKind, Severity, SyncState};
use owo_colors::OwoColorize;

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

/// Ids are UUIDs; eight characters are enough to tell them apart.
const SHORT_ID_LEN: usize = 8;

fn short_id(id: &str) -> &str {
    id.get(..SHORT_ID_LEN).unwrap_or(id)
}

impl Render for AvailabilityEvent {
    fn render(&self) -> String {
        let text = self.to_string();
        let text = match self.kind() {
            EventKind::Recurring => text.green().to_string(),
            EventKind::OneOff => text.yellow().to_string(),
        };
        format!(
            "{} {} {}",
            short_id(self.id.as_str()).dimmed(),
            text,
            format!("({})", self.kind()).dimmed()
        )
    }
}

impl Render for SyncState {
    fn render(&self) -> String {
        match self {
            SyncState::Clean => "saved".green().to_string(),
            SyncState::Dirty => "unsaved changes".yellow().to_string(),
            SyncState::Saving => "saving".dimmed().to_string(),
            SyncState::Error(e) => format!("save failed: {e}").red().to_string(),
        }
    }
}

/// Terminals have no named orange, so Medium is drawn in true colour.
const ORANGE: (u8, u8, u8) = (255, 165, 0);

fn colorize_severity(severity: Severity, text: &str) -> String {
    match severity {
        Severity::Low => text.red().to_string(),
        Severity::Medium => {
            let (r, g, b) = ORANGE;
            text.truecolor(r, g, b).to_string()
        }
        Severity::Good => text.green().to_string(),
    }
}

impl Render for AdminEntry {
    fn render(&self) -> String {
        let when = format!(
            "{} {}-{}",
            self.start.format("%a %Y-%m-%d"),
            self.start.format("%H:%M"),
            self.end.format("%H:%M")
        );
        format!(
            "{} {:>7} {:>5}  {}",
            when,
            colorize_severity(self.severity, &self.title),
            format!("{:.0}%", self.occupancy_percentage).dimmed(),
            self.role
        )
    }
}

impl Render for BandSummary {
    fn render(&self) -> String {
        format!(
            "{} {}  {} {}  {} {}",
            colorize_severity(Severity::Good, &self.good.to_string()),
            "good".dimmed(),
            colorize_severity(Severity::Medium, &self.medium.to_string()),
            "medium".dimmed(),
            colorize_severity(Severity::Low, &self.low.to_string()),
            "low".dimmed()
        )
    }
}

/// Simple pluralization helper
pub fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{word}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_id_handles_short_ids() {
        assert_eq!(short_id("abc"), "abc");
        assert_eq!(short_id("0123456789abcdef"), "01234567");
    }

    #[test]
    fn medium_band_is_orange() {
        let orange = "\u{1b}[38;2;255;165;0m";
        assert!(colorize_severity(Severity::Medium, "Medium").contains(orange));
        assert!(!colorize_severity(Severity::Low, "Low").contains(orange));

        let summary = BandSummary {
            low: 1,
            medium: 2,
            good: 3,
        };
        assert!(summary.render().contains(&format!("{orange}2")));
    }

    #[test]
    fn pluralizes() {
        assert_eq!(pluralize("event", 1), "event");
        assert_eq!(pluralize("event", 2), "events");
    }
}
