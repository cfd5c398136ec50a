//! Parsing of slot arguments into calendar selections.

use anyhow::{Result, anyhow};
use chrono::{Datelike, Days, NaiveDate, NaiveTime, Weekday};
use chrono_tz::Tz;
use clap::{Args, ValueEnum};
use clubsched_core::{EventKind, Selection};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Recurring,
    OneOff,
}

impl From<KindArg> for EventKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Recurring => EventKind::Recurring,
            KindArg::OneOff => EventKind::OneOff,
        }
    }
}

/// Where on the week grid a slot goes.
#[derive(Debug, Clone, Args)]
pub struct SlotArgs {
    /// Weekday (e.g. "mon"); the next one on or after today is used
    #[arg(long, value_parser = parse_weekday, conflicts_with = "date", required_unless_present = "date")]
    pub day: Option<Weekday>,

    /// Calendar date (YYYY-MM-DD)
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Start time (e.g. "9", "09:30")
    #[arg(long, value_parser = parse_time, required_unless_present = "all_day")]
    pub start: Option<NaiveTime>,

    /// End time (e.g. "17", "17:30")
    #[arg(long, value_parser = parse_time, required_unless_present = "all_day")]
    pub end: Option<NaiveTime>,

    /// Select the whole bookable day
    #[arg(long, conflicts_with_all = ["start", "end"])]
    pub all_day: bool,

    /// Timezone the times are given in (defaults to the reference timezone)
    #[arg(long, value_parser = parse_tz)]
    pub tz: Option<Tz>,
}

impl SlotArgs {
    /// Build the selection these arguments describe, relative to `today`.
    pub fn selection(&self, reference: Tz, today: NaiveDate) -> Result<Selection> {
        let zone = self.tz.unwrap_or(reference);
        let date = match (self.date, self.day) {
            (Some(date), _) => date,
            (None, Some(day)) => next_weekday(today, day),
            (None, None) => return Err(anyhow!("Pass --day or --date")),
        };

        let selection = if self.all_day {
            Selection::all_day(date, &zone)
        } else {
            match (self.start, self.end) {
                (Some(start), Some(end)) => Selection::from_local(date, start, end, &zone),
                _ => return Err(anyhow!("Pass --start and --end, or --all-day")),
            }
        };

        selection.map_err(|reason| anyhow!("Invalid slot: {reason}"))
    }
}

/// The first `day` on or after `from`.
pub fn next_weekday(from: NaiveDate, day: Weekday) -> NaiveDate {
    let ahead = (7 + day.num_days_from_sunday() - from.weekday().num_days_from_sunday()) % 7;
    from + Days::new(u64::from(ahead))
}

pub fn parse_weekday(s: &str) -> Result<Weekday, String> {
    s.parse::<Weekday>()
        .map_err(|_| format!("'{s}' is not a weekday (try mon, tue, ...)"))
}

pub fn parse_time(s: &str) -> Result<NaiveTime, String> {
    let s = s.trim();
    ["%H:%M", "%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            s.parse::<u32>()
                .ok()
                .and_then(|hour| NaiveTime::from_hms_opt(hour, 0, 0))
        })
        .ok_or_else(|| format!("'{s}' is not a time (try 9, 09:30 or 17:00)"))
}

pub fn parse_tz(s: &str) -> Result<Tz, String> {
    s.parse::<Tz>()
        .map_err(|_| format!("'{s}' is not an IANA timezone (e.g. America/Vancouver)"))
}
