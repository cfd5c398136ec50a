//! Calendar selections.
//!
//! A selection is what the user drags out on a week grid: a start, an end,
//! and whether it was made on the all-day row. Selections carry the zone the
//! user entered them in; they are resolved against the reference zone before
//! becoming events.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use chrono_tz::Tz;
use std::fmt;

use crate::constants::{BUSINESS_DAY_END, BUSINESS_DAY_START};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub all_day: bool,
}

/// Why a selection could not become an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejected {
    /// Start and end fall on different calendar days.
    CrossesDayBoundary,
    /// End is not after start.
    EmptyInterval,
    /// The wall-clock time doesn't exist (or exists twice) in the reference zone.
    AmbiguousLocalTime,
}

impl fmt::Display for Rejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejected::CrossesDayBoundary => write!(f, "selection crosses midnight"),
            Rejected::EmptyInterval => write!(f, "selection ends before it starts"),
            Rejected::AmbiguousLocalTime => write!(f, "time does not exist in the reference timezone"),
        }
    }
}

impl Selection {
    pub fn timed(start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> Self {
        Selection {
            start,
            end,
            all_day: false,
        }
    }

    /// An all-day row selection for `date`, as entered in `zone`.
    pub fn all_day<Z: TimeZone>(date: NaiveDate, zone: &Z) -> Result<Self, Rejected> {
        let start = localize(zone, date.and_time(NaiveTime::MIN))?.fixed_offset();
        let end = start + chrono::Duration::days(1);
        Ok(Selection {
            start,
            end,
            all_day: true,
        })
    }

    /// Build a timed selection from wall-clock input in `zone`.
    pub fn from_local<Z: TimeZone>(
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
        zone: &Z,
    ) -> Result<Self, Rejected> {
        let start = localize(zone, date.and_time(start))?.fixed_offset();
        let end = localize(zone, date.and_time(end))?.fixed_offset();
        Ok(Selection::timed(start, end))
    }

    /// Resolve the selection to a start and end in the reference zone.
    ///
    /// All-day selections become the business window on the selected day.
    /// Timed selections must start and end on the same reference-zone day.
    pub fn resolve(&self, reference: Tz) -> Result<(DateTime<Tz>, DateTime<Tz>), Rejected> {
        if self.all_day {
            let day = self.start.date_naive();
            let start = localize(&reference, day.and_time(BUSINESS_DAY_START))?;
            let end = localize(&reference, day.and_time(BUSINESS_DAY_END))?;
            return Ok((start, end));
        }

        let start = self.start.with_timezone(&reference);
        let end = self.end.with_timezone(&reference);

        if start.date_naive() != end.date_naive() {
            return Err(Rejected::CrossesDayBoundary);
        }
        if start >= end {
            return Err(Rejected::EmptyInterval);
        }

        Ok((start, end))
    }
}

fn localize<Z: TimeZone>(zone: &Z, naive: NaiveDateTime) -> Result<DateTime<Z>, Rejected> {
    zone.from_local_datetime(&naive)
        .single()
        .ok_or(Rejected::AmbiguousLocalTime)
}
