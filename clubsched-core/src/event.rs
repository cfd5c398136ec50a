//! Availability events.
//!
//! An availability event is a busy interval a member commits to. It is
//! either recurring (weekday plus wall-clock times in the reference zone)
//! or one-off (two absolute instants on the same day). The two shapes are
//! variants of [`EventSlot`], so an event can never carry both or neither.

use chrono::{DateTime, Datelike, FixedOffset, NaiveTime, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::cmp::Ordering;
use std::fmt;
use tracing::debug;
use uuid::Uuid;

use crate::selection::{Rejected, Selection};

/// Opaque event identifier. Generated locally as a UUID v4, but any string
/// the server hands back is kept as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    pub fn generate() -> Self {
        EventId(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EventId {
    fn from(s: &str) -> Self {
        EventId(s.to_string())
    }
}

impl From<String> for EventId {
    fn from(s: String) -> Self {
        EventId(s)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// Repeats every week. Older clients called this "Permanent".
    #[serde(alias = "Permanent", alias = "Recurrent")]
    Recurring,
    /// Happens once. Older clients called this "Temporary".
    #[serde(alias = "Temporary")]
    OneOff,
}

impl EventKind {
    pub fn label(self) -> &'static str {
        match self {
            EventKind::Recurring => "Recurring",
            EventKind::OneOff => "OneOff",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            EventKind::Recurring => "green",
            EventKind::OneOff => "yellow",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An absolute instant that remembers the text it was read from.
///
/// The server may send `Z` or fractional seconds; writing an entry back
/// reuses that text so loaded entries go out exactly as they came in.
/// Comparison looks at the instant only.
#[derive(Debug, Clone)]
pub struct Timestamp {
    at: DateTime<FixedOffset>,
    text: Option<String>,
}

impl Timestamp {
    pub fn at(&self) -> DateTime<FixedOffset> {
        self.at
    }
}

impl From<DateTime<FixedOffset>> for Timestamp {
    fn from(at: DateTime<FixedOffset>) -> Self {
        Timestamp { at, text: None }
    }
}

impl PartialEq for Timestamp {
    fn eq(&self, other: &Self) -> bool {
        self.at == other.at
    }
}

impl Eq for Timestamp {}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.at.cmp(&other.at)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.text {
            Some(text) => f.write_str(text),
            None => f.write_str(&self.at.to_rfc3339()),
        }
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        let at = text
            .parse::<DateTime<FixedOffset>>()
            .map_err(de::Error::custom)?;
        Ok(Timestamp {
            at,
            text: Some(text),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventSlot {
    Recurring {
        day_of_week: Weekday,
        start_time: NaiveTime,
        end_time: NaiveTime,
    },
    OneOff { start: Timestamp, end: Timestamp },
}

impl EventSlot {
    /// Build a slot of `kind` from a selection, resolved in `reference`.
    pub fn from_selection(
        selection: &Selection,
        kind: EventKind,
        reference: Tz,
    ) -> Result<Self, Rejected> {
        let (start, end) = selection.resolve(reference)?;

        Ok(match kind {
            EventKind::Recurring => EventSlot::Recurring {
                day_of_week: start.weekday(),
                start_time: start.time(),
                end_time: end.time(),
            },
            EventKind::OneOff => EventSlot::OneOff {
                start: start.fixed_offset().into(),
                end: end.fixed_offset().into(),
            },
        })
    }

    pub fn kind(&self) -> EventKind {
        match self {
            EventSlot::Recurring { .. } => EventKind::Recurring,
            EventSlot::OneOff { .. } => EventKind::OneOff,
        }
    }

    /// Check the per-kind invariants: a non-empty interval inside one day.
    pub fn validate(&self, reference: Tz) -> Result<(), Rejected> {
        match self {
            EventSlot::Recurring {
                start_time,
                end_time,
                ..
            } => {
                if start_time >= end_time {
                    return Err(Rejected::EmptyInterval);
                }
            }
            EventSlot::OneOff { start, end } => {
                let start_day = start.at().with_timezone(&reference).date_naive();
                let end_day = end.at().with_timezone(&reference).date_naive();
                if start_day != end_day {
                    return Err(Rejected::CrossesDayBoundary);
                }
                if start >= end {
                    return Err(Rejected::EmptyInterval);
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityEvent {
    pub id: EventId,
    pub slot: EventSlot,
}

/// Result of dragging an existing event to a new position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragOutcome {
    Moved(AvailabilityEvent),
    /// The drop target was refused; the caller must put the event back.
    Unchanged,
}

impl AvailabilityEvent {
    /// Create an event from a fresh selection. Always assigns a new id.
    pub fn from_selection(
        selection: &Selection,
        kind: EventKind,
        reference: Tz,
    ) -> Result<Self, Rejected> {
        let slot = EventSlot::from_selection(selection, kind, reference).inspect_err(|reason| {
            debug!(%reason, "selection discarded");
        })?;

        Ok(AvailabilityEvent {
            id: EventId::generate(),
            slot,
        })
    }

    /// Move the event to `target`, keeping its id and kind.
    ///
    /// The all-day row is never a valid drop target.
    pub fn apply_drag(&self, target: &Selection, reference: Tz) -> DragOutcome {
        if target.all_day {
            debug!(id = %self.id, "drag onto all-day row reverted");
            return DragOutcome::Unchanged;
        }

        match EventSlot::from_selection(target, self.kind(), reference) {
            Ok(slot) => DragOutcome::Moved(AvailabilityEvent {
                id: self.id.clone(),
                slot,
            }),
            Err(reason) => {
                debug!(id = %self.id, %reason, "drag reverted");
                DragOutcome::Unchanged
            }
        }
    }

    pub fn kind(&self) -> EventKind {
        self.slot.kind()
    }

    pub fn label(&self) -> &'static str {
        self.kind().label()
    }

    pub fn color(&self) -> &'static str {
        self.kind().color()
    }
}

impl fmt::Display for AvailabilityEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.slot {
            EventSlot::Recurring {
                day_of_week,
                start_time,
                end_time,
            } => write!(
                f,
                "every {} {}-{}",
                day_of_week,
                start_time.format("%H:%M"),
                end_time.format("%H:%M")
            ),
            EventSlot::OneOff { start, end } => write!(
                f,
                "{} {}-{}",
                start.at().format("%a %Y-%m-%d"),
                start.at().format("%H:%M"),
                end.at().format("%H:%M")
            ),
        }
    }
}
