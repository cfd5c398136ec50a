//! JSON representation of availability events.
//!
//! Each entry carries exactly one of two field groups:
//!
//! ```json
//! { "id": "…", "type": "Recurring", "title": "Recurring", "color": "green",
//!   "dayOfWeek": 1, "startTime": "09:00:00", "endTime": "10:00:00" }
//! { "id": "…", "type": "OneOff", "title": "OneOff", "color": "yellow",
//!   "start": "2025-06-02T09:00:00-07:00", "end": "2025-06-02T10:00:00-07:00" }
//! ```
//!
//! Ingest is lenient: an entry that can't be turned into an event is
//! dropped with a warning and the rest of the batch is kept.

use chrono::{NaiveTime, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::warn;

use crate::event::{AvailabilityEvent, EventId, EventKind, EventSlot, Timestamp};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireEvent {
    pub id: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<EventKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    // Recurring shape
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_week: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<NaiveTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<NaiveTime>,

    // One-off shape
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<Timestamp>,
}

/// Why an entry was dropped on ingest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// Not an object, or a field has the wrong type.
    Unreadable(String),
    /// Both the recurring and the one-off fields are present.
    BothShapes,
    /// Neither field group is present.
    NoShape,
    /// Only some fields of a group are present.
    PartialShape,
    /// `type` names the other shape.
    KindMismatch,
    DayOutOfRange(u8),
    InvalidInterval(String),
    DuplicateId(String),
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::Unreadable(e) => write!(f, "unreadable entry: {e}"),
            DropReason::BothShapes => write!(f, "both recurring and one-off fields present"),
            DropReason::NoShape => write!(f, "neither recurring nor one-off fields present"),
            DropReason::PartialShape => write!(f, "incomplete time fields"),
            DropReason::KindMismatch => write!(f, "type does not match the time fields"),
            DropReason::DayOutOfRange(d) => write!(f, "dayOfWeek {d} is not in 0-6"),
            DropReason::InvalidInterval(e) => write!(f, "invalid interval: {e}"),
            DropReason::DuplicateId(id) => write!(f, "duplicate id {id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireWarning {
    /// Position of the entry in the incoming array.
    pub index: usize,
    pub reason: DropReason,
}

/// Outcome of reading a wire array: the well-formed events in order,
/// plus one warning per dropped entry.
#[derive(Debug, Clone, Default)]
pub struct WireIngest {
    pub events: Vec<AvailabilityEvent>,
    pub warnings: Vec<WireWarning>,
}

/// Body shapes the schedule endpoint is known to return.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ScheduleBody {
    Bare(Vec<serde_json::Value>),
    Wrapped { schedule: Vec<serde_json::Value> },
    /// Acknowledgement without the stored set (e.g. `{"message": "..."}`).
    Ack(serde_json::Value),
}

impl ScheduleBody {
    pub fn into_entries(self) -> Option<Vec<serde_json::Value>> {
        match self {
            ScheduleBody::Bare(entries) | ScheduleBody::Wrapped { schedule: entries } => {
                Some(entries)
            }
            ScheduleBody::Ack(_) => None,
        }
    }
}

impl From<&AvailabilityEvent> for WireEvent {
    fn from(event: &AvailabilityEvent) -> Self {
        let kind = event.kind();
        let mut wire = WireEvent {
            id: event.id.to_string(),
            kind: Some(kind),
            title: Some(kind.label().to_string()),
            color: Some(kind.color().to_string()),
            day_of_week: None,
            start_time: None,
            end_time: None,
            start: None,
            end: None,
        };

        match &event.slot {
            EventSlot::Recurring {
                day_of_week,
                start_time,
                end_time,
            } => {
                wire.day_of_week = Some(day_of_week.num_days_from_sunday() as u8);
                wire.start_time = Some(*start_time);
                wire.end_time = Some(*end_time);
            }
            EventSlot::OneOff { start, end } => {
                wire.start = Some(start.clone());
                wire.end = Some(end.clone());
            }
        }

        wire
    }
}

impl WireEvent {
    /// Convert to an event, checking the one-shape rule and the interval invariants.
    pub fn into_event(self, reference: Tz) -> Result<AvailabilityEvent, DropReason> {
        let recurring = [
            self.day_of_week.is_some(),
            self.start_time.is_some(),
            self.end_time.is_some(),
        ];
        let one_off = [self.start.is_some(), self.end.is_some()];

        let has_recurring = recurring.iter().any(|f| *f);
        let has_one_off = one_off.iter().any(|f| *f);

        let slot = match (has_recurring, has_one_off) {
            (true, true) => return Err(DropReason::BothShapes),
            (false, false) => return Err(DropReason::NoShape),
            (true, false) => {
                let (Some(day), Some(start_time), Some(end_time)) =
                    (self.day_of_week, self.start_time, self.end_time)
                else {
                    return Err(DropReason::PartialShape);
                };
                EventSlot::Recurring {
                    day_of_week: weekday_from_sunday(day).ok_or(DropReason::DayOutOfRange(day))?,
                    start_time,
                    end_time,
                }
            }
            (false, true) => {
                let (Some(start), Some(end)) = (self.start, self.end) else {
                    return Err(DropReason::PartialShape);
                };
                EventSlot::OneOff { start, end }
            }
        };

        if self.kind.is_some_and(|kind| kind != slot.kind()) {
            return Err(DropReason::KindMismatch);
        }

        slot.validate(reference)
            .map_err(|e| DropReason::InvalidInterval(e.to_string()))?;

        Ok(AvailabilityEvent {
            id: EventId::from(self.id),
            slot,
        })
    }
}

/// Serialize events for the server, preserving order.
pub fn to_wire(events: &[AvailabilityEvent]) -> Vec<WireEvent> {
    events.iter().map(WireEvent::from).collect()
}

/// Read a wire array, dropping malformed entries.
pub fn from_wire(entries: &[serde_json::Value], reference: Tz) -> WireIngest {
    let mut ingest = WireIngest::default();
    let mut seen: HashSet<EventId> = HashSet::new();

    for (index, value) in entries.iter().enumerate() {
        let result = serde_json::from_value::<WireEvent>(value.clone())
            .map_err(|e| DropReason::Unreadable(e.to_string()))
            .and_then(|wire| wire.into_event(reference))
            .and_then(|event| {
                if seen.insert(event.id.clone()) {
                    Ok(event)
                } else {
                    Err(DropReason::DuplicateId(event.id.to_string()))
                }
            });

        match result {
            Ok(event) => ingest.events.push(event),
            Err(reason) => {
                warn!(index, %reason, "dropping malformed schedule entry");
                ingest.warnings.push(WireWarning { index, reason });
            }
        }
    }

    ingest
}

fn weekday_from_sunday(day: u8) -> Option<Weekday> {
    match day {
        0 => Some(Weekday::Sun),
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        _ => None,
    }
}
