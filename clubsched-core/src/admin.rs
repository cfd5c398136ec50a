//! Aggregated availability for admins.
//!
//! The server reports one slot per hour with a headcount. Slots are never
//! mutated: every fetch replaces the whole set.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, error, info};

use crate::api::AdminApi;
use crate::constants::ALL_ROLES;
use crate::error::ApiError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminAvailabilitySlot {
    pub start_date: DateTime<FixedOffset>,
    pub end_date: DateTime<FixedOffset>,
    pub number_of_people: u32,
    pub max_people_available: u32,
    pub role: String,
}

impl AdminAvailabilitySlot {
    /// Share of the role available in this slot, 0 when the role is empty.
    pub fn occupancy_percentage(&self) -> f64 {
        if self.max_people_available == 0 {
            return 0.0;
        }
        f64::from(self.number_of_people) / f64::from(self.max_people_available) * 100.0
    }

    pub fn severity(&self) -> Severity {
        band_for(self.occupancy_percentage())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Low,
    Medium,
    Good,
}

impl Severity {
    pub fn color(self) -> &'static str {
        match self {
            Severity::Low => "red",
            Severity::Medium => "orange",
            Severity::Good => "green",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Low => write!(f, "Low"),
            Severity::Medium => write!(f, "Medium"),
            Severity::Good => write!(f, "Good"),
        }
    }
}

/// Boundaries belong to the higher band.
pub fn band_for(occupancy_percentage: f64) -> Severity {
    if occupancy_percentage >= 70.0 {
        Severity::Good
    } else if occupancy_percentage >= 40.0 {
        Severity::Medium
    } else {
        Severity::Low
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RoleFilter {
    #[default]
    All,
    Role(String),
}

impl RoleFilter {
    pub fn parse(s: &str) -> Self {
        if s == ALL_ROLES {
            RoleFilter::All
        } else {
            RoleFilter::Role(s.to_string())
        }
    }

    /// Value for the `role` query parameter; `None` means no filter.
    pub fn query_value(&self) -> Option<&str> {
        match self {
            RoleFilter::All => None,
            RoleFilter::Role(role) => Some(role),
        }
    }

    pub fn matches(&self, role: &str) -> bool {
        match self {
            RoleFilter::All => true,
            RoleFilter::Role(wanted) => wanted == role,
        }
    }
}

impl fmt::Display for RoleFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.query_value().unwrap_or(ALL_ROLES))
    }
}

/// Identity for `All`, exact match otherwise.
pub fn filter_by_role(
    slots: Vec<AdminAvailabilitySlot>,
    filter: &RoleFilter,
) -> Vec<AdminAvailabilitySlot> {
    slots.into_iter().filter(|s| filter.matches(&s.role)).collect()
}

/// What the admin calendar shows for one slot.
#[derive(Debug, Clone, PartialEq)]
pub struct AdminEntry {
    pub title: String,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub role: String,
    pub occupancy_percentage: f64,
    pub severity: Severity,
}

impl From<&AdminAvailabilitySlot> for AdminEntry {
    fn from(slot: &AdminAvailabilitySlot) -> Self {
        AdminEntry {
            title: format!("{}/{}", slot.number_of_people, slot.max_people_available),
            start: slot.start_date,
            end: slot.end_date,
            role: slot.role.clone(),
            occupancy_percentage: slot.occupancy_percentage(),
            severity: slot.severity(),
        }
    }
}

impl AdminEntry {
    pub fn color(&self) -> &'static str {
        self.severity.color()
    }
}

/// Count of slots per severity band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BandSummary {
    pub low: usize,
    pub medium: usize,
    pub good: usize,
}

pub fn summarize(slots: &[AdminAvailabilitySlot]) -> BandSummary {
    slots
        .iter()
        .fold(BandSummary::default(), |mut acc, slot| {
            match slot.severity() {
                Severity::Low => acc.low += 1,
                Severity::Medium => acc.medium += 1,
                Severity::Good => acc.good += 1,
            }
            acc
        })
}

/// Parameters a fetch was issued with. A response is only applied if the
/// view still has the same parameters when it arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminQuery {
    pub filter: RoleFilter,
    pub token: String,
}

/// Admin view state: active filter, token and the last fetched slots.
#[derive(Debug, Default)]
pub struct AdminView {
    filter: RoleFilter,
    token: Option<String>,
    slots: Vec<AdminAvailabilitySlot>,
    stale: bool,
}

impl AdminView {
    pub fn new(token: Option<String>, filter: RoleFilter) -> Self {
        AdminView {
            filter,
            token,
            slots: Vec::new(),
            stale: true,
        }
    }

    pub fn filter(&self) -> &RoleFilter {
        &self.filter
    }

    pub fn slots(&self) -> &[AdminAvailabilitySlot] {
        &self.slots
    }

    pub fn entries(&self) -> Vec<AdminEntry> {
        self.slots.iter().map(AdminEntry::from).collect()
    }

    /// True when the filter or token changed since the last applied fetch.
    pub fn needs_refresh(&self) -> bool {
        self.stale
    }

    pub fn set_filter(&mut self, filter: RoleFilter) {
        if self.filter != filter {
            self.filter = filter;
            self.stale = true;
        }
    }

    pub fn set_token(&mut self, token: Option<String>) {
        if self.token != token {
            self.token = token;
            self.stale = true;
        }
    }

    /// Capture the parameters for a fetch.
    pub fn query(&self) -> Result<AdminQuery, ApiError> {
        let token = self.token.clone().ok_or(ApiError::NotAuthenticated)?;
        Ok(AdminQuery {
            filter: self.filter.clone(),
            token,
        })
    }

    /// Replace the displayed slots with a fetch result.
    ///
    /// Returns false and leaves the view untouched if `query` no longer
    /// matches the current filter and token.
    pub fn apply(&mut self, query: &AdminQuery, slots: Vec<AdminAvailabilitySlot>) -> bool {
        if query.filter != self.filter || Some(&query.token) != self.token.as_ref() {
            debug!(filter = %query.filter, "discarding admin slots for an outdated query");
            return false;
        }

        self.slots = filter_by_role(slots, &self.filter);
        self.stale = false;
        true
    }

    /// Fetch and apply in one step.
    pub async fn refresh<A: AdminApi>(&mut self, api: &A) -> Result<bool, ApiError> {
        let query = self.query()?;
        let slots = api
            .fetch_slots(&query.token, &query.filter)
            .await
            .inspect_err(|e| error!(error = %e, "failed to fetch admin availability"))?;
        info!(filter = %query.filter, count = slots.len(), "fetched admin availability");
        Ok(self.apply(&query, slots))
    }
}
