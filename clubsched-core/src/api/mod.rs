//! HTTP API of the scheduler backend.

pub mod client;
pub mod protocol;

use std::future::Future;

use crate::admin::{AdminAvailabilitySlot, RoleFilter};
use crate::constants::{
    DEFAULT_ADMIN_PREFIX, DEFAULT_AUTH_PREFIX, DEFAULT_ROLES_PREFIX, DEFAULT_SCHEDULE_PREFIX,
};
use crate::error::ApiError;
use crate::wire::WireEvent;

pub use client::ApiClient;

/// Path prefixes of the four resource groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routes {
    pub schedule: String,
    pub admin: String,
    pub roles: String,
    pub auth: String,
}

impl Default for Routes {
    fn default() -> Self {
        Routes {
            schedule: DEFAULT_SCHEDULE_PREFIX.to_string(),
            admin: DEFAULT_ADMIN_PREFIX.to_string(),
            roles: DEFAULT_ROLES_PREFIX.to_string(),
            auth: DEFAULT_AUTH_PREFIX.to_string(),
        }
    }
}

/// Storage of the signed-in user's schedule.
pub trait ScheduleApi {
    /// Current stored entries, unvalidated.
    fn fetch_schedule(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<Vec<serde_json::Value>, ApiError>> + Send;

    /// Replace the stored set with `events`. Returns the accepted entries,
    /// or `None` when the server only acknowledges.
    fn replace_schedule(
        &self,
        token: &str,
        events: Vec<WireEvent>,
    ) -> impl Future<Output = Result<Option<Vec<serde_json::Value>>, ApiError>> + Send;
}

/// Read side of the aggregated availability.
pub trait AdminApi {
    fn fetch_slots(
        &self,
        token: &str,
        filter: &RoleFilter,
    ) -> impl Future<Output = Result<Vec<AdminAvailabilitySlot>, ApiError>> + Send;
}
