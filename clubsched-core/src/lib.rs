//! Core library for clubsched.
//!
//! - `event`, `selection` and `wire` model availability and its JSON form
//! - `session` holds the signed-in user's schedule and syncs it
//! - `admin` aggregates everyone's availability for administrators
//! - `api` talks to the scheduler backend

pub mod admin;
pub mod api;
pub mod auth;
pub mod clubsched_config;
pub mod constants;
pub mod draft;
pub mod error;
pub mod event;
pub mod roles;
pub mod selection;
pub mod session;
pub mod store;
pub mod wire;

pub use admin::{AdminEntry, AdminView, RoleFilter, Severity, band_for, filter_by_role};
pub use api::ApiClient;
pub use auth::{AuthState, CredentialStore};
pub use clubsched_config::ClubSchedConfig;
pub use draft::DraftStore;
pub use error::{ApiError, ClubSchedError, ClubSchedResult, SessionError};
pub use event::{AvailabilityEvent, DragOutcome, EventId, EventKind, EventSlot, Timestamp};
pub use selection::{Rejected, Selection};
pub use session::{Draft, ScheduleSession, SyncState};
pub use wire::{WireEvent, WireWarning, from_wire, to_wire};
