//! Shared constants.

use chrono::NaiveTime;

/// Zone the server pins recurring availability to.
pub const DEFAULT_REFERENCE_TIMEZONE: &str = "America/Vancouver";

/// First hour of the bookable day. All-day selections start here.
pub const BUSINESS_DAY_START: NaiveTime = match NaiveTime::from_hms_opt(7, 0, 0) {
    Some(t) => t,
    None => panic!("invalid business day start"),
};

/// End of the bookable day. All-day selections end here.
pub const BUSINESS_DAY_END: NaiveTime = match NaiveTime::from_hms_opt(19, 0, 0) {
    Some(t) => t,
    None => panic!("invalid business day end"),
};

/// Roles the server accepts.
pub const VALID_ROLES: [&str; 6] = ["Developer", "Volunteer", "President", "Admin", "Events", "Media"];

/// Role that requires the admin password.
pub const ADMIN_ROLE: &str = "Admin";

/// Pseudo-role meaning "every role".
pub const ALL_ROLES: &str = "All";

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_SCHEDULE_PREFIX: &str = "/schedule";
pub const DEFAULT_ADMIN_PREFIX: &str = "/admin";
pub const DEFAULT_ROLES_PREFIX: &str = "/roles";
pub const DEFAULT_AUTH_PREFIX: &str = "/auth";
pub const DEFAULT_REQUEST_TIMEOUT: &str = "10s";
