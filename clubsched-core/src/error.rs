//! Error types for clubsched.

use thiserror::Error;

/// Errors returned by the HTTP API client.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not signed in")]
    NotAuthenticated,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Non-2xx response. `detail` is the server's message, passed through verbatim.
    #[error("{detail}")]
    Server { status: u16, detail: String },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    /// True when the server rejected our credentials.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_) | ApiError::NotAuthenticated)
    }
}

/// Errors raised by [`crate::session::ScheduleSession`].
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Not signed in")]
    NotAuthenticated,

    #[error("A save is already in progress")]
    SaveInFlight,

    #[error("Event {0} already exists")]
    DuplicateEvent(String),

    #[error("Event {0} not found")]
    EventNotFound(String),

    /// The response belongs to a request issued before the token changed or a newer load started.
    #[error("Discarded a response for an outdated request")]
    Stale,

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Errors that can occur in clubsched operations.
#[derive(Error, Debug)]
pub enum ClubSchedError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid timezone '{0}'")]
    InvalidTimezone(String),

    #[error("Invalid roles: {0}")]
    InvalidRoles(String),

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Result type alias for clubsched operations.
pub type ClubSchedResult<T> = Result<T, ClubSchedError>;
