//! Request and response types for the scheduler HTTP API.
//!
//! Every endpoint is a type implementing [`Endpoint`]; its associated
//! `Response` type fixes what the client decodes, so a call site can't
//! mix up bodies.

use reqwest::Method;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::admin::AdminAvailabilitySlot;
use crate::api::Routes;
use crate::wire::{ScheduleBody, WireEvent};

pub trait Endpoint: Serialize {
    type Response: DeserializeOwned;

    const METHOD: Method;

    /// Whether the call carries `Authorization: Bearer <token>`.
    const AUTHENTICATED: bool = true;

    fn path(&self, routes: &Routes) -> String;
}

// ============================================================================
// Auth
// ============================================================================

/// A signed-in user as the server describes it. Only the fields we show
/// are typed; the rest is kept so it survives a save/load of the credentials file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl User {
    pub fn display_name(&self) -> &str {
        self.email
            .as_deref()
            .or(self.id.as_deref())
            .unwrap_or("unknown user")
    }
}

#[derive(Debug, Serialize)]
pub struct Login {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub user: User,
}

impl Endpoint for Login {
    type Response = LoginResponse;
    const METHOD: Method = Method::POST;
    const AUTHENTICATED: bool = false;

    fn path(&self, routes: &Routes) -> String {
        format!("{}/login", routes.auth)
    }
}

#[derive(Debug, Serialize)]
pub struct Signup {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl Endpoint for Signup {
    type Response = serde::de::IgnoredAny;
    const METHOD: Method = Method::POST;
    const AUTHENTICATED: bool = false;

    fn path(&self, routes: &Routes) -> String {
        format!("{}/signup", routes.auth)
    }
}

#[derive(Debug, Serialize)]
pub struct Verify {}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyResponse {
    pub user: User,
    /// Some deployments hand back a refreshed token.
    #[serde(default)]
    pub token: Option<String>,
}

impl Endpoint for Verify {
    type Response = VerifyResponse;
    const METHOD: Method = Method::GET;

    fn path(&self, routes: &Routes) -> String {
        format!("{}/verify", routes.auth)
    }
}

// ============================================================================
// Schedule
// ============================================================================

#[derive(Debug, Serialize)]
pub struct FetchSchedule {}

impl Endpoint for FetchSchedule {
    type Response = ScheduleBody;
    const METHOD: Method = Method::GET;

    fn path(&self, routes: &Routes) -> String {
        format!("{}/", routes.schedule)
    }
}

/// Wholesale replacement of the stored schedule.
#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct ReplaceSchedule {
    pub events: Vec<WireEvent>,
}

impl Endpoint for ReplaceSchedule {
    type Response = ScheduleBody;
    const METHOD: Method = Method::POST;

    fn path(&self, routes: &Routes) -> String {
        format!("{}/", routes.schedule)
    }
}

// ============================================================================
// Admin
// ============================================================================

#[derive(Debug, Serialize)]
pub struct FetchAdminSlots {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl Endpoint for FetchAdminSlots {
    type Response = Vec<AdminAvailabilitySlot>;
    const METHOD: Method = Method::GET;

    fn path(&self, routes: &Routes) -> String {
        routes.admin.clone()
    }
}

// ============================================================================
// Roles
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RolesResponse {
    #[serde(default)]
    pub roles: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct FetchRoles {}

impl Endpoint for FetchRoles {
    type Response = RolesResponse;
    const METHOD: Method = Method::GET;

    fn path(&self, routes: &Routes) -> String {
        format!("{}/", routes.roles)
    }
}

/// Built through [`crate::roles::RolesUpdate`], which checks the request first.
#[derive(Debug, Serialize)]
pub struct UpdateRoles {
    pub roles: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl Endpoint for UpdateRoles {
    type Response = RolesResponse;
    const METHOD: Method = Method::POST;

    fn path(&self, routes: &Routes) -> String {
        format!("{}/", routes.roles)
    }
}
