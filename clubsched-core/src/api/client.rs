//! HTTP client for the scheduler backend.

use reqwest::{Method, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::admin::{AdminAvailabilitySlot, RoleFilter};
use crate::api::protocol::{
    Endpoint, FetchAdminSlots, FetchRoles, FetchSchedule, Login, LoginResponse, ReplaceSchedule,
    RolesResponse, Signup, Verify, VerifyResponse,
};
use crate::api::{AdminApi, Routes, ScheduleApi};
use crate::error::{ApiError, ClubSchedError, ClubSchedResult};
use crate::roles::RolesUpdate;
use crate::wire::WireEvent;

/// HTTP client for the scheduler API
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    routes: Routes,
}

/// Error body as sent by the backend (`{"detail": ...}`).
#[derive(Deserialize)]
struct ErrorResponse {
    detail: serde_json::Value,
}

impl ApiClient {
    pub fn new(base_url: &str, routes: Routes, timeout: Duration) -> ClubSchedResult<Self> {
        Url::parse(base_url)
            .map_err(|e| ClubSchedError::Config(format!("Invalid api_url '{base_url}': {e}")))?;

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClubSchedError::Config(format!("Could not build HTTP client: {e}")))?;

        Ok(ApiClient {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            routes,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a typed request and decode its response.
    ///
    /// GET endpoints are sent as query parameters, everything else as a
    /// JSON body. An empty success body decodes as `null`.
    pub async fn call<E: Endpoint>(
        &self,
        token: Option<&str>,
        endpoint: &E,
    ) -> Result<E::Response, ApiError> {
        let url = format!("{}{}", self.base_url, endpoint.path(&self.routes));
        debug!(method = %E::METHOD, %url, "api request");

        let mut req = self.http.request(E::METHOD, &url);
        req = if E::METHOD == Method::GET {
            req.query(endpoint)
        } else {
            req.json(endpoint)
        };

        if E::AUTHENTICATED {
            let token = token.ok_or(ApiError::NotAuthenticated)?;
            req = req.bearer_auth(token);
        }

        let resp = req.send().await?;
        let status = resp.status();
        let body = resp.bytes().await?;

        if !status.is_success() {
            return Err(error_from_response(status, &body));
        }

        let body: &[u8] = if body.is_empty() { b"null" } else { &body };
        serde_json::from_slice(body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// POST {auth}/login
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let req = Login {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.call(None, &req).await
    }

    /// POST {auth}/signup
    pub async fn signup(&self, name: &str, email: &str, password: &str) -> Result<(), ApiError> {
        let req = Signup {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        self.call(None, &req).await.map(|_| ())
    }

    /// GET {auth}/verify
    pub async fn verify(&self, token: &str) -> Result<VerifyResponse, ApiError> {
        self.call(Some(token), &Verify {}).await
    }

    /// GET {roles}/
    pub async fn roles(&self, token: &str) -> Result<RolesResponse, ApiError> {
        self.call(Some(token), &FetchRoles {}).await
    }

    /// POST {roles}/
    pub async fn update_roles(
        &self,
        token: &str,
        update: RolesUpdate,
    ) -> Result<RolesResponse, ApiError> {
        self.call(Some(token), &update.into_request()).await
    }
}

impl ScheduleApi for ApiClient {
    async fn fetch_schedule(&self, token: &str) -> Result<Vec<serde_json::Value>, ApiError> {
        self.call(Some(token), &FetchSchedule {})
            .await?
            .into_entries()
            .ok_or_else(|| ApiError::Decode("expected a schedule array".into()))
    }

    async fn replace_schedule(
        &self,
        token: &str,
        events: Vec<WireEvent>,
    ) -> Result<Option<Vec<serde_json::Value>>, ApiError> {
        let body = self.call(Some(token), &ReplaceSchedule { events }).await?;
        Ok(body.into_entries())
    }
}

impl AdminApi for ApiClient {
    async fn fetch_slots(
        &self,
        token: &str,
        filter: &RoleFilter,
    ) -> Result<Vec<AdminAvailabilitySlot>, ApiError> {
        let req = FetchAdminSlots {
            role: filter.query_value().map(str::to_string),
        };
        self.call(Some(token), &req).await
    }
}

fn error_from_response(status: StatusCode, body: &[u8]) -> ApiError {
    let detail = match serde_json::from_slice::<ErrorResponse>(body) {
        Ok(ErrorResponse {
            detail: serde_json::Value::String(s),
        }) => s,
        Ok(ErrorResponse { detail }) => detail.to_string(),
        Err(_) if !body.is_empty() => String::from_utf8_lossy(body).into_owned(),
        Err(_) => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized(detail),
        _ => ApiError::Server {
            status: status.as_u16(),
            detail,
        },
    }
}
