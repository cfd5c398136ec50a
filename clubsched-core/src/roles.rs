//! Club roles of the signed-in user.

use crate::api::protocol::UpdateRoles;
use crate::constants::{ADMIN_ROLE, VALID_ROLES};
use crate::error::{ClubSchedError, ClubSchedResult};

/// A checked role assignment, ready to send.
///
/// The server re-validates everything; these checks only catch mistakes
/// before a round-trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolesUpdate {
    roles: Vec<String>,
    password: Option<String>,
}

impl RolesUpdate {
    pub fn new(roles: Vec<String>, password: Option<String>) -> ClubSchedResult<Self> {
        let unknown: Vec<&str> = roles
            .iter()
            .map(String::as_str)
            .filter(|r| !VALID_ROLES.contains(r))
            .collect();
        if !unknown.is_empty() {
            return Err(ClubSchedError::InvalidRoles(format!(
                "unknown role(s) {}; expected one of {}",
                unknown.join(", "),
                VALID_ROLES.join(", ")
            )));
        }

        let mut deduped: Vec<String> = Vec::with_capacity(roles.len());
        for role in roles {
            if !deduped.contains(&role) {
                deduped.push(role);
            }
        }

        let password = password.filter(|p| !p.is_empty());
        if requires_password(&deduped) && password.is_none() {
            return Err(ClubSchedError::InvalidRoles(
                "the Admin role requires the admin password".into(),
            ));
        }

        Ok(RolesUpdate {
            roles: deduped,
            password,
        })
    }

    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    pub(crate) fn into_request(self) -> UpdateRoles {
        UpdateRoles {
            roles: self.roles,
            password: self.password,
        }
    }
}

/// True if the set includes a role that must be unlocked with the admin password.
pub fn requires_password(roles: &[String]) -> bool {
    roles.iter().any(|r| r == ADMIN_ROLE)
}
