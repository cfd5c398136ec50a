//! Global clubsched configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono_tz::Tz;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::api::{ApiClient, Routes};
use crate::constants::{
    DEFAULT_ADMIN_PREFIX, DEFAULT_API_URL, DEFAULT_AUTH_PREFIX, DEFAULT_REFERENCE_TIMEZONE,
    DEFAULT_REQUEST_TIMEOUT, DEFAULT_ROLES_PREFIX, DEFAULT_SCHEDULE_PREFIX,
};
use crate::error::{ClubSchedError, ClubSchedResult};

const CONFIG_FILE: &str = "config.toml";
const CREDENTIALS_FILE: &str = "credentials.json";
const DRAFT_FILE: &str = "draft.json";

/// Environment variables with this prefix override the file,
/// e.g. `CLUBSCHED_API_URL`.
const ENV_PREFIX: &str = "CLUBSCHED";

fn default_api_url() -> String {
    DEFAULT_API_URL.into()
}
fn default_schedule_prefix() -> String {
    DEFAULT_SCHEDULE_PREFIX.into()
}
fn default_admin_prefix() -> String {
    DEFAULT_ADMIN_PREFIX.into()
}
fn default_roles_prefix() -> String {
    DEFAULT_ROLES_PREFIX.into()
}
fn default_auth_prefix() -> String {
    DEFAULT_AUTH_PREFIX.into()
}
fn default_reference_timezone() -> String {
    DEFAULT_REFERENCE_TIMEZONE.into()
}
fn default_request_timeout() -> String {
    DEFAULT_REQUEST_TIMEOUT.into()
}

/// Configuration at ~/.config/clubsched/config.toml
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ClubSchedConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_schedule_prefix")]
    pub schedule_prefix: String,
    #[serde(default = "default_admin_prefix")]
    pub admin_prefix: String,
    #[serde(default = "default_roles_prefix")]
    pub roles_prefix: String,
    #[serde(default = "default_auth_prefix")]
    pub auth_prefix: String,

    /// IANA zone in which days and weekdays are judged.
    #[serde(default = "default_reference_timezone")]
    pub reference_timezone: String,

    /// e.g. "10s", "1m 30s"
    #[serde(default = "default_request_timeout")]
    pub request_timeout: String,

    /// Where credentials and drafts are kept. Defaults to the config directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_dir: Option<PathBuf>,
}

impl Default for ClubSchedConfig {
    fn default() -> Self {
        ClubSchedConfig {
            api_url: default_api_url(),
            schedule_prefix: default_schedule_prefix(),
            admin_prefix: default_admin_prefix(),
            roles_prefix: default_roles_prefix(),
            auth_prefix: default_auth_prefix(),
            reference_timezone: default_reference_timezone(),
            request_timeout: default_request_timeout(),
            state_dir: None,
        }
    }
}

impl ClubSchedConfig {
    pub fn config_dir() -> ClubSchedResult<PathBuf> {
        Ok(dirs::config_dir()
            .ok_or_else(|| ClubSchedError::Config("Could not determine config directory".into()))?
            .join("clubsched"))
    }

    pub fn config_path() -> ClubSchedResult<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE))
    }

    /// Load ~/.config/clubsched/config.toml, writing a commented default
    /// on first run.
    pub fn load() -> ClubSchedResult<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            Self::create_default_config(&path)?;
        }

        Self::load_from(&path)
    }

    /// Load from `path` (optional) with environment overrides on top.
    pub fn load_from(path: &Path) -> ClubSchedResult<Self> {
        Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()
            .map_err(|e| ClubSchedError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| ClubSchedError::Config(e.to_string()))
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> ClubSchedResult<()> {
        let contents = format!(
            "\
# clubsched configuration

# Scheduler backend:
# api_url = \"{DEFAULT_API_URL}\"

# Route prefixes, if the backend is mounted elsewhere:
# schedule_prefix = \"{DEFAULT_SCHEDULE_PREFIX}\"
# admin_prefix = \"{DEFAULT_ADMIN_PREFIX}\"
# roles_prefix = \"{DEFAULT_ROLES_PREFIX}\"
# auth_prefix = \"{DEFAULT_AUTH_PREFIX}\"

# Timezone in which availability days are judged:
# reference_timezone = \"{DEFAULT_REFERENCE_TIMEZONE}\"

# Give up on the backend after:
# request_timeout = \"{DEFAULT_REQUEST_TIMEOUT}\"

# Where login credentials and unsaved edits are kept:
# state_dir = \"~/.config/clubsched\"
"
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ClubSchedError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| ClubSchedError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    pub fn routes(&self) -> Routes {
        Routes {
            schedule: self.schedule_prefix.trim_end_matches('/').to_string(),
            admin: self.admin_prefix.trim_end_matches('/').to_string(),
            roles: self.roles_prefix.trim_end_matches('/').to_string(),
            auth: self.auth_prefix.trim_end_matches('/').to_string(),
        }
    }

    pub fn reference_tz(&self) -> ClubSchedResult<Tz> {
        self.reference_timezone
            .parse::<Tz>()
            .map_err(|_| ClubSchedError::InvalidTimezone(self.reference_timezone.clone()))
    }

    pub fn request_timeout(&self) -> ClubSchedResult<Duration> {
        humantime::parse_duration(&self.request_timeout).map_err(|e| {
            ClubSchedError::Config(format!(
                "Invalid request_timeout '{}': {e}",
                self.request_timeout
            ))
        })
    }

    pub fn api_client(&self) -> ClubSchedResult<ApiClient> {
        ApiClient::new(&self.api_url, self.routes(), self.request_timeout()?)
    }

    /// Directory for credentials and drafts, with `~` expanded.
    pub fn state_dir(&self) -> ClubSchedResult<PathBuf> {
        match &self.state_dir {
            Some(dir) => Ok(PathBuf::from(
                shellexpand::tilde(&dir.to_string_lossy()).into_owned(),
            )),
            None => Self::config_dir(),
        }
    }

    pub fn credentials_path(&self) -> ClubSchedResult<PathBuf> {
        Ok(self.state_dir()?.join(CREDENTIALS_FILE))
    }

    pub fn draft_path(&self) -> ClubSchedResult<PathBuf> {
        Ok(self.state_dir()?.join(DRAFT_FILE))
    }

    /// The effective configuration as TOML.
    pub fn to_toml(&self) -> ClubSchedResult<String> {
        toml::to_string_pretty(self).map_err(|e| ClubSchedError::Serialization(e.to_string()))
    }
}
