//! Loaded configuration and the clients built from it.

use anyhow::{Context, Result, bail};
use chrono_tz::Tz;
use clubsched_core::{ApiClient, AuthState, ClubSchedConfig, CredentialStore, DraftStore};

pub struct App {
    pub config: ClubSchedConfig,
    pub api: ApiClient,
    pub reference: Tz,
}

impl App {
    pub fn load() -> Result<Self> {
        let config = ClubSchedConfig::load().context("Failed to load configuration")?;
        let api = config.api_client()?;
        let reference = config.reference_tz()?;

        Ok(App {
            config,
            api,
            reference,
        })
    }

    pub fn credentials(&self) -> Result<CredentialStore> {
        Ok(CredentialStore::new(self.config.credentials_path()?))
    }

    pub fn drafts(&self) -> Result<DraftStore> {
        Ok(DraftStore::new(self.config.draft_path()?))
    }

    /// Stored credentials, checked with the server.
    pub async fn auth(&self) -> Result<AuthState> {
        Ok(AuthState::init(self.credentials()?, &self.api).await?)
    }

    /// Like [`App::auth`], but fails unless someone is signed in.
    pub async fn signed_in(&self) -> Result<(AuthState, String)> {
        let auth = self.auth().await?;
        let Some(token) = auth.token().map(str::to_string) else {
            bail!("Not signed in.\n\nSign in with:\n  clubsched login");
        };
        Ok((auth, token))
    }
}
