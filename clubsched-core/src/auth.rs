//! Sign-in state.
//!
//! The token is persisted in `credentials.json` and reused until an
//! explicit logout or until the server stops accepting it.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, warn};

use crate::api::ApiClient;
use crate::api::protocol::User;
use crate::error::{ClubSchedError, ClubSchedResult};
use crate::store::JsonFile;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub token: String,
    pub user: User,
}

pub struct CredentialStore {
    file: JsonFile,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CredentialStore {
            file: JsonFile::owner_only(path),
        }
    }

    pub fn load(&self) -> ClubSchedResult<Option<Credentials>> {
        self.file.read()
    }

    pub fn save(&self, credentials: &Credentials) -> ClubSchedResult<()> {
        self.file.write(credentials)
    }

    pub fn clear(&self) -> ClubSchedResult<bool> {
        self.file.remove()
    }
}

pub struct AuthState {
    store: CredentialStore,
    credentials: Option<Credentials>,
}

impl AuthState {
    /// Signed out, without looking at the store.
    pub fn new(store: CredentialStore) -> Self {
        AuthState {
            store,
            credentials: None,
        }
    }

    /// Pick up persisted credentials and check them with the server.
    ///
    /// Credentials the server rejects are deleted. If the server can't be
    /// reached they are kept as-is, so offline commands still know the user.
    pub async fn init(store: CredentialStore, api: &ApiClient) -> ClubSchedResult<Self> {
        let Some(mut credentials) = store.load()? else {
            return Ok(AuthState::new(store));
        };

        match api.verify(&credentials.token).await {
            Ok(verified) => {
                credentials.user = verified.user;
                if let Some(token) = verified.token {
                    credentials.token = token;
                }
                store.save(&credentials)?;
            }
            Err(e) if e.is_auth_failure() => {
                warn!(error = %e, "stored session rejected, signing out");
                store.clear()?;
                return Ok(AuthState::new(store));
            }
            Err(e) => {
                warn!(error = %e, "could not verify stored session");
            }
        }

        Ok(AuthState {
            store,
            credentials: Some(credentials),
        })
    }

    pub async fn login(
        &mut self,
        api: &ApiClient,
        email: &str,
        password: &str,
    ) -> ClubSchedResult<&User> {
        let response = api.login(email, password).await?;
        let credentials = Credentials {
            token: response.access_token,
            user: response.user,
        };
        self.store.save(&credentials)?;
        info!(user = credentials.user.display_name(), "signed in");

        Ok(&self.credentials.insert(credentials).user)
    }

    /// Forget the token, in memory and on disk. Returns whether anyone was signed in.
    pub fn logout(&mut self) -> ClubSchedResult<bool> {
        let had_file = self.store.clear()?;
        Ok(self.credentials.take().is_some() || had_file)
    }

    pub fn token(&self) -> Option<&str> {
        self.credentials.as_ref().map(|c| c.token.as_str())
    }

    pub fn user(&self) -> Option<&User> {
        self.credentials.as_ref().map(|c| &c.user)
    }

    pub fn is_signed_in(&self) -> bool {
        self.credentials.is_some()
    }

    /// Key under which this user's drafts are stored.
    pub fn owner(&self) -> Option<&str> {
        self.user().map(User::display_name)
    }
}

/// Register a new account. The server's message is returned verbatim on failure.
pub async fn signup(
    api: &ApiClient,
    name: &str,
    email: &str,
    password: &str,
    confirmation: &str,
) -> ClubSchedResult<()> {
    if password != confirmation {
        return Err(ClubSchedError::PasswordMismatch);
    }
    api.signup(name, email, password).await?;
    info!(email, "account created");
    Ok(())
}
