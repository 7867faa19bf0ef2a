//! Authorized-user token file and access-token refresh.

use calclaw_core::error::CalendarError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar";

/// Tokens this close to expiry are refreshed before use.
const EXPIRY_SKEW_SECS: i64 = 60;

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.into()
}

/// On-disk credentials of an authorized user.
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthorizedUser {
    #[serde(default)]
    pub token: Option<String>,

    #[serde(default)]
    pub refresh_token: Option<String>,

    #[serde(default = "default_token_uri")]
    pub token_uri: String,

    pub client_id: String,

    pub client_secret: String,

    #[serde(default)]
    pub scopes: Vec<String>,

    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for AuthorizedUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizedUser")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("token_uri", &self.token_uri)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("scopes", &self.scopes)
            .field("expiry", &self.expiry)
            .finish()
    }
}

impl AuthorizedUser {
    /// Whether the access token is missing or about to expire.
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        match (&self.token, self.expiry) {
            (None, _) => true,
            (Some(_), Some(expiry)) => expiry - Duration::seconds(EXPIRY_SKEW_SECS) <= now,
            (Some(_), None) => false,
        }
    }

    pub(crate) fn apply(&mut self, response: TokenResponse) {
        self.token = Some(response.access_token);
        if let Some(refresh) = response.refresh_token {
            self.refresh_token = Some(refresh);
        }
        self.expiry = response
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(secs));
    }
}

/// Successful response of the token endpoint.
#[derive(Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Reads and writes the authorized-user file, refreshing the access token
/// when it expires. Refreshes are serialized.
pub struct TokenStore {
    path: PathBuf,
    http: reqwest::Client,
    user: Mutex<AuthorizedUser>,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>, user: AuthorizedUser, http: reqwest::Client) -> Self {
        Self {
            path: path.into(),
            http,
            user: Mutex::new(user),
        }
    }

    /// Load a token file written by `calclaw auth`.
    pub fn load(path: &Path, http: reqwest::Client) -> Result<Self, CalendarError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CalendarError::Auth(format!(
                "cannot read token file {}: {e} (run `calclaw auth`)",
                path.display()
            ))
        })?;
        let user: AuthorizedUser = serde_json::from_str(&content).map_err(|e| {
            CalendarError::Auth(format!("malformed token file {}: {e}", path.display()))
        })?;
        debug!(path = %path.display(), "Loaded calendar token");
        Ok(Self::new(path, user, http))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A usable access token, refreshing first when needed.
    pub async fn access_token(&self) -> Result<String, CalendarError> {
        let mut user = self.user.lock().await;
        if user.needs_refresh(Utc::now()) {
            return self.refresh_locked(&mut user).await;
        }
        user.token
            .clone()
            .ok_or_else(|| CalendarError::Auth("no access token".into()))
    }

    /// Force a refresh (used after the API rejects the current token).
    pub async fn refresh(&self) -> Result<String, CalendarError> {
        let mut user = self.user.lock().await;
        self.refresh_locked(&mut user).await
    }

    async fn refresh_locked(&self, user: &mut AuthorizedUser) -> Result<String, CalendarError> {
        let refresh_token = user.refresh_token.clone().ok_or_else(|| {
            CalendarError::Auth("access token expired and no refresh token is stored".into())
        })?;

        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token.as_str()),
            ("client_id", user.client_id.as_str()),
            ("client_secret", user.client_secret.as_str()),
        ];

        let response = self
            .http
            .post(&user.token_uri)
            .form(&params)
            .send()
            .await
            .map_err(|e| CalendarError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CalendarError::Auth(format!(
                "token refresh failed: HTTP {status} - {body}"
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| CalendarError::Auth(format!("invalid token response: {e}")))?;
        user.apply(token);
        save(&self.path, user)?;
        info!(path = %self.path.display(), "Refreshed calendar access token");

        user.token
            .clone()
            .ok_or_else(|| CalendarError::Auth("no access token".into()))
    }
}

/// Write the token file, creating parent directories.
pub fn save(path: &Path, user: &AuthorizedUser) -> Result<(), CalendarError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| CalendarError::Auth(format!("cannot create {}: {e}", parent.display())))?;
    }
    let json = serde_json::to_string_pretty(user)
        .map_err(|e| CalendarError::Auth(e.to_string()))?;
    std::fs::write(path, json)
        .map_err(|e| CalendarError::Auth(format!("cannot write {}: {e}", path.display())))
}
