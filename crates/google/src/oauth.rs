//! Installed-application OAuth flow with a loopback redirect and PKCE.
//!
//! `calclaw auth` reads the client secret downloaded from the cloud console,
//! prints the consent URL, waits for the browser to hit the loopback listener,
//! and exchanges the code for an authorized-user token file.

use crate::token::{AuthorizedUser, CALENDAR_SCOPE, DEFAULT_TOKEN_URI, TokenResponse};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use calclaw_core::error::CalendarError;
use rand::RngCore;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tracing::{debug, warn};

const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";

/// OAuth client credentials of an installed (or web) application.
#[derive(Clone)]
pub struct ClientSecret {
    pub client_id: String,
    pub client_secret: String,
    pub auth_uri: String,
    pub token_uri: String,
}

impl std::fmt::Debug for ClientSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSecret")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("auth_uri", &self.auth_uri)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

#[derive(Deserialize)]
struct ClientSecretFile {
    installed: Option<ClientSecretSection>,
    web: Option<ClientSecretSection>,
}

#[derive(Deserialize)]
struct ClientSecretSection {
    client_id: String,
    client_secret: String,
    auth_uri: Option<String>,
    token_uri: Option<String>,
}

impl ClientSecret {
    pub fn load(path: &Path) -> Result<Self, CalendarError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CalendarError::Auth(format!("cannot read credentials {}: {e}", path.display()))
        })?;
        Self::from_json(&content)
    }

    /// Parse a `credentials.json` with an `installed` or `web` section.
    pub fn from_json(content: &str) -> Result<Self, CalendarError> {
        let file: ClientSecretFile = serde_json::from_str(content)
            .map_err(|e| CalendarError::Auth(format!("malformed credentials file: {e}")))?;
        let section = file.installed.or(file.web).ok_or_else(|| {
            CalendarError::Auth("credentials file has no `installed` or `web` section".into())
        })?;
        Ok(Self {
            client_id: section.client_id,
            client_secret: section.client_secret,
            auth_uri: section.auth_uri.unwrap_or_else(|| DEFAULT_AUTH_URI.into()),
            token_uri: section.token_uri.unwrap_or_else(|| DEFAULT_TOKEN_URI.into()),
        })
    }
}

/// PKCE verifier and its S256 challenge.
#[derive(Debug, Clone)]
pub struct PkceChallenge {
    pub verifier: String,
    pub challenge: String,
}

impl PkceChallenge {
    pub fn generate() -> Self {
        let verifier = random_token();
        let challenge = URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()));
        Self {
            verifier,
            challenge,
        }
    }
}

fn random_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// A pending authorization: the loopback listener is already bound.
pub struct InstalledFlow {
    secret: ClientSecret,
    listener: TcpListener,
    redirect_uri: String,
    pkce: PkceChallenge,
    state: String,
}

impl InstalledFlow {
    /// Bind the loopback listener on an ephemeral port.
    pub async fn bind(secret: ClientSecret) -> Result<Self, CalendarError> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| CalendarError::Auth(format!("cannot bind loopback listener: {e}")))?;
        let port = listener
            .local_addr()
            .map_err(|e| CalendarError::Auth(e.to_string()))?
            .port();

        Ok(Self {
            secret,
            listener,
            redirect_uri: format!("http://127.0.0.1:{port}/"),
            pkce: PkceChallenge::generate(),
            state: random_token(),
        })
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// The consent URL the user opens in a browser.
    pub fn authorize_url(&self) -> Result<reqwest::Url, CalendarError> {
        reqwest::Url::parse_with_params(
            &self.secret.auth_uri,
            &[
                ("response_type", "code"),
                ("client_id", self.secret.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("scope", CALENDAR_SCOPE),
                ("access_type", "offline"),
                ("prompt", "consent"),
                ("code_challenge", self.pkce.challenge.as_str()),
                ("code_challenge_method", "S256"),
                ("state", self.state.as_str()),
            ],
        )
        .map_err(|e| CalendarError::Auth(format!("invalid auth_uri: {e}")))
    }

    /// Wait for the browser redirect, then exchange the code for tokens.
    pub async fn complete(
        self,
        http: &reqwest::Client,
        timeout: Duration,
    ) -> Result<AuthorizedUser, CalendarError> {
        let code = tokio::time::timeout(timeout, wait_for_code(&self.listener, &self.state))
            .await
            .map_err(|_| CalendarError::Auth("timed out waiting for authorization".into()))??;

        debug!("Received authorization code, exchanging");

        let params = [
            ("grant_type", "authorization_code"),
            ("code", code.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("client_id", self.secret.client_id.as_str()),
            ("client_secret", self.secret.client_secret.as_str()),
            ("code_verifier", self.pkce.verifier.as_str()),
        ];

        let response = http
            .post(&self.secret.token_uri)
            .form(&params)
            .send()
            .await
            .map_err(|e| CalendarError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CalendarError::Auth(format!(
                "token exchange failed: HTTP {status} - {body}"
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| CalendarError::Auth(format!("invalid token response: {e}")))?;

        let mut user = AuthorizedUser {
            token: None,
            refresh_token: None,
            token_uri: self.secret.token_uri,
            client_id: self.secret.client_id,
            client_secret: self.secret.client_secret,
            scopes: vec![CALENDAR_SCOPE.into()],
            expiry: None,
        };
        user.apply(token);
        Ok(user)
    }
}

async fn wait_for_code(listener: &TcpListener, expected_state: &str) -> Result<String, CalendarError> {
    loop {
        let (mut socket, _) = listener
            .accept()
            .await
            .map_err(|e| CalendarError::Auth(e.to_string()))?;

        let mut request_line = String::new();
        BufReader::new(&mut socket)
            .read_line(&mut request_line)
            .await
            .map_err(|e| CalendarError::Auth(e.to_string()))?;

        let params: HashMap<String, String> = request_line
            .split_whitespace()
            .nth(1)
            .and_then(|path| reqwest::Url::parse(&format!("http://127.0.0.1{path}")).ok())
            .map(|url| url.query_pairs().into_owned().collect())
            .unwrap_or_default();

        if let Some(error) = params.get("error") {
            respond(&mut socket, "400 Bad Request", "Authorization failed. You can close this window.").await;
            return Err(CalendarError::Auth(format!("authorization denied: {error}")));
        }

        let Some(code) = params.get("code") else {
            // Browsers also ask for /favicon.ico
            respond(&mut socket, "404 Not Found", "").await;
            continue;
        };

        if params.get("state").map(String::as_str) != Some(expected_state) {
            warn!("OAuth callback carried an unexpected state");
            respond(&mut socket, "400 Bad Request", "State mismatch. You can close this window.").await;
            return Err(CalendarError::Auth("state mismatch in authorization callback".into()));
        }

        respond(
            &mut socket,
            "200 OK",
            "Calendar access granted. You can close this window and return to your terminal.",
        )
        .await;
        return Ok(code.clone());
    }
}

async fn respond(socket: &mut tokio::net::TcpStream, status: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {status}\r\n\
         Content-Type: text/plain; charset=utf-8\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n\
         {body}",
        body.len()
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}
