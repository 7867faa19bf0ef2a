//! Google Calendar access for calclaw.
//!
//! - [`GoogleCalendarClient`] implements `calclaw_core::CalendarApi` over the v3 REST API
//! - [`TokenStore`] keeps the authorized-user token file fresh
//! - [`InstalledFlow`] performs the one-time loopback consent flow

pub mod client;
pub mod oauth;
pub mod token;

pub use client::GoogleCalendarClient;
pub use oauth::{ClientSecret, InstalledFlow, PkceChallenge};
pub use token::{AuthorizedUser, TokenStore};

use calclaw_config::{CalendarConfig, resolve_in};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// HTTP client shared by the token store and the calendar client.
pub fn http_client(timeout_secs: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Open a calendar client from the configured token file.
///
/// Returns `None` (after logging why) when there is no usable token, so the
/// agent can still run and report the service as unavailable.
pub async fn connect(config: &CalendarConfig, base_dir: &Path) -> Option<GoogleCalendarClient> {
    let token_path = resolve_in(base_dir, &config.token_file);
    let http = http_client(config.request_timeout_secs);

    let store = match TokenStore::load(&token_path, http.clone()) {
        Ok(store) => store,
        Err(e) => {
            warn!(error = %e, "Google Calendar is not connected");
            return None;
        }
    };

    if let Err(e) = store.access_token().await {
        warn!(error = %e, path = %token_path.display(), "Stored calendar token is unusable");
        return None;
    }

    match GoogleCalendarClient::new(&config.api_base_url, Arc::new(store), http) {
        Ok(client) => {
            info!(base_url = %config.api_base_url, "Google Calendar connected");
            Some(client)
        }
        Err(e) => {
            warn!(error = %e, "Google Calendar client could not be built");
            None
        }
    }
}
