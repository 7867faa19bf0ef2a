//! `calclaw auth`: One-time Google Calendar authorization.

use std::time::Duration;

use calclaw_config::AppConfig;
use calclaw_google::{ClientSecret, InstalledFlow, http_client, token};

pub async fn run(timeout_secs: u64) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::runtime::load_config()?;
    let credentials_path = AppConfig::resolve_path(&config.calendar.credentials_file);
    let token_path = AppConfig::resolve_path(&config.calendar.token_file);

    let secret = ClientSecret::load(&credentials_path).map_err(|e| {
        format!(
            "{e}\n  Download an OAuth client (Desktop app) from Google Cloud Console \
             and save it as {}",
            credentials_path.display()
        )
    })?;

    let flow = InstalledFlow::bind(secret).await?;
    let url = flow.authorize_url()?;

    println!();
    println!("  Open this URL in your browser to authorize calclaw:");
    println!();
    println!("  {url}");
    println!();
    println!("  Waiting for the redirect on {} ...", flow.redirect_uri());

    let http = http_client(config.calendar.request_timeout_secs);
    let user = flow.complete(&http, Duration::from_secs(timeout_secs)).await?;
    token::save(&token_path, &user)?;

    println!();
    println!("  ✅ Authorized. Token saved to {}", token_path.display());
    println!();
    Ok(())
}
