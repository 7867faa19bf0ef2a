//! `calclaw doctor`: Diagnose configuration and credentials.

use calclaw_config::AppConfig;
use calclaw_google::{ClientSecret, TokenStore, http_client};

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 calclaw doctor");
    println!();

    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");
    let mut problems = 0;

    if config_path.exists() {
        println!("✅ Config file: {}", config_path.display());
    } else {
        println!("⚠️  No config file (run `calclaw init`); using defaults");
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("✅ Config is valid");
            config
        }
        Err(e) => {
            println!("❌ Config error: {e}");
            return Ok(());
        }
    };

    match calclaw_providers::build_from_config(&config).require_default() {
        Ok(route) => println!(
            "✅ LLM provider: {} (model: {})",
            config.default_provider, route.model
        ),
        Err(e) => {
            println!("❌ LLM provider: {e} (set GROQ_API_KEY or CALCLAW_API_KEY)");
            problems += 1;
        }
    }

    let credentials_path = AppConfig::resolve_path(&config.calendar.credentials_file);
    match ClientSecret::load(&credentials_path) {
        Ok(_) => println!("✅ OAuth client: {}", credentials_path.display()),
        Err(e) => {
            println!("❌ OAuth client: {e}");
            problems += 1;
        }
    }

    let token_path = AppConfig::resolve_path(&config.calendar.token_file);
    let http = http_client(config.calendar.request_timeout_secs);
    match TokenStore::load(&token_path, http) {
        Ok(store) => match store.access_token().await {
            Ok(_) => println!("✅ Calendar token: {}", token_path.display()),
            Err(e) => {
                println!("❌ Calendar token is unusable: {e} (run `calclaw auth`)");
                problems += 1;
            }
        },
        Err(_) => {
            println!("❌ No calendar token at {} (run `calclaw auth`)", token_path.display());
            problems += 1;
        }
    }

    match config.history.backend.as_str() {
        "memory" => println!("✅ History: in memory (lost on exit)"),
        backend => println!(
            "✅ History: {backend} at {}",
            AppConfig::resolve_path(&config.history.path).display()
        ),
    }

    println!();
    if problems == 0 {
        println!("All checks passed.");
    } else {
        println!("{problems} problem(s) found.");
    }
    Ok(())
}
