//! `calclaw init`: Write a default configuration.

use calclaw_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    println!("🗓️  calclaw setup");
    println!();

    if config_path.exists() {
        println!("⚠️  Config already exists at: {}", config_path.display());
        println!("   Delete it first if you want to start over.");
        return Ok(());
    }

    std::fs::create_dir_all(&config_dir)?;
    std::fs::write(&config_path, AppConfig::default_toml())?;
    println!("✅ Created config: {}", config_path.display());

    let defaults = AppConfig::default();
    let credentials = AppConfig::resolve_path(&defaults.calendar.credentials_file);

    println!();
    println!("Next steps:");
    println!("  1. Set your API key:");
    println!("     export GROQ_API_KEY=\"gsk_...\"");
    println!("  2. Save your Google OAuth client file as:");
    println!("     {}", credentials.display());
    println!("  3. Authorize calendar access:");
    println!("     calclaw auth");
    println!("  4. Start chatting:");
    println!("     calclaw chat");

    Ok(())
}
