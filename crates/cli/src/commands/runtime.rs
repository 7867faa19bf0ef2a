//! Assemble the agent from configuration.

use std::sync::Arc;

use calclaw_agent::{AgentLoop, SystemPrompt, now_at_offset};
use calclaw_config::AppConfig;
use calclaw_core::calendar::CalendarApi;
use calclaw_core::tool::ToolRegistry;
use calclaw_tools::{CalendarOperations, calendar_registry};
use tracing::info;

pub struct Runtime {
    pub config: AppConfig,
    pub agent: Arc<AgentLoop>,
    pub model: String,
    pub calendar_connected: bool,
}

pub fn load_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
    Ok(AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?)
}

/// The calendar tools over whatever client the token file allows.
pub async fn calendar_tools(config: &AppConfig) -> Result<(ToolRegistry, bool), Box<dyn std::error::Error>> {
    let client = calclaw_google::connect(&config.calendar, &AppConfig::config_dir())
        .await
        .map(|client| Arc::new(client) as Arc<dyn CalendarApi>);
    let connected = client.is_some();
    let ops = Arc::new(CalendarOperations::new(client));
    let registry = calendar_registry(ops, &config.calendar.default_timezone)?;
    Ok((registry, connected))
}

pub async fn build() -> Result<Runtime, Box<dyn std::error::Error>> {
    let config = load_config()?;

    let route = match calclaw_providers::build_from_config(&config).require_default() {
        Ok(route) => route,
        Err(e) => {
            eprintln!();
            eprintln!("  ERROR: {e}");
            eprintln!();
            eprintln!("  Set one of these environment variables:");
            eprintln!("    GROQ_API_KEY    = 'gsk_...'   (default provider)");
            eprintln!("    OPENAI_API_KEY  = 'sk-...'");
            eprintln!("    CALCLAW_API_KEY = '...'       (generic)");
            eprintln!();
            eprintln!(
                "  Or add api_key to {}",
                AppConfig::config_dir().join("config.toml").display()
            );
            eprintln!();
            return Err(e.into());
        }
    };

    let (tools, calendar_connected) = calendar_tools(&config).await?;
    if !calendar_connected {
        eprintln!("  Google Calendar is not connected; run `calclaw auth` to authorize.");
    }

    let history = calclaw_history::open(&config.history, &AppConfig::config_dir()).await?;

    let system_prompt = SystemPrompt::from_config(&config.agent)
        .render(now_at_offset(config.agent.utc_offset_hours));

    let agent = AgentLoop::new(
        route.provider,
        &route.model,
        config.default_temperature,
        Arc::new(tools),
        history,
        system_prompt,
    )
    .with_max_iterations(config.agent.max_tool_iterations)
    .with_max_tokens(config.default_max_tokens);

    info!(
        provider = %config.default_provider,
        model = %route.model,
        history = %config.history.backend,
        calendar_connected,
        "Agent ready"
    );

    Ok(Runtime {
        config,
        agent: Arc::new(agent),
        model: route.model,
        calendar_connected,
    })
}
