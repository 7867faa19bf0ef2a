//! `calclaw serve`: Start the HTTP gateway.

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = super::runtime::build().await?;
    let host = runtime.config.gateway.host.clone();
    let port = port_override.unwrap_or(runtime.config.gateway.port);

    println!("calclaw gateway");
    println!("   Listening: {host}:{port}");
    println!(
        "   Calendar:  {}",
        if runtime.calendar_connected { "connected" } else { "not connected" }
    );

    calclaw_gateway::start(runtime.agent, &host, port).await
}
