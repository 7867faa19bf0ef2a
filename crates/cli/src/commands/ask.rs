//! `calclaw ask`: Single-message mode.

use calclaw_core::message::SessionId;

pub async fn run(message: String, session: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = super::runtime::build().await?;
    let session = session.map(SessionId::from).unwrap_or_default();

    eprint!("  Thinking...");
    let reply = runtime.agent.handle_turn(&session, &message).await;
    eprint!("\r              \r");

    println!("{}", reply?);
    eprintln!("  (session: {session})");
    Ok(())
}
