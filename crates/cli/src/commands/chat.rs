//! `calclaw chat`: Interactive chat mode.

use std::io::Write;

use calclaw_core::message::SessionId;
use tokio::io::{AsyncBufReadExt, BufReader};

const EXIT_WORDS: &[&str] = &["exit", "quit", ":q"];

pub async fn run(session: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = super::runtime::build().await?;
    let session = session.map(SessionId::from).unwrap_or_default();

    println!();
    println!("  calclaw | {}", runtime.config.agent.assistant_name);
    println!();
    println!("  Provider:  {}", runtime.config.default_provider);
    println!("  Model:     {}", runtime.model);
    println!(
        "  Calendar:  {}",
        if runtime.calendar_connected { "connected" } else { "not connected" }
    );
    println!("  Session:   {session}");
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type 'exit' or Ctrl+C to quit.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if EXIT_WORDS.contains(&text.to_ascii_lowercase().as_str()) {
            break;
        }

        eprint!("  ...");
        let reply = runtime.agent.respond(&session, text).await;
        eprint!("\r     \r");
        println!();
        for line in reply.lines() {
            println!("  Assistant > {line}");
        }
        println!();
    }

    println!();
    println!("  Goodbye!");
    println!();
    Ok(())
}
