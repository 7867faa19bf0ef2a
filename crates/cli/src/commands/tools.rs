//! `calclaw tools`: Print the tool catalog as JSON.

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = super::runtime::load_config()?;
    let (registry, _) = super::runtime::calendar_tools(&config).await?;
    println!("{}", serde_json::to_string_pretty(&registry.definitions())?);
    Ok(())
}
