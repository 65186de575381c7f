//! Stats command - prints cache occupancy

use crate::config::AppConfig;

pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    let orchestrator = crate::create_orchestrator(&config).await?;
    let stats = orchestrator.stats()?;

    let report = serde_json::json!({
        "store": config.cache.store_path.display().to_string(),
        "stats": stats,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
