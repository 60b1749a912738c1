use anyhow::{Context, Result};
use orchestrator::configs::FederationConfig;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let path = fedforecast::config_path();
    let config = FederationConfig::from_file(&path)
        .with_context(|| format!("loading configuration from {}", path.display()))?;

    fedforecast::run(&config).await?;
    Ok(())
}
