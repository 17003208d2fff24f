//! `netrag devices` — direct device listing without the analyzer.

use colored::Colorize;

use crate::config::AppConfig;

pub async fn run(
    config: AppConfig,
    device_type: &str,
    region: Option<&str>,
    environment: Option<&str>,
    filter: Option<&str>,
    limit: usize,
) -> anyhow::Result<()> {
    let orchestrator = super::build_orchestrator(config).await?;

    match orchestrator
        .list_devices(device_type, region, environment, filter, limit)
        .await
    {
        Ok(listing) => {
            println!("{listing}");
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {}", "✗".red().bold(), e);
            Err(e.into())
        }
    }
}
