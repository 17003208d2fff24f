//! `netrag serve` — MCP server over stdio.

use rmcp::ServiceExt;

use crate::config::AppConfig;
use crate::mcp::NetragServer;

pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    let orchestrator = super::build_orchestrator(config).await?;
    let server = NetragServer::new(orchestrator);

    log::info!("netrag MCP server listening on stdio");
    let service = server
        .serve(rmcp::transport::stdio())
        .await
        .map_err(|e| anyhow::anyhow!("MCP transport failed: {e}"))?;
    service
        .waiting()
        .await
        .map_err(|e| anyhow::anyhow!("MCP server terminated abnormally: {e}"))?;
    Ok(())
}
