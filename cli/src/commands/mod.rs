pub mod devices;
pub mod ingest;
pub mod query;
pub mod serve;

use std::sync::Arc;

use anyhow::Result;

use crate::config::AppConfig;
use crate::corpus;
use crate::orchestrator::{self, Orchestrator};

/// Assemble the orchestrator from configuration and seed the default
/// corpus when the store is empty.
pub async fn build_orchestrator(config: AppConfig) -> Result<Arc<Orchestrator>> {
    let orchestrator = orchestrator::bootstrap(config).await?;
    let seeded = corpus::seed(orchestrator.documents()).await?;
    if seeded > 0 {
        log::info!("seeded {seeded} built-in documents");
    }
    Ok(Arc::new(orchestrator))
}
