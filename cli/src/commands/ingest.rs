//! `netrag ingest` — load knowledge documents into the store.
//!
//! Reads a JSON array of draft documents, validates and embeds each, and
//! reports what was accepted. Rejected documents are listed with their
//! validation error; the rest still land.

use std::path::Path;

use anyhow::Context;
use colored::Colorize;

use netrag_rag::documents::DraftDocument;

use crate::config::AppConfig;

pub async fn run(config: AppConfig, path: &Path) -> anyhow::Result<()> {
    let snapshot_file = config.snapshot_file.clone();
    let orchestrator = super::build_orchestrator(config).await?;

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let drafts: Vec<DraftDocument> =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;

    let mut accepted = 0usize;
    let mut rejected = 0usize;
    for draft in drafts {
        let title = draft.title.clone();
        match orchestrator.documents().create(draft).await {
            Ok(doc) => {
                accepted += 1;
                println!("{} {} ({})", "✓".green(), doc.title, doc.id);
            }
            Err(e) => {
                rejected += 1;
                eprintln!("{} {title}: {e}", "✗".red());
            }
        }
    }

    println!(
        "\n{} {accepted} ingested, {rejected} rejected",
        "Done:".bold()
    );

    if let Some(snapshot) = snapshot_file {
        // The document store writes vectors through the shared store, so
        // persisting the snapshot here captures the new corpus.
        orchestrator.documents().save_vectors(&snapshot)?;
        println!("vector snapshot written to {}", snapshot.display());
    }

    Ok(())
}
