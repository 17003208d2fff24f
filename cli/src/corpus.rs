//! Built-in knowledge documents.
//!
//! Seeded into the document store on startup when the corpus is empty so
//! retrieval and tool-mention weighting work out of the box. Operators
//! replace or extend these via `netrag ingest`.

use netrag_core::DocumentKind;
use netrag_rag::documents::{DocumentStore, DraftDocument};
use netrag_rag::RagError;

pub fn default_documents() -> Vec<DraftDocument> {
    vec![
        DraftDocument {
            id: Some("doc-tool-list-devices".to_string()),
            title: "list_network_devices tool".to_string(),
            kind: DocumentKind::ToolHelp,
            usefulness: 0.9,
            body: "Use the list_network_devices tool for inventory questions: device \
                   counts, regional breakdowns, and environment filters. It returns \
                   every matching device with a health summary. Prefer it whenever the \
                   question asks how many devices exist or lists devices in a region."
                .to_string(),
        },
        DraftDocument {
            id: Some("doc-tool-device-details".to_string()),
            title: "get_device_details tool".to_string(),
            kind: DocumentKind::ToolHelp,
            usefulness: 0.9,
            body: "Use the get_device_details tool when a question names a specific \
                   device such as OLT17PROP01. It fetches the full configuration of \
                   one device and runs health scoring, returning score, status, and \
                   recommendations for that device alone."
                .to_string(),
        },
        DraftDocument {
            id: Some("doc-tool-network-query".to_string()),
            title: "network_query tool".to_string(),
            kind: DocumentKind::ToolHelp,
            usefulness: 0.8,
            body: "Use the network_query tool for cross-system analysis: impact \
                   questions, dependency chains, and anything that needs both the \
                   knowledge base and live data. It fuses documentation retrieval, \
                   data-quality assessment, and health scoring into one answer."
                .to_string(),
        },
        DraftDocument {
            id: Some("doc-olt-health-framework".to_string()),
            title: "FTTH OLT health assessment framework".to_string(),
            kind: DocumentKind::Guide,
            usefulness: 0.8,
            body: "FTTH OLT health starts from a base score of 100. Devices with no \
                   configured services are critical; unmanaged or incompletely \
                   configured devices lose substantial points; high-capacity uplinks \
                   earn a small bonus. Production devices additionally must meet the \
                   environment floor for service count, management, and configuration \
                   completeness."
                .to_string(),
        },
    ]
}

/// Seed the default corpus when the store is empty.
pub async fn seed(documents: &DocumentStore) -> Result<usize, RagError> {
    if !documents.is_empty() {
        return Ok(0);
    }
    let drafts = default_documents();
    let count = drafts.len();
    for draft in drafts {
        documents.create(draft).await?;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use netrag_rag::documents::SearchConfig;
    use netrag_rag::embeddings::{EmbeddingProvider, FallbackEmbedder};
    use netrag_rag::store::VectorStore;

    #[tokio::test]
    async fn seeding_is_idempotent() {
        let fallback = FallbackEmbedder::new(32, FallbackEmbedder::default_boosts());
        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(fallback.clone());
        let store = DocumentStore::new(
            SearchConfig::default(),
            embedder,
            fallback,
            Arc::new(VectorStore::new(32)),
        );

        let first = seed(&store).await.unwrap();
        assert_eq!(first, default_documents().len());
        let second = seed(&store).await.unwrap();
        assert_eq!(second, 0);
        assert_eq!(store.len(), first);
    }
}
