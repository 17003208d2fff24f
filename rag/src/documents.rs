//! Document store: authoritative storage with business-value ranking.
//!
//! Documents and their vectors are written together; search ranks hits by a
//! weighted blend of similarity, usefulness, and recency so the corpus's
//! best operational material surfaces first.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::Utc;
use sha2::{Digest, Sha256};

use netrag_core::{Document, DocumentKind, ScoredDocument};

use crate::embeddings::{EmbeddingProvider, FallbackEmbedder};
use crate::error::RagError;
use crate::keywords::extract_keywords;
use crate::store::{VectorMeta, VectorStore};

const MIN_TITLE_LEN: usize = 5;
const MIN_BODY_LEN: usize = 50;
const MAX_KEYWORDS: usize = 8;

/// Ranking and filtering knobs for document search.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Minimum cosine similarity for vector hits.
    pub min_similarity: f32,
    /// Hits with usefulness below this are dropped.
    pub min_usefulness: f64,
    /// Documents updated within this window count as fully recent.
    pub recency_window_days: i64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_similarity: 0.5,
            min_usefulness: 0.3,
            recency_window_days: 90,
        }
    }
}

/// A document as submitted for ingestion, before validation and embedding.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DraftDocument {
    /// Explicit id; derived from the title hash when absent.
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    pub body: String,
    pub kind: DocumentKind,
    #[serde(default)]
    pub usefulness: f64,
}

/// Document store backed by the in-memory vector store.
pub struct DocumentStore {
    config: SearchConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    fallback: FallbackEmbedder,
    vectors: Arc<VectorStore>,
    docs: RwLock<HashMap<String, Document>>,
}

impl DocumentStore {
    pub fn new(
        config: SearchConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        fallback: FallbackEmbedder,
        vectors: Arc<VectorStore>,
    ) -> Self {
        Self {
            config,
            embedder,
            fallback,
            vectors,
            docs: RwLock::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.docs.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Persist the backing vector store to a JSON snapshot.
    pub fn save_vectors(&self, path: &std::path::Path) -> Result<(), RagError> {
        self.vectors.save(path)
    }

    /// Validate, embed, and store a document together with its vector.
    ///
    /// Embedding failures fall back to the deterministic embedder so
    /// ingestion stays total; the vector is tagged with the model that
    /// actually produced it.
    pub async fn create(&self, draft: DraftDocument) -> Result<Document, RagError> {
        let title = draft.title.trim();
        let body = draft.body.trim();
        if title.chars().count() < MIN_TITLE_LEN {
            return Err(RagError::Validation(format!(
                "title must be at least {MIN_TITLE_LEN} characters"
            )));
        }
        if body.chars().count() < MIN_BODY_LEN {
            return Err(RagError::Validation(format!(
                "body must be at least {MIN_BODY_LEN} characters"
            )));
        }

        let id = draft.id.clone().unwrap_or_else(|| derive_id(title));
        let keywords = extract_keywords(&format!("{title} {body}"), MAX_KEYWORDS);

        let (vector, model) = match self.embedder.embed(body).await {
            Ok(v) => (v, self.embedder.model_name().to_string()),
            Err(e) => {
                log::warn!("embedding provider failed ({e}); using fallback embedder");
                (
                    self.fallback.embed_text(body),
                    self.fallback.model_name().to_string(),
                )
            }
        };

        let now = Utc::now();
        let doc = Document {
            id: id.clone(),
            title: title.to_string(),
            body: body.to_string(),
            kind: draft.kind,
            keywords: keywords.clone(),
            usefulness: draft.usefulness.clamp(0.0, 1.0),
            view_count: 0,
            created_at: now,
            updated_at: now,
        };

        // Vector first so a store rejection leaves no half-written document.
        let meta = VectorMeta::document(doc.kind, keywords, doc.usefulness).with_model(model);
        self.vectors.upsert(&id, vector, meta)?;
        self.docs.write().unwrap().insert(id, doc.clone());

        Ok(doc)
    }

    pub fn get(&self, id: &str) -> Result<Document, RagError> {
        self.docs
            .read()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| RagError::NotFound(id.to_string()))
    }

    /// Increment the view counter and bump `updated_at`.
    pub fn touch(&self, id: &str) -> Result<(), RagError> {
        let mut docs = self.docs.write().unwrap();
        let doc = docs
            .get_mut(id)
            .ok_or_else(|| RagError::NotFound(id.to_string()))?;
        doc.view_count += 1;
        doc.updated_at = Utc::now();
        Ok(())
    }

    /// Search the corpus, ranked by business value.
    ///
    /// Business value = 0.5·similarity + 0.3·usefulness + 0.2·recency,
    /// where recency is 1.0 inside the recency window and 0.5 outside it.
    /// Hits below the usefulness floor are dropped.
    pub async fn search(
        &self,
        query: &str,
        limit: usize,
        use_vector: bool,
    ) -> Result<Vec<ScoredDocument>, RagError> {
        if query.trim().is_empty() || limit == 0 {
            return Ok(vec![]);
        }

        let candidates: Vec<(Document, f64)> = if use_vector {
            self.vector_candidates(query, limit).await?
        } else {
            self.text_candidates(query)
        };

        let now = Utc::now();
        let mut scored: Vec<ScoredDocument> = candidates
            .into_iter()
            .filter(|(doc, _)| doc.usefulness >= self.config.min_usefulness)
            .map(|(document, similarity)| {
                let recency = if document.updated_within(self.config.recency_window_days, now) {
                    1.0
                } else {
                    0.5
                };
                let business_value =
                    0.5 * similarity + 0.3 * document.usefulness + 0.2 * recency;
                ScoredDocument {
                    document,
                    similarity,
                    business_value,
                }
            })
            .collect();

        scored.sort_by(|a, b| {
            b.business_value
                .partial_cmp(&a.business_value)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.document.id.cmp(&b.document.id))
        });
        scored.truncate(limit);
        Ok(scored)
    }

    async fn vector_candidates(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<(Document, f64)>, RagError> {
        let query_vector = match self.embedder.embed(query).await {
            Ok(v) => v,
            Err(e) => {
                log::warn!("query embedding failed ({e}); using fallback embedder");
                self.fallback.embed_text(query)
            }
        };

        // Over-fetch so the usefulness floor cannot starve the result set.
        let hits = self.vectors.search(
            &query_vector,
            limit.saturating_mul(2),
            self.config.min_similarity,
            Some(crate::store::RecordKind::Document),
        );

        let docs = self.docs.read().unwrap();
        Ok(hits
            .into_iter()
            .filter_map(|hit| {
                docs.get(&hit.id)
                    .map(|doc| (doc.clone(), f64::from(hit.similarity)))
            })
            .collect())
    }

    /// Substring/keyword match used when vector search is disabled.
    /// Similarity proxy is the fraction of query terms found in the
    /// document.
    fn text_candidates(&self, query: &str) -> Vec<(Document, f64)> {
        let query_lower = query.to_lowercase();
        let terms: Vec<&str> = query_lower.split_whitespace().collect();
        if terms.is_empty() {
            return vec![];
        }

        let docs = self.docs.read().unwrap();
        docs.values()
            .filter_map(|doc| {
                let haystack = format!(
                    "{} {} {}",
                    doc.title.to_lowercase(),
                    doc.body.to_lowercase(),
                    doc.keywords.join(" ")
                );
                let matched = terms.iter().filter(|t| haystack.contains(**t)).count();
                if matched == 0 {
                    return None;
                }
                Some((doc.clone(), matched as f64 / terms.len() as f64))
            })
            .collect()
    }
}

fn derive_id(title: &str) -> String {
    let digest = Sha256::digest(title.to_lowercase().as_bytes());
    let hex: String = digest.iter().take(6).map(|b| format!("{b:02x}")).collect();
    format!("doc-{hex}")
}
