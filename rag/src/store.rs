//! In-memory vector store with cosine-similarity search.
//!
//! Vectors live in a `RwLock`-guarded map; search is brute-force cosine over
//! all stored records, optionally filtered by record kind. Snapshots
//! round-trip through JSON so the corpus survives restarts without an
//! external database.

use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use netrag_core::DocumentKind;

use crate::error::RagError;

/// Snapshot format version this build understands.
pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// What kind of record a vector indexes. Used as a search filter so
/// health-rule selection never competes with documentation hits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Document,
    HealthRule,
}

/// Filterable metadata stored alongside each vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorMeta {
    pub kind: RecordKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_kind: Option<DocumentKind>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub usefulness: f64,
    /// Identifier of the embedding model that produced the vector.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl VectorMeta {
    pub fn document(kind: DocumentKind, keywords: Vec<String>, usefulness: f64) -> Self {
        Self {
            kind: RecordKind::Document,
            document_kind: Some(kind),
            keywords,
            usefulness,
            model: None,
        }
    }

    pub fn health_rule(keywords: Vec<String>) -> Self {
        Self {
            kind: RecordKind::HealthRule,
            document_kind: None,
            keywords,
            usefulness: 1.0,
            model: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct VectorRecord {
    id: String,
    vector: Vec<f32>,
    meta: VectorMeta,
}

/// One search result.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub id: String,
    pub meta: VectorMeta,
    pub similarity: f32,
}

#[derive(Serialize, Deserialize)]
struct Snapshot {
    schema_version: u32,
    dims: usize,
    records: Vec<VectorRecord>,
}

/// Brute-force in-memory vector store.
///
/// Exactly one record exists per id; `upsert` replaces. All operations are
/// idempotent reads or single writes, so concurrent callers only contend on
/// the lock.
#[derive(Debug)]
pub struct VectorStore {
    dims: usize,
    records: RwLock<HashMap<String, VectorRecord>>,
}

impl VectorStore {
    pub fn new(dims: usize) -> Self {
        Self {
            dims,
            records: RwLock::new(HashMap::new()),
        }
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn len(&self) -> usize {
        self.records.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert or replace the vector for `id`.
    ///
    /// Rejects vectors of the wrong dimension or with non-finite components.
    pub fn upsert(
        &self,
        id: impl Into<String>,
        vector: Vec<f32>,
        meta: VectorMeta,
    ) -> Result<(), RagError> {
        if vector.len() != self.dims {
            return Err(RagError::Store(format!(
                "vector dimension {} does not match store dimension {}",
                vector.len(),
                self.dims
            )));
        }
        if vector.iter().any(|c| !c.is_finite()) {
            return Err(RagError::Store(
                "vector contains non-finite components".to_string(),
            ));
        }

        let id = id.into();
        let mut records = self.records.write().unwrap();
        records.insert(id.clone(), VectorRecord { id, vector, meta });
        Ok(())
    }

    pub fn remove(&self, id: &str) -> bool {
        self.records.write().unwrap().remove(id).is_some()
    }

    /// Search for the `limit` nearest records with similarity ≥
    /// `min_similarity`, sorted by similarity descending. `kind` restricts
    /// the search to one record kind.
    pub fn search(
        &self,
        query: &[f32],
        limit: usize,
        min_similarity: f32,
        kind: Option<RecordKind>,
    ) -> Vec<SearchHit> {
        let records = self.records.read().unwrap();
        let mut hits: Vec<SearchHit> = records
            .values()
            .filter(|r| kind.map_or(true, |k| r.meta.kind == k))
            .filter_map(|r| {
                let similarity = cosine_similarity(query, &r.vector);
                (similarity >= min_similarity).then(|| SearchHit {
                    id: r.id.clone(),
                    meta: r.meta.clone(),
                    similarity,
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        hits.truncate(limit);
        hits
    }

    /// Serialize the store to a JSON snapshot file.
    pub fn save(&self, path: &Path) -> Result<(), RagError> {
        let records = self.records.read().unwrap();
        let snapshot = Snapshot {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            dims: self.dims,
            records: records.values().cloned().collect(),
        };
        let json = serde_json::to_string(&snapshot)?;
        std::fs::write(path, json).map_err(|e| RagError::Store(e.to_string()))
    }

    /// Load a store from a JSON snapshot file.
    ///
    /// A snapshot written by a newer build is refused rather than partially
    /// interpreted.
    pub fn load(path: &Path) -> Result<Self, RagError> {
        let json = std::fs::read_to_string(path).map_err(|e| RagError::Store(e.to_string()))?;
        let snapshot: Snapshot = serde_json::from_str(&json)?;
        if snapshot.schema_version > SNAPSHOT_SCHEMA_VERSION {
            return Err(RagError::IncompatibleSnapshot {
                found: snapshot.schema_version,
                supported: SNAPSHOT_SCHEMA_VERSION,
            });
        }
        let store = Self::new(snapshot.dims);
        {
            let mut records = store.records.write().unwrap();
            for record in snapshot.records {
                records.insert(record.id.clone(), record);
            }
        }
        Ok(store)
    }
}

/// Cosine similarity ⟨a,b⟩ / (‖a‖·‖b‖); 0 when either operand has zero norm
/// or the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a < f32::EPSILON || norm_b < f32::EPSILON {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> VectorMeta {
        VectorMeta::document(DocumentKind::Guide, vec!["test".into()], 0.8)
    }

    #[test]
    fn upsert_rejects_wrong_dimension() {
        let store = VectorStore::new(4);
        let err = store.upsert("a", vec![1.0, 0.0], meta()).unwrap_err();
        assert!(err.to_string().contains("dimension"));
    }

    #[test]
    fn upsert_rejects_non_finite() {
        let store = VectorStore::new(2);
        assert!(store.upsert("a", vec![f32::NAN, 0.0], meta()).is_err());
        assert!(store.upsert("a", vec![f32::INFINITY, 0.0], meta()).is_err());
    }

    #[test]
    fn upsert_is_idempotent_per_id() {
        let store = VectorStore::new(2);
        store.upsert("a", vec![1.0, 0.0], meta()).unwrap();
        store.upsert("a", vec![1.0, 0.0], meta()).unwrap();
        assert_eq!(store.len(), 1);
        let hits = store.search(&[1.0, 0.0], 10, 0.0, None);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "a");
    }

    #[test]
    fn search_sorts_descending_and_respects_threshold() {
        let store = VectorStore::new(2);
        store.upsert("near", vec![1.0, 0.0], meta()).unwrap();
        store.upsert("mid", vec![0.7, 0.7], meta()).unwrap();
        store.upsert("far", vec![0.0, 1.0], meta()).unwrap();

        let hits = store.search(&[1.0, 0.0], 10, 0.5, None);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "near");
        assert_eq!(hits[1].id, "mid");
        assert!(hits.windows(2).all(|w| w[0].similarity >= w[1].similarity));
    }

    #[test]
    fn search_filters_by_kind() {
        let store = VectorStore::new(2);
        store.upsert("doc", vec![1.0, 0.0], meta()).unwrap();
        store
            .upsert("rule", vec![1.0, 0.0], VectorMeta::health_rule(vec![]))
            .unwrap();

        let hits = store.search(&[1.0, 0.0], 10, 0.0, Some(RecordKind::HealthRule));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "rule");
    }

    #[test]
    fn cosine_similarity_range_and_zero_norm() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vectors.json");

        let store = VectorStore::new(2);
        store.upsert("a", vec![1.0, 0.0], meta()).unwrap();
        store.save(&path).unwrap();

        let loaded = VectorStore::load(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.dims(), 2);
        let hits = loaded.search(&[1.0, 0.0], 1, 0.5, None);
        assert_eq!(hits[0].id, "a");
    }

    #[test]
    fn newer_snapshot_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vectors.json");
        std::fs::write(
            &path,
            r#"{"schema_version": 99, "dims": 2, "records": []}"#,
        )
        .unwrap();

        let err = VectorStore::load(&path).unwrap_err();
        assert!(matches!(err, RagError::IncompatibleSnapshot { found: 99, .. }));
    }
}
