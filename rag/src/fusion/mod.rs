//! RAG fusion analysis: multi-strategy retrieval plus pattern scoring.
//!
//! The analyzer rephrases a query along four strategies, retrieves
//! supporting documents for each, and combines deterministic query tallies
//! with document tool-mentions into structured [`Guidance`]. It is a pure
//! function of the query and the current corpus and never fails: retrieval
//! problems degrade to general search with LOW confidence.

pub mod signals;

use std::collections::HashMap;
use std::sync::Arc;

use netrag_core::{AnalysisType, Confidence, Guidance, ScoredDocument, ToolName};

use crate::documents::DocumentStore;

/// Documents fetched per rephrasing strategy.
const PER_STRATEGY_LIMIT: usize = 3;
/// Documents whose content is scanned for tool mentions.
const MENTION_SCAN_LIMIT: usize = 5;
/// Weight of a document tool-mention, half of a query cue.
const MENTION_WEIGHT: i32 = 2;

/// Turns a query into tool and analysis-type guidance.
pub struct RagFusionAnalyzer {
    documents: Arc<DocumentStore>,
}

impl RagFusionAnalyzer {
    pub fn new(documents: Arc<DocumentStore>) -> Self {
        Self { documents }
    }

    /// Analyze a query. Total: always returns guidance.
    pub async fn analyze(&self, query: &str) -> Guidance {
        if query.trim().is_empty() {
            return Guidance::degraded(
                "empty query; no signals to score, defaulting to general search",
            );
        }

        let documents = self.fusion_search(query).await;
        let (mut tool_tally, analysis_tally) = signals::score_query(query);

        // Document mentions nudge the tool tally at half cue weight.
        for scored in documents.iter().take(MENTION_SCAN_LIMIT) {
            let text = format!(
                "{} {}",
                scored.document.title.to_lowercase(),
                scored.document.body.to_lowercase()
            );
            if text.contains(ToolName::ListNetworkDevices.as_str()) {
                tool_tally.list += MENTION_WEIGHT;
            }
            if text.contains(ToolName::GetDeviceDetails.as_str()) {
                tool_tally.detail += MENTION_WEIGHT;
            }
            if text.contains(ToolName::NetworkQuery.as_str()) {
                tool_tally.complex += MENTION_WEIGHT;
            }
        }

        let (tool, _) = tool_tally.best();
        let (analysis_type, margin) = analysis_tally.best();

        let cited: Vec<String> = documents
            .iter()
            .take(MENTION_SCAN_LIMIT)
            .map(|d| d.document.id.clone())
            .collect();

        let confidence = if margin >= 3 && !cited.is_empty() {
            Confidence::High
        } else if margin >= 1 {
            Confidence::Medium
        } else {
            Confidence::Low
        };

        Guidance {
            analysis_type,
            confidence,
            tool,
            reasoning: reasoning_for(tool, analysis_type, documents.len()),
            terms: signals::extract_terms(query),
            cited_documents: cited,
        }
    }

    /// Run all rephrasing strategies and union the results, deduplicated by
    /// document id keeping the best business value. Individual strategy
    /// failures are skipped; total failure simply yields an empty set.
    async fn fusion_search(&self, query: &str) -> Vec<ScoredDocument> {
        let strategies = [
            format!("tool selection for: {query}"),
            format!("procedure to handle: {query}"),
            format!("network protocol context for: {query}"),
            format!("network analysis approach for: {query}"),
        ];

        let mut best: HashMap<String, ScoredDocument> = HashMap::new();
        for strategy in &strategies {
            match self.documents.search(strategy, PER_STRATEGY_LIMIT, true).await {
                Ok(hits) => {
                    for hit in hits {
                        match best.get_mut(&hit.document.id) {
                            Some(existing) if hit.business_value > existing.business_value => {
                                *existing = hit;
                            }
                            Some(_) => {}
                            None => {
                                best.insert(hit.document.id.clone(), hit);
                            }
                        }
                    }
                }
                Err(e) => {
                    log::warn!("fusion strategy search failed: {e}");
                }
            }
        }

        let mut documents: Vec<ScoredDocument> = best.into_values().collect();
        documents.sort_by(|a, b| {
            b.business_value
                .partial_cmp(&a.business_value)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.document.id.cmp(&b.document.id))
        });
        documents
    }
}

fn reasoning_for(tool: Option<ToolName>, analysis: AnalysisType, docs_analyzed: usize) -> String {
    let base = match tool {
        Some(ToolName::ListNetworkDevices) => {
            "query requests device inventory or counts, best served by the listing tool"
        }
        Some(ToolName::GetDeviceDetails) => {
            "query names a specific device, best served by the detail tool"
        }
        Some(ToolName::NetworkQuery) => {
            "query needs cross-system analysis, best served by the full pipeline"
        }
        None => match analysis {
            AnalysisType::GeneralSearch => {
                "no strong pattern matched; answering from knowledge and live data"
            }
            _ => "pattern scores selected the analysis type without a tool preference",
        },
    };
    format!("{base} ({docs_analyzed} documents analyzed)")
}
