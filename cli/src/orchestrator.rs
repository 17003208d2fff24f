//! Query orchestration pipeline.
//!
//! One [`Orchestrator`] value owns handles to every collaborator: document
//! store, vector store (via the stores), embedding client, LLM client, rule
//! engine, schema registry, and data source. The analyzer, context builder,
//! and rule engine never call back into it.
//!
//! Per request: analyzer and context builder run concurrently; their
//! results pick a strategy; devices are fetched and health-scored; the LLM
//! gets the assembled context. LLM failures degrade to a deterministic
//! response with a visible note, never an error to the caller.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Map, Value};

use netrag_analysis::{DataQualityAssessor, HealthRuleEngine, QualityConfig, SchemaRegistry};
use netrag_core::{
    AnalysisType, DeviceRecord, Guidance, HealthReport, NetragError, QualityBand,
    SchemaAwareContext,
};
use netrag_rag::documents::{DocumentStore, SearchConfig};
use netrag_rag::embeddings::{EmbeddingProvider, FallbackEmbedder, OllamaProvider, OpenAiProvider};
use netrag_rag::fusion::{signals, RagFusionAnalyzer};
use netrag_rag::store::VectorStore;

use crate::config::AppConfig;
use crate::context::ContextBuilder;
use crate::llm::{ChatClient, ChatMessage, HttpLlmClient};
use crate::format;
use crate::source::{DataSource, StaticDataSource};

/// Fixed system instruction for the final prose generation. Callers cannot
/// override it.
const SYSTEM_PROMPT: &str = "\
You are a network infrastructure analyst for a fiber and mobile fleet \
(FTTH OLTs, LAGs, mobile modems, cross-connects, operational teams).

When answering:
- Lead with the direct answer to the question, then supporting detail
- Ground every statement in the structured data provided; never invent \
devices or numbers
- Flag unhealthy devices first (CRITICAL before WARNING)
- Respect the data-quality caveats included in the context
- Keep the tone professional and concise";

/// Per-call options for [`Orchestrator::execute`].
#[derive(Debug, Clone)]
pub struct QueryFlags {
    pub include_recommendations: bool,
    /// Device list bound; the configured default applies when absent.
    pub limit: Option<usize>,
}

impl Default for QueryFlags {
    fn default() -> Self {
        Self {
            include_recommendations: true,
            limit: None,
        }
    }
}

/// Top-level query pipeline.
pub struct Orchestrator {
    config: AppConfig,
    registry: Arc<SchemaRegistry>,
    analyzer: RagFusionAnalyzer,
    context_builder: ContextBuilder,
    documents: Arc<DocumentStore>,
    health: Arc<HealthRuleEngine>,
    source: Arc<dyn DataSource>,
    llm: Arc<dyn ChatClient>,
}

impl Orchestrator {
    pub fn new(
        config: AppConfig,
        registry: Arc<SchemaRegistry>,
        documents: Arc<DocumentStore>,
        health: Arc<HealthRuleEngine>,
        source: Arc<dyn DataSource>,
        llm: Arc<dyn ChatClient>,
    ) -> Self {
        let analyzer = RagFusionAnalyzer::new(documents.clone());
        let context_builder = ContextBuilder::new(
            registry.clone(),
            DataQualityAssessor::new(QualityConfig {
                sample_cap: config.quality.sample_cap,
                fresh_window_mins: config.quality.fresh_window_mins,
                decay_horizon_hours: config.quality.decay_horizon_hours,
            }),
            source.clone(),
            config.limits.sample_size,
            Duration::from_secs(config.limits.data_fetch_timeout_secs),
        );

        Self {
            config,
            registry,
            analyzer,
            context_builder,
            documents,
            health,
            source,
            llm,
        }
    }

    pub fn documents(&self) -> &Arc<DocumentStore> {
        &self.documents
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    /// Execute a natural-language query end to end.
    pub async fn execute(&self, query: &str, flags: QueryFlags) -> Result<String, NetragError> {
        let overall = Duration::from_secs(self.config.limits.overall_timeout_secs);
        tokio::time::timeout(overall, self.execute_inner(query, flags))
            .await
            .map_err(|_| NetragError::Timeout("executing the query pipeline".to_string()))?
    }

    async fn execute_inner(&self, query: &str, flags: QueryFlags) -> Result<String, NetragError> {
        let query = query.trim();

        // The two analysis legs have no ordering relationship; both must
        // finish before strategy selection.
        let (guidance, context) =
            tokio::join!(self.analyzer.analyze(query), self.context_builder.build(query));

        let mut caveats = Vec::new();
        let mut analysis_type = guidance.analysis_type;

        if context.has_low_quality_score(self.config.quality.low_score_threshold) {
            caveats.push(
                "one or more data-quality scores are below threshold; treat the structured \
                 results with caution"
                    .to_string(),
            );
        }
        if context.worst_band() == Some(QualityBand::Red)
            && analysis_type != AnalysisType::GeneralSearch
        {
            caveats.push(format!(
                "data quality is poor; switched analysis from {} to general search",
                analysis_type.as_str()
            ));
            analysis_type = AnalysisType::GeneralSearch;
        }

        let structured = match analysis_type {
            AnalysisType::DeviceListing => match self.listing_block(query, flags.limit).await {
                Ok(block) => block,
                Err(e) => {
                    caveats.push(format!("device fetch failed ({e}); degraded to general search"));
                    analysis_type = AnalysisType::GeneralSearch;
                    self.narrative_block(query, &context).await
                }
            },
            AnalysisType::DeviceDetails => match self.details_block(query).await {
                Ok(block) => block,
                Err(e) => {
                    caveats.push(format!("device lookup failed ({e}); degraded to general search"));
                    analysis_type = AnalysisType::GeneralSearch;
                    self.narrative_block(query, &context).await
                }
            },
            AnalysisType::ComplexAnalysis | AnalysisType::GeneralSearch => {
                self.narrative_block(query, &context).await
            }
        };

        let llm_prose = self.call_llm(query, &guidance, &context, &structured).await;

        Ok(format::query_response(
            query,
            analysis_type,
            &guidance,
            &context,
            &structured,
            llm_prose.as_deref(),
            &caveats,
            flags.include_recommendations,
        ))
    }

    /// Device listing strategy: lexicon filters, bounded fetch, health per
    /// device.
    async fn listing_block(
        &self,
        query: &str,
        limit: Option<usize>,
    ) -> Result<String, NetragError> {
        let limit = limit.unwrap_or(self.config.limits.device_limit);
        let filters = extract_filters(query);

        let schema_name = self
            .registry
            .schemas_for_query(query)
            .first()
            .map(|s| s.name.clone())
            .unwrap_or_else(|| "ftth_olt".to_string());

        let records = self.fetch_with_deadline(&schema_name, &filters, limit).await?;
        let rows = self.health_rows(records).await;
        Ok(format::device_listing(&rows, rows.len()))
    }

    /// Device details strategy: extract a schema-pattern identifier, fetch
    /// one record, score it.
    async fn details_block(&self, query: &str) -> Result<String, NetragError> {
        let Some(name) = signals::device_name_in(query) else {
            return Err(NetragError::InvalidInput(
                "no device identifier found in the query".to_string(),
            ));
        };

        let schema_name = if name.starts_with("OLT") {
            "ftth_olt"
        } else {
            "mobile_modem"
        };

        let mut filters = Map::new();
        filters.insert("name_equals".to_string(), json!(name));
        let records = self.fetch_with_deadline(schema_name, &filters, 1).await?;

        match records.into_iter().next() {
            Some(record) => {
                let report = self.health.evaluate(&record).await;
                Ok(format::device_details(&record, &report))
            }
            None => Ok(format!(
                "Device **{name}** was not found in the live data. No details were invented; \
                 verify the identifier or refresh the data source.\n"
            )),
        }
    }

    /// Narrative strategy for complex analysis and general search: relevant
    /// documents plus the live-data overview.
    async fn narrative_block(&self, query: &str, context: &SchemaAwareContext) -> String {
        let mut parts = Vec::new();

        let docs = tokio::time::timeout(
            Duration::from_secs(self.config.limits.document_fetch_timeout_secs),
            self.documents.search(query, 5, true),
        )
        .await;

        match docs {
            Ok(Ok(docs)) if !docs.is_empty() => {
                parts.push("### Relevant documentation\n".to_string());
                for scored in &docs {
                    parts.push(format!(
                        "- **{}** (value {:.2}): {}\n",
                        scored.document.title,
                        scored.business_value,
                        scored.document.preview(200)
                    ));
                }
            }
            _ => parts.push("No relevant documentation found for this query.\n".to_string()),
        }

        for name in self.unresolved_identifiers(query).await {
            parts.push(format!(
                "\n⚠️ No live record found for **{name}**: data for this device is missing. \
                 Verify the identifier or refresh the data source.\n"
            ));
        }

        parts.push("\n### Live data overview\n".to_string());
        parts.push(context.schema_summary.clone());
        parts.push("\n".to_string());
        parts.join("")
    }

    /// Device-shaped tokens in the query with no record in any schema.
    /// Keeps the narrative honest: named devices that do not exist are
    /// reported as missing instead of being described.
    async fn unresolved_identifiers(&self, query: &str) -> Vec<String> {
        let mut missing = Vec::new();
        for token in identifier_tokens(query) {
            let mut filters = Map::new();
            filters.insert("name_equals".to_string(), json!(token));
            let mut found = false;
            for schema in self.registry.all() {
                match self.source.fetch(&schema.name, &filters, 1).await {
                    Ok(records) if !records.is_empty() => {
                        found = true;
                        break;
                    }
                    Ok(_) => {}
                    Err(_) => {}
                }
            }
            if !found {
                missing.push(token);
            }
        }
        missing
    }

    async fn fetch_with_deadline(
        &self,
        schema_name: &str,
        filters: &Map<String, Value>,
        limit: usize,
    ) -> Result<Vec<DeviceRecord>, NetragError> {
        tokio::time::timeout(
            Duration::from_secs(self.config.limits.data_fetch_timeout_secs),
            self.source.fetch(schema_name, filters, limit),
        )
        .await
        .map_err(|_| NetragError::Timeout(format!("fetching {schema_name} records")))?
    }

    async fn health_rows(&self, records: Vec<DeviceRecord>) -> Vec<(DeviceRecord, HealthReport)> {
        let mut rows = Vec::with_capacity(records.len());
        for record in records {
            let report = self.health.evaluate(&record).await;
            rows.push((record, report));
        }
        rows
    }

    /// Call the LLM with the assembled context. Failures return `None`; the
    /// caller renders the structured result with an unavailability note.
    async fn call_llm(
        &self,
        query: &str,
        guidance: &Guidance,
        context: &SchemaAwareContext,
        structured: &str,
    ) -> Option<String> {
        let mut user = format!(
            "**Question:** {query}\n\n\
             **Guidance:** {}\n\n\
             **Structured result:**\n{structured}\n\
             **Data quality:**\n{}",
            guidance.reasoning,
            format::quality_block(context),
        );

        for id in &guidance.cited_documents {
            if let Ok(doc) = self.documents.get(id) {
                user.push_str(&format!(
                    "\n**Reference — {}:**\n{}\n",
                    doc.title,
                    doc.preview(400)
                ));
                if let Err(e) = self.documents.touch(id) {
                    log::debug!("touch {id} failed: {e}");
                }
            }
        }

        truncate_chars(&mut user, self.config.limits.max_context_chars);

        let result = self
            .llm
            .chat(
                SYSTEM_PROMPT,
                &[ChatMessage::user(user)],
                self.config.llm.max_tokens,
                self.config.llm.temperature,
                Duration::from_secs(self.config.llm.timeout_secs),
            )
            .await;

        match result {
            Ok(text) if !text.trim().is_empty() => Some(text),
            Ok(_) => None,
            Err(e) => {
                log::warn!("LLM call failed, returning structured result only: {e}");
                None
            }
        }
    }

    /// Direct listing for the `list_network_devices` tool: no analyzer, but
    /// health still runs on every item.
    pub async fn list_devices(
        &self,
        device_type: &str,
        region: Option<&str>,
        environment: Option<&str>,
        name_filter: Option<&str>,
        limit: usize,
    ) -> Result<String, NetragError> {
        let schema_names: Vec<String> = if device_type.eq_ignore_ascii_case("all") {
            self.registry.all().iter().map(|s| s.name.clone()).collect()
        } else {
            vec![resolve_device_type(device_type)?.to_string()]
        };

        let mut filters = Map::new();
        if let Some(region) = region {
            let region = region.to_uppercase();
            if !["HOBO", "GENT", "ROES", "ASSE"].contains(&region.as_str()) {
                return Err(NetragError::InvalidInput(format!(
                    "unknown region {region:?}; expected HOBO, GENT, ROES, or ASSE"
                )));
            }
            filters.insert("region".to_string(), json!(region));
        }
        if let Some(environment) = environment {
            let environment = environment.to_uppercase();
            if !["PRODUCTION", "UAT", "TEST"].contains(&environment.as_str()) {
                return Err(NetragError::InvalidInput(format!(
                    "unknown environment {environment:?}; expected PRODUCTION, UAT, or TEST"
                )));
            }
            filters.insert("environment".to_string(), json!(environment));
        }
        if let Some(prefix) = name_filter {
            filters.insert("name_prefix".to_string(), json!(prefix));
        }

        let mut parts = vec!["# Device Inventory\n".to_string()];
        for schema_name in schema_names {
            let records = self.fetch_with_deadline(&schema_name, &filters, limit).await?;
            if records.is_empty() && device_type.eq_ignore_ascii_case("all") {
                continue;
            }
            let rows = self.health_rows(records).await;
            parts.push(format!("\n## {schema_name}\n"));
            parts.push(format::device_listing(&rows, rows.len()));
        }
        Ok(parts.join(""))
    }

    /// Direct lookup for the `get_device_details` tool. Not-found is a soft
    /// failure with a descriptive message.
    pub async fn device_details(
        &self,
        device_name: &str,
        device_type: &str,
    ) -> Result<String, NetragError> {
        let device_name = device_name.trim();
        if device_name.is_empty() {
            return Err(NetragError::InvalidInput(
                "device_name must not be empty".to_string(),
            ));
        }
        let schema_name = resolve_device_type(device_type)?;

        let mut filters = Map::new();
        filters.insert("name_equals".to_string(), json!(device_name));
        let records = self.fetch_with_deadline(schema_name, &filters, 1).await?;

        match records.into_iter().next() {
            Some(record) => {
                let report = self.health.evaluate(&record).await;
                Ok(format::device_details(&record, &report))
            }
            None => Ok(format!(
                "Device **{device_name}** was not found among {schema_name} records. \
                 Verify the name or list devices first.\n"
            )),
        }
    }
}

/// Map a tool-facing device type onto a schema name.
fn resolve_device_type(device_type: &str) -> Result<&'static str, NetragError> {
    match device_type.to_lowercase().as_str() {
        "olt" | "ftth" | "ftth_olt" => Ok("ftth_olt"),
        "modem" | "mobile" | "mobile_modem" => Ok("mobile_modem"),
        "lag" => Ok("lag"),
        "team" => Ok("team"),
        "pxc" | "cross_connect" => Ok("pxc"),
        other => Err(NetragError::InvalidInput(format!(
            "unknown device_type {other:?}; expected olt, modem, lag, team, pxc, or all"
        ))),
    }
}

/// Region and environment filters from a fixed lexicon.
fn extract_filters(query: &str) -> Map<String, Value> {
    let lowered = query.to_lowercase();
    let mut filters = Map::new();

    for (needle, region) in [
        ("hobo", "HOBO"),
        ("gent", "GENT"),
        ("ghent", "GENT"),
        ("roes", "ROES"),
        ("asse", "ASSE"),
    ] {
        if contains_word(&lowered, needle) {
            filters.insert("region".to_string(), json!(region));
            break;
        }
    }

    for (needle, environment) in [
        ("production", "PRODUCTION"),
        ("prod", "PRODUCTION"),
        ("live", "PRODUCTION"),
        ("uat", "UAT"),
        ("staging", "UAT"),
        ("test", "TEST"),
    ] {
        if contains_word(&lowered, needle) {
            filters.insert("environment".to_string(), json!(environment));
            break;
        }
    }

    filters
}

fn contains_word(haystack: &str, needle: &str) -> bool {
    haystack.split(|c: char| !c.is_alphanumeric()).any(|w| w == needle)
}

/// Uppercase device-shaped tokens (at least two letters then digits).
fn identifier_tokens(query: &str) -> Vec<String> {
    query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| {
            token.len() >= 6
                && token.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
                && token.chars().take(2).all(|c| c.is_ascii_uppercase())
                && token.chars().any(|c| c.is_ascii_digit())
        })
        .map(str::to_string)
        .collect()
}

/// Char-boundary-safe truncation to at most `max_chars` characters.
fn truncate_chars(text: &mut String, max_chars: usize) {
    if text.chars().count() > max_chars {
        let truncated: String = text.chars().take(max_chars).collect();
        *text = truncated;
    }
}

/// Assemble a full orchestrator from configuration, with a specific data
/// source and chat client. Used directly by tests; `bootstrap` wires the
/// production adapters.
pub async fn bootstrap_with(
    config: AppConfig,
    registry: Arc<SchemaRegistry>,
    source: Arc<dyn DataSource>,
    llm: Arc<dyn ChatClient>,
) -> Result<Orchestrator, NetragError> {
    let fallback = FallbackEmbedder::new(config.embedding.dims, config.boosts());
    let embedder = build_embedder(&config, &fallback);

    let vectors = match &config.snapshot_file {
        Some(path) if path.exists() => Arc::new(VectorStore::load(path)?),
        _ => Arc::new(VectorStore::new(config.embedding.dims)),
    };

    let documents = Arc::new(DocumentStore::new(
        SearchConfig {
            min_similarity: config.search.min_similarity,
            min_usefulness: config.search.min_usefulness,
            recency_window_days: config.search.recency_window_days,
        },
        embedder.clone(),
        fallback.clone(),
        vectors.clone(),
    ));

    let health = Arc::new(HealthRuleEngine::with_builtin_rules(
        vectors.clone(),
        embedder.clone(),
        fallback.clone(),
    ));
    health.index_rules().await?;

    Ok(Orchestrator::new(config, registry, documents, health, source, llm))
}

/// Assemble the orchestrator with the configured data source and LLM.
pub async fn bootstrap(config: AppConfig) -> Result<Orchestrator, NetragError> {
    let registry = Arc::new(SchemaRegistry::with_builtin_schemas());

    let source: Arc<dyn DataSource> = match &config.data_file {
        Some(path) => Arc::new(StaticDataSource::from_json_file(path, &registry)?),
        None => Arc::new(StaticDataSource::demo(&registry)),
    };

    let llm: Arc<dyn ChatClient> = Arc::new(HttpLlmClient::new(&config.llm)?);

    bootstrap_with(config, registry, source, llm).await
}

fn build_embedder(config: &AppConfig, fallback: &FallbackEmbedder) -> Arc<dyn EmbeddingProvider> {
    match config.embedding.provider.as_str() {
        "openai" => {
            let key = config
                .embedding
                .api_key_env
                .as_ref()
                .and_then(|var| std::env::var(var).ok());
            match key {
                Some(key) => Arc::new(OpenAiProvider::new(
                    key,
                    config.embedding.model.clone(),
                    config.embedding.endpoint.clone(),
                    Some(config.embedding.dims),
                    Some(config.embedding.timeout_secs),
                )),
                None => {
                    log::warn!("embedding API key missing; using the fallback embedder");
                    Arc::new(fallback.clone())
                }
            }
        }
        "ollama" => Arc::new(OllamaProvider::new(
            config.embedding.model.clone(),
            config.embedding.endpoint.clone(),
            Some(config.embedding.dims),
            Some(config.embedding.timeout_secs),
        )),
        _ => Arc::new(fallback.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_from_lexicon() {
        let filters = extract_filters("show me FTTH OLTs in HOBO region in production");
        assert_eq!(filters.get("region"), Some(&json!("HOBO")));
        assert_eq!(filters.get("environment"), Some(&json!("PRODUCTION")));

        let none = extract_filters("how many devices?");
        assert!(none.is_empty());
    }

    #[test]
    fn device_type_resolution() {
        assert_eq!(resolve_device_type("olt").unwrap(), "ftth_olt");
        assert_eq!(resolve_device_type("OLT").unwrap(), "ftth_olt");
        assert_eq!(resolve_device_type("modem").unwrap(), "mobile_modem");
        assert!(resolve_device_type("quantum_router").is_err());
    }

    #[test]
    fn identifier_tokens_finds_device_shapes() {
        let tokens = identifier_tokens("What happens if CINMECHA01 fails?");
        assert_eq!(tokens, vec!["CINMECHA01".to_string()]);
        assert!(identifier_tokens("what happens if everything fails?").is_empty());
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let mut text = "αβγδε".repeat(10);
        truncate_chars(&mut text, 7);
        assert_eq!(text.chars().count(), 7);
    }
}
