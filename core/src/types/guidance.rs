use serde::{Deserialize, Serialize};

/// How the orchestrator should answer a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisType {
    DeviceListing,
    DeviceDetails,
    ComplexAnalysis,
    GeneralSearch,
}

impl AnalysisType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DeviceListing => "device_listing",
            Self::DeviceDetails => "device_details",
            Self::ComplexAnalysis => "complex_analysis",
            Self::GeneralSearch => "general_search",
        }
    }
}

/// Analyzer confidence in its guidance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }
}

/// Externally-callable tool the analyzer can recommend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    ListNetworkDevices,
    GetDeviceDetails,
    NetworkQuery,
}

impl ToolName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ListNetworkDevices => "list_network_devices",
            Self::GetDeviceDetails => "get_device_details",
            Self::NetworkQuery => "network_query",
        }
    }
}

/// Structured output of the RAG fusion analyzer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Guidance {
    pub analysis_type: AnalysisType,
    pub confidence: Confidence,
    /// Recommended tool, absent when no tally scored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool: Option<ToolName>,
    pub reasoning: String,
    /// Terms the analyzer extracted from the query (device names, regions).
    #[serde(default)]
    pub terms: Vec<String>,
    /// Ids of the documents that informed the guidance, best first.
    #[serde(default)]
    pub cited_documents: Vec<String>,
}

impl Guidance {
    /// Degraded-mode guidance used when retrieval fails entirely.
    pub fn degraded(reasoning: impl Into<String>) -> Self {
        Self {
            analysis_type: AnalysisType::GeneralSearch,
            confidence: Confidence::Low,
            tool: None,
            reasoning: reasoning.into(),
            terms: vec![],
            cited_documents: vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_type_round_trips() {
        let json = serde_json::to_string(&AnalysisType::DeviceListing).unwrap();
        assert_eq!(json, "\"device_listing\"");
        let back: AnalysisType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, AnalysisType::DeviceListing);
    }

    #[test]
    fn degraded_guidance_is_low_confidence_search() {
        let g = Guidance::degraded("retrieval unavailable");
        assert_eq!(g.analysis_type, AnalysisType::GeneralSearch);
        assert_eq!(g.confidence, Confidence::Low);
        assert!(g.cited_documents.is_empty());
    }
}
