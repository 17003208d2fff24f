//! Regex-based pattern scoring for tool and analysis-type selection.
//!
//! Two tallies are scored from the query text alone: one over candidate
//! tools, one over analysis types. Scoring is deterministic and needs no
//! model. Document-mention adjustments are applied by the analyzer on top,
//! at half the weight of query cues.

use std::sync::LazyLock;

use regex::Regex;

use netrag_core::{AnalysisType, ToolName};

/// Tally over the candidate tools.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ToolTally {
    pub list: i32,
    pub detail: i32,
    pub complex: i32,
}

impl ToolTally {
    /// Winning tool and the margin over the runner-up. Ties break
    /// list > detail > complex; a zero-score tally recommends nothing.
    pub fn best(&self) -> (Option<ToolName>, i32) {
        let ranked = [
            (self.list, ToolName::ListNetworkDevices),
            (self.detail, ToolName::GetDeviceDetails),
            (self.complex, ToolName::NetworkQuery),
        ];
        // max_by_key keeps the last maximum, so reverse to make earlier
        // entries win ties.
        let (best_score, tool) = ranked
            .iter()
            .rev()
            .copied()
            .max_by_key(|(score, _)| *score)
            .unwrap_or((0, ToolName::NetworkQuery));
        let runner_up = ranked
            .iter()
            .filter(|(_, t)| *t != tool)
            .map(|(s, _)| *s)
            .max()
            .unwrap_or(0);
        if best_score == 0 {
            (None, 0)
        } else {
            (Some(tool), best_score - runner_up)
        }
    }
}

/// Tally over the analysis types.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisTally {
    pub listing: i32,
    pub details: i32,
    pub complex: i32,
}

impl AnalysisTally {
    /// Winning analysis type and margin. Ties break listing > details >
    /// complex; a zero-score tally falls through to general search.
    pub fn best(&self) -> (AnalysisType, i32) {
        let ranked = [
            (self.listing, AnalysisType::DeviceListing),
            (self.details, AnalysisType::DeviceDetails),
            (self.complex, AnalysisType::ComplexAnalysis),
        ];
        let (best_score, analysis) = ranked
            .iter()
            .rev()
            .copied()
            .max_by_key(|(score, _)| *score)
            .unwrap_or((0, AnalysisType::ComplexAnalysis));
        let runner_up = ranked
            .iter()
            .filter(|(_, a)| *a != analysis)
            .map(|(s, _)| *s)
            .max()
            .unwrap_or(0);
        if best_score == 0 {
            (AnalysisType::GeneralSearch, 0)
        } else {
            (analysis, best_score - runner_up)
        }
    }
}

// --- Cue patterns (compiled once) ---

static LISTING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(how\s+many|count|list\s+all|show\s+all|inventory|overview\s+of)\b")
        .unwrap()
});

static SHOW_DEVICES_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)show\s+me\b.*\b(ftth\s+olts?|olts|devices|modems|lags)\b").unwrap()
});

static REGIONAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(olts?|devices|modems)\b.*\b(region|hobo|gent|roes|asse)\b").unwrap()
});

static DETAILS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(specific|details\s+(for|of)|configuration\s+of)\b").unwrap()
});

static DETAILS_WEAK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(configuration|config|details)\b").unwrap()
});

/// Device identifiers that match a registered schema pattern.
static DEVICE_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(OLT\d+[A-Z]{3,4}\d+|LPL\d+[A-Z0-9]+)\b").unwrap());

static COMPLEX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(impact|depends\s+on|what\s+happens\s+(if|when)|path\s+from|relationships?|cross.reference|affected\s+by)\b",
    )
    .unwrap()
});

static REGION_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(hobo|gent|roes|asse)\b").unwrap());

static ENVIRONMENT_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(production|uat|test)\b").unwrap());

/// Score both tallies from the query text.
pub fn score_query(query: &str) -> (ToolTally, AnalysisTally) {
    let mut tool = ToolTally::default();
    let mut analysis = AnalysisTally::default();

    if LISTING_RE.is_match(query) {
        tool.list += 3;
        analysis.listing += 3;
    }
    if SHOW_DEVICES_RE.is_match(query) {
        tool.list += 3;
        analysis.listing += 3;
    }
    if REGIONAL_RE.is_match(query) {
        tool.list += 4;
        analysis.listing += 4;
    }

    if DETAILS_RE.is_match(query) {
        tool.detail += 3;
        analysis.details += 3;
    }
    if DETAILS_WEAK_RE.is_match(query) {
        tool.detail += 1;
        analysis.details += 1;
    }
    if DEVICE_NAME_RE.is_match(&query.to_uppercase()) {
        tool.detail += 3;
        analysis.details += 3;
    }

    if COMPLEX_RE.is_match(query) {
        tool.complex += 3;
        analysis.complex += 3;
    }

    (tool, analysis)
}

/// Extract the first device identifier matching a schema pattern.
pub fn device_name_in(query: &str) -> Option<String> {
    DEVICE_NAME_RE
        .find(&query.to_uppercase())
        .map(|m| m.as_str().to_string())
}

/// Pull notable terms (device names, regions, environments) out of a query.
pub fn extract_terms(query: &str) -> Vec<String> {
    let mut terms = Vec::new();
    if let Some(name) = device_name_in(query) {
        terms.push(name);
    }
    if let Some(m) = REGION_TOKEN_RE.find(query) {
        terms.push(m.as_str().to_uppercase());
    }
    if let Some(m) = ENVIRONMENT_TOKEN_RE.find(query) {
        terms.push(m.as_str().to_uppercase());
    }
    terms
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn how_many_scores_listing() {
        let (tool, analysis) = score_query("How many FTTH OLTs are there?");
        assert!(tool.list > 0);
        assert_eq!(analysis.best().0, AnalysisType::DeviceListing);
    }

    #[test]
    fn regional_listing_scores_highest() {
        let (tool, analysis) = score_query("Show me FTTH OLTs in HOBO region");
        assert!(tool.list >= 7);
        let (best, margin) = analysis.best();
        assert_eq!(best, AnalysisType::DeviceListing);
        assert!(margin >= 3);
    }

    #[test]
    fn device_identifier_scores_details() {
        let (tool, analysis) = score_query("Show me OLT17PROP01 configuration");
        assert_eq!(tool.best().0, Some(ToolName::GetDeviceDetails));
        assert_eq!(analysis.best().0, AnalysisType::DeviceDetails);
    }

    #[test]
    fn non_schema_identifier_does_not_score_details() {
        let (_, analysis) = score_query("What happens if CINMECHA01 fails?");
        assert_eq!(analysis.best().0, AnalysisType::ComplexAnalysis);
    }

    #[test]
    fn vague_query_falls_through_to_general_search() {
        let (tool, analysis) = score_query("tell me about the network");
        assert_eq!(tool.best().0, None);
        assert_eq!(analysis.best().0, AnalysisType::GeneralSearch);
    }

    #[test]
    fn empty_query_scores_nothing() {
        let (tool, analysis) = score_query("");
        assert_eq!(tool, ToolTally::default());
        assert_eq!(analysis.best(), (AnalysisType::GeneralSearch, 0));
    }

    #[test]
    fn ties_break_by_priority_order() {
        let tally = ToolTally {
            list: 3,
            detail: 3,
            complex: 1,
        };
        assert_eq!(tally.best(), (Some(ToolName::ListNetworkDevices), 0));

        let analysis = AnalysisTally {
            listing: 2,
            details: 2,
            complex: 2,
        };
        assert_eq!(analysis.best().0, AnalysisType::DeviceListing);
    }

    #[test]
    fn extract_terms_finds_device_region_environment() {
        let terms = extract_terms("show OLT17PROP01 in hobo production");
        assert!(terms.contains(&"OLT17PROP01".to_string()));
        assert!(terms.contains(&"HOBO".to_string()));
        assert!(terms.contains(&"PRODUCTION".to_string()));
    }
}
