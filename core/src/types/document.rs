use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of knowledge-base document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Guide,
    Troubleshooting,
    Reference,
    ToolHelp,
    Other,
}

/// A knowledge-base document with quality metadata.
///
/// The body carries operational documentation (tool help, troubleshooting
/// guides, health frameworks). Title and body are never empty after creation
/// and `updated_at >= created_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub body: String,
    pub kind: DocumentKind,

    /// Extracted keywords, at most 8, in extraction order.
    #[serde(default)]
    pub keywords: Vec<String>,

    /// User-feedback usefulness in [0, 1]. Hits below 0.3 are dropped
    /// from search results.
    #[serde(default)]
    pub usefulness: f64,

    /// Number of times the document was returned to a caller.
    #[serde(default)]
    pub view_count: u64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Truncated body preview, cut at the last sentence boundary when one
    /// lands in the second half of the window.
    pub fn preview(&self, max_len: usize) -> String {
        if self.body.chars().count() <= max_len {
            return self.body.clone();
        }
        let truncated: String = self.body.chars().take(max_len).collect();
        let cut = truncated
            .rfind(['.', '!', '?'])
            .filter(|&i| i > max_len / 2);
        match cut {
            Some(i) => truncated[..=i].to_string(),
            None => format!("{truncated}..."),
        }
    }

    /// Whether the document was updated within the last `days` days.
    pub fn updated_within(&self, days: i64, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.updated_at).num_days() < days
    }
}

/// A document paired with its retrieval scores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredDocument {
    pub document: Document,
    /// Cosine similarity against the query, or a keyword-overlap proxy for
    /// the text search path.
    pub similarity: f64,
    /// Weighted ranking score: 0.5·similarity + 0.3·usefulness + 0.2·recency.
    pub business_value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(body: &str) -> Document {
        let now = Utc::now();
        Document {
            id: "doc-1".to_string(),
            title: "Test document".to_string(),
            body: body.to_string(),
            kind: DocumentKind::Guide,
            keywords: vec![],
            usefulness: 0.5,
            view_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn preview_returns_short_bodies_unchanged() {
        let d = doc("short body");
        assert_eq!(d.preview(100), "short body");
    }

    #[test]
    fn preview_cuts_at_sentence_boundary() {
        let d = doc("First sentence ends here. Second sentence continues for a while after that.");
        let p = d.preview(40);
        assert_eq!(p, "First sentence ends here.");
    }

    #[test]
    fn preview_appends_ellipsis_without_boundary() {
        let d = doc("a very long body without any sentence punctuation at all just words");
        let p = d.preview(20);
        assert!(p.ends_with("..."));
    }

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_string(&DocumentKind::ToolHelp).unwrap();
        assert_eq!(json, "\"tool_help\"");
    }

    #[test]
    fn updated_within_window() {
        let d = doc("body");
        assert!(d.updated_within(90, Utc::now()));
        assert!(!d.updated_within(0, Utc::now() + chrono::Duration::days(1)));
    }
}
