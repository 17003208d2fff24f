//! Deterministic keyword extraction.
//!
//! A frequency heuristic over non-stopword tokens, used when documents are
//! ingested without an external keyword model. Output order is stable:
//! by descending frequency, then first occurrence.

use std::collections::HashMap;

const STOPWORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "all", "can", "had", "her", "was", "one",
    "our", "out", "day", "get", "has", "him", "his", "how", "man", "new", "now", "old", "see",
    "two", "way", "who", "did", "its", "let", "she", "too", "use", "that", "with", "have",
    "this", "will", "your", "from", "they", "been", "were", "when", "what", "which", "their",
    "there", "would", "could", "should", "about", "after", "before", "other", "than", "then",
    "them", "these", "those", "into", "over", "under", "such", "each", "more", "most", "some",
    "only", "also", "very", "must", "make", "like", "between", "during", "both", "while",
];

/// Extract up to `max` keywords from `text`.
pub fn extract_keywords(text: &str, max: usize) -> Vec<String> {
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    let mut order = 0usize;

    for raw in text.split(|c: char| !c.is_alphanumeric() && c != '_') {
        let token = raw.to_lowercase();
        if token.len() < 3 || token.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        if STOPWORDS.contains(&token.as_str()) {
            continue;
        }
        let entry = counts.entry(token).or_insert_with(|| {
            order += 1;
            (0, order)
        });
        entry.0 += 1;
    }

    let mut ranked: Vec<(String, usize, usize)> = counts
        .into_iter()
        .map(|(token, (count, first_seen))| (token, count, first_seen))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    ranked.truncate(max);
    ranked.into_iter().map(|(token, _, _)| token).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frequency_wins_then_first_occurrence() {
        let keywords = extract_keywords(
            "olt bandwidth olt configuration bandwidth olt region environment",
            3,
        );
        assert_eq!(keywords, vec!["olt", "bandwidth", "configuration"]);
    }

    #[test]
    fn stopwords_and_short_tokens_are_dropped() {
        let keywords = extract_keywords("the olt is in the rack and it has 42 ports", 8);
        assert!(!keywords.contains(&"the".to_string()));
        assert!(!keywords.contains(&"42".to_string()));
        assert!(keywords.contains(&"olt".to_string()));
        assert!(keywords.contains(&"rack".to_string()));
    }

    #[test]
    fn respects_the_cap() {
        let text = "alpha beta gamma delta epsilon zeta eta theta iota kappa";
        assert_eq!(extract_keywords(text, 8).len(), 8);
    }

    #[test]
    fn deterministic_for_identical_input() {
        let text = "fiber network health fiber scoring network";
        assert_eq!(extract_keywords(text, 8), extract_keywords(text, 8));
    }

    #[test]
    fn empty_text_yields_nothing() {
        assert!(extract_keywords("", 8).is_empty());
    }
}
