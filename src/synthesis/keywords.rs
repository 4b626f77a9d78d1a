//! Keyword theme extraction from combined page text.

use std::collections::HashMap;

/// Common tokens that carry no brand signal.
const STOPWORDS: &[&str] = &[
    "about", "after", "also", "been", "being", "best", "both", "business", "click", "contact",
    "could", "does", "each", "every", "find", "from", "get", "have", "help", "here", "home",
    "into", "just", "know", "learn", "like", "make", "many", "more", "most", "much", "need",
    "only", "other", "our", "over", "page", "please", "policy", "privacy", "read", "rights",
    "reserved", "same", "should", "site", "some", "such", "terms", "than", "that", "their",
    "them", "then", "there", "these", "they", "this", "through", "time", "under", "very",
    "view", "website", "were", "what", "when", "where", "which", "while", "will", "with",
    "would", "your",
];

/// Top-`limit` word themes by frequency: lowercase alphabetic tokens of four
/// or more letters, minus stopwords. Ties break alphabetically so output is
/// deterministic.
pub fn keyword_themes(text: &str, limit: usize) -> Vec<String> {
    let mut counts: HashMap<String, u32> = HashMap::new();
    for token in text.split(|c: char| !c.is_alphabetic()) {
        if token.len() < 4 {
            continue;
        }
        let word = token.to_lowercase();
        if STOPWORDS.contains(&word.as_str()) {
            continue;
        }
        *counts.entry(word).or_insert(0) += 1;
    }

    let mut ranked: Vec<(String, u32)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(limit);
    ranked.into_iter().map(|(word, _)| word).collect()
}
