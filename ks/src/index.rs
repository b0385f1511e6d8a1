//! Core KnowledgeIndex implementation

use std::sync::Arc;

use tracing::{debug, info};

use crate::entry::{IndexEntry, ScoredEntry};

/// Options for a retrieval
#[derive(Debug, Clone)]
pub struct RetrieveOptions {
    /// Maximum number of results
    pub limit: usize,
}

impl Default for RetrieveOptions {
    fn default() -> Self {
        Self {
            limit: crate::DEFAULT_RETRIEVE_LIMIT,
        }
    }
}

/// Statistics for the index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexStats {
    /// Number of entries
    pub entry_count: usize,
    /// Total keywords across all entries (duplicates counted)
    pub keyword_count: usize,
}

/// Append-only collection of index entries with keyword retrieval
#[derive(Debug, Default)]
pub struct KnowledgeIndex {
    entries: Vec<Arc<IndexEntry>>,
}

impl KnowledgeIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new entry built from `content` and `keywords`
    pub fn add(&mut self, content: impl Into<String>, keywords: Vec<String>) -> Arc<IndexEntry> {
        let entry = Arc::new(IndexEntry::new(content, keywords));
        self.entries.push(Arc::clone(&entry));
        info!(entry_id = %entry.id, entry_count = self.entries.len(), "Indexed entry");
        entry
    }

    /// Rank entries against `query`
    ///
    /// Entries scoring zero are dropped. The sort is stable so equal scores
    /// keep insertion order.
    pub fn retrieve(&self, query: &str, options: RetrieveOptions) -> Vec<ScoredEntry> {
        debug!(%query, limit = options.limit, entry_count = self.entries.len(), "retrieve: called");
        let words = query_words(query);

        let mut scored: Vec<ScoredEntry> = self
            .entries
            .iter()
            .filter_map(|entry| {
                let score = relevance_score(&words, &entry.keywords);
                (score > 0).then(|| ScoredEntry {
                    entry: Arc::clone(entry),
                    score,
                })
            })
            .collect();

        scored.sort_by(|a, b| b.score.cmp(&a.score));
        scored.truncate(options.limit);

        debug!(hits = scored.len(), "retrieve: done");
        scored
    }

    /// Retrieve with the default limit
    pub fn retrieve_default(&self, query: &str) -> Vec<ScoredEntry> {
        self.retrieve(query, RetrieveOptions::default())
    }

    /// Remove every entry, returning how many were removed
    ///
    /// Results already handed out keep their entries alive.
    pub fn clear(&mut self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        info!(removed, "Cleared knowledge index");
        removed
    }

    /// Look up an entry by ID
    pub fn get(&self, id: &str) -> Option<Arc<IndexEntry>> {
        self.entries.iter().find(|e| e.id == id).cloned()
    }

    /// All entries in insertion order
    pub fn entries(&self) -> &[Arc<IndexEntry>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            entry_count: self.entries.len(),
            keyword_count: self.entries.iter().map(|e| e.keywords.len()).sum(),
        }
    }
}

/// Lowercase whitespace-delimited words of a query
fn query_words(query: &str) -> Vec<String> {
    query.to_lowercase().split_whitespace().map(String::from).collect()
}

/// Count (keyword, word) pairs where either contains the other
///
/// `words` must already be lowercase; keywords are lowercased here.
pub fn relevance_score(words: &[String], keywords: &[String]) -> u32 {
    keywords
        .iter()
        .map(|keyword| {
            let keyword = keyword.to_lowercase();
            words
                .iter()
                .filter(|word| keyword.contains(word.as_str()) || word.contains(keyword.as_str()))
                .count() as u32
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn kw(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_substring_match_scores_entry() {
        let mut index = KnowledgeIndex::new();
        index.add("Rust docs", kw(&["rust", "language"]));

        let hits = index.retrieve_default("rust tutorials");
        assert_eq!(hits.len(), 1);
        assert!(hits[0].score >= 1);
    }

    #[test]
    fn test_containment_is_symmetric() {
        let words = kw(&["programming"]);
        assert_eq!(relevance_score(&words, &kw(&["program"])), 1);

        let words = kw(&["prog"]);
        assert_eq!(relevance_score(&words, &kw(&["programming"])), 1);
    }

    #[test]
    fn test_keyword_compared_case_insensitively() {
        let mut index = KnowledgeIndex::new();
        index.add("Paris", kw(&["Paris", "France"]));

        let hits = index.retrieve_default("PARIS weather");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].score, 1);
    }

    #[test]
    fn test_duplicate_keywords_each_count() {
        let words = kw(&["rust"]);
        assert_eq!(relevance_score(&words, &kw(&["rust", "rust", "go"])), 2);
    }

    #[test]
    fn test_zero_scores_excluded() {
        let mut index = KnowledgeIndex::new();
        index.add("cooking", kw(&["pasta", "sauce"]));

        assert!(index.retrieve_default("rust").is_empty());
        assert!(index.retrieve_default("").is_empty());
    }

    #[test]
    fn test_sorted_by_score_ties_keep_insertion_order() {
        let mut index = KnowledgeIndex::new();
        let first = index.add("a", kw(&["rust"]));
        let strong = index.add("b", kw(&["rust", "cargo"]));
        let second = index.add("c", kw(&["rust"]));

        let hits = index.retrieve_default("rust cargo");
        let ids: Vec<&str> = hits.iter().map(|h| h.entry.id.as_str()).collect();
        assert_eq!(ids, vec![strong.id.as_str(), first.id.as_str(), second.id.as_str()]);
        assert_eq!(hits[0].score, 2);
    }

    #[test]
    fn test_limit_truncates() {
        let mut index = KnowledgeIndex::new();
        for i in 0..8 {
            index.add(format!("entry {}", i), kw(&["shared"]));
        }

        assert_eq!(index.retrieve_default("shared").len(), 5);
        assert_eq!(index.retrieve("shared", RetrieveOptions { limit: 2 }).len(), 2);
    }

    #[test]
    fn test_clear_does_not_affect_handed_out_results() {
        let mut index = KnowledgeIndex::new();
        index.add("Rust book", kw(&["rust"]));

        let hits = index.retrieve_default("rust");
        assert_eq!(index.clear(), 1);

        assert!(index.is_empty());
        assert_eq!(hits[0].entry.content, "Rust book");
        assert!(index.retrieve_default("rust").is_empty());
    }

    #[test]
    fn test_get_and_stats() {
        let mut index = KnowledgeIndex::new();
        let entry = index.add("x", kw(&["a", "b"]));
        index.add("y", kw(&["c"]));

        assert_eq!(index.get(&entry.id).unwrap().content, "x");
        assert!(index.get("missing").is_none());
        assert_eq!(
            index.stats(),
            IndexStats {
                entry_count: 2,
                keyword_count: 3
            }
        );
    }

    proptest! {
        #[test]
        fn prop_retrieve_ranked_and_bounded(
            keyword_sets in prop::collection::vec(prop::collection::vec("[a-z]{1,6}", 0..5), 0..12),
            query in "[a-zA-Z ]{0,24}",
            limit in 0usize..8,
        ) {
            let mut index = KnowledgeIndex::new();
            for (i, keywords) in keyword_sets.into_iter().enumerate() {
                index.add(format!("entry {}", i), keywords);
            }

            let hits = index.retrieve(&query, RetrieveOptions { limit });
            prop_assert!(hits.len() <= limit);
            prop_assert!(hits.iter().all(|h| h.score > 0));

            let position = |id: &str| index.entries().iter().position(|e| e.id == id).unwrap();
            for pair in hits.windows(2) {
                prop_assert!(pair[0].score >= pair[1].score);
                if pair[0].score == pair[1].score {
                    prop_assert!(position(&pair[0].entry.id) < position(&pair[1].entry.id));
                }
            }

            let again = index.retrieve(&query, RetrieveOptions { limit });
            let ids = |v: &[ScoredEntry]| v.iter().map(|h| (h.entry.id.clone(), h.score)).collect::<Vec<_>>();
            prop_assert_eq!(ids(&hits), ids(&again));
        }
    }
}
