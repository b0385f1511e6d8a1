//! Index entry types

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// Unique identifier for an index entry
pub type EntryId = String;

/// One stored unit of analyzed content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Time-ordered unique ID (UUID v7: timestamp prefix + random suffix)
    pub id: EntryId,
    /// Full original text
    pub content: String,
    /// Keywords, themes and entities in insertion order (duplicates allowed)
    pub keywords: Vec<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl IndexEntry {
    /// Create a new entry stamped with a fresh ID and the current time
    pub fn new(content: impl Into<String>, keywords: Vec<String>) -> Self {
        let content = content.into();
        debug!(content_len = content.len(), keyword_count = keywords.len(), "IndexEntry::new: called");
        Self {
            id: Uuid::now_v7().to_string(),
            content,
            keywords,
            created_at: Utc::now(),
        }
    }

    /// Content truncated to `max_chars` characters, with `...` appended when cut
    pub fn excerpt(&self, max_chars: usize) -> String {
        let mut chars = self.content.chars();
        let head: String = chars.by_ref().take(max_chars).collect();
        if chars.next().is_some() { format!("{}...", head) } else { head }
    }
}

/// An entry paired with its relevance score for one query
///
/// The score only exists for the lifetime of a retrieval result; the stored
/// entry is shared, never modified.
#[derive(Debug, Clone)]
pub struct ScoredEntry {
    pub entry: Arc<IndexEntry>,
    pub score: u32,
}
