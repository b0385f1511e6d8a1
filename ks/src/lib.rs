//! KnowledgeStore - incremental in-memory knowledge index
//!
//! Holds previously analyzed content together with its extracted keywords and
//! ranks entries against free-text queries using symmetric substring matching.
//!
//! # Scoring
//!
//! ```text
//! query  "rust tutorials"  ->  words ["rust", "tutorials"]
//! entry  keywords ["rust", "language"]
//!
//! "rust"     vs "rust"      -> match (+1)
//! "tutorials" vs "rust"     -> no match
//! "rust"     vs "language"  -> no match
//! "tutorials" vs "language" -> no match
//!                              score = 1
//! ```
//!
//! # Example
//!
//! ```
//! use knowledgestore::{KnowledgeIndex, RetrieveOptions};
//!
//! let mut index = KnowledgeIndex::new();
//! index.add("Rust is a systems language", vec!["rust".into(), "language".into()]);
//!
//! let hits = index.retrieve("rust tutorials", RetrieveOptions::default());
//! assert_eq!(hits.len(), 1);
//! assert_eq!(hits[0].score, 1);
//! ```

mod entry;
mod index;

pub use entry::{EntryId, IndexEntry, ScoredEntry};
pub use index::{IndexStats, KnowledgeIndex, RetrieveOptions, relevance_score};

/// Default number of entries returned by a retrieval
pub const DEFAULT_RETRIEVE_LIMIT: usize = 5;
