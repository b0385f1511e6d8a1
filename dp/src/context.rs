//! Context assembly
//!
//! Builds the system payload sent with every task request from the prompt
//! templates and a snapshot of the knowledge index.

use std::sync::Arc;

use knowledgestore::{KnowledgeIndex, RetrieveOptions};
use serde::Serialize;
use tracing::debug;

use crate::config::RetrievalConfig;
use crate::prompts::{PromptError, PromptLoader};

/// Template data for one retrieved entry
#[derive(Debug, Serialize)]
struct RelevantEntry {
    id: String,
    excerpt: String,
    keywords: String,
}

/// Composes the instruction payload for plan requests
pub struct ContextBuilder {
    prompts: Arc<PromptLoader>,
    retrieval: RetrievalConfig,
}

impl ContextBuilder {
    pub fn new(prompts: Arc<PromptLoader>, retrieval: RetrievalConfig) -> Self {
        Self { prompts, retrieval }
    }

    /// Assemble the payload for `query`
    ///
    /// Sections, in order: operating instructions, index status, relevant
    /// entries (only when retrieval finds any), output contract, the query.
    pub fn build(&self, query: &str, index: &KnowledgeIndex) -> Result<String, PromptError> {
        debug!(query_len = query.len(), entry_count = index.len(), "ContextBuilder::build: called");
        let empty = serde_json::json!({});
        let mut sections = vec![
            self.prompts.render("operating", &empty)?,
            self.prompts
                .render("index-status", &serde_json::json!({ "entry_count": index.len() }))?,
        ];

        let relevant = index.retrieve(query, RetrieveOptions { limit: self.retrieval.limit });
        if !relevant.is_empty() {
            debug!(relevant_count = relevant.len(), "ContextBuilder::build: including relevant entries");
            let entries: Vec<RelevantEntry> = relevant
                .iter()
                .map(|scored| RelevantEntry {
                    id: scored.entry.id.clone(),
                    excerpt: scored.entry.excerpt(self.retrieval.excerpt_chars),
                    keywords: scored.entry.keywords.join(", "),
                })
                .collect();
            sections.push(self.prompts.render("relevant", &serde_json::json!({ "entries": entries }))?);
        }

        sections.push(self.prompts.render("contract", &empty)?);
        sections.push(self.prompts.render("query", &serde_json::json!({ "query": query }))?);

        Ok(sections
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n"))
    }
}
