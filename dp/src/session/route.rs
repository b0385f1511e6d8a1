//! Input routing

use tracing::debug;

/// Prefixes that turn input into content for the knowledge index
pub const INDEX_PREFIXES: [&str; 2] = ["index this:", "analyze this:"];

/// Where a line of user input goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Content to analyze and index (prefix removed, trimmed; may be empty)
    Index(String),
    /// Anything else is a task request for the model
    Task(String),
}

impl Route {
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        for prefix in INDEX_PREFIXES {
            // `get` rejects a cut inside a multi-byte char, so no panic on odd input
            if let Some(head) = trimmed.get(..prefix.len())
                && head.eq_ignore_ascii_case(prefix)
            {
                debug!(%prefix, "Route::parse: index command");
                return Self::Index(trimmed[prefix.len()..].trim().to_string());
            }
        }
        Self::Task(trimmed.to_string())
    }
}
