//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

/// Agent role, capabilities and execution workflow
pub const OPERATING: &str = include_str!("../../prompts/operating.pmt");

/// Knowledge index status block
pub const INDEX_STATUS: &str = include_str!("../../prompts/index_status.pmt");

/// Retrieved entries block
pub const RELEVANT: &str = include_str!("../../prompts/relevant.pmt");

/// JSON plan output contract
pub const CONTRACT: &str = include_str!("../../prompts/contract.pmt");

/// Literal user query block
pub const QUERY: &str = include_str!("../../prompts/query.pmt");

/// Content analysis instructions
pub const ANALYZE: &str = include_str!("../../prompts/analyze.pmt");

/// Names of every embedded template, in registration order
pub const NAMES: [&str; 6] = ["operating", "index-status", "relevant", "contract", "query", "analyze"];

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "operating" => Some(OPERATING),
        "index-status" => Some(INDEX_STATUS),
        "relevant" => Some(RELEVANT),
        "contract" => Some(CONTRACT),
        "query" => Some(QUERY),
        "analyze" => Some(ANALYZE),
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_names_resolve() {
        for name in NAMES {
            assert!(get_embedded(name).is_some(), "missing template {}", name);
        }
    }

    #[test]
    fn test_operating_lists_workflow() {
        for stage in [
            "Intent parsing",
            "Confirmation",
            "Environment switch",
            "Automation setup",
            "Screen parsing",
            "Execution",
            "Feedback",
            "Result",
        ] {
            assert!(OPERATING.contains(stage), "workflow stage {} missing", stage);
        }
    }

    #[test]
    fn test_contract_describes_plan_shape() {
        assert!(CONTRACT.contains("```json"));
        assert!(CONTRACT.contains("\"actionType\""));
        assert!(CONTRACT.contains(r#"{"task": "", "steps": []}"#));
    }

    #[test]
    fn test_get_embedded_unknown() {
        assert!(get_embedded("unknown-template").is_none());
    }
}
