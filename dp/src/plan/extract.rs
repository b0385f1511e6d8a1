//! Plan extraction from free-form model replies

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tracing::debug;

use super::ActionPlan;

/// First ```json fenced block; the tag is case-insensitive
static PLAN_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)```json[ \t]*\r?\n?(.*?)```").expect("plan block regex is valid"));

/// Why a reply could not be turned into a plan
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("No ```json block found in the reply")]
    NoBlockFound,

    #[error("Plan block is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Extract the action plan from a model reply
///
/// Only a missing block or broken JSON fail; any other odd shape is coerced
/// towards the nearest valid plan.
pub fn extract_plan(reply: &str) -> Result<ActionPlan, ParseError> {
    debug!(reply_len = reply.len(), "extract_plan: called");
    let captures = PLAN_BLOCK.captures(reply).ok_or(ParseError::NoBlockFound)?;
    let body = captures.get(1).map(|m| m.as_str().trim()).unwrap_or_default();

    let value: serde_json::Value = serde_json::from_str(body)?;
    let plan = ActionPlan::from_value(&value);
    debug!(task = %plan.task(), step_count = plan.steps().len(), "extract_plan: parsed");
    Ok(plan)
}

/// The reply with its plan block removed, trimmed
pub fn strip_plan_block(reply: &str) -> String {
    PLAN_BLOCK.replace(reply, "").trim().to_string()
}
