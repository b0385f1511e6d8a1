//! Action plans and their extraction from model output

mod extract;
mod types;

pub use extract::{ParseError, extract_plan, strip_plan_block};
pub use types::{ActionPlan, ActionPlanStep, ActionType};
