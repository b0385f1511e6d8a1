//! Action plan types

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use tracing::debug;

/// Kind of UI action a step performs
///
/// Values outside the four known kinds are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionType {
    Click,
    Type,
    Navigate,
    Wait,
    Other(String),
}

impl ActionType {
    /// Parse a wire value, case-insensitively for the known kinds
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "click" => Self::Click,
            "type" => Self::Type,
            "navigate" => Self::Navigate,
            "wait" => Self::Wait,
            _ => Self::Other(s.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Click => "click",
            Self::Type => "type",
            Self::Navigate => "navigate",
            Self::Wait => "wait",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for ActionType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ActionType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::parse(&s))
    }
}

/// One step of an action plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionPlanStep {
    /// Step number; expected to increase but never validated
    pub step: u32,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_type: Option<ActionType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl ActionPlanStep {
    /// Coerce a JSON value into a step; `position` is the 1-based fallback number
    ///
    /// Returns `None` for anything that is not an object.
    pub fn from_value(value: &Value, position: u32) -> Option<Self> {
        let obj = value.as_object()?;
        let step = obj.get("step").and_then(step_number).unwrap_or(position);
        let text = |key: &str| obj.get(key).and_then(Value::as_str).map(String::from);

        Some(Self {
            step,
            description: text("description").unwrap_or_default(),
            application: text("application"),
            action_type: text("actionType").map(|s| ActionType::parse(&s)),
            target: text("target"),
        })
    }
}

/// Positive step number from a JSON number or numeric string
fn step_number(value: &Value) -> Option<u32> {
    let n = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }?;
    u32::try_from(n).ok().filter(|n| *n > 0)
}

/// A proposed multi-step task awaiting approval
///
/// Construction keeps `task` and `steps` consistent: an empty task carries no
/// steps and a plan without steps has an empty task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionPlan {
    task: String,
    steps: Vec<ActionPlanStep>,
}

impl ActionPlan {
    pub fn new(task: impl Into<String>, steps: Vec<ActionPlanStep>) -> Self {
        let task = task.into();
        debug!(task_len = task.len(), step_count = steps.len(), "ActionPlan::new: called");
        if task.is_empty() || steps.is_empty() {
            return Self::none();
        }
        Self { task, steps }
    }

    /// The "not a task" plan
    pub fn none() -> Self {
        Self {
            task: String::new(),
            steps: Vec::new(),
        }
    }

    /// Coerce an arbitrary JSON value into the nearest valid plan
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            debug!("ActionPlan::from_value: not an object");
            return Self::none();
        };
        let task = obj.get("task").and_then(Value::as_str).unwrap_or_default();
        let steps = obj
            .get("steps")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .enumerate()
                    .filter_map(|(i, item)| ActionPlanStep::from_value(item, i as u32 + 1))
                    .collect()
            })
            .unwrap_or_default();
        Self::new(task, steps)
    }

    pub fn task(&self) -> &str {
        &self.task
    }

    pub fn steps(&self) -> &[ActionPlanStep] {
        &self.steps
    }

    /// Whether there is anything to confirm and execute
    pub fn is_actionable(&self) -> bool {
        !self.steps.is_empty()
    }

    /// Numbered, human-readable step list
    pub fn render_steps(&self) -> String {
        self.steps
            .iter()
            .map(|s| {
                let mut line = format!("{}. {}", s.step, s.description);
                if let Some(app) = &s.application {
                    line.push_str(&format!(" [{}]", app));
                }
                line
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl<'de> Deserialize<'de> for ActionPlan {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_task_drops_steps() {
        let step = ActionPlanStep::from_value(&json!({"step": 1, "description": "x"}), 1).unwrap();
        let plan = ActionPlan::new("", vec![step]);
        assert_eq!(plan, ActionPlan::none());
        assert!(!plan.is_actionable());
    }

    #[test]
    fn test_whitespace_task_is_kept() {
        let step = ActionPlanStep::from_value(&json!({"step": 1, "description": "x"}), 1).unwrap();
        let plan = ActionPlan::new("  ", vec![step]);
        assert_eq!(plan.task(), "  ");
        assert!(plan.is_actionable());
    }

    #[test]
    fn test_empty_steps_clear_task() {
        let plan = ActionPlan::new("Open Notepad", vec![]);
        assert_eq!(plan.task(), "");
        assert!(!plan.is_actionable());
    }

    #[test]
    fn test_from_value_coerces_shapes() {
        let plan = ActionPlan::from_value(&json!({
            "task": "Write note",
            "steps": [
                {"step": "2", "description": "Open Notepad", "application": "Notepad", "actionType": "CLICK"},
                "not a step",
                {"description": 42, "actionType": "scroll", "target": 7},
                {"step": -3, "description": "Save"}
            ]
        }));

        let steps = plan.steps();
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[0].step, 2);
        assert_eq!(steps[0].action_type, Some(ActionType::Click));
        assert_eq!(steps[1].step, 3);
        assert_eq!(steps[1].description, "");
        assert_eq!(steps[1].action_type, Some(ActionType::Other("scroll".to_string())));
        assert_eq!(steps[1].target, None);
        assert_eq!(steps[2].step, 4);
    }

    #[test]
    fn test_from_value_non_object() {
        assert_eq!(ActionPlan::from_value(&json!([1, 2])), ActionPlan::none());
        assert_eq!(ActionPlan::from_value(&json!({"task": 5, "steps": "x"})), ActionPlan::none());
    }

    #[test]
    fn test_serialize_uses_wire_names() {
        let plan = ActionPlan::from_value(&json!({
            "task": "Search",
            "steps": [{"step": 1, "description": "Go", "actionType": "navigate", "target": "https://example.com"}]
        }));
        let value = serde_json::to_value(&plan).unwrap();

        assert_eq!(value["steps"][0]["actionType"], "navigate");
        assert!(value["steps"][0].get("application").is_none());
        assert_eq!(serde_json::from_value::<ActionPlan>(value).unwrap(), plan);
    }

    #[test]
    fn test_none_round_trip_preserves_emptiness() {
        let value = serde_json::to_value(ActionPlan::none()).unwrap();
        assert_eq!(value, json!({"task": "", "steps": []}));
        let back: ActionPlan = serde_json::from_value(value).unwrap();
        assert_eq!(back.task(), "");
        assert!(back.steps().is_empty());
    }

    #[test]
    fn test_render_steps() {
        let plan = ActionPlan::from_value(&json!({
            "task": "Open Notepad",
            "steps": [{"step": 1, "description": "Open Notepad", "application": "Notepad"}, {"step": 2, "description": "Type hello"}]
        }));
        assert_eq!(plan.render_steps(), "1. Open Notepad [Notepad]\n2. Type hello");
    }
}
