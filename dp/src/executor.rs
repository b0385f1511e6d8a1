//! Plan execution collaborator
//!
//! Execution only ever happens after the confirmation gate approves a plan.
//! The shipped executor is a dry run: it records what it would do and
//! never touches the desktop.

use serde::Serialize;
use tracing::{debug, info};

use crate::plan::ActionPlan;

/// How an execution attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Completed,
    Skipped,
    Failed,
}

/// Summary of one execution attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
    pub status: ExecutionStatus,
    pub steps_run: usize,
    pub summary: String,
}

/// Carries out an approved plan
pub trait Executor: Send + Sync {
    fn execute(&self, plan: &ActionPlan) -> ExecutionResult;
}

/// Executor that logs each step and performs nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunExecutor;

impl Executor for DryRunExecutor {
    fn execute(&self, plan: &ActionPlan) -> ExecutionResult {
        debug!(task = %plan.task(), step_count = plan.steps().len(), "DryRunExecutor::execute: called");
        for step in plan.steps() {
            info!(
                step = step.step,
                description = %step.description,
                application = step.application.as_deref().unwrap_or("-"),
                action_type = step.action_type.as_ref().map(|a| a.as_str()).unwrap_or("-"),
                target = step.target.as_deref().unwrap_or("-"),
                "Dry run: would execute step"
            );
        }

        ExecutionResult {
            status: ExecutionStatus::Skipped,
            steps_run: 0,
            summary: format!(
                "Dry run: {} step(s) of \"{}\" were not executed because no automation engine is attached.",
                plan.steps().len(),
                plan.task()
            ),
        }
    }
}
