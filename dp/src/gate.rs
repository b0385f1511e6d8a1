//! ConfirmationGate - the only path from a proposed plan to execution
//!
//! At most one plan is outstanding at a time. Confirming or cancelling it
//! returns the gate to idle; the decision itself is handed back to the
//! caller as a [`Resolution`] rather than stored.

use thiserror::Error;
use tracing::{debug, info};

use crate::plan::ActionPlan;
use crate::session::{ConversationLog, MessageId};

/// Gate state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GateState {
    /// No plan awaiting a decision
    #[default]
    Idle,
    /// The plan on this message awaits confirm or cancel
    Pending(MessageId),
}

/// The user's decision on a pending plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Confirm,
    Cancel,
}

/// Outcome of resolving the pending plan
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub message_id: MessageId,
    pub decision: Decision,
    pub plan: ActionPlan,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GateError {
    #[error("Plan on message {0} is still awaiting a decision")]
    AlreadyPending(MessageId),
}

/// Tracks the single outstanding plan
#[derive(Debug, Default)]
pub struct ConfirmationGate {
    state: GateState,
}

impl ConfirmationGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    /// Id of the message whose plan is pending
    pub fn pending(&self) -> Option<MessageId> {
        match self.state {
            GateState::Pending(id) => Some(id),
            GateState::Idle => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending().is_some()
    }

    /// Start waiting for a decision on the plan carried by message `id`
    pub fn await_decision(&mut self, id: MessageId) -> Result<(), GateError> {
        debug!(%id, state = ?self.state, "ConfirmationGate::await_decision: called");
        if let GateState::Pending(current) = self.state {
            return Err(GateError::AlreadyPending(current));
        }
        self.state = GateState::Pending(id);
        info!(%id, "Plan awaiting confirmation");
        Ok(())
    }

    /// Approve the pending plan; `None` unless `id` is the pending message
    pub fn confirm(&mut self, id: MessageId, log: &ConversationLog) -> Option<Resolution> {
        self.resolve(id, log, Decision::Confirm)
    }

    /// Reject the pending plan; `None` unless `id` is the pending message
    pub fn cancel(&mut self, id: MessageId, log: &ConversationLog) -> Option<Resolution> {
        self.resolve(id, log, Decision::Cancel)
    }

    fn resolve(&mut self, id: MessageId, log: &ConversationLog, decision: Decision) -> Option<Resolution> {
        debug!(%id, ?decision, state = ?self.state, "ConfirmationGate::resolve: called");
        if self.state != GateState::Pending(id) {
            debug!(%id, "ConfirmationGate::resolve: not the pending message, ignoring");
            return None;
        }
        let Some(plan) = log.plan_for(id) else {
            debug!(%id, "ConfirmationGate::resolve: message carries no plan, ignoring");
            return None;
        };

        self.state = GateState::Idle;
        info!(%id, ?decision, task = %plan.task(), "Plan resolved");
        Some(Resolution {
            message_id: id,
            decision,
            plan: plan.clone(),
        })
    }
}
