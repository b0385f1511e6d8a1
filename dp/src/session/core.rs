//! Session - the single owner of conversation state
//!
//! Every mutating operation takes `&mut self`, so turns are strictly
//! sequential: a second request cannot start while a model call for the
//! first is still awaited.

use std::sync::Arc;

use knowledgestore::{IndexStats, KnowledgeIndex};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::conversation::{ConversationLog, Message, MessageCategory, MessageId, NewMessage};
use super::handlers::{self, Delta, GateChange, IndexChange};
use super::route::Route;
use crate::analyzer::ContentAnalyzer;
use crate::config::Config;
use crate::context::ContextBuilder;
use crate::credentials::CredentialProvider;
use crate::executor::{ExecutionResult, Executor};
use crate::gate::{ConfirmationGate, GateState};
use crate::llm::{GenerationParams, LlmClient};
use crate::plan::ActionPlan;
use crate::prompts::{PromptError, PromptLoader};

pub const WELCOME_TEXT: &str = "Hi, I'm DeskPilot. Describe a task to run on your computer and I'll draft a plan \
for you to confirm. Start a message with \"index this:\" to teach me something first.";

/// Errors that refuse a submission outright
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("No API key is configured for the language model")]
    CredentialMissing,

    #[error("A plan (message {message_id}) is waiting for confirmation; confirm or cancel it first")]
    PlanPending { message_id: MessageId },

    #[error("Input is empty")]
    EmptyInput,
}

/// What one session operation produced
#[derive(Debug, Clone, Default)]
pub struct Turn {
    /// Messages logged by this operation, user message first
    pub messages: Vec<Message>,
    /// Present only when a confirmed plan was handed to the executor
    pub execution: Option<ExecutionResult>,
}

impl Turn {
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The plan proposed in this turn, if any
    pub fn plan(&self) -> Option<(MessageId, &ActionPlan)> {
        self.messages.iter().find_map(|m| m.plan.as_ref().map(|p| (m.id, p)))
    }
}

/// One interactive conversation: log, index, gate and collaborators
pub struct Session {
    log: ConversationLog,
    index: KnowledgeIndex,
    gate: ConfirmationGate,
    analyzer: ContentAnalyzer,
    context: ContextBuilder,
    llm: Arc<dyn LlmClient>,
    credentials: Arc<dyn CredentialProvider>,
    executor: Box<dyn Executor>,
    plan_params: GenerationParams,
}

impl Session {
    /// Create a session and log the welcome message
    pub fn new(
        config: &Config,
        llm: Arc<dyn LlmClient>,
        credentials: Arc<dyn CredentialProvider>,
        executor: Box<dyn Executor>,
    ) -> Result<Self, PromptError> {
        debug!(model = %config.llm.model, "Session::new: called");
        let prompts = Arc::new(PromptLoader::new(config.prompts_dir.as_deref())?);

        let mut log = ConversationLog::new();
        log.append(NewMessage::agent(MessageCategory::Info, WELCOME_TEXT));

        Ok(Self {
            log,
            index: KnowledgeIndex::new(),
            gate: ConfirmationGate::new(),
            analyzer: ContentAnalyzer::new(llm.clone(), prompts.clone(), config.analysis.clone()),
            context: ContextBuilder::new(prompts, config.retrieval.clone()),
            llm,
            credentials,
            executor,
            plan_params: config.plan.clone(),
        })
    }

    /// Handle one line of user input
    pub async fn submit(&mut self, input: &str) -> Result<Turn, SessionError> {
        debug!(input_len = input.len(), "Session::submit: called");
        let input = input.trim();
        if input.is_empty() {
            return Err(SessionError::EmptyInput);
        }
        if let Some(message_id) = self.gate.pending() {
            debug!(%message_id, "Session::submit: refused, plan pending");
            return Err(SessionError::PlanPending { message_id });
        }

        let route = Route::parse(input);
        // Checked before logging so the same input can be re-sent once a key is entered
        if matches!(route, Route::Task(_)) && self.credentials.get_credential().is_none() {
            info!("Task refused: no credential available");
            return Err(SessionError::CredentialMissing);
        }

        let mark = self.log.last_id();
        self.log.append(NewMessage::user(input));

        let delta = match route {
            Route::Index(content) => handlers::index_content(&self.analyzer, self.index.len(), &content).await,
            Route::Task(query) => {
                handlers::plan_task(&self.context, self.llm.as_ref(), &self.plan_params, &self.index, &query).await
            }
        };
        self.apply(delta);

        Ok(self.turn_since(mark, None))
    }

    /// Approve the pending plan on message `id` and execute it once
    pub fn confirm(&mut self, id: MessageId) -> Turn {
        debug!(%id, "Session::confirm: called");
        let mark = self.log.last_id();
        let Some(resolution) = self.gate.confirm(id, &self.log) else {
            return Turn::default();
        };

        self.log.append(NewMessage::agent(
            MessageCategory::Confirmation,
            format!("Confirmed. Executing the plan for \"{}\".", resolution.plan.task()),
        ));
        let result = self.executor.execute(&resolution.plan);
        info!(status = ?result.status, task = %resolution.plan.task(), "Plan executed");
        self.log.append(NewMessage::agent(MessageCategory::Info, result.summary.clone()));

        self.turn_since(mark, Some(result))
    }

    /// Reject the pending plan on message `id`
    pub fn cancel(&mut self, id: MessageId) -> Turn {
        debug!(%id, "Session::cancel: called");
        let mark = self.log.last_id();
        let Some(resolution) = self.gate.cancel(id, &self.log) else {
            return Turn::default();
        };

        self.log.append(NewMessage::agent(
            MessageCategory::Cancellation,
            format!("Cancelled. The plan for \"{}\" will not be executed.", resolution.plan.task()),
        ));
        self.turn_since(mark, None)
    }

    /// Drop every indexed entry
    pub fn clear_index(&mut self) -> Turn {
        debug!(entry_count = self.index.len(), "Session::clear_index: called");
        let mark = self.log.last_id();
        let text = format!("Knowledge index cleared ({} entries removed).", self.index.len());
        self.apply(Delta {
            index: Some(IndexChange::Clear),
            ..Delta::message(MessageCategory::ClearIndex, text)
        });
        self.turn_since(mark, None)
    }

    /// Apply a handler's changes: messages, then index, then gate
    pub fn apply(&mut self, delta: Delta) {
        debug!(
            message_count = delta.messages.len(),
            has_index_change = delta.index.is_some(),
            gate = ?delta.gate,
            "Session::apply: called"
        );
        let mut plan_message = None;
        for message in delta.messages {
            let logged = self.log.append(message);
            if logged.plan.as_ref().is_some_and(ActionPlan::is_actionable) {
                plan_message = Some(logged.id);
            }
        }

        match delta.index {
            Some(IndexChange::Add { content, keywords }) => {
                let entry = self.index.add(content, keywords);
                debug!(id = %entry.id, entry_count = self.index.len(), "Session::apply: entry added");
            }
            Some(IndexChange::Clear) => {
                let removed = self.index.clear();
                debug!(removed, "Session::apply: index cleared");
            }
            None => {}
        }

        if let Some(GateChange::Await) = delta.gate {
            match plan_message {
                Some(id) => {
                    if let Err(e) = self.gate.await_decision(id) {
                        warn!(error = %e, "Plan not gated");
                    }
                }
                None => warn!("Gate change without a plan message, ignoring"),
            }
        }
    }

    /// Whether new text input is accepted
    pub fn accepts_input(&self) -> bool {
        !self.gate.is_pending()
    }

    pub fn gate_state(&self) -> GateState {
        self.gate.state()
    }

    /// The pending plan and the message carrying it
    pub fn pending_plan(&self) -> Option<(MessageId, &ActionPlan)> {
        let id = self.gate.pending()?;
        self.log.plan_for(id).map(|plan| (id, plan))
    }

    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    pub fn index(&self) -> &KnowledgeIndex {
        &self.index
    }

    pub fn index_stats(&self) -> IndexStats {
        self.index.stats()
    }

    fn turn_since(&self, mark: Option<MessageId>, execution: Option<ExecutionResult>) -> Turn {
        Turn {
            messages: self.log.since(mark).to_vec(),
            execution,
        }
    }
}
