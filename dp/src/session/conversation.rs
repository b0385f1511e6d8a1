//! Conversation log
//!
//! The append-only record of everything said in a session. Messages are
//! never edited once logged; later state is expressed by new messages.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::plan::ActionPlan;

/// Unique, increasing message identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Who produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    User,
    Agent,
}

/// What an agent message is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageCategory {
    Indexing,
    Plan,
    Info,
    Confirmation,
    Cancellation,
    ClearIndex,
    Error,
}

/// A message not yet assigned an id
#[derive(Debug, Clone, PartialEq)]
pub struct NewMessage {
    pub text: String,
    pub origin: Origin,
    pub category: Option<MessageCategory>,
    pub plan: Option<ActionPlan>,
}

impl NewMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            origin: Origin::User,
            category: None,
            plan: None,
        }
    }

    pub fn agent(category: MessageCategory, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            origin: Origin::Agent,
            category: Some(category),
            plan: None,
        }
    }

    pub fn with_plan(mut self, plan: ActionPlan) -> Self {
        self.plan = Some(plan);
        self
    }
}

/// A logged message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub id: MessageId,
    pub text: String,
    pub origin: Origin,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<MessageCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<ActionPlan>,
}

/// Append-only message log
#[derive(Debug, Default)]
pub struct ConversationLog {
    messages: Vec<Message>,
    next_id: u64,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message, assigning the next id and the current time
    pub fn append(&mut self, message: NewMessage) -> &Message {
        self.next_id += 1;
        let id = MessageId(self.next_id);
        debug!(%id, origin = ?message.origin, category = ?message.category, "ConversationLog::append: called");
        self.messages.push(Message {
            id,
            text: message.text,
            origin: message.origin,
            timestamp: Utc::now(),
            category: message.category,
            plan: message.plan,
        });
        &self.messages[self.messages.len() - 1]
    }

    /// Look up a message; ids are dense, so this is a direct index
    pub fn get(&self, id: MessageId) -> Option<&Message> {
        let idx = usize::try_from(id.0).ok()?.checked_sub(1)?;
        self.messages.get(idx)
    }

    /// The plan attached to message `id`, if any
    pub fn plan_for(&self, id: MessageId) -> Option<&ActionPlan> {
        self.get(id).and_then(|m| m.plan.as_ref())
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Messages logged after `id`
    pub fn since(&self, id: Option<MessageId>) -> &[Message] {
        let start = id.and_then(|id| usize::try_from(id.0).ok()).unwrap_or(0);
        self.messages.get(start..).unwrap_or_default()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn last_id(&self) -> Option<MessageId> {
        self.last().map(|m| m.id)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
