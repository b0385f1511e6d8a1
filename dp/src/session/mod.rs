//! Session module
//!
//! Owns the conversation log, knowledge index and confirmation gate for one
//! interactive user. Input is routed to a handler, the handler returns a
//! [`Delta`], and [`Session::apply`] is the only place that delta touches
//! state.

mod conversation;
mod core;
mod handlers;
mod route;

pub use conversation::{ConversationLog, Message, MessageCategory, MessageId, NewMessage, Origin};
pub use core::{Session, SessionError, Turn, WELCOME_TEXT};
pub use handlers::{
    Delta, GateChange, IndexChange, MODEL_ERROR_TEXT, NON_TASK_FALLBACK_TEXT, PARSE_ERROR_TEXT, index_content,
    plan_task,
};
pub use route::{INDEX_PREFIXES, Route};
