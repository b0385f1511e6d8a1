//! DeskPilot - conversational desktop assistant
//!
//! DeskPilot turns free-text commands into structured multi-step action
//! plans. Nothing runs until the user confirms the plan.
//!
//! # Core Concepts
//!
//! - **Knowledge index**: content taught with `index this:` is analyzed into
//!   keywords and used to enrich later requests (see the `knowledgestore` crate)
//! - **Context payload**: every task request carries operating instructions,
//!   index status, relevant entries and a JSON output contract
//! - **Plan extraction**: the first fenced JSON block in a reply becomes an
//!   [`ActionPlan`]
//! - **Confirmation gate**: at most one plan is pending; only confirming it
//!   reaches the [`Executor`]
//!
//! # Modules
//!
//! - [`session`] - Session object, conversation log and turn handlers
//! - [`analyzer`] - Content analysis with a local fallback
//! - [`context`] - Context payload assembly
//! - [`plan`] - Action plan types and extraction
//! - [`gate`] - Confirmation state machine
//! - [`executor`] - Execution collaborator (dry run)
//! - [`llm`] - LLM client trait and OpenAI-compatible implementation
//! - [`credentials`] - API key providers
//! - [`prompts`] - Prompt templates
//! - [`config`] - Configuration types and loading
//! - [`repl`] / [`cli`] - Front-ends

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod context;
pub mod credentials;
pub mod executor;
pub mod gate;
pub mod llm;
pub mod plan;
pub mod prompts;
pub mod repl;
pub mod session;

// Re-export commonly used types
pub use analyzer::{ContentAnalysis, ContentAnalyzer, fallback_analysis};
pub use config::{Config, LlmConfig, RetrievalConfig};
pub use context::ContextBuilder;
pub use credentials::{CredentialProvider, SessionCredentials};
pub use executor::{DryRunExecutor, ExecutionResult, ExecutionStatus, Executor};
pub use gate::{ConfirmationGate, Decision, GateError, GateState, Resolution};
pub use llm::{CompletionRequest, CompletionResponse, LlmClient, LlmError, create_client};
pub use plan::{ActionPlan, ActionPlanStep, ActionType, ParseError, extract_plan};
pub use session::{Message, MessageCategory, MessageId, Origin, Session, SessionError, Turn};
