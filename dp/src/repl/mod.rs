//! Interactive REPL for DeskPilot
//!
//! Line-edited chat loop over a [`Session`](crate::session::Session) with
//! slash commands and y/n answers for pending plans.

mod session;

pub use session::{ReplAction, ReplSession};

use std::sync::Arc;

use eyre::{Context, Result};

use crate::config::Config;
use crate::credentials::SessionCredentials;
use crate::executor::DryRunExecutor;
use crate::llm::create_client;
use crate::session::Session;

/// Run the interactive REPL
///
/// This is the main entry point for `dp chat`. A missing API key is not an
/// error here; the REPL asks for one the first time a task needs it.
pub async fn run_interactive(config: &Config, initial_input: Option<String>) -> Result<()> {
    let credentials = Arc::new(SessionCredentials::from_config(&config.llm));
    let llm = create_client(&config.llm, credentials.clone()).context("Failed to create LLM client")?;
    let session = Session::new(config, llm, credentials.clone(), Box::new(DryRunExecutor))
        .context("Failed to load prompt templates")?;

    let mut repl = ReplSession::new(session, credentials, config.llm.model.clone());
    repl.run(initial_input).await
}
