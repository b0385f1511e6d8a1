//! CLI command definitions and subcommands

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::debug;

/// DeskPilot - plan desktop tasks from plain language
#[derive(Debug, Parser)]
#[command(
    name = "dp",
    about = "Conversational desktop assistant that drafts action plans for you to confirm",
    version,
    after_help = "Logs are written to: ~/.local/share/deskpilot/logs/deskpilot.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Subcommand to execute (defaults to chat)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start an interactive chat session
    Chat {
        /// First message to send
        input: Option<String>,
    },

    /// Draft a plan for one task and print it as JSON (never executes)
    Plan {
        /// Task description
        query: String,

        /// Stream the raw model reply to stderr while it arrives
        #[arg(long)]
        stream: bool,
    },

    /// Analyze text the way indexing does and print the result as JSON
    Analyze {
        /// Text to analyze
        text: String,
    },

    /// Print the system payload that would be sent for a query
    Prompt {
        /// Task description
        query: String,
    },
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("deskpilot")
        .join("logs")
        .join("deskpilot.log")
}
