//! DeskPilot - conversational desktop assistant
//!
//! CLI entry point for the interactive chat and the one-shot commands.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result, eyre};
use knowledgestore::KnowledgeIndex;
use tokio::sync::mpsc;
use tracing::{debug, info};

use deskpilot::analyzer::ContentAnalyzer;
use deskpilot::cli::{Cli, Command};
use deskpilot::config::Config;
use deskpilot::context::ContextBuilder;
use deskpilot::credentials::{CredentialProvider, SessionCredentials};
use deskpilot::llm::{CompletionRequest, LlmClient, Message, StreamChunk, create_client};
use deskpilot::plan::extract_plan;
use deskpilot::prompts::PromptLoader;
use deskpilot::repl;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("deskpilot")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(log_dir.join("deskpilot.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());

    // Setup logging with priority: CLI > config > INFO default
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(model = %config.llm.model, "DeskPilot loaded config");

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        None => repl::run_interactive(&config, None).await,
        Some(Command::Chat { input }) => repl::run_interactive(&config, input).await,
        Some(Command::Plan { query, stream }) => cmd_plan(&config, &query, stream).await,
        Some(Command::Analyze { text }) => cmd_analyze(&config, &text).await,
        Some(Command::Prompt { query }) => cmd_prompt(&config, &query),
    }
}

fn load_prompts(config: &Config) -> Result<Arc<PromptLoader>> {
    let loader = PromptLoader::new(config.prompts_dir.as_deref()).context("Failed to load prompt templates")?;
    Ok(Arc::new(loader))
}

fn build_client(config: &Config) -> Result<(Arc<dyn LlmClient>, Arc<SessionCredentials>)> {
    let credentials = Arc::new(SessionCredentials::from_config(&config.llm));
    let llm = create_client(&config.llm, credentials.clone()).context("Failed to create LLM client")?;
    Ok((llm, credentials))
}

async fn cmd_plan(config: &Config, query: &str, stream: bool) -> Result<()> {
    debug!(%query, stream, "cmd_plan: called");
    let (llm, credentials) = build_client(config)?;
    if credentials.get_credential().is_none() {
        return Err(eyre!(
            "No API key found. Set the {} environment variable or configure llm.credentials-file.",
            config.llm.api_key_env
        ));
    }

    let context = ContextBuilder::new(load_prompts(config)?, config.retrieval.clone());
    let system_prompt = context
        .build(query, &KnowledgeIndex::new())
        .context("Failed to build context")?;

    let mut params = config.plan.clone();
    params.stream = params.stream || stream;
    let request = CompletionRequest {
        system_prompt,
        messages: vec![Message::user(query)],
        params,
    };

    let result = if request.params.stream {
        let (tx, mut rx) = mpsc::channel::<StreamChunk>(100);
        let print_handle = tokio::spawn(async move {
            while let Some(chunk) = rx.recv().await {
                match chunk {
                    StreamChunk::TextDelta(text) => {
                        eprint!("{}", text.dimmed());
                        let _ = io::stderr().flush();
                    }
                    StreamChunk::MessageDone { .. } => eprintln!(),
                    StreamChunk::Error(err) => eprintln!("\n{} {}", "Stream error:".red(), err),
                }
            }
        });
        let response = llm.stream(request, tx).await;
        let _ = print_handle.await;
        response
    } else {
        llm.complete(request).await
    };
    let response = result.context("Plan request failed")?;

    let plan = extract_plan(&response.into_text()).context("Could not extract a plan from the reply")?;
    if !plan.is_actionable() {
        eprintln!("{}", "The request was not recognised as a task.".yellow());
    }
    println!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(())
}

async fn cmd_analyze(config: &Config, text: &str) -> Result<()> {
    debug!(text_len = text.len(), "cmd_analyze: called");
    let (llm, _) = build_client(config)?;
    let analyzer = ContentAnalyzer::new(llm, load_prompts(config)?, config.analysis.clone());

    let analysis = analyzer.analyze(text).await;
    println!("{}", serde_json::to_string_pretty(&analysis)?);
    Ok(())
}

fn cmd_prompt(config: &Config, query: &str) -> Result<()> {
    debug!(%query, "cmd_prompt: called");
    let context = ContextBuilder::new(load_prompts(config)?, config.retrieval.clone());
    let payload = context
        .build(query, &KnowledgeIndex::new())
        .context("Failed to build context")?;
    println!("{}", payload);
    Ok(())
}
