//! REPL session management

use std::sync::Arc;

use colored::Colorize;
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{debug, info};

use crate::credentials::SessionCredentials;
use crate::session::{Message, MessageCategory, Origin, Session, SessionError, Turn};

/// What a line of input asks the REPL to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplAction {
    Help,
    Quit,
    Confirm,
    Cancel,
    ClearIndex,
    IndexStats,
    History,
    EnterKey,
    Unknown(String),
    /// Plain input while a plan waits for y/n; never sent to the session
    AwaitingDecision(String),
    /// Plain input for the session
    Submit(String),
}

impl ReplAction {
    /// Classify one trimmed, non-empty input line
    ///
    /// While a plan is pending, `y`/`yes` and `n`/`no` answer it and any
    /// other plain text is held back.
    pub fn parse(input: &str, plan_pending: bool) -> Self {
        if let Some(cmd) = input.strip_prefix('/') {
            let cmd = cmd.split_whitespace().next().unwrap_or_default();
            return match cmd {
                "help" | "h" => Self::Help,
                "quit" | "q" | "exit" => Self::Quit,
                "confirm" | "yes" => Self::Confirm,
                "cancel" | "no" => Self::Cancel,
                "clear-index" => Self::ClearIndex,
                "index" => Self::IndexStats,
                "history" => Self::History,
                "key" => Self::EnterKey,
                other => Self::Unknown(format!("/{}", other)),
            };
        }

        if plan_pending {
            match input.to_lowercase().as_str() {
                "y" | "yes" => return Self::Confirm,
                "n" | "no" => return Self::Cancel,
                _ => return Self::AwaitingDecision(input.to_string()),
            }
        }
        Self::Submit(input.to_string())
    }
}

/// Interactive REPL session
pub struct ReplSession {
    session: Session,
    credentials: Arc<SessionCredentials>,
    model: String,
}

impl ReplSession {
    /// Create a new REPL session
    ///
    /// `credentials` must be the same provider the session was built with so
    /// a key entered here is seen by the model client.
    pub fn new(session: Session, credentials: Arc<SessionCredentials>, model: impl Into<String>) -> Self {
        Self {
            session,
            credentials,
            model: model.into(),
        }
    }

    /// Run the REPL main loop
    pub async fn run(&mut self, initial_input: Option<String>) -> Result<()> {
        // Create readline editor for proper line editing
        let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;

        self.print_welcome();

        if let Some(input) = initial_input {
            println!("{} {}", ">".bright_green(), input);
            self.process_input(&mut rl, &input).await?;
        }

        loop {
            let prompt = if self.session.accepts_input() {
                format!("{} ", ">".bright_green())
            } else {
                format!("{} ", "confirm? [y/n] >".bright_yellow())
            };

            match rl.readline(&prompt) {
                Ok(line) => {
                    let input = line.trim();
                    if input.is_empty() {
                        continue;
                    }
                    let _ = rl.add_history_entry(input);

                    if !self.process_input(&mut rl, input).await? {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C - just show new prompt
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!();
                    break;
                }
                Err(err) => {
                    return Err(eyre::eyre!("Readline error: {}", err));
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    /// Handle one line; returns false when the user asked to quit
    async fn process_input(&mut self, rl: &mut DefaultEditor, input: &str) -> Result<bool> {
        let action = ReplAction::parse(input, !self.session.accepts_input());
        debug!(?action, "ReplSession::process_input: called");

        match action {
            ReplAction::Help => self.print_help(),
            ReplAction::Quit => return Ok(false),
            ReplAction::Confirm => match self.session.pending_plan().map(|(id, _)| id) {
                Some(id) => {
                    let turn = self.session.confirm(id);
                    self.print_turn(&turn);
                }
                None => println!("{}", "No plan is waiting for confirmation.".dimmed()),
            },
            ReplAction::Cancel => match self.session.pending_plan().map(|(id, _)| id) {
                Some(id) => {
                    let turn = self.session.cancel(id);
                    self.print_turn(&turn);
                }
                None => println!("{}", "No plan is waiting for confirmation.".dimmed()),
            },
            ReplAction::ClearIndex => {
                let turn = self.session.clear_index();
                self.print_turn(&turn);
            }
            ReplAction::IndexStats => self.print_index_stats(),
            ReplAction::History => self.print_history(),
            ReplAction::EnterKey => {
                self.prompt_for_key(rl)?;
            }
            ReplAction::Unknown(cmd) => {
                println!("{} Unknown command: {}", "?".yellow(), cmd);
                println!("Type {} for available commands", "/help".yellow());
            }
            ReplAction::AwaitingDecision(_) => self.print_pending_notice(),
            ReplAction::Submit(text) => self.submit(rl, &text).await?,
        }
        Ok(true)
    }

    async fn submit(&mut self, rl: &mut DefaultEditor, text: &str) -> Result<()> {
        if !self.session.accepts_input() {
            self.print_pending_notice();
            return Ok(());
        }
        println!("{}", "Thinking...".dimmed());
        match self.session.submit(text).await {
            Ok(turn) => self.print_turn(&turn),
            Err(SessionError::CredentialMissing) => {
                println!("{}", "An API key is needed to plan tasks.".yellow());
                if self.prompt_for_key(rl)? {
                    match self.session.submit(text).await {
                        Ok(turn) => self.print_turn(&turn),
                        Err(e) => println!("{} {}", "!".red(), e),
                    }
                }
            }
            Err(SessionError::PlanPending { .. }) => self.print_pending_notice(),
            Err(e) => println!("{} {}", "!".red(), e),
        }
        Ok(())
    }

    fn print_pending_notice(&self) {
        println!(
            "{}",
            "A plan is waiting for your decision. Answer y to confirm or n to cancel.".yellow()
        );
    }

    /// Ask for an API key; returns whether one was entered
    fn prompt_for_key(&self, rl: &mut DefaultEditor) -> Result<bool> {
        match rl.readline(&format!("{} ", "API key:".bright_cyan())) {
            Ok(line) if !line.trim().is_empty() => {
                self.credentials.enter(line.trim());
                info!("API key entered for this session");
                println!("{}", "Key stored for this session only.".dimmed());
                Ok(true)
            }
            Ok(_) | Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                println!("{}", "No key entered.".dimmed());
                Ok(false)
            }
            Err(err) => Err(eyre::eyre!("Readline error: {}", err)),
        }
    }

    /// Print welcome message
    fn print_welcome(&self) {
        println!();
        println!("{}", "DeskPilot".bright_cyan().bold());
        println!("Model: {}", self.model);
        if let Some(source) = self.credentials.active_source() {
            println!("API key: {}", source.dimmed());
        }
        println!("Type {} for help, {} to quit", "/help".yellow(), "/quit".yellow());
        println!();
        if let Some(welcome) = self.session.log().messages().first() {
            println!("{}", render_message(welcome));
            println!();
        }
    }

    /// Print help message
    fn print_help(&self) {
        println!();
        println!("{}", "Available Commands:".bright_cyan());
        println!("  {:14} Show this help", "/help".yellow());
        println!("  {:14} Exit the REPL", "/quit".yellow());
        println!("  {:14} Confirm the pending plan (or answer y)", "/confirm".yellow());
        println!("  {:14} Cancel the pending plan (or answer n)", "/cancel".yellow());
        println!("  {:14} Remove everything from the knowledge index", "/clear-index".yellow());
        println!("  {:14} Show knowledge index statistics", "/index".yellow());
        println!("  {:14} Show conversation history", "/history".yellow());
        println!("  {:14} Enter an API key for this session", "/key".yellow());
        println!();
        println!("{}", "Input:".bright_cyan());
        println!("  {:14} Add text to the knowledge index", "index this:".yellow());
        println!("  {:14} Same as index this:", "analyze this:".yellow());
        println!("  {:14} Anything else is planned as a task", "<text>".yellow());
        println!();
    }

    fn print_index_stats(&self) {
        let stats = self.session.index_stats();
        println!(
            "{} {} entries, {} keywords",
            "Knowledge index:".bright_cyan(),
            stats.entry_count,
            stats.keyword_count
        );
    }

    /// Print conversation history
    fn print_history(&self) {
        let messages = self.session.log().messages();
        if messages.is_empty() {
            println!("{}", "No conversation history.".dimmed());
            return;
        }

        println!();
        println!("{}", "Conversation History:".bright_cyan());
        for msg in messages {
            let who = match msg.origin {
                Origin::User => "User".bright_green(),
                Origin::Agent => "DeskPilot".bright_blue(),
            };
            let preview: String = msg.text.chars().take(60).collect();
            let preview = if msg.text.chars().count() > 60 { format!("{}...", preview) } else { preview };
            println!("  {} {}: {}", msg.id.to_string().dimmed(), who, preview.replace('\n', " "));
        }
        println!();
    }

    fn print_turn(&self, turn: &Turn) {
        if turn.is_empty() {
            println!("{}", "Nothing to do.".dimmed());
            return;
        }
        for msg in turn.messages.iter().filter(|m| m.origin == Origin::Agent) {
            println!("{}", render_message(msg));
            println!();
        }
        if turn.plan().is_some() {
            println!("{}", "Answer y to confirm or n to cancel.".yellow());
        }
    }
}

/// Colour an agent message by category
fn render_message(msg: &Message) -> String {
    match msg.category {
        Some(MessageCategory::Plan) => msg.text.bright_white().to_string(),
        Some(MessageCategory::Indexing) | Some(MessageCategory::ClearIndex) => msg.text.bright_blue().to_string(),
        Some(MessageCategory::Confirmation) => msg.text.bright_green().to_string(),
        Some(MessageCategory::Cancellation) => msg.text.yellow().to_string(),
        Some(MessageCategory::Error) => msg.text.red().to_string(),
        Some(MessageCategory::Info) | None => msg.text.clone(),
    }
}
