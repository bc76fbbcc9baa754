use std::borrow::Cow::{self, Borrowed, Owned};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use tracing_subscriber::EnvFilter;

use portal_application::{Briefing, ChatPortal, PortalGate, SendOutcome};
use portal_core::conversation::{AssistantGateway, ConversationMessage, MessageRole};
use portal_core::lead::{AccessToken, LeadRepository};
use portal_infrastructure::{ConfigService, SupabaseLeadRepository};
use portal_interaction::WebhookAssistantGateway;

const BRIEFING_COMMAND: &str = "/briefing";
const EXIT_COMMAND: &str = "/exit";

/// Open an invited demo session in the terminal.
#[derive(Parser, Debug)]
#[command(name = "portal", version)]
struct Cli {
    /// Access token from the invitation link (`/demo/<token>`).
    token: String,

    /// Path to secret.json (defaults to ~/.config/portal/secret.json).
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Slash commands understood by the REPL, with a short description.
const COMMANDS: &[(&str, &str)] = &[
    (BRIEFING_COMMAND, "show the lead briefing again"),
    (EXIT_COMMAND, "leave the portal"),
];

/// Rustyline helper: completes and hints the slash commands, tints them cyan.
#[derive(Clone, Copy)]
struct CliHelper;

impl CliHelper {
    fn matching(prefix: &str) -> impl Iterator<Item = &'static (&'static str, &'static str)> + '_ {
        COMMANDS
            .iter()
            .filter(move |(name, _)| prefix.starts_with('/') && name.starts_with(prefix))
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let candidates = Self::matching(&line[..pos])
            .map(|(name, about)| Pair {
                display: format!("{}  {}", name, about),
                replacement: name.to_string(),
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if COMMANDS.iter().any(|(name, _)| *name == line.trim_end()) {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let typed = &line[..pos];
        Self::matching(typed)
            .next()
            .filter(|(name, _)| name.len() > typed.len())
            .map(|(name, _)| name[typed.len()..].to_string())
    }
}

impl Validator for CliHelper {}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_briefing(briefing: &Briefing) {
    println!("{}", briefing.business_name.bright_magenta().bold());
    println!(
        "{}",
        format!("Authenticated lead: {}", briefing.contact_name).bright_black()
    );
    println!("{}", format!("Preview: {}", briefing.website_url).bright_black());
    println!();
    if !briefing.value_proposition.is_empty() {
        println!("{}", briefing.value_proposition);
    }
    if !briefing.key_services.is_empty() {
        println!("{}", "Key verticals:".bright_black());
        for service in &briefing.key_services {
            println!("  {}", format!("- {}", service).yellow());
        }
    }
    println!();
    println!("{}", briefing.greeting.bright_blue());
}

fn print_message(message: &ConversationMessage) {
    match message.role {
        MessageRole::User => println!("{}", format!("> {}", message.content).green()),
        MessageRole::Assistant => {
            for line in message.content.lines() {
                println!("{}", line.bright_blue());
            }
            println!();
        }
    }
}

async fn send_and_print(portal: &ChatPortal, line: &str) {
    if !portal.can_send(line) {
        println!("{}", "Message not sent".bright_black());
        return;
    }

    let before = portal.messages().len();
    println!("{}", "Processing Data...".bright_black());
    if let SendOutcome::Skipped(reason) = portal.send(line).await {
        println!("{}", format!("Message not sent ({:?})", reason).bright_black());
        return;
    }

    for message in portal.messages().iter().skip(before) {
        print_message(message);
    }
}

/// Entry point for the Portal terminal session.
///
/// 1. Loads configuration and builds the record store and assistant clients
/// 2. Resolves the access token; a denied token ends the process
/// 3. Runs a REPL that forwards each line to the portal conversation
/// 4. Waits for background record store writes before exiting
#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    // ===== Backend Initialization =====
    let config_service = match cli.config {
        Some(path) => ConfigService::with_path(path),
        None => ConfigService::new(),
    };
    let config = config_service.load()?;

    let repository: Arc<dyn LeadRepository> =
        Arc::new(SupabaseLeadRepository::new(config.record_store.clone()));
    let gateway: Arc<dyn AssistantGateway> =
        Arc::new(WebhookAssistantGateway::from_config(&config.assistant));
    let gate = PortalGate::new(repository, gateway).with_reply_timeout(config.assistant.timeout());

    println!("{}", "Authenticating Portal...".bright_black());
    let portal = match gate.enter(&AccessToken::new(cli.token)).await {
        Ok(portal) => portal,
        Err(denied) => {
            eprintln!("{}", "Access Denied".red().bold());
            eprintln!("{}", denied.to_string().red());
            gate.settle().await;
            std::process::exit(1);
        }
    };

    // ===== REPL Setup =====
    let mut rl: Editor<CliHelper, DefaultHistory> = Editor::new()?;
    rl.set_helper(Some(CliHelper));

    println!();
    print_briefing(&portal.briefing());
    println!(
        "{}",
        format!(
            "Type a question, '{}' to show the briefing again, or '{}' to leave.",
            BRIEFING_COMMAND, EXIT_COMMAND
        )
        .bright_black()
    );
    println!();

    // ===== Main REPL Loop =====
    loop {
        match rl.readline(">> ") {
            Ok(line) => {
                let trimmed = line.trim();

                if trimmed == EXIT_COMMAND || trimmed == "quit" || trimmed == "exit" {
                    println!("{}", "Goodbye!".bright_green());
                    break;
                }

                if trimmed == BRIEFING_COMMAND {
                    print_briefing(&portal.briefing());
                    continue;
                }

                // Skip empty lines
                if trimmed.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(&line);
                send_and_print(&portal, &line).await;
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!(
                    "{}",
                    format!("CTRL-C detected. Type '{}' to leave.", EXIT_COMMAND).yellow()
                );
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        }
    }

    gate.settle().await;
    Ok(())
}
