use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use crate::config::{self, AppConfig};
use crate::gateway::trello::TrelloClient;
use crate::gateway::TrelloGateway;
use crate::server::{self, AppState};
use crate::twin::{create, reconcile, remove, TwinSettings};

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Serve,
    Twin(String),
    Untwin(String),
    Reconcile,
    Help,
}

#[derive(Debug, PartialEq, Eq)]
pub struct Invocation {
    pub command: Command,
    pub config: Option<PathBuf>,
}

/// Parse command-line arguments (without the program name).
///
/// Supported forms:
///   twin-sync [serve]
///   twin-sync twin <card_id>
///   twin-sync untwin <card_id>
///   twin-sync reconcile
///   twin-sync --config <path> <command>
pub fn parse_args(args: &[String]) -> Result<Invocation> {
    let mut config: Option<PathBuf> = None;
    let mut words: Vec<&str> = Vec::new();
    let mut i = 0;

    while i < args.len() {
        match args[i].as_str() {
            "-c" | "--config" => {
                i += 1;
                if i < args.len() {
                    config = Some(PathBuf::from(&args[i]));
                } else {
                    bail!("Missing value for -c/--config flag");
                }
            }
            "-h" | "--help" => words.push("help"),
            word => words.push(word),
        }
        i += 1;
    }

    let command = match words.as_slice() {
        [] | ["serve"] => Command::Serve,
        ["twin", card_id] => Command::Twin(card_id.to_string()),
        ["untwin", card_id] => Command::Untwin(card_id.to_string()),
        ["twin"] | ["untwin"] => bail!("Missing card ID\n\nUsage: twin-sync {} <card_id>", words[0]),
        ["reconcile"] => Command::Reconcile,
        ["help", ..] => Command::Help,
        other => bail!("Unknown command: {}\n\nRun `twin-sync help` for usage.", other.join(" ")),
    };

    Ok(Invocation { command, config })
}

pub async fn run(invocation: Invocation) -> Result<()> {
    if invocation.command == Command::Help {
        print_help();
        return Ok(());
    }

    let config = config::load_config(invocation.config.as_deref())?;
    let settings = TwinSettings::from(&config.twin);
    let gateway = gateway_for(&config);

    match invocation.command {
        Command::Serve => {
            let state = AppState::new(gateway, settings);
            server::serve(state, config.server.bind).await
        }
        Command::Twin(card_id) => {
            let created = create::create_twin(gateway.as_ref(), &settings, &card_id)
                .await
                .with_context(|| format!("Failed to copy card {card_id}"))?;
            println!("Twinned {card_id} -> {}", created.twin_id);
            report_failures(created.outcome.failed)
        }
        Command::Untwin(card_id) => {
            let outcome = remove::remove_twin(gateway.as_ref(), &card_id)
                .await
                .with_context(|| format!("Failed to list links on card {card_id}"))?;
            if outcome.succeeded == 0 && outcome.failed == 0 {
                println!("{card_id} has no twin");
            } else {
                println!("Untwinned {card_id}");
            }
            report_failures(outcome.failed)
        }
        Command::Reconcile => {
            let report = reconcile::reconcile(gateway.as_ref())
                .await
                .context("Failed to list webhooks")?;
            println!(
                "Inspected {} watch-webhooks, re-activated {}",
                report.inspected, report.reactivated
            );
            for card_id in &report.duplicated_cards {
                println!("  {card_id} carries more than one watch-webhook");
            }
            report_failures(report.failed)
        }
        Command::Help => Ok(()),
    }
}

fn gateway_for(config: &AppConfig) -> Arc<dyn TrelloGateway> {
    Arc::new(TrelloClient::new(
        &config.trello,
        config.twin.webhook_url.clone(),
    ))
}

fn report_failures(failed: usize) -> Result<()> {
    if failed > 0 {
        bail!("{failed} step(s) failed; see log output");
    }
    Ok(())
}

pub fn print_help() {
    println!("twin-sync — mirror Trello cards across boards\n");
    println!("USAGE:");
    println!("  twin-sync [serve]          Receive Trello webhooks (default)");
    println!("  twin-sync twin <card_id>   Create a twin for a card now");
    println!("  twin-sync untwin <card_id> Archive a card's twin and unlink it");
    println!("  twin-sync reconcile        Re-enable watch-webhooks left disabled");
    println!();
    println!("OPTIONS:");
    println!(
        "  -c, --config <path>  Config file (default: ${} or ~/.twin-sync/config.toml)",
        config::CONFIG_ENV
    );
}
