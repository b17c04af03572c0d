//! gtn-helpdesk - IT helpdesk ticket tracking
//!
//! Entry point for the command-line client. Parses arguments, sets up
//! logging and dispatches to the command handlers.

use clap::Parser;
use gtn_helpdesk::cli::handlers::{
    HandlerContext, handle_init, handle_master_data_command, handle_notifications_command, handle_report_command,
    handle_ticket_command, handle_user_command,
};
use gtn_helpdesk::cli::{Cli, Commands, OutputFormatter};
use gtn_helpdesk::error::{HelpdeskError, Result};
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    let formatter = OutputFormatter::new(cli.json, cli.no_color);

    if let Err(e) = run(cli, &formatter) {
        handle_error(&e, &formatter);
        process::exit(1);
    }
}

/// Run the CLI application with the parsed arguments
///
/// # Errors
///
/// Returns any error that occurs during command execution
fn run(cli: Cli, formatter: &OutputFormatter) -> Result<()> {
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    dispatch_command(cli, formatter)
}

fn dispatch_command(cli: Cli, formatter: &OutputFormatter) -> Result<()> {
    if let Commands::Init { force } = cli.command {
        return handle_init(&cli.global, force, formatter);
    }

    let ctx = HandlerContext::open(&cli.global)?;
    match cli.command {
        Commands::Init { .. } => unreachable!("init is handled before the state is opened"),
        Commands::User { command } => handle_user_command(command, &ctx, formatter),
        Commands::Ticket { command } => handle_ticket_command(command, &ctx, formatter),
        Commands::Report { command } => handle_report_command(command, &ctx, formatter),
        Commands::Notifications {
            outcome,
            category,
            limit,
        } => handle_notifications_command(outcome, category, limit, &ctx, formatter),
        Commands::MasterData { command } => handle_master_data_command(command, &ctx, formatter),
    }
}

/// Display an error with its suggestions, or as a JSON object in JSON mode
fn handle_error(error: &HelpdeskError, formatter: &OutputFormatter) {
    formatter.error(&error.user_message());

    let suggestions = error.suggestions();
    if !suggestions.is_empty() && !formatter.is_json() {
        formatter.info("\nSuggestions:");
        for suggestion in &suggestions {
            formatter.info(&format!("  • {suggestion}"));
        }
    }

    if formatter.is_json() {
        if let Err(e) = formatter.json(&serde_json::json!({
            "status": "error",
            "error": error.to_string(),
            "error_type": format!("{error:?}"),
            "suggestions": suggestions,
            "recoverable": error.is_recoverable(),
            "is_config_error": error.is_config_error(),
        })) {
            tracing::debug!(error = %e, "failed to write JSON error report");
        }
    }

    if tracing::enabled!(tracing::Level::DEBUG) {
        eprintln!("\nDebug information:");
        eprintln!("{error:?}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let _cli = Cli::parse_from(["gtn-helpdesk", "init"]);
        let _cli = Cli::parse_from(["gtn-helpdesk", "ticket", "list", "--status", "open"]);
        let _cli = Cli::parse_from(["gtn-helpdesk", "--as", "testuser", "ticket", "create", "Printer jam", "-d", "Paper stuck in tray 2"]);
        let _cli = Cli::parse_from(["gtn-helpdesk", "master-data", "toggle", "category", "Network", "--disable"]);
    }
}
