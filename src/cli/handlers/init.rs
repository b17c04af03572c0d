//! Handler for the `init` command

use super::common::state_path;
use crate::cli::OutputFormatter;
use crate::cli::commands::GlobalOptions;
use crate::config::HelpdeskConfig;
use crate::error::{HelpdeskError, Result};
use crate::lifecycle::Helpdesk;
use crate::storage::{Dataset, MemoryStore};

/// Create the state file with default master data and the built-in accounts
///
/// # Errors
///
/// Returns an error if the state file already exists and `force` is not set,
/// or if it cannot be written.
pub fn handle_init(options: &GlobalOptions, force: bool, output: &OutputFormatter) -> Result<()> {
    let config = HelpdeskConfig::load(options.config.as_deref())?;
    let path = state_path(options, &config);

    if path.exists() && !force {
        return Err(HelpdeskError::validation(format!(
            "Helpdesk state already exists at {}. Use --force to start over",
            path.display()
        )));
    }

    let store = MemoryStore::create(&path, Dataset::seeded())?;
    let helpdesk = Helpdesk::new(store, config)?;
    let users = helpdesk.seed_default_users()?;
    tracing::info!(path = %path.display(), "helpdesk state initialized");

    if output.is_json() {
        return output.print_json(&serde_json::json!({
            "status": "success",
            "state_file": path.display().to_string(),
            "users": users.iter().map(|u| &u.username).collect::<Vec<_>>(),
        }));
    }

    output.success(&format!("Initialized helpdesk state at {}", path.display()));
    for user in &users {
        output.info(&format!("  created {} ({}, {})", user.username, user.role, user.email));
    }
    output.info("Run commands as another account with --as <username>");
    Ok(())
}
