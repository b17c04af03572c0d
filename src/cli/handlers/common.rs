use crate::cli::commands::GlobalOptions;
use crate::config::HelpdeskConfig;
use crate::core::{TicketNumber, User};
use crate::error::Result;
use crate::lifecycle::Helpdesk;
use crate::storage::MemoryStore;
use std::path::PathBuf;

/// Common context for all handler operations
pub struct HandlerContext {
    pub helpdesk: Helpdesk<MemoryStore>,
    actor: String,
}

impl HandlerContext {
    /// Load the configuration and open the state file
    pub fn open(options: &GlobalOptions) -> Result<Self> {
        let config = HelpdeskConfig::load(options.config.as_deref())?;
        let path = state_path(options, &config);
        let store = MemoryStore::open(path)?;

        Ok(Self {
            helpdesk: Helpdesk::new(store, config)?,
            actor: options.actor.clone(),
        })
    }

    /// The account named by `--as`
    pub fn actor(&self) -> Result<User> {
        self.helpdesk.find_user(&self.actor)
    }
}

/// `--state` if given, otherwise the configured state file
pub fn state_path(options: &GlobalOptions, config: &HelpdeskConfig) -> PathBuf {
    options
        .state
        .clone()
        .unwrap_or_else(|| config.storage.state_file.clone())
}

/// Parse `GTN-000042`, or a bare sequence like `42`
pub fn parse_ticket_number(raw: &str) -> Result<TicketNumber> {
    match raw.trim().parse::<u64>() {
        Ok(sequence) => Ok(TicketNumber::new(sequence)),
        Err(_) => raw.to_uppercase().parse(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ticket_number_forms() {
        assert_eq!(parse_ticket_number("42").unwrap(), TicketNumber::new(42));
        assert_eq!(parse_ticket_number("gtn-000042").unwrap(), TicketNumber::new(42));
        assert!(parse_ticket_number("ticket-42").is_err());
    }
}
