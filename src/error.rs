//! Error types for gtn-helpdesk
//!
//! Every fallible operation in the crate returns [`Result`]. The variants
//! follow the helpdesk error taxonomy: caller mistakes (`Validation`),
//! policy denials (`Forbidden`), missing references (`NotFound`), sequence
//! races (`Conflict`), degraded collaborators (`TransientDependency`) and
//! commit failures (`FatalStore`).

use thiserror::Error;

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, HelpdeskError>;

/// Main error type for gtn-helpdesk
#[derive(Error, Debug)]
pub enum HelpdeskError {
    /// Malformed or insufficient input, surfaced to the caller for correction
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The actor's role does not allow the action
    #[error("Forbidden: {actor} may not {action}")]
    Forbidden { actor: String, action: String },

    /// A referenced entity does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Ticket number allocation collided with an existing row
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Mailer or file store failure; never fatal to the triggering action
    #[error("Dependency unavailable: {0}")]
    TransientDependency(String),

    /// The transaction could not be committed; state is unchanged
    #[error("Store failure: {0}")]
    FatalStore(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("{0}")]
    Custom(String),
}

impl HelpdeskError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a custom error
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom(message.into())
    }

    /// Create a not-found error for the given entity kind
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Create a policy denial
    pub fn forbidden(actor: impl Into<String>, action: impl Into<String>) -> Self {
        Self::Forbidden {
            actor: actor.into(),
            action: action.into(),
        }
    }

    /// Whether the operation may succeed if attempted again internally
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// Whether the caller can fix the problem by changing the request
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::NotFound { .. } | Self::TransientDependency(_)
        )
    }

    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Hints for fixing the error from the command line
    #[must_use]
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Forbidden { .. } => vec![
                "Run the command as a super admin with --as <username>".to_string(),
            ],
            Self::NotFound { entity: "User", .. } => vec![
                "List accounts with `gtn-helpdesk user list`".to_string(),
            ],
            Self::NotFound { entity: "Ticket", .. } => vec![
                "Ticket numbers look like GTN-000042".to_string(),
                "List tickets with `gtn-helpdesk ticket list`".to_string(),
            ],
            Self::Config(_) => vec![
                "Check the config file and any HELPDESK__* environment variables".to_string(),
            ],
            Self::FatalStore(_) => vec![
                "Check that the state file directory exists and is writable".to_string(),
            ],
            _ => Vec::new(),
        }
    }

    /// Short message suitable for an operator-facing console
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Forbidden { action, .. } => format!("You do not have permission to {action}."),
            Self::FatalStore(_) => "The change could not be saved. Nothing was modified.".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for HelpdeskError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for HelpdeskError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_conflicts_are_retryable() {
        assert!(HelpdeskError::Conflict("GTN-000001".into()).is_retryable());
        assert!(!HelpdeskError::validation("too short").is_retryable());
        assert!(!HelpdeskError::forbidden("jdoe", "assign tickets").is_retryable());
        assert!(!HelpdeskError::FatalStore("disk full".into()).is_retryable());
    }

    #[test]
    fn test_user_message_hides_store_detail() {
        let err = HelpdeskError::FatalStore("rename failed: EXDEV".into());
        assert!(!err.user_message().contains("EXDEV"));

        let err = HelpdeskError::forbidden("jdoe", "assign tickets");
        assert_eq!(err.user_message(), "You do not have permission to assign tickets.");
    }

    #[test]
    fn test_not_found_display() {
        let err = HelpdeskError::not_found("Ticket", "GTN-000042");
        assert_eq!(err.to_string(), "Ticket not found: GTN-000042");
    }
}
