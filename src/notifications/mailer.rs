//! Outbound mail seam
//!
//! SMTP transport is not part of this crate. [`LogMailer`] records the message
//! through `tracing`, [`DisabledMailer`] stands in when no email settings are
//! active so every attempt is journaled as failed.

use crate::config::EmailSettings;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MailError {
    #[error("No active email settings configured")]
    NotConfigured,

    #[error("Recipient rejected: {0}")]
    Rejected(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

/// Sends a rendered notification to one recipient
#[cfg_attr(test, mockall::automock)]
pub trait Mailer: Send + Sync {
    fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError>;
}

/// Accepts every well-formed address and logs the message
#[derive(Debug, Clone)]
pub struct LogMailer {
    sender: String,
}

impl LogMailer {
    pub fn new(sender: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
        }
    }
}

impl Mailer for LogMailer {
    fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
        if !is_plausible_address(to) {
            return Err(MailError::Rejected(to.to_string()));
        }
        tracing::info!(from = %self.sender, to, subject, bytes = body.len(), "email sent");
        Ok(())
    }
}

/// Fails every send with [`MailError::NotConfigured`]
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledMailer;

impl Mailer for DisabledMailer {
    fn send(&self, to: &str, subject: &str, _body: &str) -> Result<(), MailError> {
        tracing::debug!(to, subject, "email skipped, no active settings");
        Err(MailError::NotConfigured)
    }
}

/// Pick a mailer for the configured email settings
#[must_use]
pub fn mailer_for(settings: Option<&EmailSettings>) -> Arc<dyn Mailer> {
    match settings {
        Some(settings) if settings.is_active => Arc::new(LogMailer::new(settings.sender())),
        _ => Arc::new(DisabledMailer),
    }
}

fn is_plausible_address(address: &str) -> bool {
    address
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.') && !address.contains(' '))
}
