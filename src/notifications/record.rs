use crate::core::{TicketId, UserId};
use crate::error::{HelpdeskError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

uuid_id!(
    /// Notification journal entry identifier
    NotificationId
);

/// Kind of message sent, used for filtering the journal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationCategory {
    Created,
    Assigned,
    Updated,
    Comment,
}

impl NotificationCategory {
    pub const ALL: [Self; 4] = [Self::Created, Self::Assigned, Self::Updated, Self::Comment];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Assigned => "assigned",
            Self::Updated => "updated",
            Self::Comment => "comment",
        }
    }
}

impl fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationCategory {
    type Err = HelpdeskError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s.trim_start_matches("ticket_"))
            .ok_or_else(|| {
                HelpdeskError::validation(format!(
                    "Invalid notification category: {s}. Must be one of: created, assigned, updated, comment"
                ))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryOutcome {
    Sent,
    Failed,
}

impl fmt::Display for DeliveryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Sent => "sent",
            Self::Failed => "failed",
        })
    }
}

impl FromStr for DeliveryOutcome {
    type Err = HelpdeskError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sent" => Ok(Self::Sent),
            "failed" => Ok(Self::Failed),
            _ => Err(HelpdeskError::validation(format!(
                "Invalid delivery outcome: {s}. Must be sent or failed"
            ))),
        }
    }
}

/// One delivery attempt; the journal is append-only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: NotificationId,
    pub recipient: String,
    pub subject: String,
    pub category: NotificationCategory,
    pub outcome: DeliveryOutcome,
    pub error: Option<String>,
    pub ticket_id: Option<TicketId>,
    pub user_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
}
