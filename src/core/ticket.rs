use super::UserId;
use crate::error::{HelpdeskError, Result};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Appended to the creator snapshot name when the creator account is deleted
pub const DELETED_USER_SUFFIX: &str = " (Deleted User)";

/// Shown in place of an author that no longer exists
pub const DELETED_USER_LABEL: &str = "Deleted User";

static TICKET_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^GTN-(\d{6,})$").expect("ticket number pattern is valid"));

uuid_id!(
    /// Internal ticket identifier
    TicketId
);

uuid_id!(
    /// Comment identifier
    CommentId
);

/// Externally visible ticket number, rendered as `GTN-` plus a six digit
/// zero-padded sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TicketNumber(u64);

impl TicketNumber {
    #[must_use]
    pub const fn new(sequence: u64) -> Self {
        Self(sequence)
    }

    /// Numeric sequence value
    #[must_use]
    pub const fn sequence(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TicketNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GTN-{:06}", self.0)
    }
}

impl FromStr for TicketNumber {
    type Err = HelpdeskError;

    fn from_str(s: &str) -> Result<Self> {
        let caps = TICKET_NUMBER_RE
            .captures(s.trim())
            .ok_or_else(|| HelpdeskError::validation(format!("Invalid ticket number: {s}")))?;
        caps[1]
            .parse()
            .map(Self)
            .map_err(|_| HelpdeskError::validation(format!("Ticket number out of range: {s}")))
    }
}

impl TryFrom<String> for TicketNumber {
    type Error = HelpdeskError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<TicketNumber> for String {
    fn from(number: TicketNumber) -> Self {
        number.to_string()
    }
}

/// Ticket lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum Status {
    #[default]
    Open,
    #[serde(rename = "In Progress")]
    InProgress,
    Resolved,
    Closed,
}

impl Status {
    /// All statuses in lifecycle order
    pub const ALL: [Self; 4] = [Self::Open, Self::InProgress, Self::Resolved, Self::Closed];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::InProgress => "In Progress",
            Self::Resolved => "Resolved",
            Self::Closed => "Closed",
        }
    }

    /// Closed tickets accept no further status changes or assignments
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = HelpdeskError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace(['_', '-'], " ").as_str() {
            "open" => Ok(Self::Open),
            "in progress" | "inprogress" => Ok(Self::InProgress),
            "resolved" => Ok(Self::Resolved),
            "closed" => Ok(Self::Closed),
            _ => Err(HelpdeskError::validation(format!(
                "Invalid status: {s}. Must be one of: Open, In Progress, Resolved, Closed"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    Image,
    Document,
}

/// A stored upload belonging to a ticket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub filename: String,
    pub kind: AttachmentKind,
    pub uploaded_at: DateTime<Utc>,
}

/// A helpdesk ticket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub number: TicketNumber,
    pub title: String,
    pub description: String,
    pub category: String,
    pub priority: String,
    pub status: Status,

    /// `None` once the creator account has been deleted
    pub creator_id: Option<UserId>,
    pub user_name: String,
    pub user_ip_address: Option<String>,
    pub user_system_name: Option<String>,

    pub assigned_to: Option<UserId>,
    pub assigned_by: Option<UserId>,
    pub assigned_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl Ticket {
    /// The first image attachment, shown inline by front ends
    #[must_use]
    pub fn display_image(&self) -> Option<&Attachment> {
        self.attachments
            .iter()
            .find(|a| a.kind == AttachmentKind::Image)
    }

    #[must_use]
    pub fn has_attachment(&self, filename: &str) -> bool {
        self.attachments.iter().any(|a| a.filename == filename)
    }

    #[must_use]
    pub fn is_created_by(&self, user: UserId) -> bool {
        self.creator_id == Some(user)
    }

    #[must_use]
    pub fn is_assigned_to(&self, user: UserId) -> bool {
        self.assigned_to == Some(user)
    }

    /// Move to `status`, keeping `resolved_at` in step with it
    pub(crate) fn set_status(&mut self, status: Status, now: DateTime<Utc>) {
        if status == Status::Resolved {
            if self.status != Status::Resolved {
                self.resolved_at = Some(now);
            }
        } else {
            self.resolved_at = None;
        }
        self.status = status;
        self.updated_at = now;
    }
}

/// A comment on a ticket; immutable once written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub ticket_id: TicketId,
    pub author_id: UserId,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    #[must_use]
    pub fn new(ticket_id: TicketId, author_id: UserId, text: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id: CommentId::new(),
            ticket_id,
            author_id,
            text,
            created_at,
        }
    }
}
