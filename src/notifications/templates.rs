//! Built-in notification templates rendered with tera
//!
//! Each template kind has a subject and a body template. Installations can
//! override either by dropping `<name>.subject` or `<name>.body` files into a
//! custom template directory.

use crate::error::Result;
use serde::Serialize;
use std::path::Path;
use tera::{Context, Tera};

use super::NotificationCategory;

const SIGNATURE: &str = "\n\nBest regards,\nGTN IT Helpdesk Team";

/// Which message a recipient gets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    Created,
    AssignedToAssignee,
    AssignmentUpdate,
    StatusToCreator,
    StatusToAssignee,
    CommentToCreator,
    CommentToAssignee,
}

impl TemplateKind {
    pub const ALL: [Self; 7] = [
        Self::Created,
        Self::AssignedToAssignee,
        Self::AssignmentUpdate,
        Self::StatusToCreator,
        Self::StatusToAssignee,
        Self::CommentToCreator,
        Self::CommentToAssignee,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Created => "ticket_created",
            Self::AssignedToAssignee => "ticket_assigned",
            Self::AssignmentUpdate => "assignment_update",
            Self::StatusToCreator => "status_creator",
            Self::StatusToAssignee => "status_assignee",
            Self::CommentToCreator => "comment_creator",
            Self::CommentToAssignee => "comment_assignee",
        }
    }

    /// Journal category for messages of this kind
    #[must_use]
    pub const fn category(self) -> NotificationCategory {
        match self {
            Self::Created => NotificationCategory::Created,
            Self::AssignedToAssignee => NotificationCategory::Assigned,
            Self::AssignmentUpdate | Self::StatusToCreator | Self::StatusToAssignee => {
                NotificationCategory::Updated
            },
            Self::CommentToCreator | Self::CommentToAssignee => NotificationCategory::Comment,
        }
    }

    const fn subject_source(self) -> &'static str {
        match self {
            Self::Created => "Ticket Created: {{ ticket_number }}",
            Self::AssignedToAssignee => "Ticket Assigned: {{ ticket_number }}",
            Self::AssignmentUpdate => "Ticket Update: {{ ticket_number }} - Assigned",
            Self::StatusToCreator | Self::StatusToAssignee => {
                "Ticket Update: {{ ticket_number }} - Status Changed"
            },
            Self::CommentToCreator | Self::CommentToAssignee => {
                "Ticket Update: {{ ticket_number }} - New Comment"
            },
        }
    }

    const fn body_source(self) -> &'static str {
        match self {
            Self::Created => {
                "Hello {{ recipient_name }},

Your support ticket has been successfully created with the following details:

Ticket Number: {{ ticket_number }}
Title: {{ title }}
Category: {{ category }}
Priority: {{ priority }}
Status: {{ status }}
Description: {{ description }}

We will review your ticket and assign it to the appropriate team member shortly.
You will receive email notifications for all updates to your ticket."
            },
            Self::AssignedToAssignee => {
                "Hello {{ recipient_name }},

You have been assigned to work on the following ticket:

Ticket Number: {{ ticket_number }}
Title: {{ title }}
Category: {{ category }}
Priority: {{ priority }}
Status: {{ status }}
Assigned By: {{ actor_name }}
Created By: {{ creator_name }}

Description: {{ description }}

Please review the ticket details and update the status as you work on it."
            },
            Self::AssignmentUpdate => {
                "Hello {{ recipient_name }},

Your ticket has been assigned to a team member:

Ticket Number: {{ ticket_number }}
Title: {{ title }}
Status: {{ status }}
Assigned To: {{ assignee_name }}
Assigned By: {{ actor_name }}

Our team is now working on your request. You will receive updates as progress is made."
            },
            Self::StatusToCreator => {
                "Hello {{ recipient_name }},

Your ticket status has been updated:

Ticket Number: {{ ticket_number }}
Title: {{ title }}
Previous Status: {{ previous_status }}
Current Status: {{ status }}
Updated By: {{ actor_name }}

{% if status == \"Resolved\" %}Your ticket has been resolved! Please review the solution and let us know if you need any further assistance.{% else %}We are continuing to work on your request.{% endif %}"
            },
            Self::StatusToAssignee => {
                "Hello {{ recipient_name }},

A ticket assigned to you has been updated:

Ticket Number: {{ ticket_number }}
Title: {{ title }}
Previous Status: {{ previous_status }}
Current Status: {{ status }}
Updated By: {{ actor_name }}

Please review the ticket for any additional actions needed."
            },
            Self::CommentToCreator => {
                "Hello {{ recipient_name }},

A new comment has been added to your ticket:

Ticket Number: {{ ticket_number }}
Title: {{ title }}
Comment By: {{ actor_name }}
Comment: {{ comment }}

You can view the full ticket details in the portal."
            },
            Self::CommentToAssignee => {
                "Hello {{ recipient_name }},

A new comment has been added to a ticket assigned to you:

Ticket Number: {{ ticket_number }}
Title: {{ title }}
Comment By: {{ actor_name }}
Comment: {{ comment }}

Please review the comment and respond if necessary."
            },
        }
    }
}

/// Values available to every template
#[derive(Debug, Clone, Default, Serialize)]
pub struct MessageContext {
    pub recipient_name: String,
    pub ticket_number: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub priority: String,
    pub status: String,
    pub previous_status: Option<String>,
    pub creator_name: String,
    pub assignee_name: Option<String>,
    pub actor_name: String,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub subject: String,
    pub body: String,
}

/// Template registry for notification messages
pub struct NotificationTemplates {
    tera: Tera,
}

impl std::fmt::Debug for NotificationTemplates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationTemplates")
            .field("templates", &self.tera.get_template_names().count())
            .finish()
    }
}

impl NotificationTemplates {
    /// Registry with the built-in templates
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        for kind in TemplateKind::ALL {
            tera.add_raw_template(&subject_name(kind), kind.subject_source())?;
            tera.add_raw_template(&body_name(kind), &format!("{}{SIGNATURE}", kind.body_source()))?;
        }
        Ok(Self { tera })
    }

    /// Override built-ins with `<name>.subject` / `<name>.body` files from `dir`
    ///
    /// Returns how many templates were replaced.
    pub fn load_custom_templates(&mut self, dir: &Path) -> Result<usize> {
        let mut replaced = 0;
        for kind in TemplateKind::ALL {
            for name in [subject_name(kind), body_name(kind)] {
                let path = dir.join(&name);
                if path.is_file() {
                    let source = std::fs::read_to_string(&path)?;
                    self.tera.add_raw_template(&name, &source)?;
                    replaced += 1;
                }
            }
        }
        tracing::debug!(dir = %dir.display(), replaced, "custom notification templates loaded");
        Ok(replaced)
    }

    pub fn render(&self, kind: TemplateKind, message: &MessageContext) -> Result<RenderedMessage> {
        let context = Context::from_serialize(message)?;
        Ok(RenderedMessage {
            subject: self.tera.render(&subject_name(kind), &context)?.trim().to_string(),
            body: self.tera.render(&body_name(kind), &context)?,
        })
    }
}

fn subject_name(kind: TemplateKind) -> String {
    format!("{}.subject", kind.name())
}

fn body_name(kind: TemplateKind) -> String {
    format!("{}.body", kind.name())
}
