//! Notification fan-out for lifecycle events
//!
//! [`NotificationDispatcher::plan`] decides who hears about an event;
//! [`NotificationDispatcher::deliver`] renders, sends and journals each
//! message. Delivery runs after the lifecycle change has been committed and
//! its failures never undo that change.

mod mailer;
mod record;
mod templates;

pub use mailer::{DisabledMailer, LogMailer, MailError, Mailer, mailer_for};
#[cfg(test)]
pub use mailer::MockMailer;
pub use record::{DeliveryOutcome, NotificationCategory, NotificationId, NotificationRecord};
pub use templates::{MessageContext, NotificationTemplates, RenderedMessage, TemplateKind};

use crate::clock::Clock;
use crate::core::{Ticket, User};
use crate::events::LifecycleEvent;
use crate::storage::{NotificationLog, Store};
use serde::Serialize;
use std::sync::Arc;

/// A message that should be sent, before rendering and transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationIntent {
    pub recipient: User,
    pub kind: TemplateKind,
}

impl NotificationIntent {
    #[must_use]
    pub fn category(&self) -> NotificationCategory {
        self.kind.category()
    }
}

/// Result of one delivery attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryAttempt {
    pub recipient: String,
    pub subject: String,
    pub category: NotificationCategory,
    pub outcome: DeliveryOutcome,
    pub error: Option<String>,
}

/// What happened to the notifications of one lifecycle action
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub attempts: Vec<DeliveryAttempt>,
}

impl DispatchReport {
    #[must_use]
    pub fn sent(&self) -> usize {
        self.attempts
            .iter()
            .filter(|a| a.outcome == DeliveryOutcome::Sent)
            .count()
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.attempts.len() - self.sent()
    }

    /// Informational only; a failed send never fails the action
    #[must_use]
    pub fn all_sent(&self) -> bool {
        self.failed() == 0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }
}

/// Turns lifecycle events into delivered, journaled notifications
pub struct NotificationDispatcher {
    mailer: Arc<dyn Mailer>,
    clock: Arc<dyn Clock>,
    templates: NotificationTemplates,
}

impl std::fmt::Debug for NotificationDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationDispatcher")
            .field("mailer", &"Arc<dyn Mailer>")
            .field("templates", &self.templates)
            .finish()
    }
}

impl NotificationDispatcher {
    #[must_use]
    pub fn new(mailer: Arc<dyn Mailer>, clock: Arc<dyn Clock>, templates: NotificationTemplates) -> Self {
        Self {
            mailer,
            clock,
            templates,
        }
    }

    pub(crate) fn set_mailer(&mut self, mailer: Arc<dyn Mailer>) {
        self.mailer = mailer;
    }

    pub(crate) fn set_clock(&mut self, clock: Arc<dyn Clock>) {
        self.clock = clock;
    }

    pub(crate) fn templates_mut(&mut self) -> &mut NotificationTemplates {
        &mut self.templates
    }

    /// Recipients for an event
    ///
    /// `creator` and `assignee` are the current accounts behind the ticket's
    /// creator and assignee references; `None` means there is nobody to tell.
    #[must_use]
    pub fn plan(
        event: &LifecycleEvent,
        creator: Option<&User>,
        assignee: Option<&User>,
    ) -> Vec<NotificationIntent> {
        let ticket = event.ticket();
        let actor = event.actor().id;
        let creator = creator.filter(|c| ticket.is_created_by(c.id));
        let intent = |user: &User, kind| NotificationIntent {
            recipient: user.clone(),
            kind,
        };

        let mut intents = Vec::new();
        match event {
            LifecycleEvent::TicketCreated { .. } => {
                intents.extend(creator.map(|c| intent(c, TemplateKind::Created)));
            },
            LifecycleEvent::TicketAssigned { assignee: assigned, .. } => {
                let assignee = assignee.filter(|a| a.id == *assigned);
                intents.extend(assignee.map(|a| intent(a, TemplateKind::AssignedToAssignee)));
                intents.extend(creator.map(|c| intent(c, TemplateKind::AssignmentUpdate)));
            },
            LifecycleEvent::TicketStatusChanged { .. } => {
                intents.extend(creator.map(|c| intent(c, TemplateKind::StatusToCreator)));
                let assignee = assignee.filter(|a| ticket.is_assigned_to(a.id) && a.id != actor);
                intents.extend(assignee.map(|a| intent(a, TemplateKind::StatusToAssignee)));
            },
            LifecycleEvent::TicketCommented { .. } => {
                let to_creator = creator.filter(|c| c.id != actor);
                intents.extend(to_creator.map(|c| intent(c, TemplateKind::CommentToCreator)));
                let assignee = assignee.filter(|a| {
                    ticket.is_assigned_to(a.id) && a.id != actor && !ticket.is_created_by(a.id)
                });
                intents.extend(assignee.map(|a| intent(a, TemplateKind::CommentToAssignee)));
            },
        }
        intents
    }

    /// Render, send and journal each intent
    pub fn deliver<S: Store>(
        &self,
        store: &S,
        event: &LifecycleEvent,
        intents: &[NotificationIntent],
        assignee_name: Option<&str>,
    ) -> DispatchReport {
        let mut report = DispatchReport::default();

        for intent in intents {
            let context = message_context(event, &intent.recipient, assignee_name);
            let rendered = self.templates.render(intent.kind, &context);

            let (subject, result) = match rendered {
                Ok(message) => {
                    let result = self
                        .mailer
                        .send(&intent.recipient.email, &message.subject, &message.body)
                        .map_err(|e| e.to_string());
                    (message.subject, result)
                },
                Err(e) => (format!("{} {}", intent.kind.name(), context.ticket_number), Err(e.to_string())),
            };

            let (outcome, error) = match result {
                Ok(()) => (DeliveryOutcome::Sent, None),
                Err(e) => {
                    tracing::warn!(
                        to = %intent.recipient.email,
                        subject = %subject,
                        error = %e,
                        "notification failed"
                    );
                    (DeliveryOutcome::Failed, Some(e))
                },
            };

            let record = NotificationRecord {
                id: NotificationId::new(),
                recipient: intent.recipient.email.clone(),
                subject: subject.clone(),
                category: intent.category(),
                outcome,
                error: error.clone(),
                ticket_id: Some(event.ticket_id()),
                user_id: Some(intent.recipient.id),
                created_at: self.clock.now(),
            };
            if let Err(e) = store.transaction("record_notification", |tx| tx.append_notification(record)) {
                tracing::error!(to = %intent.recipient.email, error = %e, "failed to journal notification");
            }

            report.attempts.push(DeliveryAttempt {
                recipient: intent.recipient.email.clone(),
                subject,
                category: intent.category(),
                outcome,
                error,
            });
        }

        report
    }
}

fn message_context(event: &LifecycleEvent, recipient: &User, assignee_name: Option<&str>) -> MessageContext {
    let ticket: &Ticket = event.ticket();
    let mut context = MessageContext {
        recipient_name: recipient_name(ticket, recipient),
        ticket_number: ticket.number.to_string(),
        title: ticket.title.clone(),
        description: ticket.description.clone(),
        category: ticket.category.clone(),
        priority: ticket.priority.clone(),
        status: ticket.status.to_string(),
        previous_status: None,
        creator_name: ticket.user_name.clone(),
        assignee_name: assignee_name.map(str::to_string),
        actor_name: event.actor().name.clone(),
        comment: None,
    };
    match event {
        LifecycleEvent::TicketStatusChanged { old_status, .. } => {
            context.previous_status = Some(old_status.to_string());
        },
        LifecycleEvent::TicketCommented { comment, .. } => {
            context.comment = Some(comment.text.clone());
        },
        LifecycleEvent::TicketCreated { .. } | LifecycleEvent::TicketAssigned { .. } => {},
    }
    context
}

/// Creators are greeted with the name captured on the ticket
fn recipient_name(ticket: &Ticket, recipient: &User) -> String {
    if ticket.is_created_by(recipient.id) {
        ticket.user_name.clone()
    } else {
        recipient.full_name()
    }
}
