use super::{Helpdesk, Outcome, creator_of, current_actor, lookup, validation};
use crate::core::{
    Attachment, Comment, DELETED_USER_LABEL, MasterData, RequestOrigin, Status, Ticket, TicketBuilder,
    TicketNumber, User, UserId, infer_system_name,
};
use crate::error::{HelpdeskError, Result};
use crate::events::{Actor, LifecycleEvent};
use crate::files::secure_filename;
use crate::policy::AccessPolicy;
use crate::reports::TicketFilter;
use crate::storage::{
    CommentRepository, MasterDataRepository, SequenceAllocator, Store, TicketRepository,
    UserRepository,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

/// A ticket as submitted by its creator
#[derive(Debug, Clone, Default)]
pub struct NewTicket {
    pub title: String,
    pub description: String,
    pub category: String,
    pub priority: String,
    pub uploads: Vec<Upload>,
}

impl NewTicket {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
        priority: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            category: category.into(),
            priority: priority.into(),
            uploads: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_upload(mut self, upload: Upload) -> Self {
        self.uploads.push(upload);
        self
    }
}

/// An uploaded file as received from the client
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    pub author_name: String,
}

/// A ticket with its conversation, as shown to someone allowed to see it
#[derive(Debug, Clone, Serialize)]
pub struct TicketView {
    pub ticket: Ticket,
    pub assignee_name: Option<String>,
    pub assigned_by_name: Option<String>,
    pub comments: Vec<CommentView>,
}

impl<S: Store> Helpdesk<S> {
    /// File a new ticket on behalf of `actor`
    pub fn create_ticket(
        &self,
        actor: &User,
        request: NewTicket,
        origin: &RequestOrigin,
    ) -> Result<Outcome<Ticket>> {
        let limits = &self.config.validation;
        let title = validation::title(&request.title, limits)?;
        let description = validation::description(&request.description, limits)?;
        if let Some(rejected) = request
            .uploads
            .iter()
            .find(|u| !self.attachments.is_allowed(&u.filename))
        {
            return Err(HelpdeskError::validation(format!(
                "File type not allowed: {}",
                rejected.filename
            )));
        }

        let now = self.clock.now();
        let mut warnings = Vec::new();
        self.store.read(|tx| classify(&tx.load_master_data()?, &request).map(drop))?;
        let attachments = self.store_uploads(&request.uploads, now, &mut warnings);

        let retries = self.config.lifecycle.allocation_retries;
        let mut attempt = 0;
        let (ticket, creator) = loop {
            let result = self.store.transaction("create_ticket", |tx| {
                let mut creator = current_actor(tx, actor)?;
                let (category, priority) = classify(&tx.load_master_data()?, &request)?;

                let system_name = origin
                    .system_name
                    .as_deref()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .or_else(|| creator.system_name.clone())
                    .unwrap_or_else(|| infer_system_name(origin.user_agent.as_deref().unwrap_or_default(), now));

                let ticket = TicketBuilder::new()
                    .number(tx.next_ticket_number()?)
                    .title(title.clone())
                    .description(description.clone())
                    .category(category)
                    .priority(priority)
                    .creator(&creator)
                    .user_ip_address(origin.ip_address.clone())
                    .user_system_name(Some(system_name.clone()))
                    .created_at(now)
                    .attachments(attachments.clone())
                    .build();
                tx.insert_ticket(ticket.clone())?;

                if origin.ip_address.is_some() {
                    creator.ip_address.clone_from(&origin.ip_address);
                }
                creator.system_name = Some(system_name);
                tx.save_user(&creator)?;

                Ok((ticket, creator))
            });

            match result {
                Err(e) if e.is_retryable() && attempt < retries => {
                    attempt += 1;
                    tracing::debug!(attempt, error = %e, "ticket number collision, retrying");
                },
                Err(e) => {
                    self.discard_uploads(&attachments);
                    return Err(e);
                },
                Ok(created) => break created,
            }
        };

        tracing::info!(ticket = %ticket.number, creator = %creator.username, "ticket created");
        let event = LifecycleEvent::TicketCreated {
            ticket: ticket.clone(),
            actor: Actor::from(&creator),
        };
        let report = self.publish(&event);

        Ok(Outcome {
            value: ticket,
            report,
            warnings,
        })
    }

    /// Hand a ticket to `assignee`; an Open ticket moves to In Progress
    pub fn assign_ticket(&self, actor: &User, number: TicketNumber, assignee: UserId) -> Result<Outcome<Ticket>> {
        let now = self.clock.now();
        let (ticket, actor) = self.store.transaction("assign_ticket", |tx| {
            let actor = current_actor(tx, actor)?;
            AccessPolicy::ensure_assign(&actor)?;

            let mut ticket = tx.load_ticket_by_number(number)?;
            if ticket.status.is_terminal() {
                return Err(HelpdeskError::validation(format!(
                    "Ticket {number} is closed and cannot be assigned"
                )));
            }
            let assignee = tx.load_user(&assignee)?;

            ticket.assigned_to = Some(assignee.id);
            ticket.assigned_by = Some(actor.id);
            ticket.assigned_at = Some(now);
            if ticket.status == Status::Open {
                ticket.set_status(Status::InProgress, now);
            } else {
                ticket.updated_at = now;
            }
            tx.save_ticket(&ticket)?;
            Ok((ticket, actor))
        })?;

        tracing::info!(ticket = %ticket.number, by = %actor.username, "ticket assigned");
        let event = LifecycleEvent::TicketAssigned {
            ticket: ticket.clone(),
            assignee,
            actor: Actor::from(&actor),
        };
        let report = self.publish(&event);

        Ok(Outcome {
            value: ticket,
            report,
            warnings: Vec::new(),
        })
    }

    /// Clear the assignee; the status is left alone and nobody is notified
    pub fn unassign_ticket(&self, actor: &User, number: TicketNumber) -> Result<Ticket> {
        let now = self.clock.now();
        let ticket = self.store.transaction("unassign_ticket", |tx| {
            let actor = current_actor(tx, actor)?;
            AccessPolicy::ensure_assign(&actor)?;

            let mut ticket = tx.load_ticket_by_number(number)?;
            if ticket.status.is_terminal() {
                return Err(HelpdeskError::validation(format!(
                    "Ticket {number} is closed and cannot be reassigned"
                )));
            }
            ticket.assigned_to = None;
            ticket.assigned_at = None;
            ticket.assigned_by = Some(actor.id);
            ticket.updated_at = now;
            tx.save_ticket(&ticket)?;
            Ok(ticket)
        })?;

        tracing::info!(ticket = %ticket.number, by = %actor.username, "ticket unassigned");
        Ok(ticket)
    }

    /// Move a ticket to `new_status`, recording an audit comment
    ///
    /// Setting the current status again changes nothing and notifies nobody.
    pub fn update_status(
        &self,
        actor: &User,
        number: TicketNumber,
        new_status: Status,
        note: Option<&str>,
    ) -> Result<Outcome<Ticket>> {
        let now = self.clock.now();
        let (ticket, actor, previous) = self.store.transaction("update_status", |tx| {
            let actor = current_actor(tx, actor)?;
            AccessPolicy::ensure_manage(&actor, "change ticket status")?;

            let mut ticket = tx.load_ticket_by_number(number)?;
            let old_status = ticket.status;
            if old_status == new_status {
                return Ok((ticket, actor, None));
            }
            if old_status.is_terminal() {
                return Err(HelpdeskError::validation(format!(
                    "Ticket {number} is closed; its status can no longer change"
                )));
            }
            if !tx.load_master_data()?.is_status_active(new_status) {
                return Err(HelpdeskError::validation(format!("Status '{new_status}' is not active")));
            }

            ticket.set_status(new_status, now);
            tx.save_ticket(&ticket)?;

            let text = match note.map(str::trim).filter(|n| !n.is_empty()) {
                Some(note) => format!("Status updated to '{new_status}'. {note}"),
                None => format!("Status updated from '{old_status}' to '{new_status}'"),
            };
            tx.insert_comment(Comment::new(ticket.id, actor.id, text, now))?;

            Ok((ticket, actor, Some(old_status)))
        })?;

        let Some(old_status) = previous else {
            tracing::debug!(ticket = %ticket.number, status = %new_status, "status unchanged");
            return Ok(Outcome::new(ticket));
        };

        tracing::info!(
            ticket = %ticket.number,
            from = %old_status,
            to = %new_status,
            by = %actor.username,
            "ticket status changed"
        );
        let event = LifecycleEvent::TicketStatusChanged {
            ticket: ticket.clone(),
            old_status,
            new_status,
            actor: Actor::from(&actor),
        };
        let report = self.publish(&event);

        Ok(Outcome {
            value: ticket,
            report,
            warnings: Vec::new(),
        })
    }

    pub fn add_comment(&self, actor: &User, number: TicketNumber, text: &str) -> Result<Outcome<Comment>> {
        let text = validation::comment(text, &self.config.validation)?;
        let now = self.clock.now();

        let (ticket, comment, actor) = self.store.transaction("add_comment", |tx| {
            let actor = current_actor(tx, actor)?;
            let mut ticket = tx.load_ticket_by_number(number)?;
            let creator = creator_of(tx, &ticket);
            AccessPolicy::ensure_comment(&actor, &ticket, creator.as_ref())?;

            let comment = Comment::new(ticket.id, actor.id, text, now);
            tx.insert_comment(comment.clone())?;
            ticket.updated_at = now;
            tx.save_ticket(&ticket)?;
            Ok((ticket, comment, actor))
        })?;

        tracing::info!(ticket = %ticket.number, by = %actor.username, "comment added");
        let event = LifecycleEvent::TicketCommented {
            ticket,
            comment: comment.clone(),
            actor: Actor::from(&actor),
        };
        let report = self.publish(&event);

        Ok(Outcome {
            value: comment,
            report,
            warnings: Vec::new(),
        })
    }

    /// Remove a ticket and its comments; its number is never handed out again
    pub fn delete_ticket(&self, actor: &User, number: TicketNumber) -> Result<Ticket> {
        let (ticket, comments) = self.store.transaction("delete_ticket", |tx| {
            let actor = current_actor(tx, actor)?;
            AccessPolicy::ensure_manage(&actor, "delete tickets")?;

            let ticket = tx.load_ticket_by_number(number)?;
            let comments = tx.delete_comments_for(&ticket.id)?;
            tx.delete_ticket(&ticket.id)?;
            Ok((ticket, comments))
        })?;

        tracing::info!(ticket = %ticket.number, comments, by = %actor.username, "ticket deleted");
        Ok(ticket)
    }

    /// A ticket with its comments, if `actor` may see it
    pub fn ticket(&self, actor: &User, number: TicketNumber) -> Result<TicketView> {
        self.store.read(|tx| {
            let actor = current_actor(tx, actor)?;
            let ticket = tx.load_ticket_by_number(number)?;
            let creator = creator_of(tx, &ticket);
            AccessPolicy::ensure_view(&actor, &ticket, creator.as_ref())?;

            let name_of = |id: Option<UserId>| lookup(tx, id).map(|u| u.full_name());
            let comments = tx
                .comments_for(&ticket.id)?
                .into_iter()
                .map(|comment| CommentView {
                    author_name: name_of(Some(comment.author_id)).unwrap_or_else(|| DELETED_USER_LABEL.to_string()),
                    comment,
                })
                .collect();

            Ok(TicketView {
                assignee_name: name_of(ticket.assigned_to),
                assigned_by_name: name_of(ticket.assigned_by),
                ticket,
                comments,
            })
        })
    }

    /// Tickets `actor` may see that match `filter`, newest first
    pub fn visible_tickets(&self, actor: &User, filter: &TicketFilter) -> Result<Vec<Ticket>> {
        self.store.read(|tx| {
            let actor = current_actor(tx, actor)?;
            let users: HashMap<UserId, User> = tx
                .load_all_users()?
                .into_iter()
                .map(|u| (u.id, u))
                .collect();

            let visible = tx.find_tickets(|t| {
                let creator = t.creator_id.and_then(|id| users.get(&id));
                AccessPolicy::can_view(&actor, t, creator)
            })?;
            Ok(filter.apply(visible))
        })
    }

    /// Fetch an attachment's bytes after checking `actor` may see its ticket
    pub fn attachment(&self, actor: &User, filename: &str) -> Result<(Attachment, Vec<u8>)> {
        let attachment = self.store.read(|tx| {
            let actor = current_actor(tx, actor)?;
            let ticket = tx
                .find_tickets(|t| t.has_attachment(filename))?
                .into_iter()
                .next()
                .ok_or_else(|| HelpdeskError::not_found("Attachment", filename))?;
            let creator = creator_of(tx, &ticket);
            AccessPolicy::ensure_view(&actor, &ticket, creator.as_ref())?;

            ticket
                .attachments
                .into_iter()
                .find(|a| a.filename == filename)
                .ok_or_else(|| HelpdeskError::not_found("Attachment", filename))
        })?;

        let bytes = self.files.load(&attachment.filename)?;
        Ok((attachment, bytes))
    }

    /// Store uploads under timestamped names; failures become warnings
    fn store_uploads(&self, uploads: &[Upload], now: DateTime<Utc>, warnings: &mut Vec<String>) -> Vec<Attachment> {
        let prefix = now.format("%Y%m%d_%H%M%S").to_string();
        uploads
            .iter()
            .filter_map(|upload| {
                let safe = secure_filename(&upload.filename);
                if safe.is_empty() {
                    warnings.push(format!("Skipped upload with unusable filename: {}", upload.filename));
                    return None;
                }
                let filename = format!("{prefix}_{safe}");
                match self.files.store(&filename, &upload.bytes) {
                    Ok(()) => Some(Attachment {
                        kind: self.attachments.kind_of(&filename),
                        filename,
                        uploaded_at: now,
                    }),
                    Err(e) => {
                        tracing::warn!(file = %upload.filename, error = %e, "attachment not stored");
                        warnings.push(format!("Attachment {} was not saved: {e}", upload.filename));
                        None
                    },
                }
            })
            .collect()
    }

    fn discard_uploads(&self, attachments: &[Attachment]) {
        for attachment in attachments {
            if let Err(e) = self.files.remove(&attachment.filename) {
                tracing::warn!(file = %attachment.filename, error = %e, "orphaned attachment not removed");
            }
        }
    }
}

/// Canonical category and priority names for a new ticket
fn classify(master: &MasterData, request: &NewTicket) -> Result<(String, String)> {
    let category = master
        .active_category(&request.category)
        .ok_or_else(|| HelpdeskError::validation(format!("Unknown or inactive category: {}", request.category)))?;
    let priority = master
        .active_priority(&request.priority)
        .ok_or_else(|| HelpdeskError::validation(format!("Unknown or inactive priority: {}", request.priority)))?;
    Ok((category.name.clone(), priority.name.clone()))
}
