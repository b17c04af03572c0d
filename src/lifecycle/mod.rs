//! The helpdesk service: ticket lifecycle, user administration and
//! master data, each action run as one store transaction
//!
//! Every public operation takes the acting [`User`] explicitly. The actor is
//! re-read inside the transaction so a role change or deletion that happened
//! in the meantime is honoured.

mod master_data;
mod tickets;
mod users;
mod validation;

pub use tickets::{CommentView, NewTicket, TicketView, Upload};
pub use users::{NewUser, UserDeletion};

use crate::clock::{Clock, SystemClock};
use crate::config::HelpdeskConfig;
use crate::core::{Ticket, User, UserId};
use crate::error::{HelpdeskError, Result};
use crate::events::{EventBus, LifecycleEvent};
use crate::files::{AttachmentPolicy, FileStore, LocalFileStore};
use crate::notifications::{
    DispatchReport, Mailer, NotificationDispatcher, NotificationTemplates, mailer_for,
};
use crate::storage::{Repository, Store, UserRepository};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast;

/// A committed result together with what happened to its side effects
#[derive(Debug, Clone)]
pub struct Outcome<T> {
    pub value: T,
    pub report: DispatchReport,
    /// Degraded side effects such as skipped uploads
    pub warnings: Vec<String>,
}

impl<T> Outcome<T> {
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            value,
            report: DispatchReport::default(),
            warnings: Vec::new(),
        }
    }

    /// The action committed but a notification or upload did not go through
    #[must_use]
    pub fn is_partial(&self) -> bool {
        !self.warnings.is_empty() || !self.report.all_sent()
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

/// The helpdesk engine over a [`Store`]
pub struct Helpdesk<S: Store> {
    store: S,
    config: HelpdeskConfig,
    clock: Arc<dyn Clock>,
    files: Arc<dyn FileStore>,
    attachments: AttachmentPolicy,
    dispatcher: NotificationDispatcher,
    events: EventBus,
}

impl<S: Store> std::fmt::Debug for Helpdesk<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Helpdesk")
            .field("config", &self.config)
            .field("dispatcher", &self.dispatcher)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

impl<S: Store> Helpdesk<S> {
    /// Service with the system clock, the configured mailer and a local
    /// upload directory
    pub fn new(store: S, config: HelpdeskConfig) -> Result<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let mailer = mailer_for(config.email.as_ref());
        let dispatcher = NotificationDispatcher::new(mailer, Arc::clone(&clock), NotificationTemplates::new()?);

        Ok(Self {
            files: Arc::new(LocalFileStore::new(config.attachments.upload_dir.clone())),
            attachments: AttachmentPolicy::from_settings(&config.attachments),
            store,
            config,
            clock,
            dispatcher,
            events: EventBus::default(),
        })
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.dispatcher.set_clock(Arc::clone(&clock));
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.dispatcher.set_mailer(mailer);
        self
    }

    #[must_use]
    pub fn with_file_store(mut self, files: Arc<dyn FileStore>) -> Self {
        self.files = files;
        self
    }

    /// Override notification templates from a directory
    pub fn load_custom_templates(&mut self, dir: &Path) -> Result<usize> {
        self.dispatcher.templates_mut().load_custom_templates(dir)
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub const fn config(&self) -> &HelpdeskConfig {
        &self.config
    }

    /// Receive every lifecycle event committed from now on
    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.events.subscribe()
    }

    /// Look up an account by username
    pub fn find_user(&self, username: &str) -> Result<User> {
        self.store.read(|tx| {
            tx.find_user_by_username(username)?
                .ok_or_else(|| HelpdeskError::not_found("User", username))
        })
    }

    /// Publish a committed event and deliver its notifications
    ///
    /// Recipients are resolved from the committed state; deleted accounts
    /// are simply absent.
    fn publish(&self, event: &LifecycleEvent) -> DispatchReport {
        self.events.publish(event);

        let ticket = event.ticket();
        let participants = self.store.read(|tx| Ok((lookup(tx, ticket.creator_id), lookup(tx, ticket.assigned_to))));
        let (creator, assignee) = participants.unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to resolve notification recipients");
            (None, None)
        });

        let intents = NotificationDispatcher::plan(event, creator.as_ref(), assignee.as_ref());
        let assignee_name = assignee.as_ref().map(User::full_name);
        let report = self
            .dispatcher
            .deliver(&self.store, event, &intents, assignee_name.as_deref());

        if !report.all_sent() {
            tracing::warn!(
                ticket = %ticket.number,
                sent = report.sent(),
                failed = report.failed(),
                "some notifications were not delivered"
            );
        }
        report
    }
}

fn lookup<R: Repository>(tx: &R, id: Option<UserId>) -> Option<User> {
    id.and_then(|id| tx.load_user(&id).ok())
}

/// Re-read the acting user inside a transaction
fn current_actor<R: Repository>(tx: &R, actor: &User) -> Result<User> {
    tx.load_user(&actor.id)
}

/// The creator account of a ticket, if it still exists
fn creator_of<R: Repository>(tx: &R, ticket: &Ticket) -> Option<User> {
    lookup(tx, ticket.creator_id)
}
