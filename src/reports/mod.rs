//! Read-only statistics over tickets and the notification journal
//!
//! The aggregation functions are pure over slices; the [`Helpdesk`] methods
//! below take a committed snapshot and scope it to what the actor may see.

mod export;
mod filter;

pub use export::{EXPORT_HEADERS, write_csv};
pub use filter::{DateFilter, TicketFilter};

use crate::core::{Role, Status, Ticket, User, UserId};
use crate::error::Result;
use crate::lifecycle::Helpdesk;
use crate::notifications::{DeliveryOutcome, NotificationCategory, NotificationRecord};
use crate::policy::AccessPolicy;
use crate::storage::{NotificationLog, Store, TicketRepository, UserRepository};
use crate::timezone::TimezoneFormatter;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::io::Write;

/// Department label for tickets whose creator is gone or has none
pub const UNKNOWN_DEPARTMENT: &str = "Unknown";

/// Ticket count per status, with every status present
#[must_use]
pub fn status_counts(tickets: &[Ticket]) -> BTreeMap<Status, usize> {
    let mut counts: BTreeMap<Status, usize> = Status::ALL.iter().map(|s| (*s, 0)).collect();
    for ticket in tickets {
        *counts.entry(ticket.status).or_default() += 1;
    }
    counts
}

#[must_use]
pub fn category_counts(tickets: &[Ticket]) -> BTreeMap<String, usize> {
    count_by(tickets, |t| t.category.clone())
}

#[must_use]
pub fn priority_counts(tickets: &[Ticket]) -> BTreeMap<String, usize> {
    count_by(tickets, |t| t.priority.clone())
}

/// Ticket count per creator department
#[must_use]
pub fn department_counts(tickets: &[Ticket], users: &HashMap<UserId, User>) -> BTreeMap<String, usize> {
    count_by(tickets, |t| department_of(t, users).to_string())
}

/// One row of the top creators table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatorCount {
    pub user_id: UserId,
    pub username: String,
    pub full_name: String,
    pub department: String,
    pub tickets: usize,
}

/// The `limit` accounts with the most tickets, ties broken by username
#[must_use]
pub fn top_creators(tickets: &[Ticket], users: &HashMap<UserId, User>, limit: usize) -> Vec<CreatorCount> {
    let mut per_user: HashMap<UserId, usize> = HashMap::new();
    for id in tickets.iter().filter_map(|t| t.creator_id) {
        *per_user.entry(id).or_default() += 1;
    }

    let mut rows: Vec<CreatorCount> = per_user
        .into_iter()
        .filter_map(|(id, tickets)| {
            users.get(&id).map(|user| CreatorCount {
                user_id: id,
                username: user.username.clone(),
                full_name: user.full_name(),
                department: user.department.clone(),
                tickets,
            })
        })
        .collect();
    rows.sort_by(|a, b| b.tickets.cmp(&a.tickets).then_with(|| a.username.cmp(&b.username)));
    rows.truncate(limit);
    rows
}

/// The `limit` most recently created tickets
#[must_use]
pub fn recent_tickets(tickets: &[Ticket], limit: usize) -> Vec<Ticket> {
    TicketFilter {
        limit: Some(limit),
        ..TicketFilter::default()
    }
    .apply(tickets.to_vec())
}

fn count_by<F>(tickets: &[Ticket], key: F) -> BTreeMap<String, usize>
where
    F: Fn(&Ticket) -> String,
{
    let mut counts = BTreeMap::new();
    for ticket in tickets {
        *counts.entry(key(ticket)).or_default() += 1;
    }
    counts
}

fn department_of<'a>(ticket: &Ticket, users: &'a HashMap<UserId, User>) -> &'a str {
    ticket
        .creator_id
        .and_then(|id| users.get(&id))
        .map(|u| u.department.trim())
        .filter(|d| !d.is_empty())
        .unwrap_or(UNKNOWN_DEPARTMENT)
}

/// Aggregated view of the tickets an actor can see
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    /// Which tickets the numbers cover: `own`, `department` or `all`
    pub scope: &'static str,
    pub total: usize,
    pub by_status: BTreeMap<Status, usize>,
    pub by_category: BTreeMap<String, usize>,
    pub by_priority: BTreeMap<String, usize>,
    pub by_department: BTreeMap<String, usize>,
    pub top_creators: Vec<CreatorCount>,
    /// Unfinished tickets currently assigned to the actor
    pub assigned_to_me: usize,
    pub recent: Vec<Ticket>,
}

/// Sent and failed counts plus the matching journal rows, newest first
#[derive(Debug, Clone, Serialize)]
pub struct NotificationSummary {
    pub total: usize,
    pub sent: usize,
    pub failed: usize,
    pub records: Vec<NotificationRecord>,
}

/// Which journal rows a notification summary lists
#[derive(Debug, Clone, Copy, Default)]
pub struct NotificationQuery {
    pub outcome: Option<DeliveryOutcome>,
    pub category: Option<NotificationCategory>,
    pub limit: Option<usize>,
}

impl<S: Store> Helpdesk<S> {
    /// Statistics over the tickets `actor` may see, optionally within a
    /// creation window
    pub fn dashboard(&self, actor: &User, created: Option<DateFilter>) -> Result<Dashboard> {
        let limits = &self.config().reports;
        self.store().read(|tx| {
            let actor = tx.load_user(&actor.id)?;
            let users = users_by_id(tx.load_all_users()?);
            let filter = TicketFilter {
                created,
                ..TicketFilter::default()
            };
            let tickets = tx.find_tickets(|t| {
                let creator = t.creator_id.and_then(|id| users.get(&id));
                AccessPolicy::can_view(&actor, t, creator) && filter.matches(t)
            })?;

            let scope = if AccessPolicy::can_view_all(&actor) {
                "all"
            } else if actor.role == Role::Hod && !actor.department.trim().is_empty() {
                "department"
            } else {
                "own"
            };
            let assigned_to_me = tx
                .count_tickets(|t| t.is_assigned_to(actor.id) && matches!(t.status, Status::Open | Status::InProgress))?;

            Ok(Dashboard {
                scope,
                total: tickets.len(),
                by_status: status_counts(&tickets),
                by_category: category_counts(&tickets),
                by_priority: priority_counts(&tickets),
                by_department: department_counts(&tickets, &users),
                top_creators: top_creators(&tickets, &users, limits.top_creators),
                assigned_to_me,
                recent: recent_tickets(&tickets, limits.recent_limit),
            })
        })
    }

    /// The notification journal, for administrators
    pub fn notification_summary(&self, actor: &User, query: NotificationQuery) -> Result<NotificationSummary> {
        let default_limit = self.config().reports.notification_limit;
        self.store().read(|tx| {
            let actor = tx.load_user(&actor.id)?;
            AccessPolicy::ensure_manage(&actor, "view the notification log")?;

            let all = tx.load_notifications()?;
            let sent = all.iter().filter(|r| r.outcome == DeliveryOutcome::Sent).count();
            let records = all
                .iter()
                .rev()
                .filter(|r| query.outcome.is_none_or(|o| r.outcome == o))
                .filter(|r| query.category.is_none_or(|c| r.category == c))
                .take(query.limit.unwrap_or(default_limit))
                .cloned()
                .collect();

            Ok(NotificationSummary {
                total: all.len(),
                sent,
                failed: all.len() - sent,
                records,
            })
        })
    }

    /// Write the complaint register for tickets created in `created` as CSV
    ///
    /// Returns the number of ticket rows written.
    pub fn export_report<W: Write>(
        &self,
        actor: &User,
        created: Option<DateFilter>,
        formatter: &dyn TimezoneFormatter,
        writer: W,
    ) -> Result<usize> {
        let (tickets, users) = self.store().read(|tx| {
            let actor = tx.load_user(&actor.id)?;
            AccessPolicy::ensure_manage(&actor, "export reports")?;

            let mut tickets = tx.find_tickets(|t| created.is_none_or(|range| range.contains(t.created_at)))?;
            tickets.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.number.cmp(&b.number)));
            Ok((tickets, users_by_id(tx.load_all_users()?)))
        })?;

        let rows = write_csv(&tickets, &users, formatter, writer)?;
        tracing::info!(rows, filter = ?created, by = %actor.username, "report exported");
        Ok(rows)
    }
}

fn users_by_id(users: Vec<User>) -> HashMap<UserId, User> {
    users.into_iter().map(|u| (u.id, u)).collect()
}
