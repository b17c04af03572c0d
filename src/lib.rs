//! gtn-helpdesk - IT helpdesk ticket lifecycle and access control
//!
//! This crate tracks support tickets for an engineering organisation:
//! - Sequential, never-reused ticket numbers (`GTN-000001`)
//! - Role-based visibility for users, heads of department and super admins
//! - Assignment, status transitions and comment threads with audit notes
//! - Best-effort email notifications with a persisted delivery log
//! - Dashboards and CSV exports
//!
//! # Transactions
//!
//! Every lifecycle action runs inside one [`Store`](storage::Store)
//! transaction. Either all of its writes become visible or none do;
//! notifications are only sent after the commit.
//!
//! # Example
//!
//! ```rust,ignore
//! use gtn_helpdesk::config::HelpdeskConfig;
//! use gtn_helpdesk::core::RequestOrigin;
//! use gtn_helpdesk::lifecycle::{Helpdesk, NewTicket};
//! use gtn_helpdesk::storage::{Dataset, MemoryStore};
//!
//! let helpdesk = Helpdesk::new(MemoryStore::new(Dataset::seeded()), HelpdeskConfig::default())?;
//! helpdesk.seed_default_users()?;
//!
//! let user = helpdesk.find_user("testuser")?;
//! let request = NewTicket::new("Printer jam", "Paper stuck in tray 2", "Hardware", "Medium");
//! let outcome = helpdesk.create_ticket(&user, request, &RequestOrigin::new(Some("10.0.0.7".to_string())))?;
//! assert_eq!(outcome.value.number.to_string(), "GTN-000001");
//! ```

// Allow missing error documentation for internal implementations
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::redundant_closure_for_method_calls)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::map_unwrap_or)]

#[macro_use]
pub mod core;

pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod files;
pub mod lifecycle;
pub mod notifications;
pub mod policy;
pub mod reports;
pub mod storage;
pub mod timezone;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types
pub use error::{HelpdeskError, Result};
pub use lifecycle::{Helpdesk, Outcome};
