//! Test utilities for gtn-helpdesk
//!
//! Shared fixtures so lifecycle and report tests can set up a helpdesk with a
//! fixed clock and a recording mailer in one line.

#![cfg(test)]

use crate::clock::ManualClock;
use crate::config::HelpdeskConfig;
use crate::core::{RequestOrigin, Role, Ticket, TicketBuilder, TicketNumber, User, UserBuilder};
use crate::lifecycle::{Helpdesk, NewTicket};
use crate::notifications::{MailError, Mailer};
use crate::storage::{Dataset, MemoryStore, Store, TicketRepository, UserRepository};
use chrono::{DateTime, TimeZone, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Mailer that remembers what it sent and fails for chosen recipients
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<(String, String)>>,
    failing: Mutex<HashSet<String>>,
}

impl RecordingMailer {
    /// Subjects of the messages sent so far
    pub fn subjects(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(_, s)| s.clone()).collect()
    }

    pub fn recipients(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(to, _)| to.clone()).collect()
    }

    /// Make every send to `address` fail
    pub fn fail_for(&self, address: &str) {
        self.failing.lock().unwrap().insert(address.to_string());
    }
}

impl Mailer for RecordingMailer {
    fn send(&self, to: &str, subject: &str, _body: &str) -> Result<(), MailError> {
        if self.failing.lock().unwrap().contains(to) {
            return Err(MailError::Transport(format!("connection refused for {to}")));
        }
        self.sent.lock().unwrap().push((to.to_string(), subject.to_string()));
        Ok(())
    }
}

/// Fixed start time of the test clock
pub fn test_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, 9, 30, 0).unwrap()
}

/// Test fixture: an in-memory helpdesk with one super admin
pub struct TestHelpdesk {
    pub temp_dir: TempDir,
    pub helpdesk: Helpdesk<MemoryStore>,
    pub admin: User,
    pub mailer: Arc<RecordingMailer>,
    pub clock: Arc<ManualClock>,
}

impl TestHelpdesk {
    /// Seeded master data plus the `root` super admin
    pub fn new() -> Self {
        Self::with_dataset(Dataset::seeded())
    }

    /// Seeded master data and no accounts; `admin` is not stored
    pub fn empty() -> Self {
        Self::build(Dataset::seeded(), admin())
    }

    /// Start from prepared data, adding the `root` super admin
    pub fn with_dataset(mut dataset: Dataset) -> Self {
        let admin = admin();
        dataset.insert_user(admin.clone()).expect("Failed to add admin");
        Self::build(dataset, admin)
    }

    fn build(dataset: Dataset, admin: User) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let mut config = HelpdeskConfig::default();
        config.attachments.upload_dir = temp_dir.path().join("uploads");

        let mailer = Arc::new(RecordingMailer::default());
        let clock = Arc::new(ManualClock::new(test_start()));
        let helpdesk = Helpdesk::new(MemoryStore::new(dataset), config)
            .expect("Failed to create helpdesk")
            .with_clock(clock.clone())
            .with_mailer(mailer.clone());

        Self {
            temp_dir,
            helpdesk,
            admin,
            mailer,
            clock,
        }
    }

    /// Reconfigure the helpdesk, keeping its data
    pub fn map(self, f: impl FnOnce(Helpdesk<MemoryStore>) -> Helpdesk<MemoryStore>) -> Self {
        Self {
            helpdesk: f(self.helpdesk),
            ..self
        }
    }

    /// Store a "Test User" account with the given role and department
    pub fn user(&self, username: &str, role: Role, department: &str) -> User {
        let user = test_user(username, role, department);
        self.helpdesk
            .store()
            .transaction("test_user", |tx| tx.insert_user(user.clone()))
            .expect("Failed to add user");
        user
    }

    /// File a Hardware/Medium ticket through the lifecycle
    pub fn create_ticket(&self, creator: &User, title: &str) -> Ticket {
        let request = NewTicket::new(title, format!("{title}, please have a look"), "Hardware", "Medium");
        self.helpdesk
            .create_ticket(creator, request, &RequestOrigin::default())
            .expect("Failed to create ticket")
            .value
    }
}

fn admin() -> User {
    UserBuilder::new()
        .username("root")
        .first_name("System")
        .last_name("Administrator")
        .department("IT")
        .role(Role::SuperAdmin)
        .created_at(test_start())
        .build()
}

fn test_user(username: &str, role: Role, department: &str) -> User {
    UserBuilder::new()
        .username(username)
        .email(format!("{username}@gtnengineering.com"))
        .first_name("Test")
        .last_name("User")
        .department(department)
        .role(role)
        .created_at(test_start())
        .build()
}

/// Builder for datasets with back-dated tickets
#[derive(Default)]
pub struct TestDataBuilder {
    dataset: Dataset,
    users: HashMap<String, User>,
    next_number: u64,
}

impl TestDataBuilder {
    pub fn new() -> Self {
        Self {
            dataset: Dataset::seeded(),
            ..Self::default()
        }
    }

    pub fn user(mut self, username: &str, role: Role, department: &str) -> Self {
        let user = test_user(username, role, department);
        self.dataset.insert_user(user.clone()).expect("Failed to add user");
        self.users.insert(username.to_string(), user);
        self
    }

    /// Add an Open ticket by `username` created at an RFC 3339 timestamp
    pub fn ticket(mut self, username: &str, title: &str, created_at: &str) -> Self {
        let creator = &self.users[username];
        let created_at = DateTime::parse_from_rfc3339(created_at)
            .expect("Invalid timestamp")
            .with_timezone(&Utc);
        self.next_number += 1;

        let ticket = TicketBuilder::new()
            .number(TicketNumber::new(self.next_number))
            .title(title)
            .description(format!("{title}, please have a look"))
            .category("Hardware")
            .priority("Medium")
            .creator(creator)
            .created_at(created_at)
            .build();
        self.dataset.insert_ticket(ticket).expect("Failed to add ticket");
        self
    }

    pub fn build(self) -> Dataset {
        self.dataset
    }
}
