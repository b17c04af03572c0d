use super::{Attachment, Role, Status, Ticket, TicketId, TicketNumber, User, UserId};
use chrono::{DateTime, Utc};

/// Builder for creating Ticket instances
#[derive(Default)]
pub struct TicketBuilder {
    id: Option<TicketId>,
    number: Option<TicketNumber>,
    title: Option<String>,
    description: Option<String>,
    category: Option<String>,
    priority: Option<String>,
    status: Option<Status>,
    creator: Option<(UserId, String)>,
    user_ip_address: Option<String>,
    user_system_name: Option<String>,
    assigned_to: Option<UserId>,
    assigned_by: Option<UserId>,
    created_at: Option<DateTime<Utc>>,
    attachments: Vec<Attachment>,
}

impl TicketBuilder {
    /// Create a new ticket builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the ticket ID
    #[must_use]
    pub const fn id(mut self, id: TicketId) -> Self {
        self.id = Some(id);
        self
    }

    /// Set the ticket number
    #[must_use]
    pub const fn number(mut self, number: TicketNumber) -> Self {
        self.number = Some(number);
        self
    }

    /// Set the title
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the description
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the category name
    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Set the priority name
    #[must_use]
    pub fn priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = Some(priority.into());
        self
    }

    /// Set the status
    #[must_use]
    pub const fn status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    /// Set the creator and capture their display name snapshot
    #[must_use]
    pub fn creator(mut self, user: &User) -> Self {
        self.creator = Some((user.id, user.full_name()));
        self
    }

    /// Set the client IP snapshot
    #[must_use]
    pub fn user_ip_address(mut self, ip: Option<String>) -> Self {
        self.user_ip_address = ip;
        self
    }

    /// Set the system name snapshot
    #[must_use]
    pub fn user_system_name(mut self, system_name: Option<String>) -> Self {
        self.user_system_name = system_name;
        self
    }

    /// Set assignee and assigner
    #[must_use]
    pub const fn assigned(mut self, assignee: UserId, assigner: UserId) -> Self {
        self.assigned_to = Some(assignee);
        self.assigned_by = Some(assigner);
        self
    }

    /// Set `created_at` timestamp
    #[must_use]
    pub const fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Add attachments
    #[must_use]
    pub fn attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = attachments;
        self
    }

    /// Add a single attachment
    #[must_use]
    pub fn attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Build the ticket
    ///
    /// `resolved_at` is derived from the status so the built ticket always
    /// satisfies the resolution invariant.
    pub fn build(self) -> Ticket {
        let created_at = self.created_at.unwrap_or_else(Utc::now);
        let status = self.status.unwrap_or_default();
        let (creator_id, user_name) = match self.creator {
            Some((id, name)) => (Some(id), name),
            None => (None, String::new()),
        };
        let assigned_at = self.assigned_to.map(|_| created_at);

        Ticket {
            id: self.id.unwrap_or_default(),
            number: self.number.unwrap_or(TicketNumber::new(0)),
            title: self.title.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            category: self.category.unwrap_or_default(),
            priority: self.priority.unwrap_or_default(),
            status,
            creator_id,
            user_name,
            user_ip_address: self.user_ip_address,
            user_system_name: self.user_system_name,
            assigned_to: self.assigned_to,
            assigned_by: self.assigned_by,
            assigned_at,
            created_at,
            updated_at: created_at,
            resolved_at: (status == Status::Resolved).then_some(created_at),
            attachments: self.attachments,
        }
    }
}

/// Builder for creating User instances
#[derive(Default)]
pub struct UserBuilder {
    id: Option<UserId>,
    username: Option<String>,
    email: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    department: Option<String>,
    specialization: Option<String>,
    role: Option<Role>,
    system_name: Option<String>,
    created_at: Option<DateTime<Utc>>,
}

impl UserBuilder {
    /// Create a new user builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the user ID
    #[must_use]
    pub const fn id(mut self, id: UserId) -> Self {
        self.id = Some(id);
        self
    }

    /// Set the username
    #[must_use]
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set the email address
    #[must_use]
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Set the first name
    #[must_use]
    pub fn first_name(mut self, first_name: impl Into<String>) -> Self {
        self.first_name = Some(first_name.into());
        self
    }

    /// Set the last name
    #[must_use]
    pub fn last_name(mut self, last_name: impl Into<String>) -> Self {
        self.last_name = Some(last_name.into());
        self
    }

    /// Set the department
    #[must_use]
    pub fn department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }

    /// Set the specialization (Hardware, Software, ...)
    #[must_use]
    pub fn specialization(mut self, specialization: impl Into<String>) -> Self {
        self.specialization = Some(specialization.into());
        self
    }

    /// Set the role
    #[must_use]
    pub const fn role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    /// Set the last known system name
    #[must_use]
    pub fn system_name(mut self, system_name: impl Into<String>) -> Self {
        self.system_name = Some(system_name.into());
        self
    }

    /// Set `created_at` timestamp
    #[must_use]
    pub const fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Build the user
    ///
    /// Without an explicit email, one is derived from the username.
    pub fn build(self) -> User {
        let username = self.username.unwrap_or_default();
        let email = self
            .email
            .unwrap_or_else(|| format!("{username}@helpdesk.local"));

        User {
            id: self.id.unwrap_or_default(),
            username,
            email,
            first_name: self.first_name.unwrap_or_default(),
            last_name: self.last_name.unwrap_or_default(),
            department: self.department.unwrap_or_default(),
            specialization: self.specialization,
            role: self.role.unwrap_or_default(),
            ip_address: None,
            system_name: self.system_name,
            created_at: self.created_at.unwrap_or_else(Utc::now),
        }
    }
}
