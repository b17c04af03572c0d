use super::{Helpdesk, current_actor, validation};
use crate::core::{DELETED_USER_SUFFIX, Role, Status, User, UserBuilder, UserId};
use crate::error::{HelpdeskError, Result};
use crate::policy::AccessPolicy;
use crate::storage::{CommentRepository, Store, TicketRepository, UserRepository};
use serde::Serialize;

/// An account as entered by an administrator
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub department: String,
    pub specialization: Option<String>,
    pub role: Role,
}

/// What a user deletion did to the rest of the data
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserDeletion {
    pub username: String,
    /// Tickets the user had created, now without a creator
    pub tickets_orphaned: usize,
    /// Tickets that were assigned to the user, now unassigned and open
    pub tickets_unassigned: usize,
    pub comments_removed: usize,
}

impl<S: Store> Helpdesk<S> {
    pub fn create_user(&self, actor: &User, new: NewUser) -> Result<User> {
        let user = UserBuilder::new()
            .username(validation::username(&new.username)?)
            .email(validation::email(&new.email)?)
            .first_name(validation::name(&new.first_name, "First name")?)
            .last_name(validation::name(&new.last_name, "Last name")?)
            .department(new.department.trim())
            .role(new.role)
            .created_at(self.clock.now());
        let user = match new.specialization.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(specialization) => user.specialization(specialization),
            None => user,
        }
        .build();

        let created = user.clone();
        self.store.transaction("create_user", |tx| {
            let actor = current_actor(tx, actor)?;
            AccessPolicy::ensure_manage(&actor, "create users")?;
            tx.insert_user(user)
        })?;

        tracing::info!(user = %created.username, role = %created.role, by = %actor.username, "user created");
        Ok(created)
    }

    /// Change another account's role
    pub fn change_role(&self, actor: &User, user_id: UserId, role: Role) -> Result<User> {
        let user = self.store.transaction("change_role", |tx| {
            let actor = current_actor(tx, actor)?;
            AccessPolicy::ensure_manage(&actor, "change user roles")?;
            if actor.id == user_id {
                return Err(HelpdeskError::validation("You cannot change your own role"));
            }

            let mut user = tx.load_user(&user_id)?;
            user.role = role;
            tx.save_user(&user)?;
            Ok(user)
        })?;

        tracing::info!(user = %user.username, role = %role, by = %actor.username, "role changed");
        Ok(user)
    }

    /// Delete an account and detach it from everything it touched
    ///
    /// Created tickets keep a marked snapshot of the creator's name, assigned
    /// tickets go back to the queue as Open, and the user's comments are
    /// removed. All of it commits together or not at all.
    pub fn delete_user(&self, actor: &User, user_id: UserId) -> Result<UserDeletion> {
        let now = self.clock.now();
        let deletion = self.store.transaction("delete_user", |tx| {
            let actor = current_actor(tx, actor)?;
            AccessPolicy::ensure_manage(&actor, "delete users")?;
            if actor.id == user_id {
                return Err(HelpdeskError::validation("You cannot delete your own account"));
            }
            let user = tx.load_user(&user_id)?;
            let mut deletion = UserDeletion {
                username: user.username.clone(),
                ..UserDeletion::default()
            };

            for mut ticket in tx.find_tickets(|t| t.is_created_by(user_id))? {
                ticket.creator_id = None;
                if !ticket.user_name.ends_with(DELETED_USER_SUFFIX) {
                    ticket.user_name.push_str(DELETED_USER_SUFFIX);
                }
                ticket.updated_at = now;
                tx.save_ticket(&ticket)?;
                deletion.tickets_orphaned += 1;
            }

            for mut ticket in tx.find_tickets(|t| t.is_assigned_to(user_id))? {
                ticket.assigned_to = None;
                ticket.assigned_by = None;
                ticket.assigned_at = None;
                ticket.set_status(Status::Open, now);
                tx.save_ticket(&ticket)?;
                deletion.tickets_unassigned += 1;
            }

            for mut ticket in tx.find_tickets(|t| t.assigned_by == Some(user_id))? {
                ticket.assigned_by = None;
                tx.save_ticket(&ticket)?;
            }

            deletion.comments_removed = tx.delete_comments_by(&user_id)?;
            tx.delete_user(&user_id)?;
            Ok(deletion)
        })?;

        tracing::info!(
            user = %deletion.username,
            orphaned = deletion.tickets_orphaned,
            unassigned = deletion.tickets_unassigned,
            comments = deletion.comments_removed,
            by = %actor.username,
            "user deleted"
        );
        Ok(deletion)
    }

    /// All accounts, for administrators
    pub fn users(&self, actor: &User) -> Result<Vec<User>> {
        self.store.read(|tx| {
            let actor = current_actor(tx, actor)?;
            AccessPolicy::ensure_manage(&actor, "list users")?;
            tx.load_all_users()
        })
    }

    /// Create the built-in accounts of a fresh installation
    ///
    /// Skipped entirely when a super admin already exists.
    pub fn seed_default_users(&self) -> Result<Vec<User>> {
        let now = self.clock.now();
        let defaults = [
            UserBuilder::new()
                .username("superadmin")
                .email("superadmin@gtnengineering.com")
                .first_name("Super")
                .last_name("Administrator")
                .department("IT")
                .role(Role::SuperAdmin)
                .created_at(now)
                .build(),
            UserBuilder::new()
                .username("testuser")
                .email("user@gtnengineering.com")
                .first_name("Test")
                .last_name("User")
                .department("Engineering")
                .role(Role::User)
                .created_at(now)
                .build(),
        ];

        let seeded = self.store.transaction("seed_default_users", |tx| {
            if tx.load_all_users()?.iter().any(|u| u.role == Role::SuperAdmin) {
                return Ok(Vec::new());
            }
            let mut seeded = Vec::new();
            for user in defaults {
                if tx.find_user_by_username(&user.username)?.is_none() {
                    tx.insert_user(user.clone())?;
                    seeded.push(user);
                }
            }
            Ok(seeded)
        })?;

        if !seeded.is_empty() {
            tracing::info!(count = seeded.len(), "default users created");
        }
        Ok(seeded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{RequestOrigin, TicketNumber};
    use crate::lifecycle::NewTicket;
    use crate::reports::TicketFilter;
    use crate::test_utils::TestHelpdesk;

    fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.into(),
            email: format!("{username}@gtnengineering.com"),
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            department: "Finance".into(),
            specialization: None,
            role: Role::User,
        }
    }

    #[test]
    fn test_create_user_requires_super_admin() {
        let env = TestHelpdesk::new();
        let created = env.helpdesk.create_user(&env.admin, new_user("jdoe")).unwrap();
        assert_eq!(created.full_name(), "Jane Doe");

        let err = env.helpdesk.create_user(&created, new_user("jroe")).unwrap_err();
        assert!(matches!(err, HelpdeskError::Forbidden { .. }));
    }

    #[test]
    fn test_create_user_rejects_duplicates() {
        let env = TestHelpdesk::new();
        env.helpdesk.create_user(&env.admin, new_user("jdoe")).unwrap();

        let mut again = new_user("JDoe");
        again.email = "other@gtnengineering.com".into();
        assert!(matches!(
            env.helpdesk.create_user(&env.admin, again),
            Err(HelpdeskError::Validation(_))
        ));
    }

    #[test]
    fn test_cannot_change_own_role() {
        let env = TestHelpdesk::new();
        let err = env
            .helpdesk
            .change_role(&env.admin, env.admin.id, Role::User)
            .unwrap_err();
        assert!(matches!(err, HelpdeskError::Validation(_)));

        let user = env.user("jdoe", Role::User, "");
        let promoted = env.helpdesk.change_role(&env.admin, user.id, Role::Hod).unwrap();
        assert_eq!(promoted.role, Role::Hod);
    }

    #[test]
    fn test_stale_actor_role_is_rechecked() {
        let env = TestHelpdesk::new();
        let deputy = env.user("deputy", Role::SuperAdmin, "IT");
        env.helpdesk.change_role(&env.admin, deputy.id, Role::User).unwrap();

        // `deputy` still carries the old role in memory
        let err = env.helpdesk.create_user(&deputy, new_user("jdoe")).unwrap_err();
        assert!(matches!(err, HelpdeskError::Forbidden { .. }));
    }

    #[test]
    fn test_delete_user_cascades() {
        let env = TestHelpdesk::new();
        let leaver = env.user("leaver", Role::SuperAdmin, "IT");
        let reporter = env.user("reporter", Role::User, "");

        let own = env.create_ticket(&leaver, "Laptop battery swelling");
        let assigned = env.create_ticket(&reporter, "Printer not working");
        env.helpdesk.assign_ticket(&env.admin, assigned.number, leaver.id).unwrap();
        env.helpdesk
            .add_comment(&leaver, assigned.number, "On my way to check")
            .unwrap();

        let deletion = env.helpdesk.delete_user(&env.admin, leaver.id).unwrap();
        assert_eq!(deletion.tickets_orphaned, 1);
        assert_eq!(deletion.tickets_unassigned, 1);
        assert_eq!(deletion.comments_removed, 1);

        let own = env.helpdesk.ticket(&env.admin, own.number).unwrap().ticket;
        assert_eq!(own.creator_id, None);
        assert!(own.user_name.ends_with(" (Deleted User)"));

        let assigned = env.helpdesk.ticket(&env.admin, assigned.number).unwrap();
        assert_eq!(assigned.ticket.assigned_to, None);
        assert_eq!(assigned.ticket.status, Status::Open);
        assert!(assigned.comments.is_empty());

        assert!(env.helpdesk.find_user("leaver").is_err());
    }

    #[test]
    fn test_delete_user_clears_assigner() {
        let env = TestHelpdesk::new();
        let dispatcher = env.user("dispatcher", Role::SuperAdmin, "IT");
        let tech = env.user("tech", Role::User, "IT");
        let ticket = env.create_ticket(&tech, "Scanner driver missing");
        env.helpdesk.assign_ticket(&dispatcher, ticket.number, tech.id).unwrap();

        env.helpdesk.delete_user(&env.admin, dispatcher.id).unwrap();

        let ticket = env.helpdesk.ticket(&env.admin, ticket.number).unwrap().ticket;
        assert_eq!(ticket.assigned_to, Some(tech.id));
        assert_eq!(ticket.assigned_by, None);
        assert_eq!(ticket.status, Status::InProgress);
    }

    #[test]
    fn test_cannot_delete_self() {
        let env = TestHelpdesk::new();
        assert!(env.helpdesk.delete_user(&env.admin, env.admin.id).is_err());
        assert!(env.helpdesk.find_user(&env.admin.username).is_ok());
    }

    #[test]
    fn test_orphaned_ticket_hidden_from_department_head() {
        let env = TestHelpdesk::new();
        let hod = env.user("hod", Role::Hod, "Engineering");
        let eng = env.user("eng", Role::User, "Engineering");
        env.helpdesk
            .create_ticket(
                &eng,
                NewTicket::new("Printer not working", "Paper jam on every print job", "Hardware", "Low"),
                &RequestOrigin::default(),
            )
            .unwrap();
        assert_eq!(env.helpdesk.visible_tickets(&hod, &TicketFilter::default()).unwrap().len(), 1);

        env.helpdesk.delete_user(&env.admin, eng.id).unwrap();
        assert!(env.helpdesk.visible_tickets(&hod, &TicketFilter::default()).unwrap().is_empty());
        assert!(env.helpdesk.ticket(&hod, TicketNumber::new(1)).is_err());
    }

    #[test]
    fn test_seed_default_users_once() {
        let env = TestHelpdesk::empty();
        let seeded = env.helpdesk.seed_default_users().unwrap();
        assert_eq!(seeded.len(), 2);
        assert_eq!(seeded[0].role, Role::SuperAdmin);
        assert!(env.helpdesk.seed_default_users().unwrap().is_empty());
    }
}
