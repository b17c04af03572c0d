//! Role-based access decisions
//!
//! Every lifecycle operation asks [`AccessPolicy`] explicitly; a denial is
//! always a [`HelpdeskError::Forbidden`], never a silent filter.

use crate::core::{Role, Ticket, User};
use crate::error::{HelpdeskError, Result};

/// Pure authorization rules over users and tickets
#[derive(Debug, Default, Clone, Copy)]
pub struct AccessPolicy;

impl AccessPolicy {
    /// Whether `actor` may see `ticket`
    ///
    /// `creator` is the ticket's creator account, `None` once deleted.
    #[must_use]
    pub fn can_view(actor: &User, ticket: &Ticket, creator: Option<&User>) -> bool {
        match actor.role {
            Role::SuperAdmin | Role::Admin => true,
            Role::Hod => {
                ticket.is_created_by(actor.id)
                    || creator.is_some_and(|c| ticket.is_created_by(c.id) && actor.shares_department_with(c))
            },
            Role::User => ticket.is_created_by(actor.id),
        }
    }

    /// Commenting follows the same rules as viewing
    #[must_use]
    pub fn can_comment(actor: &User, ticket: &Ticket, creator: Option<&User>) -> bool {
        Self::can_view(actor, ticket, creator)
    }

    /// Status changes, deletions and administration
    #[must_use]
    pub fn can_manage(actor: &User) -> bool {
        actor.role == Role::SuperAdmin
    }

    #[must_use]
    pub fn can_assign(actor: &User) -> bool {
        actor.role == Role::SuperAdmin
    }

    /// Whether `actor` may see the organisation-wide dashboard
    #[must_use]
    pub fn can_view_all(actor: &User) -> bool {
        matches!(actor.role, Role::SuperAdmin | Role::Admin)
    }

    pub fn ensure_view(actor: &User, ticket: &Ticket, creator: Option<&User>) -> Result<()> {
        if Self::can_view(actor, ticket, creator) {
            Ok(())
        } else {
            Err(deny(actor, format!("view ticket {}", ticket.number)))
        }
    }

    pub fn ensure_comment(actor: &User, ticket: &Ticket, creator: Option<&User>) -> Result<()> {
        if Self::can_comment(actor, ticket, creator) {
            Ok(())
        } else {
            Err(deny(actor, format!("comment on ticket {}", ticket.number)))
        }
    }

    pub fn ensure_manage(actor: &User, action: &str) -> Result<()> {
        if Self::can_manage(actor) {
            Ok(())
        } else {
            Err(deny(actor, action))
        }
    }

    pub fn ensure_assign(actor: &User) -> Result<()> {
        if Self::can_assign(actor) {
            Ok(())
        } else {
            Err(deny(actor, "assign tickets"))
        }
    }
}

fn deny(actor: &User, action: impl Into<String>) -> HelpdeskError {
    let action = action.into();
    tracing::warn!(actor = %actor.username, role = %actor.role, action = %action, "access denied");
    HelpdeskError::forbidden(actor.username.clone(), action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{TicketBuilder, UserBuilder};

    fn user(name: &str, role: Role, department: &str) -> User {
        UserBuilder::new().username(name).role(role).department(department).build()
    }

    #[test]
    fn test_creator_can_always_view() {
        for role in [Role::User, Role::Hod, Role::Admin, Role::SuperAdmin] {
            let creator = user("creator", role, "");
            let ticket = TicketBuilder::new().creator(&creator).build();
            assert!(AccessPolicy::can_view(&creator, &ticket, Some(&creator)));
        }
    }

    #[test]
    fn test_users_only_see_their_own() {
        let owner = user("owner", Role::User, "Engineering");
        let other = user("other", Role::User, "Engineering");
        let ticket = TicketBuilder::new().creator(&owner).build();

        assert!(!AccessPolicy::can_view(&other, &ticket, Some(&owner)));
        assert!(!AccessPolicy::can_comment(&other, &ticket, Some(&owner)));
    }

    #[test]
    fn test_hod_department_scope() {
        let hod = user("hod", Role::Hod, "Engineering");
        let engineer = user("eng", Role::User, "Engineering");
        let accountant = user("acc", Role::User, "Finance");

        let eng_ticket = TicketBuilder::new().creator(&engineer).build();
        let fin_ticket = TicketBuilder::new().creator(&accountant).build();

        assert!(AccessPolicy::can_view(&hod, &eng_ticket, Some(&engineer)));
        assert!(!AccessPolicy::can_view(&hod, &fin_ticket, Some(&accountant)));
    }

    #[test]
    fn test_hod_without_department_sees_only_own() {
        let hod = user("hod", Role::Hod, "");
        let someone = user("someone", Role::User, "");
        let ticket = TicketBuilder::new().creator(&someone).build();
        assert!(!AccessPolicy::can_view(&hod, &ticket, Some(&someone)));
    }

    #[test]
    fn test_deleted_creator_hidden_from_hod() {
        let hod = user("hod", Role::Hod, "Engineering");
        let mut ticket = TicketBuilder::new().build();
        ticket.creator_id = None;
        assert!(!AccessPolicy::can_view(&hod, &ticket, None));

        let admin = user("admin", Role::Admin, "");
        assert!(AccessPolicy::can_view(&admin, &ticket, None));
    }

    #[test]
    fn test_manage_and_assign_are_super_admin_only() {
        assert!(AccessPolicy::can_manage(&user("root", Role::SuperAdmin, "")));
        assert!(!AccessPolicy::can_manage(&user("admin", Role::Admin, "")));
        assert!(!AccessPolicy::can_assign(&user("hod", Role::Hod, "")));

        let err = AccessPolicy::ensure_assign(&user("admin", Role::Admin, "")).unwrap_err();
        assert!(matches!(err, HelpdeskError::Forbidden { .. }));
    }
}
