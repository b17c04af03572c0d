//! Lifecycle behaviour exercised through the public library API

use gtn_helpdesk::config::HelpdeskConfig;
use gtn_helpdesk::core::{RequestOrigin, Role, Status, User};
use gtn_helpdesk::error::HelpdeskError;
use gtn_helpdesk::lifecycle::{Helpdesk, NewTicket, NewUser};
use gtn_helpdesk::reports::TicketFilter;
use gtn_helpdesk::storage::{Dataset, MemoryStore};
use std::collections::HashSet;
use std::thread;

fn helpdesk() -> (Helpdesk<MemoryStore>, User) {
    let helpdesk = Helpdesk::new(MemoryStore::new(Dataset::seeded()), HelpdeskConfig::default()).unwrap();
    helpdesk.seed_default_users().unwrap();
    let admin = helpdesk.find_user("superadmin").unwrap();
    (helpdesk, admin)
}

fn add_user(helpdesk: &Helpdesk<MemoryStore>, admin: &User, username: &str, department: &str, role: Role) -> User {
    helpdesk
        .create_user(admin, NewUser {
            username: username.to_string(),
            email: format!("{username}@gtnengineering.com"),
            first_name: "Test".to_string(),
            last_name: "Person".to_string(),
            department: department.to_string(),
            specialization: None,
            role,
        })
        .unwrap()
}

fn file(helpdesk: &Helpdesk<MemoryStore>, user: &User, title: &str) -> gtn_helpdesk::core::Ticket {
    let request = NewTicket::new(title, "Details of the problem go here", "Hardware", "Medium");
    helpdesk
        .create_ticket(user, request, &RequestOrigin::new(Some("10.0.0.7".to_string())))
        .unwrap()
        .into_value()
}

#[test]
fn test_concurrent_creation_yields_unique_numbers() {
    let (helpdesk, admin) = helpdesk();
    let user = add_user(&helpdesk, &admin, "jdoe", "Engineering", Role::User);

    let numbers: Vec<u64> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let helpdesk = &helpdesk;
                let user = &user;
                scope.spawn(move || {
                    (0..5)
                        .map(|i| file(helpdesk, user, &format!("Worker {worker} issue {i}")).number.sequence())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles.into_iter().flat_map(|h| h.join().unwrap()).collect()
    });

    let unique: HashSet<_> = numbers.iter().copied().collect();
    assert_eq!(unique.len(), 40);
    assert_eq!(numbers.iter().copied().min(), Some(1));
    assert_eq!(numbers.iter().copied().max(), Some(40));
}

#[test]
fn test_numbers_are_never_reused_after_delete() {
    let (helpdesk, admin) = helpdesk();
    let first = file(&helpdesk, &admin, "First ticket filed");
    helpdesk.delete_ticket(&admin, first.number).unwrap();

    let second = file(&helpdesk, &admin, "Second ticket filed");
    assert_eq!(second.number.to_string(), "GTN-000002");
}

#[test]
fn test_hod_sees_own_department_only() {
    let (helpdesk, admin) = helpdesk();
    let hod = add_user(&helpdesk, &admin, "hod_eng", "Engineering", Role::Hod);
    let engineer = add_user(&helpdesk, &admin, "eng1", "Engineering", Role::User);
    let accountant = add_user(&helpdesk, &admin, "acc1", "Accounts", Role::User);

    let visible_ticket = file(&helpdesk, &engineer, "CAD licence expired");
    let hidden_ticket = file(&helpdesk, &accountant, "Tally will not open");

    let visible = helpdesk.visible_tickets(&hod, &TicketFilter::default()).unwrap();
    let numbers: Vec<_> = visible.iter().map(|t| t.number).collect();
    assert_eq!(numbers, vec![visible_ticket.number]);

    let err = helpdesk.ticket(&hod, hidden_ticket.number).unwrap_err();
    assert!(matches!(err, HelpdeskError::Forbidden { .. }));
}

#[test]
fn test_delete_user_detaches_everything() {
    let (helpdesk, admin) = helpdesk();
    let technician = add_user(&helpdesk, &admin, "tech1", "IT", Role::User);
    let reporter = add_user(&helpdesk, &admin, "rep1", "Engineering", Role::User);

    let filed = file(&helpdesk, &technician, "Own ticket by tech");
    let assigned = file(&helpdesk, &reporter, "Needs a technician");
    helpdesk.assign_ticket(&admin, assigned.number, technician.id).unwrap();
    helpdesk
        .add_comment(&technician, filed.number, "Looking into it now")
        .unwrap();

    let deletion = helpdesk.delete_user(&admin, technician.id).unwrap();
    assert_eq!(deletion.tickets_orphaned, 1);
    assert_eq!(deletion.tickets_unassigned, 1);
    assert_eq!(deletion.comments_removed, 1);

    let orphan = helpdesk.ticket(&admin, filed.number).unwrap();
    assert!(orphan.ticket.creator_id.is_none());
    assert!(orphan.ticket.user_name.ends_with("(Deleted User)"));
    assert!(orphan.comments.is_empty());

    let requeued = helpdesk.ticket(&admin, assigned.number).unwrap();
    assert_eq!(requeued.ticket.status, Status::Open);
    assert!(requeued.ticket.assigned_to.is_none());
}

#[test]
fn test_printer_ticket_walkthrough() {
    let (helpdesk, admin) = helpdesk();
    let user = helpdesk.find_user("testuser").unwrap();

    let ticket = file(&helpdesk, &user, "Printer jam on floor 2");
    assert_eq!(ticket.status, Status::Open);
    assert_eq!(ticket.user_ip_address.as_deref(), Some("10.0.0.7"));

    let assigned = helpdesk.assign_ticket(&admin, ticket.number, admin.id).unwrap();
    assert_eq!(assigned.value.status, Status::InProgress);

    let resolved = helpdesk
        .update_status(&admin, ticket.number, Status::Resolved, Some("Replaced the roller"))
        .unwrap();
    assert!(resolved.value.resolved_at.is_some());

    let view = helpdesk.ticket(&user, ticket.number).unwrap();
    assert_eq!(view.comments.len(), 1);
    assert_eq!(view.comments[0].comment.text, "Status updated to 'Resolved'. Replaced the roller");
}

#[test]
fn test_two_handles_on_one_state_file_allocate_distinct_numbers() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("state.yaml");
    let setup = Helpdesk::new(MemoryStore::create(&path, Dataset::seeded()).unwrap(), HelpdeskConfig::default()).unwrap();
    setup.seed_default_users().unwrap();

    let first = Helpdesk::new(MemoryStore::open(&path).unwrap(), HelpdeskConfig::default()).unwrap();
    let second = Helpdesk::new(MemoryStore::open(&path).unwrap(), HelpdeskConfig::default()).unwrap();
    let user = first.find_user("testuser").unwrap();

    let a = file(&first, &user, "Monitor flickers");
    let b = file(&second, &user, "Printer not working");
    assert_eq!(a.number.to_string(), "GTN-000001");
    assert_eq!(b.number.to_string(), "GTN-000002");

    let reopened = Helpdesk::new(MemoryStore::open(&path).unwrap(), HelpdeskConfig::default()).unwrap();
    let admin = reopened.find_user("superadmin").unwrap();
    let mut titles: Vec<_> = reopened
        .visible_tickets(&admin, &TicketFilter::default())
        .unwrap()
        .into_iter()
        .map(|t| t.title)
        .collect();
    titles.sort();
    assert_eq!(titles, vec!["Monitor flickers", "Printer not working"]);
}
