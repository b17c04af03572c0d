use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use gtn_helpdesk::config::HelpdeskConfig;
use gtn_helpdesk::core::{RequestOrigin, User};
use gtn_helpdesk::lifecycle::{Helpdesk, NewTicket};
use gtn_helpdesk::reports::{self, TicketFilter};
use gtn_helpdesk::storage::{Dataset, MemoryStore};
use std::collections::HashMap;
use std::hint::black_box;

fn helpdesk() -> (Helpdesk<MemoryStore>, User) {
    let helpdesk = Helpdesk::new(MemoryStore::new(Dataset::seeded()), HelpdeskConfig::default()).unwrap();
    helpdesk.seed_default_users().unwrap();
    let user = helpdesk.find_user("testuser").unwrap();
    (helpdesk, user)
}

fn populated(count: usize) -> (Helpdesk<MemoryStore>, User) {
    let (helpdesk, user) = helpdesk();
    let origin = RequestOrigin::new(Some("10.0.0.7".to_string()));
    for i in 0..count {
        let category = ["Hardware", "Software", "Network", "Other"][i % 4];
        let request = NewTicket::new(format!("Issue number {i}"), "Details of the problem", category, "Medium");
        helpdesk.create_ticket(&user, request, &origin).unwrap();
    }
    let admin = helpdesk.find_user("superadmin").unwrap();
    (helpdesk, admin)
}

fn bench_ticket_creation(c: &mut Criterion) {
    let origin = RequestOrigin::new(Some("10.0.0.7".to_string()));

    c.bench_function("lifecycle.create_ticket", |b| {
        b.iter_batched(
            helpdesk,
            |(helpdesk, user)| {
                let request = NewTicket::new("Printer jam on floor 2", "Paper stuck in tray 2", "Hardware", "Medium");
                black_box(helpdesk.create_ticket(&user, request, &origin).unwrap());
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_reports(c: &mut Criterion) {
    let (helpdesk, admin) = populated(500);
    let tickets = helpdesk.visible_tickets(&admin, &TicketFilter::default()).unwrap();
    let users: HashMap<_, _> = helpdesk
        .users(&admin)
        .unwrap()
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    c.bench_function("reports.status_counts_500", |b| {
        b.iter(|| black_box(reports::status_counts(&tickets)));
    });

    c.bench_function("reports.top_creators_500", |b| {
        b.iter(|| black_box(reports::top_creators(&tickets, &users, 8)));
    });

    c.bench_function("reports.dashboard_500", |b| {
        b.iter(|| black_box(helpdesk.dashboard(&admin, None).unwrap()));
    });

    let filter = TicketFilter {
        search: Some("number 4".to_string()),
        ..TicketFilter::default()
    };
    c.bench_function("reports.search_500", |b| {
        b.iter(|| black_box(filter.apply(tickets.clone())));
    });
}

criterion_group!(benches, bench_ticket_creation, bench_reports);
criterion_main!(benches);
