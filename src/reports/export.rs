use super::department_of;
use crate::core::{Ticket, User, UserId};
use crate::error::Result;
use crate::timezone::TimezoneFormatter;
use std::collections::HashMap;
use std::io::Write;

/// Column headers of the user complaint register
pub const EXPORT_HEADERS: [&str; 13] = [
    "SNo",
    "Ticket Number",
    "Dept",
    "Issue",
    "Issue Type",
    "Priority",
    "Status",
    "Raised By",
    "Originating Date",
    "Mode Of Communication",
    "Issue Cleared By",
    "Issue Clearance Date",
    "Reason Of The Issue",
];

/// Write tickets as CSV rows in the given order, timestamps in the
/// formatter's zone
///
/// Returns the number of ticket rows written.
pub fn write_csv<W: Write>(
    tickets: &[Ticket],
    users: &HashMap<UserId, User>,
    formatter: &dyn TimezoneFormatter,
    writer: W,
) -> Result<usize> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(EXPORT_HEADERS)?;

    for (index, ticket) in tickets.iter().enumerate() {
        let cleared_by = ticket
            .assigned_to
            .and_then(|id| users.get(&id))
            .map_or_else(|| "Unassigned".to_string(), User::full_name);
        let cleared_on = ticket
            .resolved_at
            .map_or_else(|| "Pending".to_string(), |at| formatter.format(at));

        csv.write_record([
            (index + 1).to_string(),
            ticket.number.to_string(),
            department_of(ticket, users).to_string(),
            ticket.title.clone(),
            ticket.category.clone(),
            ticket.priority.clone(),
            ticket.status.to_string(),
            ticket.user_name.clone(),
            formatter.format(ticket.created_at),
            "Online Portal".to_string(),
            cleared_by,
            cleared_on,
            ticket.description.clone(),
        ])?;
    }

    csv.flush()?;
    Ok(tickets.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Status, TicketBuilder, TicketNumber, UserBuilder};
    use crate::timezone::OffsetFormatter;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_register_rows() {
        let creator = UserBuilder::new()
            .username("eng")
            .first_name("Asha")
            .last_name("Rao")
            .department("Engineering")
            .build();
        let tech = UserBuilder::new().username("tech").first_name("Ravi").last_name("Kumar").build();
        let users: HashMap<_, _> = [(creator.id, creator.clone()), (tech.id, tech.clone())].into();

        let created = Utc.with_ymd_and_hms(2024, 1, 10, 4, 0, 0).unwrap();
        let resolved = TicketBuilder::new()
            .number(TicketNumber::new(7))
            .title("Printer, second floor")
            .category("Hardware")
            .priority("High")
            .status(Status::Resolved)
            .creator(&creator)
            .assigned(tech.id, tech.id)
            .created_at(created)
            .build();
        let pending = TicketBuilder::new()
            .number(TicketNumber::new(8))
            .title("VPN drops")
            .creator(&creator)
            .created_at(created)
            .build();

        let mut out = Vec::new();
        let rows = write_csv(&[resolved, pending], &users, &OffsetFormatter::ist(), &mut out).unwrap();
        assert_eq!(rows, 2);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("SNo,Ticket Number,Dept"));
        assert!(lines[1].starts_with("1,GTN-000007,Engineering,\"Printer, second floor\",Hardware,High,Resolved,Asha Rao,2024-01-10 09:30:00"));
        assert!(lines[1].contains("Ravi Kumar,2024-01-10 09:30:00"));
        assert!(lines[2].contains("Unassigned,Pending"));
    }
}
