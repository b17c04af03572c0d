//! Handlers for the `ticket` subcommands

use super::common::{HandlerContext, parse_ticket_number};
use crate::cli::commands::{OriginArgs, TicketCommands};
use crate::cli::output::{colored_priority, colored_status};
use crate::cli::OutputFormatter;
use crate::core::{RequestOrigin, Status, Ticket, User, resolve_client_ip};
use crate::error::{HelpdeskError, Result};
use crate::lifecycle::{NewTicket, Outcome, TicketView, Upload};
use crate::reports::TicketFilter;
use crate::timezone::TimezoneFormatter;
use std::path::PathBuf;

pub fn handle_ticket_command(command: TicketCommands, ctx: &HandlerContext, output: &OutputFormatter) -> Result<()> {
    let actor = ctx.actor()?;

    match command {
        TicketCommands::Create {
            title,
            description,
            category,
            priority,
            attachments,
            origin,
        } => {
            let request = NewTicket::new(title, description, category, priority);
            handle_create(ctx, &actor, request, attachments, &origin, output)
        },
        TicketCommands::Show { number } => {
            let view = ctx.helpdesk.ticket(&actor, parse_ticket_number(&number)?)?;
            if output.is_json() {
                return output.print_json(&view);
            }
            let formatter = ctx.helpdesk.config().timezone.formatter()?;
            print_ticket(&view, &formatter, output);
            Ok(())
        },
        TicketCommands::List {
            status,
            category,
            priority,
            search,
            created,
            assigned_to,
            limit,
        } => {
            let filter = TicketFilter {
                status: status.as_deref().map(str::parse).transpose()?,
                category,
                priority,
                assigned_to: match assigned_to {
                    Some(username) => Some(ctx.helpdesk.find_user(&username)?.id),
                    None => None,
                },
                search,
                created: created.as_deref().map(str::parse).transpose()?,
                limit,
            };
            let tickets = ctx.helpdesk.visible_tickets(&actor, &filter)?;
            if output.is_json() {
                return output.print_json(&tickets);
            }
            print_ticket_list(&tickets, output);
            Ok(())
        },
        TicketCommands::Assign { number, assignee } => {
            let assignee = ctx.helpdesk.find_user(&assignee)?;
            let outcome = ctx
                .helpdesk
                .assign_ticket(&actor, parse_ticket_number(&number)?, assignee.id)?;
            finish(&outcome, &format!("Assigned {} to {}", outcome.value.number, assignee.full_name()), output)
        },
        TicketCommands::Unassign { number } => {
            let ticket = ctx.helpdesk.unassign_ticket(&actor, parse_ticket_number(&number)?)?;
            if output.is_json() {
                return output.print_json(&ticket);
            }
            output.success(&format!("{} is no longer assigned", ticket.number));
            Ok(())
        },
        TicketCommands::Status { number, status, note } => {
            let status: Status = status.parse()?;
            let number = parse_ticket_number(&number)?;
            let outcome = ctx.helpdesk.update_status(&actor, number, status, note.as_deref())?;
            finish(&outcome, &format!("{number} is now {status}"), output)
        },
        TicketCommands::Comment { number, text } => {
            let number = parse_ticket_number(&number)?;
            let outcome = ctx.helpdesk.add_comment(&actor, number, &text)?;
            finish(&outcome, &format!("Comment added to {number}"), output)
        },
        TicketCommands::Delete { number } => {
            let ticket = ctx.helpdesk.delete_ticket(&actor, parse_ticket_number(&number)?)?;
            if output.is_json() {
                return output.print_json(&ticket);
            }
            output.success(&format!("Deleted {} ({})", ticket.number, ticket.title));
            Ok(())
        },
    }
}

fn handle_create(
    ctx: &HandlerContext,
    actor: &User,
    mut request: NewTicket,
    attachments: Vec<PathBuf>,
    origin: &OriginArgs,
    output: &OutputFormatter,
) -> Result<()> {
    for path in attachments {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| HelpdeskError::validation(format!("Not a file: {}", path.display())))?
            .to_string();
        request.uploads.push(Upload::new(filename, std::fs::read(&path)?));
    }

    let ip = resolve_client_ip(
        origin.forwarded_for.as_deref(),
        origin.real_ip.as_deref(),
        origin.remote_addr.as_deref(),
    );
    let mut request_origin = RequestOrigin::new(ip);
    request_origin.system_name.clone_from(&origin.system_name);
    request_origin.user_agent.clone_from(&origin.user_agent);

    let outcome = ctx.helpdesk.create_ticket(actor, request, &request_origin)?;
    let message = format!("Created {}: {}", outcome.value.number, outcome.value.title);
    finish(&outcome, &message, output)
}

/// Print the result of a lifecycle action with its notification report
fn finish<T: serde::Serialize>(outcome: &Outcome<T>, message: &str, output: &OutputFormatter) -> Result<()> {
    if output.is_json() {
        return output.print_json(&serde_json::json!({
            "status": if outcome.is_partial() { "partial" } else { "success" },
            "result": outcome.value,
            "notifications": outcome.report,
            "warnings": outcome.warnings,
        }));
    }

    output.success(message);
    for attempt in &outcome.report.attempts {
        match &attempt.error {
            None => output.info(&format!("  notified {} ({})", attempt.recipient, attempt.category)),
            Some(error) => output.warning(&format!("Could not notify {}: {error}", attempt.recipient)),
        }
    }
    for warning in &outcome.warnings {
        output.warning(warning);
    }
    Ok(())
}

fn print_ticket(view: &TicketView, formatter: &dyn TimezoneFormatter, output: &OutputFormatter) {
    let ticket = &view.ticket;
    output.heading(&format!("{} {}", ticket.number, ticket.title));
    output.field("Status", &colored_status(ticket.status));
    output.field("Priority", &colored_priority(&ticket.priority));
    output.field("Category", &ticket.category);
    output.field("Raised by", &ticket.user_name);
    if let Some(system) = &ticket.user_system_name {
        output.field("System", system);
    }
    if let Some(ip) = &ticket.user_ip_address {
        output.field("IP address", ip);
    }
    output.field("Assigned to", view.assignee_name.as_deref().unwrap_or("Unassigned"));
    output.field("Created", &formatter.format(ticket.created_at));
    output.field("Updated", &formatter.format(ticket.updated_at));
    if ticket.resolved_at.is_some() {
        output.field("Resolved", &formatter.format_opt(ticket.resolved_at));
    }
    for attachment in &ticket.attachments {
        output.field("Attachment", &attachment.filename);
    }

    output.info("");
    output.info(&ticket.description);

    if !view.comments.is_empty() {
        output.info("");
        output.heading(&format!("Comments ({})", view.comments.len()));
        for entry in &view.comments {
            output.info(&format!(
                "  [{}] {}: {}",
                formatter.format(entry.comment.created_at),
                entry.author_name,
                entry.comment.text
            ));
        }
    }
}

fn print_ticket_list(tickets: &[Ticket], output: &OutputFormatter) {
    if tickets.is_empty() {
        output.info("No tickets found");
        return;
    }
    for ticket in tickets {
        output.info(&format!(
            "{}  {:<12} {:<9} {:<10} {}",
            ticket.number,
            ticket.status.as_str(),
            ticket.priority,
            ticket.category,
            ticket.title
        ));
    }
    output.info(&format!("\n{} tickets", tickets.len()));
}
