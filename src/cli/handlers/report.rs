//! Handlers for the `report` and `notifications` commands

use super::common::HandlerContext;
use crate::cli::OutputFormatter;
use crate::cli::commands::ReportCommands;
use crate::error::Result;
use crate::reports::{DateFilter, Dashboard, NotificationQuery};
use crate::timezone::TimezoneFormatter;
use std::fs::File;
use std::io::{self, BufWriter};

pub fn handle_report_command(command: ReportCommands, ctx: &HandlerContext, output: &OutputFormatter) -> Result<()> {
    let actor = ctx.actor()?;

    match command {
        ReportCommands::Summary { created } => {
            let created: Option<DateFilter> = created.as_deref().map(str::parse).transpose()?;
            let dashboard = ctx.helpdesk.dashboard(&actor, created)?;
            if output.is_json() {
                return output.print_json(&dashboard);
            }
            print_dashboard(&dashboard, created, output);
        },
        ReportCommands::Export { created, output: path } => {
            let created: Option<DateFilter> = created.as_deref().map(str::parse).transpose()?;
            let formatter = ctx.helpdesk.config().timezone.formatter()?;
            match &path {
                Some(path) => {
                    let writer = BufWriter::new(File::create(path)?);
                    let rows = ctx.helpdesk.export_report(&actor, created, &formatter, writer)?;
                    output.success(&format!("Exported {rows} tickets to {}", path.display()));
                },
                None => {
                    ctx.helpdesk.export_report(&actor, created, &formatter, io::stdout().lock())?;
                },
            }
        },
    }

    Ok(())
}

pub fn handle_notifications_command(
    outcome: Option<String>,
    category: Option<String>,
    limit: Option<usize>,
    ctx: &HandlerContext,
    output: &OutputFormatter,
) -> Result<()> {
    let actor = ctx.actor()?;
    let query = NotificationQuery {
        outcome: outcome.as_deref().map(str::parse).transpose()?,
        category: category.as_deref().map(str::parse).transpose()?,
        limit,
    };
    let summary = ctx.helpdesk.notification_summary(&actor, query)?;
    if output.is_json() {
        return output.print_json(&summary);
    }

    let formatter = ctx.helpdesk.config().timezone.formatter()?;
    output.heading(&format!(
        "Notifications: {} total, {} sent, {} failed",
        summary.total, summary.sent, summary.failed
    ));
    for record in &summary.records {
        let detail = record.error.as_deref().map(|e| format!(" ({e})")).unwrap_or_default();
        output.info(&format!(
            "  {}  {:<7} {:<9} {:<32} {}{detail}",
            formatter.format(record.created_at),
            record.outcome.to_string(),
            record.category.to_string(),
            record.recipient,
            record.subject
        ));
    }
    Ok(())
}

fn print_dashboard(dashboard: &Dashboard, created: Option<DateFilter>, output: &OutputFormatter) {
    let window = created.map(|f| format!(", created {f}")).unwrap_or_default();
    output.heading(&format!("{} tickets ({} scope{window})", dashboard.total, dashboard.scope));

    output.info("By status:");
    for (status, count) in &dashboard.by_status {
        output.info(&format!("  {:<20} {count}", status.as_str()));
    }
    output.info("By category:");
    for (category, count) in &dashboard.by_category {
        output.info(&format!("  {category:<20} {count}"));
    }
    output.info("By priority:");
    for (priority, count) in &dashboard.by_priority {
        output.info(&format!("  {priority:<20} {count}"));
    }
    output.info("By department:");
    for (department, count) in &dashboard.by_department {
        output.info(&format!("  {department:<20} {count}"));
    }

    if !dashboard.top_creators.is_empty() {
        output.info("Top creators:");
        for creator in &dashboard.top_creators {
            output.info(&format!("  {:<20} {:<14} {}", creator.full_name, creator.department, creator.tickets));
        }
    }
    if dashboard.assigned_to_me > 0 {
        output.info(&format!("Assigned to you and unfinished: {}", dashboard.assigned_to_me));
    }
    if !dashboard.recent.is_empty() {
        output.info("Recent:");
        for ticket in &dashboard.recent {
            output.info(&format!("  {}  {}", ticket.number, ticket.title));
        }
    }
}
