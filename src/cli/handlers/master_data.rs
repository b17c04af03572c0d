//! Handlers for the `master-data` subcommands

use super::common::HandlerContext;
use crate::cli::OutputFormatter;
use crate::cli::commands::MasterDataCommands;
use crate::core::{MasterData, MasterDataKind, Status};
use crate::error::Result;

pub fn handle_master_data_command(
    command: MasterDataCommands,
    ctx: &HandlerContext,
    output: &OutputFormatter,
) -> Result<()> {
    let data = match command {
        MasterDataCommands::List => ctx.helpdesk.master_data()?,
        MasterDataCommands::AddCategory { name, description } => {
            let data = ctx.helpdesk.add_category(&ctx.actor()?, &name, description)?;
            output.success(&format!("Added category '{}'", name.trim()));
            data
        },
        MasterDataCommands::AddPriority {
            name,
            level,
            color,
            description,
        } => {
            let data = ctx
                .helpdesk
                .add_priority(&ctx.actor()?, &name, level, color, description)?;
            output.success(&format!("Added priority '{}' at level {level}", name.trim()));
            data
        },
        MasterDataCommands::AddStatus {
            status,
            color,
            description,
        } => {
            let status: Status = status.parse()?;
            let data = ctx.helpdesk.add_status(&ctx.actor()?, status, color, description)?;
            output.success(&format!("Added status '{status}'"));
            data
        },
        MasterDataCommands::Toggle { kind, name, disable } => {
            let kind: MasterDataKind = kind.parse()?;
            let data = ctx
                .helpdesk
                .set_master_data_active(&ctx.actor()?, kind, &name, !disable)?;
            let state = if disable { "disabled" } else { "enabled" };
            output.success(&format!("{kind} '{name}' {state}"));
            data
        },
    };

    if output.is_json() {
        return output.print_json(&data);
    }
    print_master_data(&data, output);
    Ok(())
}

fn print_master_data(data: &MasterData, output: &OutputFormatter) {
    let flag = |active: bool| if active { "" } else { " (inactive)" };

    output.heading("Categories");
    for category in &data.categories {
        output.info(&format!("  {}{}", category.name, flag(category.is_active)));
    }

    output.heading("Priorities");
    let mut priorities: Vec<_> = data.priorities.iter().collect();
    priorities.sort_by_key(|p| p.level);
    for priority in priorities {
        output.info(&format!(
            "  {:<2} {:<10} {}{}",
            priority.level,
            priority.name,
            priority.color_code.as_deref().unwrap_or("-"),
            flag(priority.is_active)
        ));
    }

    output.heading("Statuses");
    for label in &data.statuses {
        output.info(&format!(
            "  {:<12} {}{}",
            label.status.as_str(),
            label.color_code.as_deref().unwrap_or("-"),
            flag(label.is_active)
        ));
    }
}
