//! Handlers for the `user` subcommands

use super::common::HandlerContext;
use crate::cli::OutputFormatter;
use crate::cli::commands::UserCommands;
use crate::core::{Role, User};
use crate::error::Result;
use crate::lifecycle::NewUser;

pub fn handle_user_command(command: UserCommands, ctx: &HandlerContext, output: &OutputFormatter) -> Result<()> {
    let actor = ctx.actor()?;

    match command {
        UserCommands::Create {
            username,
            email,
            first_name,
            last_name,
            department,
            specialization,
            role,
        } => {
            let user = ctx.helpdesk.create_user(&actor, NewUser {
                username,
                email,
                first_name,
                last_name,
                department,
                specialization,
                role: role.parse()?,
            })?;
            if output.is_json() {
                return output.print_json(&user);
            }
            output.success(&format!("Created user {} ({})", user.username, user.role));
        },
        UserCommands::List => {
            let users = ctx.helpdesk.users(&actor)?;
            if output.is_json() {
                return output.print_json(&users);
            }
            print_users(&users, output);
        },
        UserCommands::Role { username, role } => {
            let role: Role = role.parse()?;
            let target = ctx.helpdesk.find_user(&username)?;
            let user = ctx.helpdesk.change_role(&actor, target.id, role)?;
            if output.is_json() {
                return output.print_json(&user);
            }
            output.success(&format!("{} is now {}", user.username, user.role));
        },
        UserCommands::Delete { username } => {
            let target = ctx.helpdesk.find_user(&username)?;
            let deletion = ctx.helpdesk.delete_user(&actor, target.id)?;
            if output.is_json() {
                return output.print_json(&deletion);
            }
            output.success(&format!("Deleted user {}", deletion.username));
            output.info(&format!(
                "  {} created tickets kept without a creator, {} tickets returned to the queue, {} comments removed",
                deletion.tickets_orphaned, deletion.tickets_unassigned, deletion.comments_removed
            ));
        },
    }

    Ok(())
}

fn print_users(users: &[User], output: &OutputFormatter) {
    output.heading(&format!("{} users", users.len()));
    for user in users {
        let department = if user.department.is_empty() { "-" } else { &user.department };
        output.info(&format!(
            "  {:<16} {:<24} {:<12} {:<14} {}",
            user.username,
            user.full_name(),
            user.role.as_str(),
            department,
            user.email
        ));
    }
}
