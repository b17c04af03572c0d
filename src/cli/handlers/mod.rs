//! Command handlers for the CLI
//!
//! Each handler resolves the acting account, calls into the lifecycle
//! engine and renders the result through [`OutputFormatter`](crate::cli::OutputFormatter).

mod common;
mod init;
mod master_data;
mod report;
mod ticket;
mod user;

pub use common::{HandlerContext, parse_ticket_number, state_path};
pub use init::handle_init;
pub use master_data::handle_master_data_command;
pub use report::{handle_notifications_command, handle_report_command};
pub use ticket::handle_ticket_command;
pub use user::handle_user_command;
