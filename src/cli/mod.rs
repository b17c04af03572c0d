//! Command-line interface for the helpdesk

pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{
    Cli, Commands, GlobalOptions, MasterDataCommands, OriginArgs, ReportCommands, TicketCommands, UserCommands,
};
pub use output::OutputFormatter;
