use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// GTN IT helpdesk: tickets, assignments, users and reports
#[derive(Parser, Debug)]
#[command(name = "gtn-helpdesk", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    /// Output results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command that touches the helpdesk state
#[derive(Args, Debug, Clone)]
pub struct GlobalOptions {
    /// Path to the YAML state file
    #[arg(long, global = true, env = "HELPDESK_STATE", value_name = "FILE")]
    pub state: Option<PathBuf>,

    /// Path to a YAML configuration file
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Username the command runs as
    #[arg(
        long = "as",
        global = true,
        env = "HELPDESK_USER",
        value_name = "USERNAME",
        default_value = "superadmin"
    )]
    pub actor: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a fresh state file with default users and master data
    Init {
        /// Overwrite an existing state file
        #[arg(long)]
        force: bool,
    },

    /// Manage user accounts
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// File and work tickets
    Ticket {
        #[command(subcommand)]
        command: TicketCommands,
    },

    /// Dashboards and exports
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },

    /// Show the notification log
    Notifications {
        /// Only `sent` or `failed` deliveries
        #[arg(long)]
        outcome: Option<String>,

        /// Only one category: created, assigned, updated or comment
        #[arg(long)]
        category: Option<String>,

        /// Maximum number of rows
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Manage categories, priorities and statuses
    #[command(name = "master-data")]
    MasterData {
        #[command(subcommand)]
        command: MasterDataCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// Create an account
    Create {
        username: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        #[arg(long, default_value = "")]
        department: String,

        /// Technician specialization (Hardware, Software, ...)
        #[arg(long)]
        specialization: Option<String>,

        /// user, hod, admin or super_admin
        #[arg(long, default_value = "user")]
        role: String,
    },

    /// List all accounts
    List,

    /// Change an account's role
    Role { username: String, role: String },

    /// Delete an account, detaching its tickets and removing its comments
    Delete { username: String },
}

#[derive(Subcommand, Debug)]
pub enum TicketCommands {
    /// File a new ticket
    Create {
        title: String,

        #[arg(short, long)]
        description: String,

        #[arg(short, long, default_value = "Other")]
        category: String,

        #[arg(short, long, default_value = "Medium")]
        priority: String,

        /// Files to attach
        #[arg(long = "attach", value_name = "FILE")]
        attachments: Vec<PathBuf>,

        #[command(flatten)]
        origin: OriginArgs,
    },

    /// Show a ticket with its comments
    Show { number: String },

    /// List the tickets you can see
    List {
        #[arg(short, long)]
        status: Option<String>,

        #[arg(short, long)]
        category: Option<String>,

        #[arg(short, long)]
        priority: Option<String>,

        /// Text to look for in number, title, description or creator
        #[arg(long)]
        search: Option<String>,

        /// Creation window: 2024, 2024-03, 2024-01-15 or 2024-01-01..2024-01-31
        #[arg(long)]
        created: Option<String>,

        /// Username of the assignee
        #[arg(long)]
        assigned_to: Option<String>,

        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Assign a ticket to a user
    Assign { number: String, assignee: String },

    /// Remove a ticket's assignee
    Unassign { number: String },

    /// Change a ticket's status
    Status {
        number: String,

        /// Open, "In Progress", Resolved or Closed
        status: String,

        /// Note recorded with the change
        #[arg(short, long)]
        note: Option<String>,
    },

    /// Add a comment to a ticket
    Comment { number: String, text: String },

    /// Delete a ticket and its comments
    Delete { number: String },
}

/// Where the request came from, as a front end would report it
#[derive(Args, Debug, Clone, Default)]
pub struct OriginArgs {
    /// Client machine name
    #[arg(long)]
    pub system_name: Option<String>,

    /// Browser user agent, used to guess a machine name
    #[arg(long)]
    pub user_agent: Option<String>,

    /// X-Forwarded-For header value
    #[arg(long)]
    pub forwarded_for: Option<String>,

    /// X-Real-IP header value
    #[arg(long)]
    pub real_ip: Option<String>,

    /// Socket peer address
    #[arg(long)]
    pub remote_addr: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum ReportCommands {
    /// Role-scoped statistics
    Summary {
        /// Creation window: 2024, 2024-03, 2024-01-15 or 2024-01-01..2024-01-31
        #[arg(long)]
        created: Option<String>,
    },

    /// Export the complaint register as CSV
    Export {
        #[arg(long)]
        created: Option<String>,

        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum MasterDataCommands {
    /// Show categories, priorities and statuses
    List,

    AddCategory {
        name: String,

        #[arg(long)]
        description: Option<String>,
    },

    AddPriority {
        name: String,

        /// 1 (lowest) to 10
        #[arg(long)]
        level: u8,

        /// #RRGGBB
        #[arg(long)]
        color: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },

    AddStatus {
        status: String,

        #[arg(long)]
        color: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },

    /// Enable or disable a row
    Toggle {
        /// category, priority or status
        kind: String,
        name: String,

        /// Disable instead of enable
        #[arg(long)]
        disable: bool,
    },
}
