//! CLI command definitions and argument parsing.

use casewatch_domain::{AlertId, AlertStatus, RecordId, RecordKind};
use clap::{Parser, Subcommand};

/// Casewatch CLI - Track stalled records and escalate them.
#[derive(Debug, Parser)]
#[command(name = "casewatch")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "CASEWATCH_CONFIG")]
    pub config: Option<String>,

    /// SQLite database path (overrides the configuration)
    #[arg(short, long, alias = "db", global = true, env = "CASEWATCH_DB")]
    pub database: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (IDs only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage tracked records
    Record(RecordArgs),

    /// Run one escalation sweep over every open record
    Sweep(SweepArgs),

    /// Sweep on a schedule until interrupted
    Watch(WatchArgs),

    /// List and resolve alerts
    Alerts(AlertsArgs),

    /// Show the responsibility changes of a record
    History(HistoryArgs),
}

/// Arguments for record management.
#[derive(Debug, Parser)]
pub struct RecordArgs {
    #[command(subcommand)]
    pub action: RecordAction,
}

/// Record management actions.
#[derive(Debug, Subcommand)]
pub enum RecordAction {
    /// Start tracking a record
    Add {
        /// Record kind
        #[arg(short, long, value_enum, default_value = "protocol")]
        kind: KindArg,

        /// Workflow status
        #[arg(short, long, default_value = "open")]
        status: String,

        /// Days since the last movement
        #[arg(long, default_value = "0", conflicts_with = "last_movement_at")]
        stalled_days: u64,

        /// Last movement as Unix seconds
        #[arg(long)]
        last_movement_at: Option<u64>,

        /// Responsible staff member
        #[arg(short, long)]
        responsible: Option<String>,

        /// Documents are still pending
        #[arg(long)]
        documents_pending: bool,
    },

    /// List open records with their current tier
    List,

    /// Recompute tier, tags and alerts of one record
    Show {
        /// Record ID
        id: RecordId,
    },

    /// Register activity on a record (resets its aging)
    Touch {
        /// Record ID
        id: RecordId,

        /// Staff member who acted
        #[arg(short, long)]
        actor: Option<String>,

        /// Activity time as Unix seconds (default: now)
        #[arg(long)]
        at: Option<u64>,
    },

    /// Change the workflow status
    Status {
        /// Record ID
        id: RecordId,

        /// New status
        status: String,
    },

    /// Attach a manual tag
    Tag {
        /// Record ID
        id: RecordId,

        /// Tag code
        code: String,

        /// Display label
        #[arg(short, long)]
        label: String,

        /// Display color
        #[arg(long, default_value = "#6b7280")]
        color: String,
    },

    /// Mark documents as pending or received
    Docs {
        /// Record ID
        id: RecordId,

        /// Documents were received
        #[arg(long)]
        received: bool,
    },
}

/// Arguments for the sweep command.
#[derive(Debug, Parser)]
pub struct SweepArgs {
    /// Evaluate and report without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Evaluate as of this Unix time instead of now
    #[arg(long)]
    pub at: Option<u64>,
}

/// Arguments for the watch command.
#[derive(Debug, Parser)]
pub struct WatchArgs {
    /// Minutes between sweeps (overrides the configuration)
    #[arg(short, long)]
    pub interval: Option<u64>,

    /// Stop after this many sweeps
    #[arg(long)]
    pub cycles: Option<usize>,

    /// Evaluate and report without writing anything
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for alert management.
#[derive(Debug, Parser)]
pub struct AlertsArgs {
    #[command(subcommand)]
    pub action: AlertAction,
}

/// Alert actions.
#[derive(Debug, Subcommand)]
pub enum AlertAction {
    /// List alerts, newest first
    List {
        /// Only alerts of this record
        #[arg(short, long)]
        record: Option<RecordId>,

        /// Filter by status
        #[arg(short, long, value_enum, default_value = "pending")]
        status: AlertStatusArg,

        /// Only alerts addressed to this staff member
        #[arg(short, long)]
        target: Option<String>,

        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Mark an alert as resolved
    Resolve {
        /// Alert ID
        id: AlertId,
    },
}

/// Arguments for the history command.
#[derive(Debug, Parser)]
pub struct HistoryArgs {
    /// Record ID
    pub id: RecordId,
}

/// Record kind argument.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum KindArg {
    /// Administrative protocol
    Protocol,
    /// Hospital record request
    #[value(alias = "bau")]
    HospitalRecordRequest,
}

/// Alert status filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum AlertStatusArg {
    /// Awaiting action
    Pending,
    /// Already handled
    Resolved,
    /// Every alert
    All,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}

impl From<KindArg> for RecordKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Protocol => RecordKind::Protocol,
            KindArg::HospitalRecordRequest => RecordKind::HospitalRecordRequest,
        }
    }
}

impl AlertStatusArg {
    /// Status to filter on; `None` for every alert
    pub fn to_status(self) -> Option<AlertStatus> {
        match self {
            AlertStatusArg::Pending => Some(AlertStatus::Pending),
            AlertStatusArg::Resolved => Some(AlertStatus::Resolved),
            AlertStatusArg::All => None,
        }
    }
}
