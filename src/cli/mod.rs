use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::entities::{ControlCategory, EntityId, FacilityStatus, OrderStatus, TaskStatus};

pub mod commands;

#[derive(Parser)]
#[command(name = "fireops")]
#[command(about = "Fire-safety operations: facility rollup, order closing and customer deactivation")]
#[command(long_about = "fireops runs the multi-record workflows of the operations console against a \
                       JSON snapshot (or SQLite when configured). Every write is reported step by step; \
                       partially applied workflows exit non-zero with the full report.")]
pub struct Cli {
    /// Snapshot file to operate on
    #[arg(long, global = true, help = "Snapshot file (default: store.snapshot_path from config)")]
    pub data: Option<PathBuf>,

    /// Operator recorded on writes
    #[arg(long, global = true, help = "Operator name (default: workflows.default_operator from config)")]
    pub operator: Option<String>,

    /// Emit JSON log lines on stderr
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create an empty snapshot
    Init {
        /// Overwrite an existing snapshot
        #[arg(long)]
        force: bool,
        /// Also write the effective configuration to fireops.toml
        #[arg(long)]
        write_config: bool,
    },
    /// Facility completion flags, status and owner
    #[command(subcommand)]
    Facility(FacilityCommands),
    /// Order status and the completion protocol
    #[command(subcommand)]
    Order(OrderCommands),
    /// Task status (settles orders when an invoice task is done)
    #[command(subcommand)]
    Task(TaskCommands),
    /// Customer deactivation
    #[command(subcommand)]
    Customer(CustomerCommands),
}

#[derive(Subcommand)]
pub enum FacilityCommands {
    /// Mark a control category complete (or incomplete)
    Flag {
        facility: EntityId,
        category: ControlCategory,
        #[arg(long, help = "Clear the flag instead of setting it")]
        incomplete: bool,
    },
    /// Show "N of M categories complete" and the stored status
    Summary { facility: EntityId },
    /// Set the stored facility status
    Status {
        facility: EntityId,
        status: FacilityStatus,
    },
    /// Replace the subscribed control categories
    Categories {
        facility: EntityId,
        #[arg(required = true, num_args = 1..)]
        categories: Vec<ControlCategory>,
    },
    /// Change (or clear) the owning customer
    Reassign {
        facility: EntityId,
        #[arg(long, help = "New owner; omit to leave the facility without customer")]
        customer: Option<EntityId>,
        #[arg(long, help = "Hide the previous customer if it is left without dependents")]
        remove_orphan: bool,
    },
}

#[derive(Subcommand)]
pub enum OrderCommands {
    /// Edit the order status (cannot set invoiced)
    Status { order: EntityId, status: OrderStatus },
    /// Close the order, filing an invoice task unless already invoiced
    Complete {
        order: EntityId,
        #[arg(long, conflicts_with = "technician", help = "Billed outside fireops; no invoice task")]
        already_invoiced: bool,
        #[arg(long, help = "Technician assigned to the invoice task")]
        technician: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum TaskCommands {
    /// Set the task status
    Status { task: EntityId, status: TaskStatus },
}

#[derive(Subcommand)]
pub enum CustomerCommands {
    /// Show what a deactivation would touch
    Preview { customer: EntityId },
    /// Hide the customer and apply the chosen dispositions
    Deactivate(DeactivateArgs),
    /// Hide a customer that has no facilities, active orders or active tasks left
    Remove { customer: EntityId },
}

#[derive(Args)]
pub struct DeactivateArgs {
    pub customer: EntityId,
    #[arg(long, value_enum)]
    pub facilities: FacilityChoice,
    #[arg(long, help = "Destination customer when --facilities move")]
    pub move_to: Option<EntityId>,
    #[arg(long, value_enum, default_value_t = DispositionChoice::Leave)]
    pub orders: DispositionChoice,
    #[arg(long, value_enum, default_value_t = DispositionChoice::Leave)]
    pub tasks: DispositionChoice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FacilityChoice {
    Keep,
    Unlink,
    Move,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DispositionChoice {
    Leave,
    Complete,
}
