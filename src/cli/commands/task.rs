use anyhow::Result;

use crate::cli::TaskCommands;
use crate::entities::OperatorContext;
use crate::orders::{InvoiceSettings, OrderLifecycleEngine};
use crate::store::Repository;

use super::print_report;

pub struct TaskCommand<'a> {
    pub command: &'a TaskCommands,
    pub invoice: InvoiceSettings,
}

impl TaskCommand<'_> {
    pub async fn execute(&self, repo: Repository, ctx: &OperatorContext) -> Result<()> {
        let engine = OrderLifecycleEngine::new(repo, self.invoice.clone());

        match self.command {
            TaskCommands::Status { task, status } => {
                let report = engine.set_task_status(ctx, task, *status).await?;
                print_report(&report);
            }
        }
        Ok(())
    }
}
