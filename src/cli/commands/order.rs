use anyhow::Result;

use crate::cli::OrderCommands;
use crate::entities::{OperatorContext, Technician};
use crate::orders::{CompletionRequest, InvoiceSettings, Invoicing, OrderLifecycleEngine};
use crate::store::Repository;

use super::print_report;

pub struct OrderCommand<'a> {
    pub command: &'a OrderCommands,
    pub invoice: InvoiceSettings,
}

impl OrderCommand<'_> {
    pub async fn execute(&self, repo: Repository, ctx: &OperatorContext) -> Result<()> {
        let engine = OrderLifecycleEngine::new(repo, self.invoice.clone());

        match self.command {
            OrderCommands::Status { order, status } => {
                let updated = engine.edit_status(ctx, order, *status).await?;
                println!("✅ Order {} is now {}", updated.id, updated.status);
            }
            OrderCommands::Complete {
                order,
                already_invoiced,
                technician,
            } => {
                let invoicing = if *already_invoiced {
                    Invoicing::AlreadyInvoiced
                } else {
                    Invoicing::NotYetInvoiced {
                        technician: technician.as_deref().map(Technician::new),
                    }
                };
                let report = engine
                    .complete_order(
                        ctx,
                        CompletionRequest {
                            order: order.clone(),
                            invoicing,
                        },
                    )
                    .await?;
                print_report(&report);
            }
        }
        Ok(())
    }
}
