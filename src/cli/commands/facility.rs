use anyhow::Result;
use std::collections::BTreeSet;

use crate::cascade::FacilityReassignment;
use crate::cli::FacilityCommands;
use crate::entities::OperatorContext;
use crate::rollup::CompletionRollup;
use crate::store::Repository;

pub struct FacilityCommand<'a> {
    pub command: &'a FacilityCommands,
}

impl FacilityCommand<'_> {
    pub async fn execute(&self, repo: Repository, ctx: &OperatorContext) -> Result<()> {
        let rollup = CompletionRollup::new(repo.clone());

        match self.command {
            FacilityCommands::Flag {
                facility,
                category,
                incomplete,
            } => {
                let summary = rollup
                    .set_category_complete(ctx, facility, *category, !incomplete)
                    .await?;
                let state = if *incomplete { "incomplete" } else { "complete" };
                println!("✅ {} marked {} on facility {}", category, state, facility);
                println!("   {}", summary);
            }
            FacilityCommands::Summary { facility } => {
                let record = repo.facility(facility).await?;
                let summary = record.completion_summary();
                println!("🏢 {} ({})", record.name, record.id);
                println!("   {}", summary);
                println!("   Status: {}", record.operator_status);
                for (category, done) in record.subscribed_flags() {
                    println!("   {} {}", if done { "✅" } else { "⬜" }, category);
                }
                if summary.contradicts(record.operator_status) {
                    println!("⚠️  Stored status does not match the completion flags");
                }
            }
            FacilityCommands::Status { facility, status } => {
                let summary = rollup.set_operator_status(ctx, facility, *status).await?;
                println!("✅ Facility {} status set to {}", facility, status);
                if summary.contradicts(*status) {
                    println!("⚠️  {} but status is {}", summary, status);
                }
            }
            FacilityCommands::Categories {
                facility,
                categories,
            } => {
                let categories: BTreeSet<_> = categories.iter().copied().collect();
                let summary = rollup.set_subscriptions(ctx, facility, categories).await?;
                println!("✅ Facility {} subscriptions updated", facility);
                println!("   {}", summary);
            }
            FacilityCommands::Reassign {
                facility,
                customer,
                remove_orphan,
            } => {
                let reassignment = FacilityReassignment::new(repo);
                let outcome = reassignment.reassign(ctx, facility, customer.clone()).await?;
                match customer {
                    Some(customer) => println!("✅ Facility {} now belongs to {}", facility, customer),
                    None => println!("✅ Facility {} no longer has a customer", facility),
                }

                if let Some(orphan) = outcome.orphaned_customer {
                    if *remove_orphan {
                        reassignment.remove_orphaned_customer(ctx, &orphan).await?;
                        println!("🗑️  Customer {} had nothing left and was removed", orphan);
                    } else {
                        println!("💡 Customer {} has no facilities, orders or tasks left", orphan);
                        println!("   → Remove it: fireops customer remove {}", orphan);
                    }
                }
            }
        }
        Ok(())
    }
}
