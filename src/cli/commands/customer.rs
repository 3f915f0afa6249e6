use anyhow::Result;

use crate::cascade::{
    CustomerDeactivation, DeactivationPlan, FacilityDisposition, FacilityReassignment,
    OrderDisposition, TaskDisposition,
};
use crate::cli::{CustomerCommands, DeactivateArgs, DispositionChoice, FacilityChoice};
use crate::entities::OperatorContext;
use crate::store::Repository;

use super::print_report;

pub struct CustomerCommand<'a> {
    pub command: &'a CustomerCommands,
}

impl CustomerCommand<'_> {
    pub async fn execute(&self, repo: Repository, ctx: &OperatorContext) -> Result<()> {
        match self.command {
            CustomerCommands::Preview { customer } => {
                let deactivation = CustomerDeactivation::new(repo);
                let counts = deactivation.preview(customer).await?;
                println!("📋 Deactivating customer {} would touch:", customer);
                println!("{}", counts);

                let destinations = deactivation.move_destinations(customer).await?;
                if destinations.is_empty() {
                    println!("   No other customer can receive the facilities");
                } else {
                    println!("   Facilities can be moved to:");
                    for destination in destinations {
                        println!("     {}  {}", destination.id, destination.name);
                    }
                }
            }
            CustomerCommands::Deactivate(args) => {
                let plan = plan_from(args);
                let report = CustomerDeactivation::new(repo)
                    .deactivate(ctx, &args.customer, &plan)
                    .await?;
                print_report(&report);
            }
            CustomerCommands::Remove { customer } => {
                FacilityReassignment::new(repo)
                    .remove_orphaned_customer(ctx, customer)
                    .await?;
                println!("🗑️  Customer {} removed", customer);
            }
        }
        Ok(())
    }
}

fn plan_from(args: &DeactivateArgs) -> DeactivationPlan {
    let facilities = match args.facilities {
        FacilityChoice::Keep => FacilityDisposition::KeepLinked,
        FacilityChoice::Unlink => FacilityDisposition::Unlink,
        FacilityChoice::Move => FacilityDisposition::MoveTo(args.move_to.clone()),
    };
    DeactivationPlan {
        facilities,
        orders: match args.orders {
            DispositionChoice::Leave => OrderDisposition::LeaveUnchanged,
            DispositionChoice::Complete => OrderDisposition::ForceComplete,
        },
        tasks: match args.tasks {
            DispositionChoice::Leave => TaskDisposition::LeaveUnchanged,
            DispositionChoice::Complete => TaskDisposition::ForceComplete,
        },
    }
}
