use anyhow::Result;
use clap::Parser;

use fireops::cli::commands::customer::CustomerCommand;
use fireops::cli::commands::facility::FacilityCommand;
use fireops::cli::commands::init::InitCommand;
use fireops::cli::commands::order::OrderCommand;
use fireops::cli::commands::task::TaskCommand;
use fireops::cli::commands::with_repository;
use fireops::cli::{Cli, Commands};
use fireops::{config, init_telemetry, OperatorContext};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config()?;

    init_telemetry(
        cli.json_logs || config.observability.json_logs,
        &config.observability.log_level,
    )?;

    let data = cli
        .data
        .clone()
        .unwrap_or_else(|| config.store.snapshot_path.clone());
    let operator = cli
        .operator
        .clone()
        .unwrap_or_else(|| config.workflows.default_operator.clone());
    let ctx = OperatorContext::new(operator);
    let invoice = config.workflows.invoice_settings();

    tokio::runtime::Runtime::new()?.block_on(async move {
        match &cli.command {
            Commands::Init {
                force,
                write_config,
            } => {
                InitCommand {
                    data,
                    force: *force,
                    write_config: *write_config,
                }
                .execute(config)
                .await
            }
            Commands::Facility(command) => {
                with_repository(config, &data, |repo| async move {
                    FacilityCommand { command }.execute(repo, &ctx).await
                })
                .await
            }
            Commands::Order(command) => {
                with_repository(config, &data, |repo| async move {
                    OrderCommand { command, invoice }.execute(repo, &ctx).await
                })
                .await
            }
            Commands::Task(command) => {
                with_repository(config, &data, |repo| async move {
                    TaskCommand { command, invoice }.execute(repo, &ctx).await
                })
                .await
            }
            Commands::Customer(command) => {
                with_repository(config, &data, |repo| async move {
                    CustomerCommand { command }.execute(repo, &ctx).await
                })
                .await
            }
        }
    })
}
