use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use crate::entities::{EntityRef, OperatorContext};

/// Initialize structured logging.
///
/// `RUST_LOG` overrides `default_level`. JSON output carries the current span
/// so every line of a workflow invocation shows its correlation id.
pub fn init_telemetry(json: bool, default_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_level))?;

    if json {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_writer(std::io::stderr),
            )
            .with(filter)
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .with(filter)
            .try_init()?;
    }

    tracing::debug!(json, "fireops telemetry initialized");
    Ok(())
}

/// Generate a correlation ID for linking the writes of one workflow invocation
pub fn generate_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Span wrapping one workflow invocation
pub fn create_workflow_span(workflow: &str, subject: &EntityRef, ctx: &OperatorContext) -> tracing::Span {
    tracing::info_span!(
        "workflow",
        workflow = workflow,
        subject = %subject,
        operator = %ctx.operator,
        correlation.id = %ctx.correlation_id,
    )
}
