use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

/// Initialize structured logging. JSON output so runs can be correlated
/// and grepped in CI logs. `RUST_LOG` wins over the configured level.
pub fn init_telemetry(log_level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(log_level))?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true),
        )
        .with(filter)
        .init();

    tracing::debug!("telemetry initialized with structured logging");
    Ok(())
}

/// Generate a correlation ID for linking related operations
pub fn generate_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Create the span wrapping one release run.
pub fn release_run_span(release_tag: Option<&str>, correlation_id: &str) -> tracing::Span {
    tracing::info_span!(
        "release_run",
        release.tag = release_tag,
        correlation.id = correlation_id,
    )
}
