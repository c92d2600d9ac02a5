use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global tracing subscriber: stdout formatting plus an
/// env-filter seeded from `RUST_LOG` (falling back to the given directive).
///
/// Call once from the embedding service's entry point. Safe to call again;
/// later calls are no-ops.
pub fn init(default_directive: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_directive.into());

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
