//! Structured logging initialization.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global tracing subscriber.
///
/// Level defaults to `mesh_ingress=debug` and can be overridden with
/// `RUST_LOG`. Call once from the launcher; library users install their own.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mesh_ingress=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
