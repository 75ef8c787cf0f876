//! Logging set-up.
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install a global subscriber writing compact, single-line logs to stdout.
///
/// Verbosity is read from `RUST_LOG`, falling back to `default_directives` when unset
/// or invalid (e.g. `info` or `request_consumer=debug,lapin=warn`).
pub fn init_subscriber(default_directives: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false).compact())
        .init();
}
