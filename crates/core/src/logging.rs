//! Tracing subscriber setup shared by frontends.
//!
//! Output goes to stderr so JSON models written to stdout stay parseable.
//! Filtering follows `RUST_LOG`, defaulting to `info`.

use std::sync::Once;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install a human-readable subscriber. Later calls are ignored.
pub fn init_tracing() {
    INIT.call_once(|| {
        let fmt_layer = fmt::layer().with_writer(std::io::stderr).with_target(true);
        let _ = tracing_subscriber::registry().with(env_filter()).with(fmt_layer).try_init();
    });
}

/// Install a JSON subscriber. Later calls are ignored.
pub fn init_tracing_json() {
    INIT.call_once(|| {
        let fmt_layer = fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_current_span(true);
        let _ = tracing_subscriber::registry().with(env_filter()).with(fmt_layer).try_init();
    });
}
