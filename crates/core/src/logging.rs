//! Tracing setup shared by frontends.
//!
//! Events go to stderr so JSON written to stdout stays machine-readable.

use std::sync::Once;

use tracing::debug;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `verbose` picks `debug` over `warn`.
/// Subsequent calls are ignored.
pub fn init_tracing(verbose: bool) {
    INIT.call_once(|| {
        let default_level = if verbose { "debug" } else { "warn" };
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

        let fmt_layer = fmt::layer().with_writer(std::io::stderr).with_target(verbose);

        // Another subscriber may already be installed by an embedding host.
        let _ = tracing_subscriber::registry().with(env_filter).with(fmt_layer).try_init();

        debug!("clip-rename tracing initialized");
    });
}
