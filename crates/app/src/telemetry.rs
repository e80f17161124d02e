use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

static INIT: Once = Once::new();

/// Install the global subscriber.
///
/// `TUTOR_LOG` takes an `EnvFilter` directive (default `info`);
/// `TUTOR_LOG_JSON=1` switches to JSON lines. Later calls are no-ops.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_env("TUTOR_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
        let json = std::env::var("TUTOR_LOG_JSON").is_ok_and(|v| v == "1" || v == "true");

        let registry = tracing_subscriber::registry().with(filter);
        if json {
            registry.with(fmt::layer().json().with_target(true)).init();
        } else {
            registry.with(fmt::layer().with_target(true)).init();
        }
    });
}
