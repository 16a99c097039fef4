//! Tracing initialization for the binary.

use std::io;
use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Environment variable holding the log filter, e.g.
/// `HEAT_REJECTION_LOG=heat_rejection::rejection=debug`.
pub const LOG_ENV: &str = "HEAT_REJECTION_LOG";

static INIT: Once = Once::new();

/// Installs a stderr subscriber filtered by [`LOG_ENV`].
///
/// Falls back to `heat_rejection=info` when the variable is unset or invalid.
/// Calling it again has no effect.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV)
            .unwrap_or_else(|_| EnvFilter::new("heat_rejection=info"));

        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(io::stderr).with_target(true))
            .with(filter)
            .init();
    });
}
