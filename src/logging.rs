//! Logging setup for the binary and for embedding applications
//!
//! `RUST_LOG` selects levels (default `info`); `LEDPULSE_LOG_JSON=1`
//! switches to JSON lines.

use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_JSON_ENV: &str = "LEDPULSE_LOG_JSON";

pub fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let use_json = std::env::var(LOG_JSON_ENV)
        .map(|value| value == "1")
        .unwrap_or(false);

    // try_init: a subscriber may already be installed by the host application
    if use_json {
        let _ = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .json()
            .with_writer(std::io::stderr)
            .try_init();
    } else {
        let _ = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .compact()
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
    }
}
