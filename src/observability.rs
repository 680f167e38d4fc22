//! Logging setup for heapcap.
//!
//! Logs always go to stderr so the wrapped runtime owns stdout. The default
//! filter is `warn`, which keeps a normal launch silent; set
//! `RUST_LOG=heapcap=debug` to see why a limit was or was not detected.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "warn";

/// Initialize structured logging (`RUST_LOG` filter, JSON when
/// `HEAPCAP_LOG_JSON=1`).
pub fn init_observability() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let is_json = std::env::var("HEAPCAP_LOG_JSON").ok().as_deref() == Some("1");

    if is_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .try_init()?;
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init()?;
    }

    tracing::debug!("heapcap observability initialized");
    Ok(())
}
