use std::sync::Once;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Installs the process-wide `tracing` subscriber.
///
/// Safe to call any number of times; only the first call has an effect. The
/// filter comes from `RUST_LOG` and falls back to `info`. If the host
/// application already installed a subscriber, that one is kept.
pub fn initialize() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info"));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init();
    });
}
