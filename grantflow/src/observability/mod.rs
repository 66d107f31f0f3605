//! Tracing setup.
//!
//! The pipeline itself only emits `tracing` events and spans; binaries
//! call [`init_tracing`] once at startup to install a subscriber.

use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber.
///
/// The filter comes from `RUST_LOG` when set, otherwise defaults to
/// `info` for this crate. Fails if a subscriber is already installed.
pub fn init_tracing() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("grantflow=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to install tracing subscriber: {err}"))
}

/// Best-effort tracing for tests: routes output through the test
/// harness and ignores double initialization.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("grantflow=debug"))
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_test_init_is_harmless() {
        init_test_tracing();
        init_test_tracing();
    }
}
