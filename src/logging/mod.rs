//! Tracing setup.

use tracing_subscriber::EnvFilter;

/// Initialize the global subscriber. `filter` follows `RUST_LOG` syntax
/// and acts as the fallback when `RUST_LOG` itself is unset.
pub fn init(filter: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();
}
