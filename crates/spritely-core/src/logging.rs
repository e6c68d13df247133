//! Logging setup on top of `tracing-subscriber`.

use tracing_subscriber::EnvFilter;

/// Directives used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info,wgpu_core=warn,wgpu_hal=warn,naga=warn";

/// Install the global fmt subscriber, honoring `RUST_LOG` when set.
pub fn init() {
    init_with_filter(DEFAULT_FILTER);
}

/// Install the global fmt subscriber with `fallback` directives.
///
/// `RUST_LOG` still takes precedence. Calling this more than once is a no-op.
pub fn init_with_filter(fallback: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_err()
    {
        tracing::debug!("global subscriber already installed");
    }
}
