pub mod core;

pub use crate::core::error::{LauncherError, LauncherResult};
pub use crate::core::state::AppState;

use tracing_subscriber::EnvFilter;

/// Structured logging to stderr, `RUST_LOG` overriding the default filter.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,blocklaunch=debug")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}
