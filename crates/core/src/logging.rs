//! Unified logging integration
//!
//! One `tracing` subscriber for every crate in the workspace. `RUST_LOG`
//! wins when set; otherwise the caller's default directive applies (the CLI
//! passes `warn` so its tables are not interleaved with request chatter).

use std::sync::Once;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

static INIT: Once = Once::new();

/// Initialize the global tracing subscriber. Safe to call more than once.
pub fn init_logging(default_directive: &str) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directive));

        let installed = tracing_subscriber::registry()
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .with(filter)
            .try_init();

        if installed.is_ok() {
            tracing::debug!("📝 Logging initialized");
        }
    });
}

/// Log an order lifecycle event
#[macro_export]
macro_rules! log_order {
    ($action:expr, $symbol:expr, $side:expr, $quantity:expr, $price:expr) => {
        tracing::info!("📋 ORDER {}: {} {} {} @ {}", $action, $side, $quantity, $symbol, $price);
    };
}

/// Log a failed operation
#[macro_export]
macro_rules! log_error {
    ($operation:expr, $error:expr) => {
        tracing::error!("❌ {} failed: {}", $operation, $error);
    };
}
