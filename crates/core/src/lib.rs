//! # perpdesk core
//!
//! Shared primitives for the perpdesk futures client.
//!
//! ## Building blocks
//!
//! 1. **Single-threaded async with monoio** - one runtime, one request in flight
//! 2. **Millisecond request timestamps** - the clock the exchange signs against
//! 3. **Exact decimals** - step/tick rounding without floating point drift
//! 4. **Unified logging** - tracing with an env-driven filter

pub mod runtime;
pub mod timing;
pub mod decimal;
pub mod logging;

// Re-export commonly used items
pub use runtime::{SessionRuntime, run_session};
pub use timing::{nanos, timestamp_ms, PerfTimer, Timestamp};
pub use decimal::{DecimalError, precision_of, round_to_increment, quantize_to_increment};
pub use logging::init_logging;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::runtime::{SessionRuntime, RuntimeConfig, run_session};
    pub use crate::timing::{nanos, timestamp_ms, PerfTimer, Timestamp};
    pub use crate::decimal::{
        DecimalError, format_grouped, is_multiple_of, parse_decimal, precision_of,
        quantize_to_increment, round_to_increment,
    };
    pub use crate::logging::init_logging;

    // Common external types
    pub use monoio;
    pub use rust_decimal::Decimal;
    pub use serde::{Deserialize, Serialize};
    pub use chrono::{DateTime, Utc};
}
