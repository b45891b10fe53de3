//! # perpdesk exchange integration
//!
//! Binance USDT-M futures over monoio: signed REST requests, per-symbol
//! trading rules, and the quantizer that makes an order acceptable before
//! it is sent.
//!
//! ## Architecture
//!
//! - **monoio-based HTTPS transport** behind the [`HttpTransport`] trait
//! - **HMAC-SHA256 signer** over the exact query string sent
//! - **Rule cache** with an explicit degraded state when rules are missing
//! - **Exact decimals** for every step, tick and notional comparison

pub mod binance;
pub mod errors;
pub mod filters;
pub mod http;
pub mod quantize;
pub mod traits;
pub mod types;

// Re-export main types
pub use errors::{ErrorKind, ExchangeError, Result};
pub use filters::{InstrumentFilters, PriceBand};
pub use http::{HttpRequest, HttpResponse, Method, MonoioHttpsClient};
pub use quantize::{format_price, format_quantity, validate_and_quantize};
pub use traits::HttpTransport;
pub use types::*;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::binance::{
        AccountSummary, Credentials, FuturesConfig, FuturesRestClient, OrderOutcome,
        PositionView, RuleCache, RuleCacheStatus, SymbolSnapshot, TradingSession,
    };
    pub use crate::errors::{ErrorKind, ExchangeError, Result};
    pub use crate::filters::{InstrumentFilters, PriceBand};
    pub use crate::http::MonoioHttpsClient;
    pub use crate::quantize::{format_price, format_quantity, validate_and_quantize};
    pub use crate::traits::HttpTransport;
    pub use crate::types::*;
    pub use perpdesk_core::prelude::*;
}
