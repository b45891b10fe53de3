//! Binance USDT-M futures integration
//!
//! Signed REST client over the monoio HTTPS transport, the per-symbol rule
//! cache built from `exchangeInfo`, and the order session that chains
//! mark price, validation, quantization and submission.

pub mod account;
pub mod auth;
pub mod rest;
pub mod rules;
pub mod session;
pub mod types;

pub use account::{AccountSummary, PositionSide, PositionView, roi_percent};
pub use auth::{Credentials, SignedRequest, Signer, build_query_string, sign};
pub use rest::{FuturesConfig, FuturesRestClient, MAINNET_URL, TESTNET_URL};
pub use rules::{PREFERRED_SYMBOLS, RuleCache, RuleCacheStatus, SymbolSnapshot};
pub use session::{
    LEVERAGE_RANGE, OrderOutcome, PlacedOrder, TEST_ORDER_LEVERAGE, TradingSession,
};
pub use types::*;

use crate::errors::Result;
use crate::http::MonoioHttpsClient;
use tracing::info;

/// Open a session against the live exchange over HTTPS
pub async fn connect(
    config: FuturesConfig,
    credentials: Credentials,
) -> Result<TradingSession<MonoioHttpsClient>> {
    info!("🚀 Connecting to Binance futures {}", config.network_name());
    let client = FuturesRestClient::new(config, Some(credentials))?;
    let session = TradingSession::open(client).await;

    if let RuleCacheStatus::Degraded { reason } = session.rules().status() {
        info!("   Trading rules unavailable ({}), using defaults", reason);
    } else {
        info!("✅ Loaded rules for {} symbols", session.rules().len());
    }

    Ok(session)
}
