//! Order session
//!
//! Ties the REST client to the rule cache: every order goes mark price,
//! then validation and quantization, then the signed order endpoint.

use crate::binance::rest::FuturesRestClient;
use crate::binance::rules::RuleCache;
use crate::binance::types::{LeverageResponse, OrderResponse};
use crate::errors::{ExchangeError, Result};
use crate::quantize::validate_and_quantize;
use crate::traits::HttpTransport;
use crate::types::{OrderRequest, OrderSide, QuantizedOrder};
use perpdesk_core::prelude::*;

use rust_decimal_macros::dec;
use std::ops::RangeInclusive;
use tracing::{info, warn};

/// Leverage accepted by USDT-M futures
pub const LEVERAGE_RANGE: RangeInclusive<u32> = 1..=125;

/// Leverage applied before test orders
pub const TEST_ORDER_LEVERAGE: u32 = 20;

/// Offset from mark for the first limit attempt
pub const PRIMARY_OFFSET: Decimal = dec!(0.001);

/// Offset from mark for the single retry
pub const FALLBACK_OFFSET: Decimal = dec!(0.05);

/// Limit price `offset` away from mark on the side that fills: above for
/// buys, below for sells.
pub fn offset_price(mark_price: Decimal, side: OrderSide, offset: Decimal) -> Decimal {
    match side {
        OrderSide::Buy => mark_price * (Decimal::ONE + offset),
        OrderSide::Sell => mark_price * (Decimal::ONE - offset),
    }
}

/// An order the exchange accepted
#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub order: QuantizedOrder,
    pub response: OrderResponse,
    pub mark_price: Decimal,
}

/// Result of [`TradingSession::place_with_fallback`]
#[derive(Debug, Clone)]
pub struct OrderOutcome {
    pub placed: PlacedOrder,
    pub fallback_used: bool,
    /// Why the first attempt failed, when the fallback was used
    pub primary_error: Option<ExchangeError>,
}

/// REST client plus the rules loaded for it
pub struct TradingSession<T: HttpTransport> {
    client: FuturesRestClient<T>,
    rules: RuleCache,
}

impl<T: HttpTransport> TradingSession<T> {
    /// Load exchange rules and start a session. A failed rule load
    /// degrades the session instead of failing it.
    pub async fn open(client: FuturesRestClient<T>) -> Self {
        let rules = RuleCache::load(&client).await;
        Self { client, rules }
    }

    pub fn with_rules(client: FuturesRestClient<T>, rules: RuleCache) -> Self {
        Self { client, rules }
    }

    pub fn client(&self) -> &FuturesRestClient<T> {
        &self.client
    }

    pub fn rules(&self) -> &RuleCache {
        &self.rules
    }

    pub async fn refresh_rules(&mut self) -> Result<()> {
        self.rules.refresh(&self.client).await
    }

    /// Validate, quantize and submit `request` against the current mark.
    pub async fn place_order(&self, request: &OrderRequest) -> Result<PlacedOrder> {
        let mark_price = self.client.mark_price(&request.symbol).await?;
        self.submit(request, mark_price).await
    }

    async fn submit(&self, request: &OrderRequest, mark_price: Decimal) -> Result<PlacedOrder> {
        let order = validate_and_quantize(self.rules.filters_for(&request.symbol), request, mark_price)?;
        let response = self.client.new_order(&order).await?;

        perpdesk_core::log_order!(
            "ACCEPTED",
            response.symbol,
            order.side,
            response.orig_qty,
            response.status
        );

        Ok(PlacedOrder {
            order,
            response,
            mark_price,
        })
    }

    /// Place near the mark, retrying once as a limit order further away.
    ///
    /// The first attempt is a market order when `use_market`, otherwise a
    /// limit [`PRIMARY_OFFSET`] from mark. Any failure triggers one limit
    /// at [`FALLBACK_OFFSET`]; if that fails too its error is returned.
    pub async fn place_with_fallback(
        &self,
        symbol: &str,
        side: OrderSide,
        quantity: Decimal,
        use_market: bool,
    ) -> Result<OrderOutcome> {
        let mark_price = self.client.mark_price(symbol).await?;

        let primary = if use_market {
            OrderRequest::market(symbol, side, quantity)
        } else {
            OrderRequest::limit(symbol, side, quantity, offset_price(mark_price, side, PRIMARY_OFFSET))
        };

        let primary_error = match self.submit(&primary, mark_price).await {
            Ok(placed) => {
                return Ok(OrderOutcome {
                    placed,
                    fallback_used: false,
                    primary_error: None,
                });
            }
            Err(e) => e,
        };

        warn!(
            "⚠️ {} {} order failed ({}), retrying at {}% from mark",
            symbol,
            side,
            primary_error,
            FALLBACK_OFFSET * dec!(100)
        );

        let fallback = OrderRequest::limit(
            symbol,
            side,
            quantity,
            offset_price(mark_price, side, FALLBACK_OFFSET),
        );
        let placed = self.submit(&fallback, mark_price).await?;

        Ok(OrderOutcome {
            placed,
            fallback_used: true,
            primary_error: Some(primary_error),
        })
    }

    /// Set [`TEST_ORDER_LEVERAGE`], then place with fallback.
    pub async fn place_test_order(
        &self,
        symbol: &str,
        side: OrderSide,
        quantity: Decimal,
        use_market: bool,
    ) -> Result<OrderOutcome> {
        self.set_leverage(symbol, TEST_ORDER_LEVERAGE).await?;
        self.place_with_fallback(symbol, side, quantity, use_market).await
    }

    /// Change leverage; out-of-range values never reach the exchange.
    pub async fn set_leverage(&self, symbol: &str, leverage: u32) -> Result<LeverageResponse> {
        if !LEVERAGE_RANGE.contains(&leverage) {
            return Err(ExchangeError::validation(format!(
                "leverage must be between {} and {}, got {}",
                LEVERAGE_RANGE.start(),
                LEVERAGE_RANGE.end(),
                leverage
            )));
        }

        let response = self.client.change_leverage(symbol, leverage).await?;
        info!("⚙️ {} leverage set to {}x", symbol, response.leverage);
        Ok(response)
    }
}
