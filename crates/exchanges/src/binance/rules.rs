//! Exchange rule cache
//!
//! Per-symbol trading constraints indexed from `exchangeInfo`. Loaded once
//! per session; a failed load leaves the cache empty and marked
//! [`RuleCacheStatus::Degraded`], so orders fall back to the conservative
//! defaults instead of the process failing to start.

use crate::binance::rest::FuturesRestClient;
use crate::binance::types::{ExchangeInfo, SymbolFilter, SymbolInfo};
use crate::errors::Result;
use crate::filters::{InstrumentFilters, PriceBand};
use crate::traits::HttpTransport;
use perpdesk_core::prelude::*;

use std::collections::HashMap;
use tracing::{info, warn};

/// Symbols listed first when offering pairs to trade
pub const PREFERRED_SYMBOLS: [&str; 10] = [
    "BTCUSDT", "ETHUSDT", "BNBUSDT", "XRPUSDT", "DOGEUSDT", "ADAUSDT", "SOLUSDT", "MATICUSDT",
    "DOTUSDT", "LTCUSDT",
];

impl From<&SymbolInfo> for InstrumentFilters {
    fn from(info: &SymbolInfo) -> Self {
        let mut filters = InstrumentFilters::defaults(&info.symbol);
        // Published filters replace the defaults; a missing filter leaves
        // that constraint unenforced, except the notional floor.
        filters.min_qty = Decimal::ZERO;
        filters.step_size = Decimal::ZERO;
        filters.tick_size = Decimal::ZERO;

        for filter in &info.filters {
            match filter {
                SymbolFilter::Price { min_price, max_price, tick_size } => {
                    filters.min_price = *min_price;
                    filters.max_price = unbounded_if_zero(*max_price);
                    filters.tick_size = *tick_size;
                }
                SymbolFilter::LotSize { min_qty, max_qty, step_size } => {
                    filters.min_qty = *min_qty;
                    filters.max_qty = unbounded_if_zero(*max_qty);
                    filters.step_size = *step_size;
                }
                SymbolFilter::MinNotional { notional } => {
                    filters.min_notional = *notional;
                }
                SymbolFilter::PercentPrice { multiplier_up, multiplier_down } => {
                    filters.price_band = Some(PriceBand {
                        multiplier_down: *multiplier_down,
                        multiplier_up: *multiplier_up,
                    });
                }
                SymbolFilter::Other => {}
            }
        }

        filters
    }
}

fn unbounded_if_zero(value: Decimal) -> Decimal {
    if value.is_zero() { Decimal::MAX } else { value }
}

/// Whether the cache holds live exchange rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleCacheStatus {
    Loaded,
    Degraded { reason: String },
}

/// Mark price plus the effective constraints for one symbol
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolSnapshot {
    pub symbol: String,
    pub mark_price: Decimal,
    pub min_qty: Decimal,
    pub step_size: Decimal,
    pub min_notional: Decimal,
    pub price_precision: u32,
    pub quantity_precision: u32,
}

/// Instrument rules keyed by exchange symbol
#[derive(Debug, Clone)]
pub struct RuleCache {
    filters: HashMap<String, InstrumentFilters>,
    tradable: Vec<String>,
    status: RuleCacheStatus,
}

impl RuleCache {
    /// Fetch exchange info and index it. Never fails; see [`Self::status`].
    pub async fn load<T: HttpTransport>(client: &FuturesRestClient<T>) -> Self {
        match client.exchange_info().await {
            Ok(info) => Self::from_exchange_info(&info),
            Err(e) => {
                warn!("⚠️ Failed to load exchange rules, using defaults: {}", e);
                Self::degraded(e.to_string())
            }
        }
    }

    pub fn from_exchange_info(info: &ExchangeInfo) -> Self {
        let filters: HashMap<String, InstrumentFilters> = info
            .symbols
            .iter()
            .map(|symbol| (symbol.symbol.clone(), InstrumentFilters::from(symbol)))
            .collect();
        let tradable = info
            .symbols
            .iter()
            .filter(|symbol| symbol.is_trading())
            .map(|symbol| symbol.symbol.clone())
            .collect();

        info!("📚 Loaded trading rules for {} symbols", filters.len());

        Self {
            filters,
            tradable,
            status: RuleCacheStatus::Loaded,
        }
    }

    pub fn degraded(reason: impl Into<String>) -> Self {
        Self {
            filters: HashMap::new(),
            tradable: Vec::new(),
            status: RuleCacheStatus::Degraded {
                reason: reason.into(),
            },
        }
    }

    /// Reload from the exchange. The current rules are kept on failure.
    pub async fn refresh<T: HttpTransport>(&mut self, client: &FuturesRestClient<T>) -> Result<()> {
        let info = client.exchange_info().await?;
        *self = Self::from_exchange_info(&info);
        Ok(())
    }

    pub fn status(&self) -> &RuleCacheStatus {
        &self.status
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self.status, RuleCacheStatus::Degraded { .. })
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Case-sensitive lookup
    pub fn filters_for(&self, symbol: &str) -> Option<&InstrumentFilters> {
        self.filters.get(symbol)
    }

    /// Trading symbols, preferred ones first in their fixed order, the
    /// rest sorted. Without loaded rules, the preferred list itself.
    pub fn tradable_symbols(&self) -> Vec<String> {
        if self.tradable.is_empty() {
            return PREFERRED_SYMBOLS.iter().map(|s| s.to_string()).collect();
        }

        let mut ordered: Vec<String> = PREFERRED_SYMBOLS
            .iter()
            .filter(|preferred| self.tradable.iter().any(|s| s == *preferred))
            .map(|s| s.to_string())
            .collect();

        let mut rest: Vec<String> = self
            .tradable
            .iter()
            .filter(|s| !PREFERRED_SYMBOLS.contains(&s.as_str()))
            .cloned()
            .collect();
        rest.sort();
        rest.dedup();

        ordered.extend(rest);
        ordered
    }

    /// Effective constraints for `symbol` at `mark_price`
    pub fn symbol_info(&self, symbol: &str, mark_price: Decimal) -> SymbolSnapshot {
        let defaults;
        let filters = match self.filters_for(symbol) {
            Some(filters) => filters,
            None => {
                defaults = InstrumentFilters::defaults(symbol);
                &defaults
            }
        };

        SymbolSnapshot {
            symbol: symbol.to_string(),
            mark_price,
            min_qty: filters.min_qty,
            step_size: filters.step_size,
            min_notional: filters.min_notional,
            price_precision: filters.price_precision(),
            quantity_precision: filters.quantity_precision(),
        }
    }
}
