//! Per-instrument trading constraints
//!
//! Exchange-agnostic view of the rules an order must satisfy before the
//! exchange will accept it. Venue modules build these from their own
//! metadata; the quantizer only ever sees this type.

use perpdesk_core::prelude::*;
use rust_decimal_macros::dec;

/// Allowed price range relative to the mark price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBand {
    pub multiplier_down: Decimal,
    pub multiplier_up: Decimal,
}

impl PriceBand {
    pub fn bounds(&self, mark_price: Decimal) -> (Decimal, Decimal) {
        (
            mark_price.saturating_mul(self.multiplier_down),
            mark_price.saturating_mul(self.multiplier_up),
        )
    }

    pub fn contains(&self, price: Decimal, mark_price: Decimal) -> bool {
        let (low, high) = self.bounds(mark_price);
        price >= low && price <= high
    }
}

/// Trading constraints for one instrument.
///
/// A zero `step_size`, `tick_size`, `min_price` or `min_notional` means the
/// constraint is not enforced. `max_qty` and `max_price` are
/// [`Decimal::MAX`] when the exchange publishes no upper limit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentFilters {
    pub symbol: String,
    pub min_qty: Decimal,
    pub max_qty: Decimal,
    pub step_size: Decimal,
    pub tick_size: Decimal,
    pub min_price: Decimal,
    pub max_price: Decimal,
    pub min_notional: Decimal,
    pub price_band: Option<PriceBand>,
}

impl InstrumentFilters {
    /// Conservative constraints used when the exchange's rules for a
    /// symbol are unknown.
    pub fn defaults(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            min_qty: dec!(0.001),
            max_qty: Decimal::MAX,
            step_size: dec!(0.001),
            tick_size: dec!(0.0001),
            min_price: Decimal::ZERO,
            max_price: Decimal::MAX,
            min_notional: dec!(5),
            price_band: None,
        }
    }

    /// Fractional digits allowed in a quantity
    pub fn quantity_precision(&self) -> u32 {
        precision_of(self.step_size)
    }

    /// Fractional digits allowed in a price
    pub fn price_precision(&self) -> u32 {
        precision_of(self.tick_size)
    }
}
