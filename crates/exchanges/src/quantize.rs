//! Order quantization and validation
//!
//! Turns an [`OrderRequest`] into a [`QuantizedOrder`] the exchange will
//! accept, or explains why it cannot. Checks run in a fixed order because
//! later steps assume earlier ones passed:
//!
//! 1. notional of the raw order against `min_notional`
//! 2. LIMIT price against the percent-price band around the mark price
//! 3. quantity clamped to `[min_qty, max_qty]` and rounded to `step_size`
//! 4. LIMIT price rounded to `tick_size` and checked against the price range
//!
//! Rounding can pull a quantity below the notional floor, so the rounded
//! order is checked once more before it is returned.

use crate::errors::{ExchangeError, Result};
use crate::filters::InstrumentFilters;
use crate::types::{OrderRequest, OrderType, QuantizedOrder};
use perpdesk_core::prelude::*;
use tracing::debug;

pub const BELOW_MIN_NOTIONAL: &str = "below minimum notional";
pub const PRICE_OUT_OF_BAND: &str = "price out of band";
pub const PRICE_OUT_OF_RANGE: &str = "price out of range";
pub const ORDER_VALUE_OVERFLOW: &str = "order value overflows";

/// `quantity * price`, or a validation error when it does not fit.
pub fn order_value(quantity: Decimal, price: Decimal) -> Result<Decimal> {
    quantity
        .checked_mul(price)
        .ok_or_else(|| ExchangeError::validation(ORDER_VALUE_OVERFLOW))
}

/// Validate `request` against `filters` and round it to the instrument's
/// increments. Absent filters fall back to [`InstrumentFilters::defaults`].
pub fn validate_and_quantize(
    filters: Option<&InstrumentFilters>,
    request: &OrderRequest,
    mark_price: Decimal,
) -> Result<QuantizedOrder> {
    let defaults;
    let filters = match filters {
        Some(filters) => filters,
        None => {
            defaults = InstrumentFilters::defaults(&request.symbol);
            &defaults
        }
    };

    if request.quantity <= Decimal::ZERO {
        return Err(ExchangeError::validation(format!(
            "quantity must be positive, got {}",
            request.quantity
        )));
    }

    let raw_price = match (request.order_type, request.price) {
        (OrderType::Limit, None) => {
            return Err(ExchangeError::validation("limit order requires a price"));
        }
        (_, Some(price)) if price <= Decimal::ZERO => {
            return Err(ExchangeError::validation(format!(
                "price must be positive, got {price}"
            )));
        }
        (_, price) => price,
    };

    let effective_price = raw_price.unwrap_or(mark_price);
    if order_value(request.quantity, effective_price)? < filters.min_notional {
        return Err(ExchangeError::validation(BELOW_MIN_NOTIONAL));
    }

    if request.order_type == OrderType::Limit {
        if let (Some(band), Some(price)) = (filters.price_band, raw_price) {
            if !band.contains(price, mark_price) {
                let (low, high) = band.bounds(mark_price);
                debug!("{} price {} outside [{}, {}]", request.symbol, price, low, high);
                return Err(ExchangeError::validation(PRICE_OUT_OF_BAND));
            }
        }
    }

    let quantity = format_quantity(filters, request.quantity);

    let price = match (request.order_type, raw_price) {
        (OrderType::Limit, Some(price)) => Some(format_price(filters, price)?),
        _ => None,
    };

    if order_value(quantity, price.unwrap_or(mark_price))? < filters.min_notional {
        return Err(ExchangeError::validation(BELOW_MIN_NOTIONAL));
    }

    Ok(QuantizedOrder {
        symbol: request.symbol.clone(),
        side: request.side,
        order_type: request.order_type,
        quantity,
        price,
        reduce_only: request.reduce_only,
        quantity_precision: filters.quantity_precision(),
        price_precision: filters.price_precision(),
    })
}

/// Clamp to the quantity bounds and round to the step.
///
/// Bounds need not be step multiples; a result rounded past a bound is
/// moved one step back inside it.
pub fn format_quantity(filters: &InstrumentFilters, quantity: Decimal) -> Decimal {
    let step = filters.step_size;
    let clamped = quantity.max(filters.min_qty).min(filters.max_qty);
    let rounded = quantize_to_increment(clamped, step);

    if step <= Decimal::ZERO {
        rounded
    } else if rounded < filters.min_qty {
        rounded + step
    } else if rounded > filters.max_qty {
        rounded - step
    } else {
        rounded
    }
}

/// Round a price to the tick and check it against the instrument's
/// price range.
pub fn format_price(filters: &InstrumentFilters, price: Decimal) -> Result<Decimal> {
    let rounded = quantize_to_increment(price, filters.tick_size);

    let below = filters.min_price > Decimal::ZERO && rounded < filters.min_price;
    let above = filters.max_price > Decimal::ZERO && rounded > filters.max_price;
    if below || above {
        return Err(ExchangeError::validation(PRICE_OUT_OF_RANGE));
    }

    Ok(rounded)
}
