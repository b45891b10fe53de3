//! Quantization and validation properties
//!
//! Parameterized cases for the filter checks plus property tests for the
//! rounding guarantees every accepted order relies on.

use perpdesk_core::prelude::*;
use perpdesk_exchanges::prelude::*;
use perpdesk_exchanges::quantize::{BELOW_MIN_NOTIONAL, PRICE_OUT_OF_BAND};
use proptest::prelude::*;
use rstest::*;
use rust_decimal_macros::dec;

const TOLERANCE: Decimal = dec!(0.00000001);

// ============================================================================
// FIXTURES
// ============================================================================

#[fixture]
fn btc_filters() -> InstrumentFilters {
    InstrumentFilters {
        symbol: "BTCUSDT".to_string(),
        min_qty: dec!(0.001),
        max_qty: Decimal::MAX,
        step_size: dec!(0.001),
        tick_size: dec!(0.01),
        min_price: Decimal::ZERO,
        max_price: Decimal::MAX,
        min_notional: dec!(5),
        price_band: None,
    }
}

#[fixture]
fn banded_filters() -> InstrumentFilters {
    InstrumentFilters {
        symbol: "TESTUSDT".to_string(),
        min_qty: dec!(0.1),
        max_qty: dec!(10000),
        step_size: dec!(0.1),
        tick_size: dec!(0.01),
        min_price: Decimal::ZERO,
        max_price: Decimal::MAX,
        min_notional: dec!(5),
        price_band: Some(PriceBand {
            multiplier_down: dec!(0.9),
            multiplier_up: dec!(1.1),
        }),
    }
}

fn validation_reason(err: ExchangeError) -> String {
    match err {
        ExchangeError::Validation { reason } => reason,
        other => panic!("expected a validation error, got {other:?}"),
    }
}

// ============================================================================
// FILTER CHECKS
// ============================================================================

#[cfg(test)]
mod filter_checks {
    use super::*;

    #[rstest]
    fn test_btc_end_to_end(btc_filters: InstrumentFilters) {
        let request = OrderRequest::limit("BTCUSDT", OrderSide::Buy, dec!(0.00137), dec!(50000.123));
        let order = validate_and_quantize(Some(&btc_filters), &request, dec!(50000)).unwrap();

        assert_eq!(order.quantity, dec!(0.001));
        assert_eq!(order.price, Some(dec!(50000.12)));
        assert_eq!(order.quantity_precision, 3);
        assert_eq!(order.price_precision, 2);
        assert_eq!(order.notional(dec!(50000)), dec!(50.00012));
        assert_eq!(order.time_in_force(), Some(TimeInForce::GoodTillCanceled));
    }

    #[rstest]
    #[case(dec!(1), false)]
    #[case(dec!(4.9), false)]
    #[case(dec!(5), true)]
    #[case(dec!(10), true)]
    fn test_min_notional(#[case] quantity: Decimal, #[case] accepted: bool) {
        let mut filters = InstrumentFilters::defaults("TESTUSDT");
        filters.step_size = dec!(0.1);
        filters.min_qty = dec!(0.1);

        let request = OrderRequest::limit("TESTUSDT", OrderSide::Buy, quantity, dec!(1));
        let result = validate_and_quantize(Some(&filters), &request, dec!(1));

        match result {
            Ok(order) => {
                assert!(accepted, "{quantity} x 1 should be rejected");
                assert_eq!(order.quantity, quantity);
            }
            Err(err) => {
                assert!(!accepted, "{quantity} x 1 should be accepted");
                assert_eq!(validation_reason(err), BELOW_MIN_NOTIONAL);
            }
        }
    }

    #[rstest]
    #[case(dec!(111), false)]
    #[case(dec!(110.01), false)]
    #[case(dec!(89.99), false)]
    #[case(dec!(105), true)]
    #[case(dec!(110), true)]
    #[case(dec!(90), true)]
    fn test_percent_price_band(
        banded_filters: InstrumentFilters,
        #[case] price: Decimal,
        #[case] accepted: bool,
    ) {
        let request = OrderRequest::limit("TESTUSDT", OrderSide::Sell, dec!(1), price);
        let result = validate_and_quantize(Some(&banded_filters), &request, dec!(100));

        if accepted {
            assert_eq!(result.unwrap().price, Some(price));
        } else {
            assert_eq!(validation_reason(result.unwrap_err()), PRICE_OUT_OF_BAND);
        }
    }

    #[rstest]
    fn test_market_orders_skip_band(banded_filters: InstrumentFilters) {
        let request = OrderRequest::market("TESTUSDT", OrderSide::Buy, dec!(1));
        let order = validate_and_quantize(Some(&banded_filters), &request, dec!(100)).unwrap();
        assert_eq!(order.price, None);
        assert_eq!(order.time_in_force(), None);
    }

    #[test]
    fn test_absent_filters_use_defaults() {
        let request = OrderRequest::market("NEWUSDT", OrderSide::Buy, dec!(0.0005));
        let order = validate_and_quantize(None, &request, dec!(50000)).unwrap();
        assert_eq!(order.quantity, dec!(0.001));
        assert_eq!(order.quantity_precision, 3);
    }

    #[rstest]
    #[case(dec!(0))]
    #[case(dec!(-1))]
    fn test_non_positive_quantity(btc_filters: InstrumentFilters, #[case] quantity: Decimal) {
        let request = OrderRequest::limit("BTCUSDT", OrderSide::Buy, quantity, dec!(50000));
        assert!(matches!(
            validate_and_quantize(Some(&btc_filters), &request, dec!(50000)),
            Err(ExchangeError::Validation { .. })
        ));
    }
}

// ============================================================================
// ROUNDING PROPERTIES
// ============================================================================

fn increment() -> impl Strategy<Value = Decimal> {
    prop_oneof![
        Just(dec!(1)),
        Just(dec!(0.1)),
        Just(dec!(0.01)),
        Just(dec!(0.001)),
        Just(dec!(0.00001)),
        Just(dec!(0.5)),
        Just(dec!(0.025)),
    ]
}

/// Positive decimals with up to 8 fractional digits
fn raw_value() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000_000_000i64).prop_map(|units| Decimal::new(units, 8))
}

proptest! {
    #[test]
    fn quantity_is_step_multiple_within_bounds(
        step in increment(),
        quantity in raw_value(),
        min_steps in 1i64..100,
        span_steps in 0i64..1_000_000,
    ) {
        let mut filters = InstrumentFilters::defaults("PROPUSDT");
        filters.step_size = step;
        filters.min_qty = step * Decimal::from(min_steps);
        filters.max_qty = filters.min_qty + step * Decimal::from(span_steps);

        let quantized = format_quantity(&filters, quantity);

        prop_assert!(is_multiple_of(quantized, step, TOLERANCE));
        prop_assert!(quantized >= filters.min_qty);
        prop_assert!(quantized <= filters.max_qty);
    }

    #[test]
    fn quantity_stays_inside_unaligned_bounds(
        step in increment(),
        quantity in raw_value(),
        min_steps in 0i64..100,
        min_offset in 1i64..100,
        span_steps in 1i64..1_000,
    ) {
        let mut filters = InstrumentFilters::defaults("PROPUSDT");
        filters.step_size = step;
        filters.min_qty = step * Decimal::from(min_steps) + step * Decimal::new(min_offset, 2);
        filters.max_qty = filters.min_qty + step * Decimal::from(span_steps);

        let quantized = format_quantity(&filters, quantity);

        prop_assert!(is_multiple_of(quantized, step, TOLERANCE));
        prop_assert!(quantized >= filters.min_qty);
        prop_assert!(quantized <= filters.max_qty);
    }

    #[test]
    fn price_is_tick_multiple(tick in increment(), price in raw_value()) {
        let mut filters = InstrumentFilters::defaults("PROPUSDT");
        filters.tick_size = tick;

        if let Ok(quantized) = format_price(&filters, price) {
            prop_assert!(is_multiple_of(quantized, tick, TOLERANCE));
            prop_assert!((quantized - price).abs() <= tick / dec!(2));
        }
    }

    #[test]
    fn accepted_orders_meet_notional(quantity in raw_value(), mark in 1u32..100_000) {
        let mark = Decimal::from(mark);
        let request = OrderRequest::market("PROPUSDT", OrderSide::Buy, quantity);

        if let Ok(order) = validate_and_quantize(None, &request, mark) {
            prop_assert!(order.quantity * mark >= dec!(5));
            prop_assert!(is_multiple_of(order.quantity, dec!(0.001), TOLERANCE));
        }
    }
}
