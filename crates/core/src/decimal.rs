//! Step and tick arithmetic on exact decimals
//!
//! Exchanges publish quantity steps and price ticks as decimal strings
//! ("0.00100000"). Rounding a value to such an increment in binary floating
//! point leaves residues like `0.30000000000000004`, so every helper here
//! works on [`Decimal`]. Division by an increment that would overflow the
//! 96-bit mantissa leaves the value untouched.

use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Decimal parsing errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecimalError {
    #[error("invalid decimal value: {0:?}")]
    InvalidValue(String),
}

/// Parse a decimal string as published by the exchange.
pub fn parse_decimal(s: &str) -> Result<Decimal, DecimalError> {
    Decimal::from_str(s.trim()).map_err(|_| DecimalError::InvalidValue(s.to_string()))
}

/// Number of significant fractional digits in an increment.
///
/// Trailing zeros are ignored: `0.00100000` has precision 3, `1` and `10`
/// have precision 0. Non-positive increments have precision 0.
pub fn precision_of(increment: Decimal) -> u32 {
    if increment <= Decimal::ZERO {
        return 0;
    }
    increment.normalize().scale()
}

/// Round `value` to the nearest multiple of `increment`.
///
/// Ties go to the even multiple, the same midpoint rule the exchange's
/// reference client used when these rules were established. A
/// non-positive increment means "unconstrained" and returns `value`.
pub fn round_to_increment(value: Decimal, increment: Decimal) -> Decimal {
    if increment <= Decimal::ZERO {
        return value;
    }

    value
        .checked_div(increment)
        .map(|steps| steps.round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven))
        .and_then(|steps| steps.checked_mul(increment))
        .unwrap_or(value)
}

/// Round to the nearest multiple of `increment`, then to the increment's
/// own precision so the result carries no spurious digits.
pub fn quantize_to_increment(value: Decimal, increment: Decimal) -> Decimal {
    if increment <= Decimal::ZERO {
        return value;
    }
    round_to_increment(value, increment).round_dp(precision_of(increment))
}

/// Whether `value` is a multiple of `increment` within `tolerance`.
pub fn is_multiple_of(value: Decimal, increment: Decimal, tolerance: Decimal) -> bool {
    if increment <= Decimal::ZERO {
        return true;
    }
    let nearest = round_to_increment(value, increment);
    (nearest - value).abs() <= tolerance
}

/// Format with a fixed number of decimals and thousands separators,
/// e.g. `1234567.891` at 2 decimals becomes `1,234,567.89`.
pub fn format_grouped(value: Decimal, decimals: u32) -> String {
    let rounded = value.round_dp(decimals);
    let plain = format!("{:.1$}", rounded.abs(), decimals as usize);

    let (integer, fraction) = match plain.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (plain.as_str(), None),
    };

    let mut grouped = String::with_capacity(plain.len() + integer.len() / 3 + 1);
    if rounded.is_sign_negative() && !rounded.is_zero() {
        grouped.push('-');
    }
    for (i, ch) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(fraction) = fraction {
        grouped.push('.');
        grouped.push_str(fraction);
    }

    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_precision_of() {
        assert_eq!(precision_of(dec!(0.00100000)), 3);
        assert_eq!(precision_of(dec!(0.01)), 2);
        assert_eq!(precision_of(dec!(1)), 0);
        assert_eq!(precision_of(dec!(10)), 0);
        assert_eq!(precision_of(dec!(0.5)), 1);
        assert_eq!(precision_of(Decimal::ZERO), 0);
    }

    #[test]
    fn test_round_to_increment() {
        assert_eq!(round_to_increment(dec!(0.00137), dec!(0.001)), dec!(0.001));
        assert_eq!(round_to_increment(dec!(0.0016), dec!(0.001)), dec!(0.002));
        assert_eq!(round_to_increment(dec!(50000.123), dec!(0.01)), dec!(50000.12));
        assert_eq!(round_to_increment(dec!(17), dec!(5)), dec!(15));
    }

    #[test]
    fn test_midpoint_goes_to_even() {
        assert_eq!(round_to_increment(dec!(0.0025), dec!(0.001)), dec!(0.002));
        assert_eq!(round_to_increment(dec!(0.0035), dec!(0.001)), dec!(0.004));
    }

    #[test]
    fn test_zero_increment_is_unconstrained() {
        assert_eq!(round_to_increment(dec!(1.23456), Decimal::ZERO), dec!(1.23456));
        assert_eq!(quantize_to_increment(dec!(1.23456), Decimal::ZERO), dec!(1.23456));
        assert!(is_multiple_of(dec!(1.23456), Decimal::ZERO, Decimal::ZERO));
    }

    #[test]
    fn test_quantize_strips_spurious_digits() {
        let q = quantize_to_increment(dec!(0.3), dec!(0.1000));
        assert_eq!(q, dec!(0.3));
        assert_eq!(q.scale(), 1);
    }

    #[test]
    fn test_is_multiple_of() {
        assert!(is_multiple_of(dec!(0.003), dec!(0.001), dec!(0.00000001)));
        assert!(!is_multiple_of(dec!(0.0031), dec!(0.001), dec!(0.00000001)));
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("0.00100000").unwrap(), dec!(0.001));
        assert_eq!(parse_decimal(" 5.0 ").unwrap(), dec!(5));
        assert!(parse_decimal("five").is_err());
    }

    #[test]
    fn test_format_grouped() {
        assert_eq!(format_grouped(dec!(1234567.891), 2), "1,234,567.89");
        assert_eq!(format_grouped(dec!(999.5), 0), "1,000");
        assert_eq!(format_grouped(dec!(-1234.5), 2), "-1,234.50");
        assert_eq!(format_grouped(dec!(0.12345), 4), "0.1234");
        assert_eq!(format_grouped(dec!(12), 2), "12.00");
    }
}
