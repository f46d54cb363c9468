//! Pricing calculator
//!
//! Pure functions; the price of a stay is the room's nightly rate times the
//! number of nights, in the rate's own currency.

use crate::constants::MINOR_UNITS_PER_MAJOR;
use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use stayhub_core::{models::StayDates, AppError, AppResult};

/// Number of nights between two dates
///
/// Fails with `InvalidDateRange` unless `check_out` is after `check_in`.
pub fn nights_between(check_in: NaiveDate, check_out: NaiveDate) -> AppResult<i64> {
    Ok(StayDates::new(check_in, check_out)?.nights())
}

/// Price of a stay at `rate` per night
pub fn price_stay(rate: Decimal, dates: &StayDates) -> AppResult<Decimal> {
    if rate < Decimal::ZERO {
        return Err(AppError::Validation(format!(
            "nightly rate must not be negative, got {}",
            rate
        )));
    }
    Ok(rate * Decimal::from(dates.nights()))
}

/// Price of a stay given raw dates
pub fn quote(rate: Decimal, check_in: NaiveDate, check_out: NaiveDate) -> AppResult<Decimal> {
    price_stay(rate, &StayDates::new(check_in, check_out)?)
}

/// Convert a major-unit amount to minor units, truncating toward zero
pub fn to_minor_units(amount: Decimal) -> AppResult<i64> {
    (amount * Decimal::from(MINOR_UNITS_PER_MAJOR))
        .trunc()
        .to_i64()
        .ok_or_else(|| AppError::Validation(format!("amount {} is out of range", amount)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_three_nights_at_100() {
        let total = quote(dec!(100), date(2024, 1, 1), date(2024, 1, 4)).unwrap();
        assert_eq!(total, dec!(300));
    }

    #[test]
    fn test_fractional_rate_keeps_precision() {
        let total = quote(dec!(49.99), date(2024, 3, 1), date(2024, 3, 3)).unwrap();
        assert_eq!(total, dec!(99.98));
    }

    #[test]
    fn test_zero_rate_is_free() {
        assert_eq!(
            quote(Decimal::ZERO, date(2024, 1, 1), date(2024, 1, 2)).unwrap(),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_invalid_range() {
        for (a, b) in [
            (date(2024, 1, 4), date(2024, 1, 4)),
            (date(2024, 1, 4), date(2024, 1, 1)),
        ] {
            assert!(matches!(
                quote(dec!(100), a, b),
                Err(AppError::InvalidDateRange { .. })
            ));
            assert!(matches!(
                nights_between(a, b),
                Err(AppError::InvalidDateRange { .. })
            ));
        }
    }

    #[test]
    fn test_negative_rate_rejected() {
        assert!(matches!(
            quote(dec!(-1), date(2024, 1, 1), date(2024, 1, 2)),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_minor_units_truncate() {
        assert_eq!(to_minor_units(dec!(300)).unwrap(), 30_000);
        assert_eq!(to_minor_units(dec!(12.345)).unwrap(), 1_234);
        assert_eq!(to_minor_units(dec!(0.009)).unwrap(), 0);
    }
}
