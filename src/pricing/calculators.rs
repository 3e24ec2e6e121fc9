//! Core pricing calculation functions.
//!
//! Pure functions for stay pricing - no database access.

use chrono::NaiveDate;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

/// Fee schedule applied on top of the nightly subtotal.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingPolicy {
    /// Fraction of the subtotal charged as service fee (0.12 = 12%)
    pub service_fee_rate: Decimal,
    /// Flat fee per pet for the whole stay
    pub pet_fee: Decimal,
    pub currency: String,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            service_fee_rate: dec!(0.12),
            pet_fee: dec!(500),
            currency: "INR".to_string(),
        }
    }
}

/// What a guest asks for: a date range plus party size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StayRequest {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: u32,
    pub pets: u32,
}

/// Price breakdown for a stay
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StayPrice {
    pub nights: i64,
    pub nightly_rate: Decimal,
    pub subtotal: Decimal,
    pub service_fee: Decimal,
    pub pet_fee: Decimal,
    pub total: Decimal,
    pub currency: String,
}

/// Round to whole currency units, halves away from zero.
///
/// # Examples
/// ```
/// use rust_decimal_macros::dec;
/// use vacation_rentals::pricing::round_currency;
///
/// assert_eq!(round_currency(dec!(151.5)), dec!(152));
/// assert_eq!(round_currency(dec!(2232.49)), dec!(2232));
/// ```
pub fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Convert a major-unit amount (rupees) into integer minor units (paise).
///
/// Returns `None` if the amount does not fit in an `i64`.
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    (amount * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

/// Whole nights between check-in and check-out. Inverted ranges count as zero.
pub fn count_nights(check_in: NaiveDate, check_out: NaiveDate) -> i64 {
    (check_out - check_in).num_days().max(0)
}

/// Price a stay at `nightly_rate` under `policy`.
///
/// subtotal = rate x nights, service fee = round(subtotal x rate),
/// pet fee = pets x flat fee, total = sum of the three.
pub fn price_stay(policy: &PricingPolicy, nightly_rate: Decimal, stay: &StayRequest) -> StayPrice {
    let nights = count_nights(stay.check_in, stay.check_out);
    let subtotal = nightly_rate * Decimal::from(nights);
    let service_fee = round_currency(subtotal * policy.service_fee_rate);
    let pet_fee = policy.pet_fee * Decimal::from(stay.pets);

    StayPrice {
        nights,
        nightly_rate,
        subtotal,
        service_fee,
        pet_fee,
        total: subtotal + service_fee + pet_fee,
        currency: policy.currency.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn stay(check_in: NaiveDate, check_out: NaiveDate, pets: u32) -> StayRequest {
        StayRequest {
            check_in,
            check_out,
            guests: 2,
            pets,
        }
    }

    // ==================== round_currency tests ====================

    #[test]
    fn test_round_currency_half_away_from_zero() {
        assert_eq!(round_currency(dec!(2.5)), dec!(3));
        assert_eq!(round_currency(dec!(3.5)), dec!(4));
        assert_eq!(round_currency(dec!(-2.5)), dec!(-3));
    }

    #[test]
    fn test_round_currency_normal_rounding() {
        assert_eq!(round_currency(dec!(2232.0)), dec!(2232));
        assert_eq!(round_currency(dec!(1.49)), dec!(1));
        assert_eq!(round_currency(dec!(1.51)), dec!(2));
    }

    #[test]
    fn test_to_minor_units() {
        assert_eq!(to_minor_units(dec!(20832)), Some(2_083_200));
        assert_eq!(to_minor_units(dec!(0.015)), Some(2));
        assert_eq!(to_minor_units(dec!(0)), Some(0));
    }

    // ==================== count_nights tests ====================

    #[test]
    fn test_count_nights() {
        assert_eq!(count_nights(date(2025, 2, 15), date(2025, 2, 18)), 3);
        assert_eq!(count_nights(date(2024, 2, 28), date(2024, 3, 1)), 2); // leap year
        assert_eq!(count_nights(date(2025, 2, 15), date(2025, 2, 15)), 0);
        assert_eq!(count_nights(date(2025, 2, 18), date(2025, 2, 15)), 0);
    }

    // ==================== price_stay tests ====================

    #[test]
    fn test_price_stay_three_nights_no_pets() {
        let price = price_stay(
            &PricingPolicy::default(),
            dec!(6200),
            &stay(date(2025, 2, 15), date(2025, 2, 18), 0),
        );

        assert_eq!(price.nights, 3);
        assert_eq!(price.subtotal, dec!(18600));
        assert_eq!(price.service_fee, dec!(2232));
        assert_eq!(price.pet_fee, dec!(0));
        assert_eq!(price.total, dec!(20832));
        assert_eq!(price.currency, "INR");
    }

    #[test]
    fn test_price_stay_with_pet() {
        let price = price_stay(
            &PricingPolicy::default(),
            dec!(6200),
            &stay(date(2025, 2, 15), date(2025, 2, 18), 1),
        );

        assert_eq!(price.pet_fee, dec!(500));
        assert_eq!(price.total, dec!(21332));
    }

    #[test]
    fn test_price_stay_service_fee_rounds_half_up() {
        // 1262.5 * 0.12 = 151.5
        let price = price_stay(
            &PricingPolicy::default(),
            dec!(1262.5),
            &stay(date(2025, 3, 1), date(2025, 3, 2), 0),
        );

        assert_eq!(price.service_fee, dec!(152));
        assert_eq!(price.total, dec!(1414.5));
    }

    #[test]
    fn test_price_stay_zero_nights() {
        let price = price_stay(
            &PricingPolicy::default(),
            dec!(6200),
            &stay(date(2025, 2, 15), date(2025, 2, 15), 2),
        );

        assert_eq!(price.nights, 0);
        assert_eq!(price.subtotal, dec!(0));
        assert_eq!(price.service_fee, dec!(0));
        // Pet fee is flat per stay, not per night
        assert_eq!(price.total, dec!(1000));
    }

    #[test]
    fn test_price_stay_formula_holds_across_rates() {
        let policy = PricingPolicy::default();
        for rate in [dec!(0), dec!(999), dec!(4500.75), dec!(12000)] {
            for nights in 0..10i64 {
                for pets in 0..3u32 {
                    let check_in = date(2025, 6, 1);
                    let check_out = check_in + chrono::Duration::days(nights);
                    let price = price_stay(&policy, rate, &stay(check_in, check_out, pets));

                    let subtotal = rate * Decimal::from(nights);
                    let expected = subtotal
                        + round_currency(subtotal * dec!(0.12))
                        + dec!(500) * Decimal::from(pets);
                    assert_eq!(price.total, expected);
                }
            }
        }
    }

    #[test]
    fn test_price_stay_large_values_stay_exact() {
        let price = price_stay(
            &PricingPolicy::default(),
            dec!(99999999.99),
            &stay(date(2025, 1, 1), date(2025, 1, 31), 0),
        );

        assert_eq!(price.subtotal, dec!(2999999999.70));
        // 2999999999.70 * 0.12 = 359999999.964
        assert_eq!(price.service_fee, dec!(360000000));
    }

    #[test]
    fn test_price_stay_custom_policy() {
        let policy = PricingPolicy {
            service_fee_rate: dec!(0.10),
            pet_fee: dec!(750),
            currency: "INR".to_string(),
        };
        let price = price_stay(&policy, dec!(5000), &stay(date(2025, 5, 1), date(2025, 5, 3), 1));

        assert_eq!(price.service_fee, dec!(1000));
        assert_eq!(price.total, dec!(11750));
    }
}
