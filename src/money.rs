//! Money and quantity primitives shared by the pricing engine.
//!
//! Every monetary value is an exact [`Decimal`]. Arithmetic runs at full
//! precision end to end; rounding happens once, at a presentation boundary,
//! through [`round_to`] or [`format_amount`]. Floats never enter the picture.

use rust_decimal::{Decimal, RoundingStrategy};
use validator::ValidationError;

/// Decimal places shown on screens (order entry, listings).
pub const SCREEN_SCALE: u32 = 2;

/// Decimal places printed on documents. Dinar amounts are written with
/// three decimals on invoices and delivery notes.
pub const DOCUMENT_SCALE: u32 = 3;

/// Exact percentage of an amount: `amount * percent / 100`, unrounded.
pub fn percentage(amount: Decimal, percent: Decimal) -> Decimal {
    amount * percent / Decimal::ONE_HUNDRED
}

/// Rounds for presentation, midpoint away from zero.
pub fn round_to(amount: Decimal, scale: u32) -> Decimal {
    amount.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero)
}

/// Formats an amount with exactly `scale` decimal places.
pub fn format_amount(amount: Decimal, scale: u32) -> String {
    format!("{:.*}", scale as usize, round_to(amount, scale))
}

/// Validator hook: a percentage must lie in `[0, 100]`.
pub fn validate_percent(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO || *value > Decimal::ONE_HUNDRED {
        let mut err = ValidationError::new("percent_out_of_range");
        err.message = Some("percentage must be between 0 and 100".into());
        return Err(err);
    }
    Ok(())
}

/// Validator hook: a unit price must not be negative.
pub fn validate_unit_price(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO {
        let mut err = ValidationError::new("negative_unit_price");
        err.message = Some("unit price must not be negative".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn percentage_is_exact() {
        assert_eq!(percentage(dec!(300), dec!(10)), dec!(30));
        assert_eq!(percentage(dec!(0.03), dec!(50)), dec!(0.015));
        assert_eq!(percentage(dec!(100), dec!(0)), dec!(0));
    }

    #[test]
    fn rounding_is_midpoint_away_from_zero() {
        assert_eq!(round_to(dec!(1.005), 2), dec!(1.01));
        assert_eq!(round_to(dec!(-1.005), 2), dec!(-1.01));
        assert_eq!(round_to(dec!(2.0004), 3), dec!(2.000));
    }

    #[test]
    fn format_pads_to_scale() {
        assert_eq!(format_amount(dec!(300), SCREEN_SCALE), "300.00");
        assert_eq!(format_amount(dec!(309), DOCUMENT_SCALE), "309.000");
        assert_eq!(format_amount(dec!(15.2), DOCUMENT_SCALE), "15.200");
    }

    #[test]
    fn percent_validator_bounds() {
        assert!(validate_percent(&dec!(0)).is_ok());
        assert!(validate_percent(&dec!(100)).is_ok());
        assert!(validate_percent(&dec!(100.01)).is_err());
        assert!(validate_percent(&dec!(-1)).is_err());
    }

    #[test]
    fn unit_price_validator_rejects_negative() {
        assert!(validate_unit_price(&dec!(0)).is_ok());
        assert!(validate_unit_price(&dec!(19.99)).is_ok());
        assert!(validate_unit_price(&dec!(-0.001)).is_err());
    }
}
