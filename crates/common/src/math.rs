//! Mathematical Utilities for the NAU Vault Editor
//!
//! Collateral ratios, borrowing-fee application and recovery-mode checks.

use crate::constants::{fees, ratios};
use crate::decimal::Decimal;
use crate::errors::{NauError, NauResult};

/// Calculate a collateral ratio
///
/// ratio = collateral * price / debt
///
/// # Arguments
/// * `collateral` - Collateral in AR
/// * `debt` - Debt in GiB
/// * `price` - AR price in GiB
///
/// # Returns
/// The ratio as a fraction (1.5 = 150%), `Decimal::INFINITY` for zero debt
/// or for a ratio too large to represent
pub fn collateral_ratio(collateral: Decimal, debt: Decimal, price: Decimal) -> NauResult<Decimal> {
    if debt.is_zero() {
        return Ok(Decimal::INFINITY);
    }

    match collateral.checked_mul(price).and_then(|value| value.checked_div(debt)) {
        Err(NauError::Overflow) => Ok(Decimal::INFINITY),
        ratio => ratio,
    }
}

/// Check if a ratio is below the Minimum Collateral Ratio
pub fn is_below_minimum(ratio: Decimal) -> bool {
    ratio < ratios::MCR
}

/// Check if a ratio is below the Critical Collateral Ratio
pub fn is_below_critical(ratio: Decimal) -> bool {
    ratio < ratios::CCR
}

/// Check if the system is in Recovery Mode given its total collateral ratio
pub fn is_recovery_mode(total_collateral_ratio: Decimal) -> bool {
    is_below_critical(total_collateral_ratio)
}

/// Calculate the one-time borrowing fee on a principal
///
/// fee = principal * borrowing_rate
pub fn borrowing_fee(principal: Decimal, borrowing_rate: Decimal) -> NauResult<Decimal> {
    principal.checked_mul(borrowing_rate)
}

/// Split a net-debt increase that already includes the borrowed fee
///
/// principal = increase / (1 + borrowing_rate), fee = increase - principal,
/// so the two parts always add back up to `increase`.
///
/// # Returns
/// `(principal, fee)`
pub fn unapply_fee(increase: Decimal, borrowing_rate: Decimal) -> NauResult<(Decimal, Decimal)> {
    let principal = increase.checked_div(Decimal::ONE.checked_add(borrowing_rate)?)?;
    let fee = increase.checked_sub(principal)?;
    Ok((principal, fee))
}

/// Clamp a borrowing rate into the protocol's floor/ceiling
pub fn clamp_borrowing_rate(rate: Decimal) -> Decimal {
    rate.max(fees::MINIMUM_BORROWING_RATE)
        .min(fees::MAXIMUM_BORROWING_RATE)
}

/// Decay a base rate by `MINUTE_DECAY_FACTOR` per elapsed minute
pub fn decay_base_rate(base_rate: Decimal, minutes_elapsed: u64) -> NauResult<Decimal> {
    if base_rate.is_zero() || minutes_elapsed == 0 {
        return Ok(base_rate);
    }

    base_rate.checked_mul(fees::MINUTE_DECAY_FACTOR.pow(minutes_elapsed)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_collateral_ratio() {
        // 2000 AR at 1.2 GiB backing 1200 GiB = 200%
        assert_eq!(collateral_ratio(d("2000"), d("1200"), d("1.2")).unwrap(), d("2"));

        // 1.5 AR at 100 backing 100 = 150%
        assert_eq!(collateral_ratio(d("1.5"), d("100"), d("100")).unwrap(), d("1.5"));
    }

    #[test]
    fn test_collateral_ratio_zero_debt() {
        assert_eq!(collateral_ratio(d("1"), Decimal::ZERO, d("100")).unwrap(), Decimal::INFINITY);
    }

    #[test]
    fn test_collateral_ratio_saturates() {
        // 1000 AR against one wei of debt
        let dust = Decimal::from_raw(1);
        assert_eq!(collateral_ratio(d("1000"), dust, d("1000")).unwrap(), Decimal::INFINITY);
        assert!(!is_below_minimum(collateral_ratio(d("1000"), dust, d("1000")).unwrap()));
    }

    #[test]
    fn test_ratio_thresholds() {
        assert!(is_below_minimum(d("1.09")));
        assert!(!is_below_minimum(d("1.1")));
        assert!(is_below_critical(d("1.49")));
        assert!(!is_recovery_mode(d("1.5")));
        assert!(is_recovery_mode(d("1.2")));
        assert!(!is_recovery_mode(Decimal::INFINITY));
    }

    #[test]
    fn test_borrowing_fee() {
        // 1000 GiB at 0.5% = 5 GiB
        assert_eq!(borrowing_fee(d("1000"), d("0.005")).unwrap(), d("5"));
    }

    #[test]
    fn test_unapply_fee_splits_exactly() {
        let (principal, fee) = unapply_fee(d("1005"), d("0.005")).unwrap();
        assert_eq!(principal, d("1000"));
        assert_eq!(fee, d("5"));

        let (principal, fee) = unapply_fee(d("1"), d("0.005")).unwrap();
        assert_eq!(principal.checked_add(fee).unwrap(), d("1"));
    }

    #[test]
    fn test_clamp_borrowing_rate() {
        assert_eq!(clamp_borrowing_rate(Decimal::ZERO), fees::MINIMUM_BORROWING_RATE);
        assert_eq!(clamp_borrowing_rate(d("0.2")), fees::MAXIMUM_BORROWING_RATE);
        assert_eq!(clamp_borrowing_rate(d("0.01")), d("0.01"));
    }

    #[test]
    fn test_decay_base_rate_halves_in_twelve_hours() {
        let decayed = decay_base_rate(d("0.02"), 720).unwrap();
        // within 0.1% of the half
        assert!(decayed > d("0.00999") && decayed < d("0.01001"), "got {decayed}");
        assert_eq!(decay_base_rate(d("0.02"), 0).unwrap(), d("0.02"));
    }
}
